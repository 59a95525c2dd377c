//! Error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration-level failures. Anything in here means the grammar,
/// the signature or a stored program is broken, so it is never recovered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("symbol declared twice: {0}")]
    DuplicateSymbol(String),

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("literal {value} is not in the domain of {ty}")]
    InvalidLiteral { ty: String, value: String },

    #[error("parameter #{index} out of range, the program takes {arity} inputs")]
    BadParam { index: usize, arity: usize },

    #[error("no handler for production {0}")]
    MissingHandler(String),

    #[error("parse error at byte {pos}: {msg}")]
    Parse { pos: usize, msg: String },

    #[error("invalid input policy: {0}")]
    InputPolicy(String),

    #[error("cannot load input: {0}")]
    Load(String),
}

impl Error {
    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn parse(pos: usize, msg: impl Into<String>) -> Self {
        Error::Parse { pos, msg: msg.into() }
    }
}

/// Outcome of a failed evaluation. Neither case is a crash: a prune says
/// the candidate is semantically invalid for this input, an execution
/// error says the domain engine itself failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("pruned: {reason}")]
    Prune { reason: String },

    #[error("execution failed: {detail}")]
    Execution { detail: String },
}

impl EvalError {
    pub fn prune(reason: impl Into<String>) -> Self {
        EvalError::Prune { reason: reason.into() }
    }

    pub fn execution(detail: impl Into<String>) -> Self {
        EvalError::Execution { detail: detail.into() }
    }

    pub fn is_prune(&self) -> bool {
        matches!(self, EvalError::Prune { .. })
    }
}

pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Signalled by an enumerator once no further distinct candidate exists
/// within its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search space exhausted")]
pub struct SearchExhausted;
