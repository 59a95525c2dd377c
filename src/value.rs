use std::fmt;

/// Name of an opaque value living inside the domain executor. Handles
/// are only minted by a session's [`HandleAllocator`](crate::domain::HandleAllocator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub(crate) u64);

impl Handle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RET_DF{}", self.0)
    }
}

/// A concrete value flowing through the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Handle(Handle),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<Handle> {
        match self {
            Value::Handle(h) => Some(*h),
            _ => None,
        }
    }

    /// Whether the value can be written down as a literal. Handles can't,
    /// they only exist for the lifetime of a session.
    pub fn is_literal(&self) -> bool {
        match self {
            Value::Int(_) | Value::Str(_) => true,
            Value::List(xs) => xs.iter().all(Value::is_literal),
            Value::Handle(_) => false,
        }
    }

    /// Every handle mentioned by this value, depth first.
    pub fn handles(&self) -> Vec<Handle> {
        let mut res = Vec::new();
        self.collect_handles(&mut res);
        res
    }

    fn collect_handles(&self, out: &mut Vec<Handle>) {
        match self {
            Value::Handle(h) => out.push(*h),
            Value::List(xs) => xs.iter().for_each(|x| x.collect_handles(out)),
            Value::Int(_) | Value::Str(_) => (),
        }
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Self {
        Value::Int(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self {
        Value::List(xs)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(x) => write!(f, "{x}"),
            Value::Str(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            },
            Value::List(xs) => {
                f.write_str("(")?;
                for (idx, x) in xs.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{x}")?;
                }
                f.write_str(")")
            },
            Value::Handle(h) => write!(f, "#<{h}>"),
        }
    }
}
