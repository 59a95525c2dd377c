use log::{debug, info, trace};

use crate::domain::{DomainExecutor, Session};
use crate::error::EvalError;
use crate::expr::Program;
use crate::interp::Interpreter;
use crate::oracle::{Decider, Example};
use crate::spec::Spec;
use crate::synth::Enumerator;

/// Outcome of trying one candidate.
#[derive(Clone, Debug)]
pub enum SearchStep {
    /// A handler rejected the candidate on some example's input.
    Pruned {
        cand: Program,
        reason: String,
    },
    /// The domain executor failed while running the candidate.
    Failed {
        cand: Program,
        detail: String,
    },
    /// The candidate ran but disagreed with example #`example`.
    Mismatch {
        cand: Program,
        example: usize,
    },
    Solved {
        cand: Program,
    },
}

impl SearchStep {
    pub fn cand(&self) -> &Program {
        match self {
            SearchStep::Pruned { cand, .. }
            | SearchStep::Failed { cand, .. }
            | SearchStep::Mismatch { cand, .. }
            | SearchStep::Solved { cand } => cand,
        }
    }
}

/// The enumerate, interpret, decide loop. Examples without an output
/// are skipped.
pub struct Search<'a, E: DomainExecutor, S> {
    spec: &'a Spec,
    synth: S,
    interp: &'a Interpreter<E>,
    decider: &'a Decider<E>,
    session: &'a mut Session<E>,
    examples: &'a [Example],
    attempts: usize,
    max_attempts: Option<usize>,
}

impl<'a, E: DomainExecutor, S: Enumerator> Search<'a, E, S> {
    pub fn new(
        spec: &'a Spec,
        synth: S,
        interp: &'a Interpreter<E>,
        decider: &'a Decider<E>,
        session: &'a mut Session<E>,
        examples: &'a [Example],
    ) -> Self {
        Self {
            spec,
            synth,
            interp,
            decider,
            session,
            examples,
            attempts: 0,
            max_attempts: None,
        }
    }

    /// Stops the search after `cap` candidates. Required for enumerators
    /// that never run out on their own.
    pub fn with_max_attempts(mut self, cap: usize) -> Self {
        self.max_attempts = Some(cap);
        self
    }

    /// Candidates tried so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Tries the next candidate. Returns `None` once the enumerator is
    /// exhausted or the attempt cap is hit. Every candidate that isn't a
    /// solution is excluded from the enumerator.
    pub fn step(&mut self) -> Option<SearchStep> {
        if self.max_attempts.is_some_and(|cap| self.attempts >= cap) {
            debug!("Attempt cap reached");
            return None;
        }

        let cand = self.synth.next_expr().ok()?;
        self.attempts += 1;

        debug!("Try: {}", cand.to_sexp(self.spec));

        let step = self.check(cand);
        if !matches!(step, SearchStep::Solved { .. }) {
            self.synth.exclude(step.cand());
        }

        Some(step)
    }

    fn check(&mut self, cand: Program) -> SearchStep {
        for (idx, example) in self.examples.iter().enumerate() {
            let Some(expected) = &example.output else {
                continue;
            };

            let value = match self.interp.eval_program(self.session, &cand, &example.input) {
                Ok(value) => value,
                Err(EvalError::Prune { reason }) => {
                    trace!("Pruned on example #{idx}: {reason}");
                    return SearchStep::Pruned { cand, reason };
                },
                Err(EvalError::Execution { detail }) => {
                    debug!("Execution failed on example #{idx}: {detail}");
                    return SearchStep::Failed { cand, detail };
                },
            };

            let ok = self.decider.matches(self.session.executor(), &value, expected);
            self.session.release_result(&value, &example.input);

            if !ok {
                trace!("Mismatch on example #{idx}: got {value}, want {expected}");
                return SearchStep::Mismatch { cand, example: idx };
            }
        }

        SearchStep::Solved { cand }
    }

    /// Steps until a solution turns up or the search runs dry.
    pub fn run(mut self) -> Option<Program> {
        while let Some(step) = self.step() {
            if let SearchStep::Solved { cand } = step {
                info!("Solved after {} candidates: {}", self.attempts, cand.to_sexp(self.spec));
                return Some(cand);
            }
        }

        info!("No solution after {} candidates", self.attempts);
        None
    }
}
