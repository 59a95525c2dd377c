use log::debug;

use crate::domain::DomainExecutor;
use crate::error::Result;
use crate::expr::{Expr, Program};
use crate::spec::Spec;
use crate::value::Value;

/// One input/output pair. `output` is `None` while the example is still
/// waiting for the generator to fill it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub input: Vec<Value>,
    pub output: Option<Value>,
}

impl Example {
    pub fn new(input: Vec<Value>, output: Value) -> Self {
        Self { input, output: Some(output) }
    }

    pub fn partial(input: Vec<Value>) -> Self {
        Self { input, output: None }
    }
}

/// When two values count as the same output.
pub trait Equivalence<E>: Send + Sync {
    fn equivalent(&self, executor: &E, lhs: &Value, rhs: &Value) -> bool;
}

/// Structural equality. Opaque values are compared by the executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueEquality;

impl<E: DomainExecutor> Equivalence<E> for ValueEquality {
    fn equivalent(&self, executor: &E, lhs: &Value, rhs: &Value) -> bool {
        match (lhs, rhs) {
            (Value::Handle(l), Value::Handle(r)) => l == r || executor.equivalent(*l, *r),
            (Value::List(l), Value::List(r)) => l.len() == r.len()
                && l.iter().zip(r).all(|(l, r)| self.equivalent(executor, l, r)),
            (l, r) => l == r,
        }
    }
}

/// Like [`ValueEquality`], but lists are compared as multisets.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unordered;

impl<E: DomainExecutor> Equivalence<E> for Unordered {
    fn equivalent(&self, executor: &E, lhs: &Value, rhs: &Value) -> bool {
        match (lhs, rhs) {
            (Value::List(l), Value::List(r)) => {
                if l.len() != r.len() {
                    return false;
                }

                let mut used = vec![false; r.len()];
                l.iter().all(|x| {
                    let hit = r.iter()
                        .enumerate()
                        .find(|(idx, y)| !used[*idx] && self.equivalent(executor, x, y))
                        .map(|(idx, _)| idx);
                    match hit {
                        Some(idx) => {
                            used[idx] = true;
                            true
                        },
                        None => false,
                    }
                })
            },
            (l, r) => ValueEquality.equivalent(executor, l, r),
        }
    }
}

/// How far apart two applications of the same production may be before
/// the redundancy rule stops caring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatScope {
    Off,
    /// Parent and direct child only.
    Adjacent,
    /// Any ancestor on the path.
    Path,
}

/// A caller supplied predicate every accepted program must satisfy.
pub struct StructuralRule {
    name: String,
    check: Box<dyn Fn(&Expr) -> bool + Send + Sync>,
}

impl StructuralRule {
    pub fn new(name: &str, check: impl Fn(&Expr) -> bool + Send + Sync + 'static) -> Self {
        Self {
            name: name.to_string(),
            check: Box::new(check),
        }
    }

    /// The root must be an application of `production`.
    pub fn root_is(spec: &Spec, production: &str) -> Result<Self> {
        let id = spec.production_id(production)?;

        Ok(Self::new(
            &format!("root is {production}"),
            move |e| e.production() == Some(id),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct SanityPolicy {
    pub reject_identity: bool,
    pub repeat_scope: RepeatScope,
    pub require_nonempty: bool,
    pub structural: Vec<StructuralRule>,
}

impl Default for SanityPolicy {
    fn default() -> Self {
        Self {
            reject_identity: true,
            repeat_scope: RepeatScope::Adjacent,
            require_nonempty: true,
            structural: Vec::new(),
        }
    }
}

impl SanityPolicy {
    pub fn with_rule(mut self, rule: StructuralRule) -> Self {
        self.structural.push(rule);
        self
    }
}

pub struct Decider<E> {
    equivalence: Box<dyn Equivalence<E>>,
    policy: SanityPolicy,
}

impl<E: DomainExecutor> Decider<E> {
    pub fn new(equivalence: impl Equivalence<E> + 'static, policy: SanityPolicy) -> Self {
        Self {
            equivalence: Box::new(equivalence),
            policy,
        }
    }

    pub fn policy(&self) -> &SanityPolicy {
        &self.policy
    }

    pub fn matches(&self, executor: &E, value: &Value, expected: &Value) -> bool {
        self.equivalence.equivalent(executor, value, expected)
    }

    /// Whether `example` (with its output filled in by running `program`)
    /// is worth keeping. Rules run in order and stop at the first failure.
    pub fn is_sane(&self, executor: &E, program: &Program, example: &Example) -> bool {
        let Some(output) = &example.output else {
            return false;
        };

        if self.policy.reject_identity
            && example.input.iter().any(|x| self.matches(executor, output, x))
        {
            debug!("Insane: output equals an input");
            return false;
        }

        if self.has_redundant_repeat(program.root()) {
            debug!("Insane: redundant repeated production");
            return false;
        }

        if self.policy.require_nonempty
            && output.handles().into_iter().any(|h| !executor.query_nonempty(h))
        {
            debug!("Insane: degenerate output");
            return false;
        }

        if let Some(rule) = self.policy.structural.iter().find(|r| !(r.check)(program.root())) {
            debug!("Insane: violates {}", rule.name);
            return false;
        }

        true
    }

    fn has_redundant_repeat(&self, root: &Expr) -> bool {
        let scope = self.policy.repeat_scope;
        if scope == RepeatScope::Off {
            return false;
        }

        root.any_with_ancestor(|node, anc, dist| {
            let same = node.production().is_some() && node.production() == anc.production();
            same && (scope == RepeatScope::Path || dist == 1)
        })
    }
}

impl<E: DomainExecutor> Default for Decider<E> {
    fn default() -> Self {
        Self::new(ValueEquality, SanityPolicy::default())
    }
}
