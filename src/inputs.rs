//! Synthetic program inputs: random tables built column by column, for
//! generating examples when no real inputs are at hand.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::{ColumnKind, InputPolicy};
use crate::domain::{DomainExecutor, Session};
use crate::error::{Error, Result};
use crate::spec::{ProgramSignature, Spec};
use crate::value::Value;

pub struct InputSampler {
    policy: InputPolicy,
    rng: StdRng,
}

impl InputSampler {
    /// Fails if the policy can't produce a single table.
    pub fn new(policy: InputPolicy, seed: u64) -> Result<Self> {
        let bad = |what: &str| Err(Error::InputPolicy(what.to_string()));

        if policy.weights().iter().all(|(_, w)| *w == 0) {
            return bad("every column kind weighs 0");
        }
        if policy.rows.is_empty() || policy.cols.is_empty() || policy.values.is_empty() {
            return bad("empty row, column or value range");
        }
        if policy.categories.is_empty() || *policy.categories.start() == 0 {
            return bad("categorical columns need at least one category");
        }
        if policy.words.is_empty() {
            return bad("no words to draw string cells from");
        }

        Ok(Self {
            policy,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn kind(&mut self) -> ColumnKind {
        // `new` made sure some weight is positive.
        self.policy.weights()
            .choose_weighted(&mut self.rng, |(_, w)| *w)
            .map_or(ColumnKind::Int, |(k, _)| *k)
    }

    fn word(&mut self) -> Value {
        let idx = self.rng.gen_range(0..self.policy.words.len());
        Value::Str(self.policy.words[idx].clone())
    }

    fn int(&mut self) -> Value {
        Value::Int(self.rng.gen_range(self.policy.values.clone()))
    }

    /// `rows` cells of kind `kind`.
    pub fn column(&mut self, kind: ColumnKind, rows: usize) -> Value {
        let cells = match kind {
            ColumnKind::Str => (0..rows).map(|_| self.word()).collect(),
            ColumnKind::Int => (0..rows).map(|_| self.int()).collect(),
            ColumnKind::Float => {
                let lo = *self.policy.values.start() as f64;
                let hi = *self.policy.values.end() as f64;
                // Cells carry the two-decimal text engines parse.
                (0..rows)
                    .map(|_| Value::Str(format!("{:.2}", self.rng.gen_range(lo..=hi))))
                    .collect()
            },
            ColumnKind::StrCat | ColumnKind::IntCat => {
                let n = self.rng.gen_range(self.policy.categories.clone());
                let pool = (0..n)
                    .map(|_| if kind == ColumnKind::StrCat { self.word() } else { self.int() })
                    .collect::<Vec<_>>();

                (0..rows)
                    .map(|_| pool[self.rng.gen_range(0..pool.len())].clone())
                    .collect()
            },
        };

        Value::List(cells)
    }

    /// A table as a list of equally long columns.
    pub fn table(&mut self) -> Value {
        let rows = self.rng.gen_range(self.policy.rows.clone());
        let cols = self.rng.gen_range(self.policy.cols.clone());

        let columns = (0..cols)
            .map(|_| {
                let kind = self.kind();
                trace!("Column of {kind}, {rows} rows");
                self.column(kind, rows)
            })
            .collect();

        Value::List(columns)
    }

    /// One input per parameter of `sig`. Enum-typed parameters get a
    /// literal of their domain. Opaque ones get a fresh table loaded
    /// into the session, owned by the caller.
    pub fn inputs<E: DomainExecutor>(
        &mut self,
        spec: &Spec,
        sig: &ProgramSignature,
        session: &mut Session<E>,
    ) -> Result<Vec<Value>> {
        spec.check_signature(sig)?;

        let mut res = Vec::with_capacity(sig.arity());
        for ty in &sig.inputs {
            let decl = spec.ty(*ty);
            let value = if decl.is_enum() {
                decl.literals()
                    .choose(&mut self.rng)
                    .cloned()
                    .ok_or_else(|| Error::InputPolicy(format!("{} has no literals", decl.name)))
            } else {
                let table = self.table();
                session.load(&table).map_err(|e| Error::Load(e.0))
            };

            match value {
                Ok(value) => res.push(value),
                Err(e) => {
                    for v in &res {
                        session.release(v);
                    }
                    return Err(e);
                },
            }
        }

        debug!("Sampled {} inputs", res.len());
        Ok(res)
    }
}
