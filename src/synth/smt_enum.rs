use std::collections::HashSet;

use log::{debug, info, warn};

use crate::config::Bounds;
use crate::conv::{Assignment, HoleEncoding};
use crate::error::SearchExhausted;
use crate::expr::Program;
use crate::spec::{ProgramSignature, Spec};

use super::Enumerator;

/// Enumerator backed by z3. Every hole of the bounded program tree is an
/// integer variable, the solver proposes assignments satisfying the
/// well-formedness constraints and rejected assignments get blocked.
///
/// Proposing does not block anything: until a candidate is excluded, the
/// solver is free to propose it again.
pub struct SmtEnum<'ctx> {
    solver: z3::Solver<'ctx>,
    encoding: HoleEncoding<'ctx>,
    sig: ProgramSignature,
    blocked: HashSet<Assignment>,
}

impl<'ctx> SmtEnum<'ctx> {
    pub fn new(
        z3: &'ctx z3::Context,
        spec: &Spec,
        sig: ProgramSignature,
        bounds: Bounds,
    ) -> Self {
        let encoding = HoleEncoding::new(z3, spec, &sig, bounds.max_depth);
        let solver = z3::Solver::new(z3);

        if bounds.max_depth > 0 {
            for constr in encoding.well_formed(sig.output, bounds.max_size) {
                solver.assert(&constr);
            }
        } else {
            solver.assert(&z3::ast::Bool::from_bool(z3, false));
        }

        info!("Guided enumerator over {} holes", encoding.slot_count());

        Self {
            solver,
            encoding,
            sig,
            blocked: HashSet::new(),
        }
    }

    /// Asks the solver for a fresh assignment.
    pub fn propose(&self) -> Result<Assignment, SearchExhausted> {
        let verdict = self.solver.check();
        debug!("Z3 proposal: {verdict:?}");

        match verdict {
            z3::SatResult::Sat => (),
            z3::SatResult::Unsat => return Err(SearchExhausted),
            z3::SatResult::Unknown => {
                warn!("Z3 could not decide the remaining space");
                return Err(SearchExhausted);
            },
        }

        let model = self.solver.get_model().ok_or(SearchExhausted)?;
        self.encoding.assignment(&model).ok_or(SearchExhausted)
    }

    /// Blocks `assignment` for the rest of the session. Excluding twice
    /// is a no-op.
    pub fn exclude_assignment(&mut self, assignment: Assignment) {
        if self.blocked.contains(&assignment) {
            return;
        }

        self.solver.assert(&self.encoding.block(&assignment));
        self.blocked.insert(assignment);
    }

    pub fn blocked(&self) -> usize {
        self.blocked.len()
    }
}

impl<'ctx> Enumerator for SmtEnum<'ctx> {
    fn next_expr(&mut self) -> Result<Program, SearchExhausted> {
        let assignment = self.propose()?;
        let Some(expr) = self.encoding.to_expr(&assignment) else {
            // Can only happen if the model ignored the shape constraints.
            warn!("Malformed model {assignment:?}");
            self.exclude_assignment(assignment);
            return Err(SearchExhausted);
        };

        Ok(Program::new_unchecked(expr, self.sig.clone()))
    }

    fn exclude(&mut self, cand: &Program) {
        match self.encoding.assignment_of(cand.root()) {
            Some(assignment) => self.exclude_assignment(assignment),
            None => debug!("Excluded candidate does not fit the holes"),
        }
    }
}
