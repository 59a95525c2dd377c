//! Hole-variable encoding of ASTs for the guided enumerator.
//!
//! A candidate is laid out on a complete tree with `levels` levels and
//! `fanout` children per slot, numbered breadth first. Every slot holds an
//! integer choice: the id of an [`Alternative`], or `unused` for slots
//! below a leaf. With unused slots pinned, assignments and trees are in
//! one to one correspondence.

use std::collections::HashMap;

use log::trace;
use z3::ast::{Ast, Bool, Int};

use crate::expr::Expr;
use crate::spec::{ProgramSignature, Spec, TypeId};
use crate::synth::{alternatives, Alternative};

/// Slot values, indexed by slot.
pub type Assignment = Vec<i64>;

/// Where the alternatives of one type sit among the global ids. Leaves
/// come first, applications last.
#[derive(Debug, Clone, Copy)]
struct TypeRange {
    start: i64,
    apply_start: i64,
    end: i64,
}

pub struct HoleEncoding<'ctx> {
    z3: &'ctx z3::Context,
    fanout: usize,
    inner_slots: usize,
    slots: Vec<Int<'ctx>>,
    alts: Vec<Alternative>,
    arity: Vec<usize>,
    arg_types: Vec<Vec<TypeId>>,
    ranges: Vec<TypeRange>,
    ids: HashMap<Alternative, i64>,
}

impl<'ctx> HoleEncoding<'ctx> {
    pub fn new(
        z3: &'ctx z3::Context,
        spec: &Spec,
        sig: &ProgramSignature,
        levels: usize,
    ) -> Self {
        let fanout = spec.max_arity().max(1);

        let mut alts = Vec::new();
        let mut ranges = Vec::new();
        for (ty, _) in spec.types() {
            let of_ty = alternatives(spec, sig, ty);
            let start = alts.len() as i64;
            let leaves = of_ty.iter().filter(|a| !a.is_apply()).count() as i64;
            alts.extend(of_ty);
            ranges.push(TypeRange {
                start,
                apply_start: start + leaves,
                end: alts.len() as i64,
            });
        }

        let arity = alts.iter().map(|a| a.arity(spec)).collect();
        let arg_types = alts.iter()
            .map(|a| match a {
                Alternative::Apply(p) => spec.production(*p).args.clone(),
                Alternative::Param(_) | Alternative::Literal(..) => Vec::new(),
            })
            .collect();
        let ids = alts.iter()
            .enumerate()
            .map(|(idx, a)| (a.clone(), idx as i64))
            .collect();

        // Slots on every level but the last have children.
        let level_sizes = (0..levels)
            .scan(1usize, |width, _| {
                let here = *width;
                *width = width.saturating_mul(fanout);
                Some(here)
            })
            .collect::<Vec<_>>();
        let total = level_sizes.iter().sum::<usize>();
        let inner_slots = total - level_sizes.last().copied().unwrap_or(0);

        let slots = (0..total)
            .map(|idx| Int::new_const(z3, format!("h{idx}")))
            .collect();

        trace!("Encoding: {total} slots, {} alternatives", alts.len());

        Self {
            z3,
            fanout,
            inner_slots,
            slots,
            alts,
            arity,
            arg_types,
            ranges,
            ids,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn unused(&self) -> i64 {
        self.alts.len() as i64
    }

    fn child(&self, slot: usize, idx: usize) -> Option<usize> {
        (slot < self.inner_slots && idx < self.fanout)
            .then(|| slot * self.fanout + 1 + idx)
    }

    fn num(&self, x: i64) -> Int<'ctx> {
        Int::from_i64(self.z3, x)
    }

    fn in_range(&self, var: &Int<'ctx>, ty: TypeId) -> Bool<'ctx> {
        let r = self.ranges[ty.0];
        Bool::and(self.z3, &[&var.ge(&self.num(r.start)), &var.lt(&self.num(r.end))])
    }

    fn is_apply(&self, var: &Int<'ctx>) -> Bool<'ctx> {
        let cases = self.ranges.iter()
            .filter(|r| r.apply_start < r.end)
            .map(|r| Bool::and(self.z3, &[
                &var.ge(&self.num(r.apply_start)),
                &var.lt(&self.num(r.end)),
            ]))
            .collect::<Vec<_>>();

        Bool::or(self.z3, &cases.iter().collect::<Vec<_>>())
    }

    /// Type consistency, shape and size constraints of well-formed
    /// candidates producing `output`.
    pub fn well_formed(&self, output: TypeId, max_size: usize) -> Vec<Bool<'ctx>> {
        let unused = self.num(self.unused());
        let zero = self.num(0);
        let mut res = Vec::new();

        for slot in &self.slots {
            res.push(slot.ge(&zero));
            res.push(slot.le(&unused));
        }

        res.push(self.in_range(&self.slots[0], output));

        for (s, slot) in self.slots.iter().enumerate() {
            let has_children = self.child(s, 0).is_some();

            for (a, arity) in self.arity.iter().enumerate() {
                let chosen = slot._eq(&self.num(a as i64));

                if !has_children {
                    if *arity > 0 {
                        res.push(chosen.not());
                    }
                    continue;
                }

                let mut then = Vec::new();
                for j in 0..self.fanout {
                    let Some(c) = self.child(s, j) else { continue };
                    let child = &self.slots[c];
                    if j < *arity {
                        then.push(self.in_range(child, self.arg_types[a][j]));
                    } else {
                        then.push(child._eq(&unused));
                    }
                }
                res.push(chosen.implies(&Bool::and(self.z3, &then.iter().collect::<Vec<_>>())));
            }

            if has_children {
                let idle = (0..self.fanout)
                    .filter_map(|j| self.child(s, j))
                    .map(|c| self.slots[c]._eq(&unused))
                    .collect::<Vec<_>>();
                res.push(slot._eq(&unused).implies(&Bool::and(self.z3, &idle.iter().collect::<Vec<_>>())));
            }
        }

        if max_size < self.slots.len() {
            let one = self.num(1);
            let counts = self.slots.iter()
                .map(|slot| self.is_apply(slot).ite(&one, &zero))
                .collect::<Vec<_>>();
            let loc = Int::add(self.z3, &counts.iter().collect::<Vec<_>>());
            res.push(loc.le(&self.num(max_size as i64)));
        }

        res
    }

    /// Reads every slot out of `model`.
    pub fn assignment(&self, model: &z3::Model<'ctx>) -> Option<Assignment> {
        self.slots.iter()
            .map(|slot| model.eval(slot, true).and_then(|v| v.as_i64()))
            .collect()
    }

    /// Materializes the tree an assignment describes.
    pub fn to_expr(&self, assignment: &[i64]) -> Option<Expr> {
        self.to_expr_rec(assignment, 0)
    }

    fn to_expr_rec(&self, assignment: &[i64], slot: usize) -> Option<Expr> {
        let id = *assignment.get(slot)?;
        let alt = self.alts.get(usize::try_from(id).ok()?)?;

        let children = (0..self.arity[id as usize])
            .map(|j| self.child(slot, j).and_then(|c| self.to_expr_rec(assignment, c)))
            .collect::<Option<Vec<_>>>()?;

        Some(alt.build(children))
    }

    /// The assignment describing `expr`, if it fits the slot tree.
    pub fn assignment_of(&self, expr: &Expr) -> Option<Assignment> {
        let mut res = vec![self.unused(); self.slots.len()];
        self.assign_rec(expr, 0, &mut res)?;
        Some(res)
    }

    fn assign_rec(&self, expr: &Expr, slot: usize, out: &mut Assignment) -> Option<()> {
        *out.get_mut(slot)? = *self.ids.get(&Alternative::of(expr))?;

        for (j, child) in expr.children().iter().enumerate() {
            self.assign_rec(child, self.child(slot, j)?, out)?;
        }

        Some(())
    }

    /// Rules out exactly `assignment`.
    pub fn block(&self, assignment: &[i64]) -> Bool<'ctx> {
        let diffs = self.slots.iter()
            .zip(assignment)
            .map(|(slot, v)| slot._eq(&self.num(*v)).not())
            .collect::<Vec<_>>();

        Bool::or(self.z3, &diffs.iter().collect::<Vec<_>>())
    }
}
