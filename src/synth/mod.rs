pub mod brute_enum;
pub mod random_enum;
pub mod replay;
pub mod smt_enum;

use crate::error::SearchExhausted;
use crate::expr::{Expr, Program};
use crate::spec::{ProductionId, ProgramSignature, Spec, TypeId};
use crate::value::Value;

/// An enumerator is an iterator-like structure producing candidate
/// programs. In addition to that it can be told about candidates that
/// failed, so it does not end up producing things that "definitely
/// aren't going to work".
pub trait Enumerator {
    /// Query the enumerator for the next candidate to try. Every
    /// candidate is a fresh tree.
    fn next_expr(&mut self) -> Result<Program, SearchExhausted>;

    /// Reports `cand` as rejected. Guided enumerators only move past a
    /// candidate once it has been excluded.
    fn exclude(&mut self, _cand: &Program) {
        // Most enumerators don't learn
    }
}

impl<T: Enumerator + ?Sized> Enumerator for Box<T> {
    fn next_expr(&mut self) -> Result<Program, SearchExhausted> {
        (**self).next_expr()
    }

    fn exclude(&mut self, cand: &Program) {
        (**self).exclude(cand)
    }
}

/// One way of filling a hole.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Alternative {
    Param(usize),
    Literal(TypeId, Value),
    Apply(ProductionId),
}

impl Alternative {
    pub fn arity(&self, spec: &Spec) -> usize {
        match self {
            Alternative::Apply(p) => spec.production(*p).arity(),
            Alternative::Param(_) | Alternative::Literal(..) => 0,
        }
    }

    pub fn is_apply(&self) -> bool {
        matches!(self, Alternative::Apply(_))
    }

    /// Builds the node for this alternative over `children`.
    pub fn build(&self, children: Vec<Expr>) -> Expr {
        match self {
            Alternative::Param(idx) => Expr::Param(*idx),
            Alternative::Literal(ty, v) => Expr::Literal { ty: *ty, value: v.clone() },
            Alternative::Apply(p) => Expr::Apply { prod: *p, children },
        }
    }

    /// The alternative `expr`'s root was built from.
    pub fn of(expr: &Expr) -> Self {
        match expr {
            Expr::Param(idx) => Alternative::Param(*idx),
            Expr::Literal { ty, value } => Alternative::Literal(*ty, value.clone()),
            Expr::Apply { prod, .. } => Alternative::Apply(*prod),
        }
    }
}

/// Everything that can fill a hole of type `ty`, in canonical order:
/// parameters by index, literals in domain order, productions by name.
pub fn alternatives(spec: &Spec, sig: &ProgramSignature, ty: TypeId) -> Vec<Alternative> {
    let params = sig.inputs.iter()
        .enumerate()
        .filter(|(_, input)| **input == ty)
        .map(|(idx, _)| Alternative::Param(idx));
    let literals = spec.ty(ty)
        .literals()
        .iter()
        .map(|v| Alternative::Literal(ty, v.clone()));
    let prods = spec.productions_returning(ty)
        .iter()
        .map(|p| Alternative::Apply(*p));

    params.chain(literals).chain(prods).collect()
}

/// [`alternatives`] for every type of the grammar, indexed by type.
pub fn alternative_table(spec: &Spec, sig: &ProgramSignature) -> Vec<Vec<Alternative>> {
    spec.types()
        .map(|(id, _)| alternatives(spec, sig, id))
        .collect()
}
