use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::SamplingPolicy;
use crate::error::SearchExhausted;
use crate::expr::{Expr, Program};
use crate::spec::{ProgramSignature, Spec, TypeId};

use super::{alternative_table, Alternative, Enumerator};

/// Depth of the sampled trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthTarget {
    Exact(usize),
    /// Each draw picks one of the feasible depths up to the bound.
    UpTo(usize),
}

impl DepthTarget {
    fn max(&self) -> usize {
        match self {
            DepthTarget::Exact(d) | DepthTarget::UpTo(d) => *d,
        }
    }
}

/// Samples type-correct trees. Draws may repeat. Each draw takes a number
/// of steps linear in the size of the tree it produces: the feasibility
/// tables computed up front guarantee every choice can be completed
/// within the bounds, so there is no backtracking.
pub struct RandomEnum<'s> {
    spec: &'s Spec,
    sig: ProgramSignature,
    target: DepthTarget,
    max_size: usize,
    rng: StdRng,
    // (alternative, weight), weight 0 entries are dropped.
    alts: Vec<Vec<(Alternative, u32)>>,
    // min_exact[ty][d]: fewest applications of a tree of type ty and
    // depth exactly d, `None` if there is no such tree.
    min_exact: Vec<Vec<Option<usize>>>,
    min_upto: Vec<Vec<Option<usize>>>,
}

impl<'s> RandomEnum<'s> {
    pub fn new(
        spec: &'s Spec,
        sig: ProgramSignature,
        target: DepthTarget,
        max_size: usize,
        policy: &SamplingPolicy,
        seed: u64,
    ) -> Self {
        let alts = alternative_table(spec, &sig)
            .into_iter()
            .map(|alts| alts.into_iter()
                .map(|alt| {
                    let w = match &alt {
                        Alternative::Apply(p) => policy.weight(&spec.production(*p).name),
                        Alternative::Param(_) | Alternative::Literal(..) => 1,
                    };
                    (alt, w)
                })
                .filter(|(_, w)| *w > 0)
                .collect::<Vec<_>>()
            )
            .collect::<Vec<_>>();

        let mut res = Self {
            spec,
            sig,
            target,
            max_size,
            rng: StdRng::seed_from_u64(seed),
            alts,
            min_exact: Vec::new(),
            min_upto: Vec::new(),
        };
        res.build_tables();

        res
    }

    fn build_tables(&mut self) {
        let types = self.alts.len();
        let max_depth = self.target.max();

        self.min_exact = vec![vec![None; max_depth + 1]; types];
        self.min_upto = vec![vec![None; max_depth + 1]; types];

        for d in 1..=max_depth {
            for ty in 0..types {
                let best = self.alts[ty].iter()
                    .filter_map(|(alt, _)| self.alt_cost(alt, d))
                    .min();
                self.min_exact[ty][d] = best;
                self.min_upto[ty][d] = min_opt(self.min_upto[ty][d - 1], best);
            }
        }
    }

    /// Fewest applications a tree rooted at `alt` needs to have depth
    /// exactly `depth`.
    fn alt_cost(&self, alt: &Alternative, depth: usize) -> Option<usize> {
        let Alternative::Apply(p) = alt else {
            return (depth == 1).then_some(0);
        };
        let args = &self.spec.production(*p).args;

        if args.is_empty() {
            return (depth == 1).then_some(1);
        }
        if depth < 2 {
            return None;
        }

        (0..args.len())
            .filter_map(|carrier| self.carrier_cost(args, carrier, depth))
            .min()
    }

    /// Cost of an application at `depth` whose child `carrier` is the one
    /// reaching depth - 1.
    fn carrier_cost(&self, args: &[TypeId], carrier: usize, depth: usize) -> Option<usize> {
        args.iter()
            .enumerate()
            .map(|(idx, ty)| self.child_min(*ty, idx == carrier, depth - 1))
            .sum::<Option<usize>>()
            .map(|x| x + 1)
    }

    fn child_min(&self, ty: TypeId, exact: bool, depth: usize) -> Option<usize> {
        if exact {
            self.min_exact[ty.0][depth]
        } else {
            self.min_upto[ty.0][depth]
        }
    }

    fn pick_depth(&mut self) -> Option<usize> {
        let out = self.sig.output.0;
        match self.target {
            DepthTarget::Exact(d) => self.fits(out, d, self.max_size).then_some(d),
            DepthTarget::UpTo(max) => {
                let feasible = (1..=max)
                    .filter(|d| self.fits(out, *d, self.max_size))
                    .collect::<Vec<_>>();
                feasible.choose(&mut self.rng).copied()
            },
        }
    }

    fn fits(&self, ty: usize, depth: usize, budget: usize) -> bool {
        matches!(self.min_exact[ty].get(depth), Some(Some(c)) if *c <= budget)
    }

    /// Samples a tree of type `ty`, depth exactly `depth` and at most
    /// `budget` applications. Callers make sure one exists.
    fn sample(&mut self, ty: TypeId, depth: usize, budget: usize) -> Option<Expr> {
        // Alternatives that can still be completed, with the children able
        // to carry the depth.
        let mut options = Vec::new();
        for (idx, (alt, w)) in self.alts[ty.0].iter().enumerate() {
            let arity = alt.arity(self.spec);
            if arity == 0 {
                if matches!(self.alt_cost(alt, depth), Some(c) if c <= budget) {
                    options.push((idx, Vec::new(), *w));
                }
                continue;
            }

            let Alternative::Apply(p) = alt else { continue };
            let args = &self.spec.production(*p).args;
            let carriers = (0..arity)
                .filter(|carrier| {
                    matches!(self.carrier_cost(args, *carrier, depth), Some(c) if c <= budget)
                })
                .collect::<Vec<_>>();
            if !carriers.is_empty() {
                options.push((idx, carriers, *w));
            }
        }

        let (idx, carriers, _) = options.choose_weighted(&mut self.rng, |(_, _, w)| *w).ok()?;
        let alt = self.alts[ty.0][*idx].0.clone();
        let Some(&carrier) = carriers.choose(&mut self.rng) else {
            return Some(alt.build(Vec::new()));
        };

        let Alternative::Apply(p) = alt else { return None };
        let args = self.spec.production(p).args.clone();

        // What each child needs at the very least.
        let mins = args.iter()
            .enumerate()
            .map(|(idx, ty)| self.child_min(*ty, idx == carrier, depth - 1))
            .collect::<Option<Vec<_>>>()?;

        let mut remaining = budget - 1;
        let mut children = Vec::with_capacity(args.len());
        for (idx, ty) in args.iter().enumerate() {
            let reserved = mins[idx + 1..].iter().sum::<usize>();
            let own = remaining - reserved;

            let child_depth = if idx == carrier {
                depth - 1
            } else {
                let depths = (1..depth)
                    .filter(|d| self.fits(ty.0, *d, own))
                    .collect::<Vec<_>>();
                *depths.choose(&mut self.rng)?
            };

            let child = self.sample(*ty, child_depth, own)?;
            remaining -= child.loc();
            children.push(child);
        }

        trace!("Sampled {} at depth {depth}", self.spec.production(p).name);

        Some(alt.build(children))
    }
}

fn min_opt(l: Option<usize>, r: Option<usize>) -> Option<usize> {
    match (l, r) {
        (Some(l), Some(r)) => Some(l.min(r)),
        (l, None) => l,
        (None, r) => r,
    }
}

impl<'s> Enumerator for RandomEnum<'s> {
    fn next_expr(&mut self) -> Result<Program, SearchExhausted> {
        let depth = self.pick_depth().ok_or(SearchExhausted)?;
        let out = self.sig.output;
        let expr = self.sample(out, depth, self.max_size).ok_or(SearchExhausted)?;

        debug!("Random draw at depth {depth}: {} nodes", expr.size());

        Ok(Program::new_unchecked(expr, self.sig.clone()))
    }
}
