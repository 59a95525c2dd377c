//! Exhaustive bounded enumeration in a fixed canonical order: by
//! increasing depth, then by alternative at each hole, then over the
//! children left to right (first child varies slowest).

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use crate::config::Bounds;
use crate::error::SearchExhausted;
use crate::expr::{Expr, Program};
use crate::spec::{ProgramSignature, Spec, TypeId};

use super::{alternative_table, Alternative, Enumerator};

/// A tree with its measurements cached.
#[derive(Debug, Clone)]
struct Tree {
    expr: Expr,
    depth: usize,
    loc: usize,
}

type Pool = Rc<Vec<Tree>>;

/// Memoized subtrees, keyed by type and depth.
struct Pools<'s> {
    spec: &'s Spec,
    max_size: usize,
    alts: Vec<Vec<Alternative>>,
    exact: HashMap<(TypeId, usize), Pool>,
    upto: HashMap<(TypeId, usize), Pool>,
}

impl<'s> Pools<'s> {
    /// All trees of type `ty` with depth exactly `depth`.
    fn exact(&mut self, ty: TypeId, depth: usize) -> Pool {
        if let Some(pool) = self.exact.get(&(ty, depth)) {
            return pool.clone();
        }

        let mut cursor = LevelCursor::new(ty, depth);
        let mut trees = Vec::new();
        while let Some(tree) = cursor.next(self) {
            trees.push(tree);
        }

        trace!("Level ({ty:?}, {depth}): {} trees", trees.len());

        let pool = Rc::new(trees);
        self.exact.insert((ty, depth), pool.clone());
        pool
    }

    /// All trees of type `ty` with depth at most `depth`, shallow first.
    fn upto(&mut self, ty: TypeId, depth: usize) -> Pool {
        if let Some(pool) = self.upto.get(&(ty, depth)) {
            return pool.clone();
        }

        let mut trees = Vec::new();
        for d in 1..=depth {
            trees.extend(self.exact(ty, d).iter().cloned());
        }

        let pool = Rc::new(trees);
        self.upto.insert((ty, depth), pool.clone());
        pool
    }
}

/// Walks the trees of one (type, exact depth) level. For every
/// alternative with children the cursor keeps one digit per child,
/// indexing into that child's pool, and counts through them like an
/// odometer.
struct LevelCursor {
    ty: TypeId,
    depth: usize,
    alt_idx: usize,
    pools: Vec<Pool>,
    digits: Vec<usize>,
    loaded: bool,
}

impl LevelCursor {
    fn new(ty: TypeId, depth: usize) -> Self {
        Self {
            ty,
            depth,
            alt_idx: 0,
            pools: Vec::new(),
            digits: Vec::new(),
            loaded: false,
        }
    }

    fn next(&mut self, pools: &mut Pools<'_>) -> Option<Tree> {
        if self.depth == 0 {
            return None;
        }

        loop {
            let alt = pools.alts[self.ty.0].get(self.alt_idx)?.clone();
            let arity = alt.arity(pools.spec);

            if arity == 0 {
                self.alt_idx += 1;

                let loc = usize::from(alt.is_apply());
                if self.depth == 1 && loc <= pools.max_size {
                    return Some(Tree { expr: alt.build(Vec::new()), depth: 1, loc });
                }
                continue;
            }

            if self.depth == 1 || pools.max_size == 0 {
                self.alt_idx += 1;
                continue;
            }

            if !self.loaded {
                let Alternative::Apply(p) = alt else {
                    self.finish_alt();
                    continue;
                };
                let args = pools.spec.production(p).args.clone();

                self.pools = args.iter()
                    .map(|arg| pools.upto(*arg, self.depth - 1))
                    .collect();
                self.digits = vec![0; arity];
                self.loaded = true;

                if self.pools.iter().any(|p| p.is_empty()) {
                    self.finish_alt();
                    continue;
                }
            }

            while self.loaded {
                let children = self.digits.iter()
                    .zip(&self.pools)
                    .map(|(digit, pool)| &pool[*digit])
                    .collect::<Vec<_>>();
                let max_depth = children.iter().map(|c| c.depth).max().unwrap_or(0);
                let loc = 1 + children.iter().map(|c| c.loc).sum::<usize>();
                let tree = (max_depth + 1 == self.depth && loc <= pools.max_size)
                    .then(|| Tree {
                        expr: alt.build(children.iter().map(|c| c.expr.clone()).collect()),
                        depth: self.depth,
                        loc,
                    });

                self.increment();

                if tree.is_some() {
                    return tree;
                }
            }
        }
    }

    fn increment(&mut self) {
        for (digit, pool) in self.digits.iter_mut().zip(&self.pools).rev() {
            if *digit + 1 < pool.len() {
                *digit += 1;
                return;
            }

            *digit = 0;
        }

        self.finish_alt();
    }

    fn finish_alt(&mut self) {
        self.alt_idx += 1;
        self.loaded = false;
        self.pools.clear();
        self.digits.clear();
    }
}

pub struct ExhaustiveEnum<'s> {
    pools: Pools<'s>,
    sig: ProgramSignature,
    max_depth: usize,
    cursor: LevelCursor,
    shard: usize,
    shards: usize,
    position: usize,
}

impl<'s> ExhaustiveEnum<'s> {
    pub fn new(spec: &'s Spec, sig: ProgramSignature, bounds: Bounds) -> Self {
        Self::sharded(spec, sig, bounds, 0, 1)
    }

    /// Only yields the candidates whose position in the canonical order
    /// is `shard` modulo `shards`. The shards of one space are disjoint
    /// and together cover it, so independent workers can split it.
    pub fn sharded(
        spec: &'s Spec,
        sig: ProgramSignature,
        bounds: Bounds,
        shard: usize,
        shards: usize,
    ) -> Self {
        assert!(shard < shards, "shard {shard} out of {shards}");

        let alts = alternative_table(spec, &sig);
        let root = LevelCursor::new(sig.output, 1.min(bounds.max_depth));

        Self {
            pools: Pools {
                spec,
                max_size: bounds.max_size,
                alts,
                exact: HashMap::new(),
                upto: HashMap::new(),
            },
            sig,
            max_depth: bounds.max_depth,
            cursor: root,
            shard,
            shards,
            position: 0,
        }
    }

    fn next_tree(&mut self) -> Option<Tree> {
        loop {
            if let Some(tree) = self.cursor.next(&mut self.pools) {
                return Some(tree);
            }

            if self.cursor.depth == 0 || self.cursor.depth >= self.max_depth {
                return None;
            }

            debug!("Exhaustive: moving on to depth {}", self.cursor.depth + 1);
            self.cursor = LevelCursor::new(self.sig.output, self.cursor.depth + 1);
        }
    }
}

impl<'s> Enumerator for ExhaustiveEnum<'s> {
    fn next_expr(&mut self) -> Result<Program, SearchExhausted> {
        loop {
            let tree = self.next_tree().ok_or(SearchExhausted)?;
            let position = self.position;
            self.position += 1;

            if position % self.shards == self.shard {
                return Ok(Program::new_unchecked(tree.expr, self.sig.clone()));
            }
        }
    }
}
