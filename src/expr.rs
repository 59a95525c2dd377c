use crate::error::Result;
use crate::spec::{ProductionId, ProgramSignature, Spec, TypeId};
use crate::value::Value;

/// A node of a candidate program. Children are owned exclusively, so a
/// program is always a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal { ty: TypeId, value: Value },
    Apply { prod: ProductionId, children: Vec<Expr> },
    /// Reads program input `#idx`.
    Param(usize),
}

impl Expr {
    pub fn literal(ty: TypeId, value: impl Into<Value>) -> Self {
        Expr::Literal { ty, value: value.into() }
    }

    pub fn apply(prod: ProductionId, children: Vec<Expr>) -> Self {
        Expr::Apply { prod, children }
    }

    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Apply { children, .. } => children,
            Expr::Literal { .. } | Expr::Param(_) => &[],
        }
    }

    pub fn production(&self) -> Option<ProductionId> {
        match self {
            Expr::Apply { prod, .. } => Some(*prod),
            Expr::Literal { .. } | Expr::Param(_) => None,
        }
    }

    /// Folds the tree bottom-up.
    pub fn walk_expr<T, L, A>(&self, on_leaf: &mut L, on_apply: &mut A) -> T
    where
        L: FnMut(&Expr) -> T,
        A: FnMut(ProductionId, Vec<T>) -> T,
    {
        match self {
            Expr::Apply { prod, children } => {
                let vals = children.iter()
                    .map(|c| c.walk_expr(on_leaf, on_apply))
                    .collect();
                on_apply(*prod, vals)
            },
            leaf => on_leaf(leaf),
        }
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.walk_expr(
            &mut |_| 1,
            &mut |_, xs: Vec<usize>| 1 + xs.into_iter().sum::<usize>(),
        )
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.walk_expr(
            &mut |_| 1,
            &mut |_, xs: Vec<usize>| 1 + xs.into_iter().max().unwrap_or(0),
        )
    }

    /// Number of production applications. Parameters and literals are free.
    pub fn loc(&self) -> usize {
        self.walk_expr(
            &mut |_| 0,
            &mut |_, xs: Vec<usize>| 1 + xs.into_iter().sum::<usize>(),
        )
    }

    /// Visits every (node, ancestor) pair and reports whether `pred` holds
    /// for any of them. The third argument is the distance between the two,
    /// 1 for a direct parent.
    pub fn any_with_ancestor<P>(&self, mut pred: P) -> bool
    where
        P: FnMut(&Expr, &Expr, usize) -> bool,
    {
        self.find_with_ancestor(&mut pred).is_some()
    }

    /// First (node, ancestor) pair in pre-order for which `pred` holds.
    pub fn find_with_ancestor<P>(&self, pred: &mut P) -> Option<(&Expr, &Expr)>
    where
        P: FnMut(&Expr, &Expr, usize) -> bool,
    {
        let mut path = Vec::new();
        Self::find_rec(self, &mut path, pred)
    }

    fn find_rec<'a, P>(
        node: &'a Expr,
        path: &mut Vec<&'a Expr>,
        pred: &mut P,
    ) -> Option<(&'a Expr, &'a Expr)>
    where
        P: FnMut(&Expr, &Expr, usize) -> bool,
    {
        let hit = path.iter()
            .rev()
            .enumerate()
            .find(|(dist, anc)| pred(node, anc, dist + 1))
            .map(|(_, anc)| *anc);
        if let Some(anc) = hit {
            return Some((node, anc));
        }

        path.push(node);
        let res = node.children()
            .iter()
            .find_map(|c| Self::find_rec(c, path, pred));
        path.pop();

        res
    }
}

/// A root expression together with the signature it was built against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Program {
    root: Expr,
    signature: ProgramSignature,
}

impl Program {
    /// Type checks `root` before wrapping it.
    pub fn new(spec: &Spec, root: Expr, signature: ProgramSignature) -> Result<Self> {
        spec.check_program(&root, &signature)?;

        Ok(Self { root, signature })
    }

    /// For enumerators, which only ever build well-typed trees.
    pub(crate) fn new_unchecked(root: Expr, signature: ProgramSignature) -> Self {
        Self { root, signature }
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn signature(&self) -> &ProgramSignature {
        &self.signature
    }

    pub fn into_root(self) -> Expr {
        self.root
    }
}
