//! The typed grammar a synthesis session searches over.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::value::Value;

/// Reserved head symbol of parameter references.
pub const PARAM_SYMBOL: &str = "@param";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionId(pub(crate) usize);

impl TypeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl ProductionId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub name: String,
    /// `Some` for enumerated types. `None` means opaque: values only come
    /// from productions or program inputs.
    pub domain: Option<Vec<Value>>,
}

impl Type {
    pub fn is_enum(&self) -> bool {
        self.domain.is_some()
    }

    pub fn literals(&self) -> &[Value] {
        self.domain.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub id: ProductionId,
    pub name: String,
    pub result: TypeId,
    pub args: Vec<TypeId>,
}

impl Production {
    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramSignature {
    pub inputs: Vec<TypeId>,
    pub output: TypeId,
}

impl ProgramSignature {
    pub fn arity(&self) -> usize {
        self.inputs.len()
    }
}

/// Immutable once built. Shared read-only by every component of a session.
#[derive(Debug, Clone)]
pub struct Spec {
    types: Vec<Type>,
    type_names: HashMap<String, TypeId>,
    productions: Vec<Production>,
    production_names: HashMap<String, ProductionId>,
    // Sorted by production name, indexed by result type.
    by_result: Vec<Vec<ProductionId>>,
}

impl Spec {
    pub fn builder() -> SpecBuilder {
        SpecBuilder::default()
    }

    pub fn lookup_type(&self, name: &str) -> Result<&Type> {
        self.type_id(name).map(|id| self.ty(id))
    }

    pub fn lookup_production(&self, name: &str) -> Result<&Production> {
        self.production_id(name).map(|id| self.production(id))
    }

    pub fn type_id(&self, name: &str) -> Result<TypeId> {
        self.type_names.get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSymbol(name.to_string()))
    }

    pub fn production_id(&self, name: &str) -> Result<ProductionId> {
        self.production_names.get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSymbol(name.to_string()))
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.0]
    }

    pub fn types(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.types.iter()
            .enumerate()
            .map(|(idx, ty)| (TypeId(idx), ty))
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Productions whose result is `ty`, in name order.
    pub fn productions_returning(&self, ty: TypeId) -> &[ProductionId] {
        &self.by_result[ty.0]
    }

    pub fn max_arity(&self) -> usize {
        self.productions.iter()
            .map(Production::arity)
            .max()
            .unwrap_or(0)
    }

    /// Builds a signature from type names.
    pub fn signature(&self, inputs: &[&str], output: &str) -> Result<ProgramSignature> {
        let inputs = inputs.iter()
            .map(|name| self.type_id(name))
            .collect::<Result<Vec<_>>>()?;
        let output = self.type_id(output)?;

        Ok(ProgramSignature { inputs, output })
    }

    /// Like [`Spec::ty`], for ids that may come from another grammar.
    fn checked_ty(&self, id: TypeId) -> Result<&Type> {
        self.types.get(id.0)
            .ok_or_else(|| Error::UnknownSymbol(format!("type #{}", id.0)))
    }

    pub fn check_signature(&self, sig: &ProgramSignature) -> Result<()> {
        for ty in sig.inputs.iter().chain(std::iter::once(&sig.output)) {
            self.checked_ty(*ty)?;
        }

        Ok(())
    }

    pub fn check_literal(&self, ty: TypeId, value: &Value) -> Result<()> {
        let decl = self.checked_ty(ty)?;
        let fits = match &decl.domain {
            Some(domain) => domain.contains(value),
            None => false,
        };

        if fits {
            Ok(())
        } else {
            Err(Error::InvalidLiteral {
                ty: decl.name.clone(),
                value: value.to_string(),
            })
        }
    }

    /// Type checks `expr` against the grammar and `sig`, returning its result
    /// type.
    pub fn type_of(&self, expr: &Expr, sig: &ProgramSignature) -> Result<TypeId> {
        match expr {
            Expr::Literal { ty, value } => {
                self.check_literal(*ty, value)?;
                Ok(*ty)
            },
            Expr::Param(index) => {
                let ty = sig.inputs.get(*index)
                    .copied()
                    .ok_or(Error::BadParam { index: *index, arity: sig.arity() })?;
                self.checked_ty(ty)?;
                Ok(ty)
            },
            Expr::Apply { prod, children } => {
                let decl = self.productions.get(prod.0)
                    .ok_or_else(|| Error::UnknownSymbol(format!("production #{}", prod.0)))?;

                if decl.arity() != children.len() {
                    return Err(Error::mismatch(
                        format!("{} arguments to {}", decl.arity(), decl.name),
                        format!("{} arguments", children.len()),
                    ));
                }

                for (child, expected) in children.iter().zip(&decl.args) {
                    let found = self.type_of(child, sig)?;
                    if found != *expected {
                        return Err(Error::mismatch(
                            self.ty(*expected).name.clone(),
                            self.ty(found).name.clone(),
                        ));
                    }
                }

                Ok(decl.result)
            },
        }
    }

    /// Like [`Spec::type_of`], but also requires the program's result type.
    pub fn check_program(&self, expr: &Expr, sig: &ProgramSignature) -> Result<()> {
        self.check_signature(sig)?;
        let found = self.type_of(expr, sig)?;
        if found != sig.output {
            return Err(Error::mismatch(
                self.ty(sig.output).name.clone(),
                self.ty(found).name.clone(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SpecBuilder {
    types: Vec<Type>,
    type_names: HashMap<String, TypeId>,
    productions: Vec<Production>,
    production_names: HashMap<String, ProductionId>,
}

impl SpecBuilder {
    /// Declares an enumerated type with a fixed literal domain.
    pub fn enum_type(
        &mut self,
        name: &str,
        domain: impl IntoIterator<Item = Value>,
    ) -> Result<TypeId> {
        let domain = domain.into_iter().collect::<Vec<_>>();

        if let Some(bad) = domain.iter().find(|v| !v.is_literal()) {
            return Err(Error::InvalidLiteral {
                ty: name.to_string(),
                value: bad.to_string(),
            });
        }

        self.add_type(Type {
            name: name.to_string(),
            domain: Some(domain),
        })
    }

    /// Declares an opaque type.
    pub fn value_type(&mut self, name: &str) -> Result<TypeId> {
        self.add_type(Type {
            name: name.to_string(),
            domain: None,
        })
    }

    /// Declares `name: result -> args...`.
    pub fn production(
        &mut self,
        name: &str,
        result: &str,
        args: &[&str],
    ) -> Result<ProductionId> {
        if name == PARAM_SYMBOL || self.production_names.contains_key(name) {
            return Err(Error::DuplicateSymbol(name.to_string()));
        }

        let result = self.type_id(result)?;
        let args = args.iter()
            .map(|x| self.type_id(x))
            .collect::<Result<Vec<_>>>()?;
        let id = ProductionId(self.productions.len());

        self.productions.push(Production {
            id,
            name: name.to_string(),
            result,
            args,
        });
        self.production_names.insert(name.to_string(), id);

        Ok(id)
    }

    pub fn build(self) -> Spec {
        let mut by_result = vec![Vec::new(); self.types.len()];
        for prod in &self.productions {
            by_result[prod.result.0].push(prod.id);
        }
        for prods in &mut by_result {
            prods.sort_by(|l, r| {
                self.productions[l.0].name.cmp(&self.productions[r.0].name)
            });
        }

        Spec {
            types: self.types,
            type_names: self.type_names,
            productions: self.productions,
            production_names: self.production_names,
            by_result,
        }
    }

    fn type_id(&self, name: &str) -> Result<TypeId> {
        self.type_names.get(name)
            .copied()
            .ok_or_else(|| Error::UnknownSymbol(name.to_string()))
    }

    fn add_type(&mut self, ty: Type) -> Result<TypeId> {
        if self.type_names.contains_key(&ty.name) {
            return Err(Error::DuplicateSymbol(ty.name));
        }

        let id = TypeId(self.types.len());
        self.type_names.insert(ty.name.clone(), id);
        self.types.push(ty);

        Ok(id)
    }
}
