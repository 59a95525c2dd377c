//! Post-order evaluation of candidate programs.

use std::collections::HashMap;

use log::trace;

use crate::domain::{DomainExecutor, Session};
use crate::error::{Error, EvalError, EvalResult, Result};
use crate::expr::{Expr, Program};
use crate::spec::Spec;
use crate::value::{Handle, Value};

/// Semantics of one production. Gets the node being evaluated and the
/// already evaluated children, left to right.
pub type Handler<E> =
    Box<dyn Fn(&mut EvalCtx<'_, E>, &Expr, &[Value]) -> EvalResult<Value> + Send + Sync>;

/// Production name to handler mapping, resolved against a grammar by
/// [`Interpreter::new`].
pub struct HandlerTable<E: DomainExecutor> {
    handlers: HashMap<String, Handler<E>>,
}

impl<E: DomainExecutor> HandlerTable<E> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn with<F>(mut self, production: &str, f: F) -> Self
    where
        F: Fn(&mut EvalCtx<'_, E>, &Expr, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.insert(production, f);
        self
    }

    pub fn insert<F>(&mut self, production: &str, f: F)
    where
        F: Fn(&mut EvalCtx<'_, E>, &Expr, &[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.handlers.insert(production.to_string(), Box::new(f));
    }
}

impl<E: DomainExecutor> Default for HandlerTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Interpreter<E: DomainExecutor> {
    names: Vec<String>,
    arity: Vec<usize>,
    handlers: Vec<Handler<E>>,
}

impl<E: DomainExecutor> Interpreter<E> {
    /// Every production of `spec` must have a handler and every handler
    /// must name a production, otherwise the grammar is rejected here.
    pub fn new(spec: &Spec, table: HandlerTable<E>) -> Result<Self> {
        let mut table = table.handlers;
        let mut handlers = Vec::with_capacity(spec.productions().len());

        for prod in spec.productions() {
            let h = table.remove(&prod.name)
                .ok_or_else(|| Error::MissingHandler(prod.name.clone()))?;
            handlers.push(h);
        }

        if let Some(stray) = table.keys().min() {
            return Err(Error::UnknownSymbol(stray.clone()));
        }

        Ok(Self {
            names: spec.productions().iter().map(|p| p.name.clone()).collect(),
            arity: spec.productions().iter().map(|p| p.arity()).collect(),
            handlers,
        })
    }

    pub fn eval_program(
        &self,
        session: &mut Session<E>,
        program: &Program,
        inputs: &[Value],
    ) -> EvalResult<Value> {
        self.evaluate(session, program.root(), inputs)
    }

    /// Evaluates `expr` on `inputs`. Intermediate handles are released
    /// on every exit path; handles in the returned value belong to the
    /// caller (see [`Session::release`]).
    pub fn evaluate(
        &self,
        session: &mut Session<E>,
        expr: &Expr,
        inputs: &[Value],
    ) -> EvalResult<Value> {
        let mut ctx = EvalCtx {
            session,
            names: &self.names,
            acquired: Vec::new(),
        };

        let res = self.eval_rec(&mut ctx, expr, inputs)?;
        ctx.keep(&res);

        Ok(res)
    }

    fn eval_rec(
        &self,
        ctx: &mut EvalCtx<'_, E>,
        expr: &Expr,
        inputs: &[Value],
    ) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),
            Expr::Param(idx) => inputs.get(*idx)
                .cloned()
                .ok_or_else(|| EvalError::execution(format!(
                    "malformed program: parameter #{idx} with {} inputs",
                    inputs.len(),
                ))),
            Expr::Apply { prod, children } => {
                let expected = self.arity.get(prod.0)
                    .copied()
                    .ok_or_else(|| EvalError::execution(format!("unknown production #{}", prod.0)))?;
                if expected != children.len() {
                    return Err(EvalError::execution(format!(
                        "malformed program: {} applied to {} arguments",
                        self.names[prod.0],
                        children.len(),
                    )));
                }

                let args = children.iter()
                    .map(|c| self.eval_rec(ctx, c, inputs))
                    .collect::<EvalResult<Vec<_>>>()?;

                trace!("Eval {}{args:?}", self.names[prod.0]);

                (self.handlers[prod.0])(ctx, expr, &args)
            },
        }
    }
}

/// What a handler can reach while it runs. Handles allocated through
/// the context are released when it goes out of scope, whichever way
/// the evaluation ends.
pub struct EvalCtx<'s, E: DomainExecutor> {
    session: &'s mut Session<E>,
    names: &'s [String],
    acquired: Vec<Handle>,
}

impl<'s, E: DomainExecutor> EvalCtx<'s, E> {
    pub fn executor(&self) -> &E {
        self.session.executor()
    }

    /// Hands the node to the domain executor and wraps the fresh result.
    pub fn execute(&mut self, node: &Expr, args: &[Value]) -> EvalResult<Value> {
        let names = self.names;
        let name = node.production()
            .and_then(|p| names.get(p.0))
            .ok_or_else(|| EvalError::execution("only applications can be executed"))?;

        let h = self.session.apply(name, args)
            .map_err(|e| EvalError::execution(format!("{name}: {}", e.0)))?;
        self.acquired.push(h);

        Ok(Value::Handle(h))
    }

    fn keep(&mut self, value: &Value) {
        let kept = value.handles();
        self.acquired.retain(|h| !kept.contains(h));
    }
}

impl<'s, E: DomainExecutor> Drop for EvalCtx<'s, E> {
    fn drop(&mut self) {
        for h in self.acquired.drain(..) {
            self.session.executor_mut().release(h);
        }
    }
}

/// Prunes unless `cond` holds.
pub fn require(cond: bool, reason: impl FnOnce() -> String) -> EvalResult<()> {
    if cond {
        Ok(())
    } else {
        Err(EvalError::prune(reason()))
    }
}

pub fn int_arg(args: &[Value], idx: usize) -> EvalResult<i64> {
    args.get(idx)
        .and_then(Value::as_int)
        .ok_or_else(|| EvalError::prune(format!("operand #{idx} is not numeric")))
}

pub fn handle_arg(args: &[Value], idx: usize) -> EvalResult<Handle> {
    args.get(idx)
        .and_then(Value::as_handle)
        .ok_or_else(|| EvalError::prune(format!("operand #{idx} is not an opaque value")))
}
