//! A small integer grammar, handy for demos and tests:
//!
//! ```text
//! enum SmallInt { 0, 1, 2, 3 }
//! value Int, Empty
//! program Toy(Int, Int) -> Int
//! const: Int -> SmallInt
//! plus, minus, mult: Int -> Int, Int
//! empty: Empty -> Empty
//! ```

use crate::domain::DomainExecutor;
use crate::error::{EvalError, EvalResult, Result};
use crate::interp::{int_arg, HandlerTable};
use crate::oracle::Example;
use crate::spec::{ProgramSignature, Spec};
use crate::value::Value;

pub fn spec() -> Result<Spec> {
    let mut b = Spec::builder();

    b.enum_type("SmallInt", (0..4).map(Value::Int))?;
    b.value_type("Int")?;
    b.value_type("Empty")?;

    b.production("const", "Int", &["SmallInt"])?;
    b.production("plus", "Int", &["Int", "Int"])?;
    b.production("minus", "Int", &["Int", "Int"])?;
    b.production("mult", "Int", &["Int", "Int"])?;
    b.production("empty", "Empty", &["Empty"])?;

    Ok(b.build())
}

/// `Toy(Int, Int) -> Int`, or any other arity via `inputs`.
pub fn signature(spec: &Spec, inputs: usize) -> Result<ProgramSignature> {
    spec.signature(&vec!["Int"; inputs], "Int")
}

fn arith(args: &[Value], op: &str, f: fn(i64, i64) -> Option<i64>) -> EvalResult<Value> {
    let l = int_arg(args, 0)?;
    let r = int_arg(args, 1)?;

    f(l, r)
        .map(Value::Int)
        .ok_or_else(|| EvalError::prune(format!("{l} {op} {r} overflows")))
}

pub fn handlers<E: DomainExecutor>() -> HandlerTable<E> {
    HandlerTable::<E>::new()
        .with("const", |_, _, args| int_arg(args, 0).map(Value::Int))
        .with("plus", |_, _, args| arith(args, "+", i64::checked_add))
        .with("minus", |_, _, args| arith(args, "-", i64::checked_sub))
        .with("mult", |_, _, args| arith(args, "*", i64::checked_mul))
        .with("empty", |_, _, args| {
            args.first()
                .cloned()
                .ok_or_else(|| EvalError::prune("empty needs an operand"))
        })
}

/// Examples `mult(minus(@param 0, @param 1), @param 1)` satisfies.
pub fn examples() -> Vec<Example> {
    [([4, 3], 3), ([6, 3], 9), ([1, 2], -2), ([1, 1], 0)]
        .into_iter()
        .map(|(input, output)| Example::new(
            input.into_iter().map(Value::Int).collect(),
            Value::Int(output),
        ))
        .collect()
}
