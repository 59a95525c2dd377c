//! The nested-list text form programs are stored in:
//! `(spread (unite (@param 0) 3 1) 1 3)`. Applications are
//! `(name child ...)`, parameters are `(@param idx)` and literals are
//! written bare. The typed literal form `(ColInt 3)` found in older
//! benchmark files is accepted on input.

use log::trace;

use crate::error::{Error, Result};
use crate::expr::{Expr, Program};
use crate::spec::{ProgramSignature, Spec, TypeId, PARAM_SYMBOL};
use crate::value::Value;

pub fn expr_to_sexp(spec: &Spec, expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(spec, expr, &mut out);
    out
}

fn write_expr(spec: &Spec, expr: &Expr, out: &mut String) {
    match expr {
        Expr::Literal { value, .. } => out.push_str(&value.to_string()),
        Expr::Param(idx) => out.push_str(&format!("({PARAM_SYMBOL} {idx})")),
        Expr::Apply { prod, children } => {
            out.push('(');
            out.push_str(&spec.production(*prod).name);
            for child in children {
                out.push(' ');
                write_expr(spec, child, out);
            }
            out.push(')');
        },
    }
}

impl Program {
    pub fn to_sexp(&self, spec: &Spec) -> String {
        expr_to_sexp(spec, self.root())
    }
}

/// Parses a stored program and type checks it against `sig`.
pub fn parse_program(spec: &Spec, sig: &ProgramSignature, text: &str) -> Result<Program> {
    let datum = read_datum(text)?;
    let root = datum_to_expr(spec, sig, &datum, sig.output)?;

    Program::new(spec, root, sig.clone())
}

/// Parses a bare literal value, as it would appear inside a program.
pub fn parse_value(text: &str) -> Result<Value> {
    let datum = read_datum(text)?;
    datum_to_value(&datum)
}

#[derive(Debug, Clone, PartialEq)]
enum DatumKind {
    Int(i64),
    Str(String),
    Sym(String),
    List(Vec<Datum>),
}

#[derive(Debug, Clone, PartialEq)]
struct Datum {
    pos: usize,
    kind: DatumKind,
}

impl Datum {
    fn head_symbol(&self) -> Option<(&str, &[Datum])> {
        match &self.kind {
            DatumKind::List(items) => match items.split_first() {
                Some((Datum { kind: DatumKind::Sym(s), .. }, rest)) => Some((s.as_str(), rest)),
                _ => None,
            },
            _ => None,
        }
    }
}

fn datum_to_value(datum: &Datum) -> Result<Value> {
    match &datum.kind {
        DatumKind::Int(x) => Ok(Value::Int(*x)),
        DatumKind::Str(s) => Ok(Value::Str(s.clone())),
        DatumKind::List(items) => items.iter()
            .map(datum_to_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        DatumKind::Sym(s) => Err(Error::parse(
            datum.pos,
            format!("symbol `{s}` where a literal was expected"),
        )),
    }
}

fn datum_to_expr(
    spec: &Spec,
    sig: &ProgramSignature,
    datum: &Datum,
    expected: TypeId,
) -> Result<Expr> {
    let expected_ty = spec.ty(expected);
    trace!("Parse {:?} as {}", datum.kind, expected_ty.name);

    let (head, rest) = match datum.head_symbol() {
        Some(x) => x,
        None if expected_ty.is_enum() => {
            let value = datum_to_value(datum)?;
            spec.check_literal(expected, &value)?;
            return Ok(Expr::Literal { ty: expected, value });
        },
        None => return Err(Error::parse(
            datum.pos,
            format!("expected an expression of type {}", expected_ty.name),
        )),
    };

    if head == expected_ty.name && expected_ty.is_enum() {
        let [lit] = rest else {
            return Err(Error::parse(datum.pos, "typed literal takes exactly one value"));
        };
        let value = datum_to_value(lit)?;
        spec.check_literal(expected, &value)?;
        return Ok(Expr::Literal { ty: expected, value });
    }

    if head == PARAM_SYMBOL {
        let idx = match rest {
            [Datum { kind: DatumKind::Int(x), .. }] if *x >= 0 => *x as usize,
            _ => return Err(Error::parse(datum.pos, "malformed parameter reference")),
        };
        let found = *sig.inputs.get(idx)
            .ok_or(Error::BadParam { index: idx, arity: sig.arity() })?;
        if found != expected {
            return Err(Error::mismatch(expected_ty.name.clone(), spec.ty(found).name.clone()));
        }
        return Ok(Expr::Param(idx));
    }

    let prod = spec.lookup_production(head)?;
    if prod.result != expected {
        return Err(Error::mismatch(
            expected_ty.name.clone(),
            spec.ty(prod.result).name.clone(),
        ));
    }
    if prod.arity() != rest.len() {
        return Err(Error::parse(
            datum.pos,
            format!("{} takes {} arguments, got {}", prod.name, prod.arity(), rest.len()),
        ));
    }

    let children = rest.iter()
        .zip(&prod.args)
        .map(|(child, ty)| datum_to_expr(spec, sig, child, *ty))
        .collect::<Result<Vec<_>>>()?;

    Ok(Expr::Apply { prod: prod.id, children })
}

fn read_datum(text: &str) -> Result<Datum> {
    let mut reader = Reader { src: text.as_bytes(), pos: 0 };
    let datum = reader.datum()?;

    reader.skip_ws();
    if reader.pos != reader.src.len() {
        return Err(Error::parse(reader.pos, "trailing input"));
    }

    Ok(datum)
}

struct Reader<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn datum(&mut self) -> Result<Datum> {
        self.skip_ws();
        let start = self.pos;

        let kind = match self.peek() {
            None => return Err(Error::parse(start, "unexpected end of input")),
            Some(b')') => return Err(Error::parse(start, "unbalanced `)`")),
            Some(b'(') => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    self.skip_ws();
                    match self.peek() {
                        Some(b')') => {
                            self.pos += 1;
                            break;
                        },
                        Some(_) => items.push(self.datum()?),
                        None => return Err(Error::parse(start, "unclosed `(`")),
                    }
                }
                DatumKind::List(items)
            },
            Some(b'"') => DatumKind::Str(self.string()?),
            Some(_) => {
                let atom = self.atom();
                match atom.parse::<i64>() {
                    Ok(x) => DatumKind::Int(x),
                    Err(_) => DatumKind::Sym(atom.to_string()),
                }
            },
        };

        Ok(Datum { pos: start, kind })
    }

    fn atom(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || c == b'(' || c == b')' || c == b'"' {
                break;
            }
            self.pos += 1;
        }

        // Only ever split on ASCII bytes, so this stays on char boundaries.
        std::str::from_utf8(&src[start..self.pos]).unwrap_or_default()
    }

    fn string(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 1;
        let mut bytes = Vec::new();

        loop {
            match self.peek() {
                None => return Err(Error::parse(start, "unterminated string")),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                },
                Some(b'\\') => {
                    self.pos += 1;
                    let escaped = match self.peek() {
                        Some(b'n') => b'\n',
                        Some(b'"') => b'"',
                        Some(b'\\') => b'\\',
                        _ => return Err(Error::parse(self.pos, "bad escape")),
                    };
                    bytes.push(escaped);
                    self.pos += 1;
                },
                Some(c) => {
                    bytes.push(c);
                    self.pos += 1;
                },
            }
        }

        String::from_utf8(bytes).map_err(|_| Error::parse(start, "string is not utf-8"))
    }
}
