mod common;

use dslsynth::sexp::{parse_program, parse_value};
use dslsynth::synth::brute_enum::ExhaustiveEnum;
use dslsynth::synth::Enumerator;
use dslsynth::{Bounds, Error, Expr, Program, ProgramSignature, Spec, Value};

use common::toy_fixture;

fn roundtrip_all(spec: &Spec, sig: &ProgramSignature, bounds: Bounds) -> usize {
    let mut synth = ExhaustiveEnum::new(spec, sig.clone(), bounds);
    let mut count = 0;

    while let Ok(prog) = synth.next_expr() {
        let text = prog.to_sexp(spec);
        let back = parse_program(spec, sig, &text)
            .unwrap_or_else(|e| panic!("{text}: {e}"));

        assert_eq!(back, prog);
        assert_eq!(back.to_sexp(spec), text);
        count += 1;
    }

    count
}

/// `filter: Tbl -> Tbl, Op, Cols` with string and list literals.
fn literal_fixture() -> (Spec, ProgramSignature) {
    let mut b = Spec::builder();
    b.enum_type("Op", [Value::from("=="), Value::from("say \"hi\"\n")]).unwrap();
    b.enum_type("Cols", [
        Value::from(vec![Value::Int(1), Value::Int(2)]),
        Value::from(vec![Value::Int(-3)]),
    ]).unwrap();
    b.value_type("Tbl").unwrap();
    b.production("filter", "Tbl", &["Tbl", "Op", "Cols"]).unwrap();

    let spec = b.build();
    let sig = spec.signature(&["Tbl"], "Tbl").unwrap();

    (spec, sig)
}

#[test]
fn enumerated_toy_programs_roundtrip() {
    let (spec, sig) = toy_fixture();

    assert!(roundtrip_all(&spec, &sig, Bounds::new(3, 2)) > 100);
}

#[test]
fn string_and_list_literals_roundtrip() {
    let (spec, sig) = literal_fixture();

    // p0, then 2 x 2 filters over p0, then 4 filters over each of those
    assert_eq!(roundtrip_all(&spec, &sig, Bounds::new(3, 2)), 1 + 4 + 16);
}

#[test]
fn stored_text_is_canonical() {
    let (spec, sig) = toy_fixture();
    let text = "(mult (minus (@param 0) (@param 1)) (@param 1))";

    let prog = parse_program(&spec, &sig, text).unwrap();
    assert_eq!(prog.to_sexp(&spec), text);

    let spaced = "( mult\n  (minus (@param 0)   (@param 1))\t(@param 1) )";
    assert_eq!(parse_program(&spec, &sig, spaced).unwrap(), prog);
}

#[test]
fn typed_literals_are_accepted() {
    let (spec, sig) = toy_fixture();

    let typed = parse_program(&spec, &sig, "(plus (const (SmallInt 3)) (@param 0))").unwrap();
    let bare = parse_program(&spec, &sig, "(plus (const 3) (@param 0))").unwrap();

    assert_eq!(typed, bare);
    assert_eq!(typed.to_sexp(&spec), "(plus (const 3) (@param 0))");
}

#[test]
fn literal_nodes_keep_their_type() {
    let (spec, sig) = toy_fixture();
    let prog = parse_program(&spec, &sig, "(const 2)").unwrap();
    let small = spec.type_id("SmallInt").unwrap();

    assert_eq!(prog.root().children(), &[Expr::literal(small, 2i64)]);
}

#[test]
fn bad_programs_are_rejected() {
    let (spec, sig) = toy_fixture();
    let parse = |text| parse_program(&spec, &sig, text).unwrap_err();

    assert_eq!(parse("(divide (@param 0) (@param 1))"), Error::UnknownSymbol("divide".into()));
    assert!(matches!(parse("(const 7)"), Error::InvalidLiteral { .. }));
    assert!(matches!(parse("(@param 2)"), Error::BadParam { index: 2, arity: 2 }));
    assert!(matches!(parse("(plus (@param 0))"), Error::Parse { .. }));
    assert!(matches!(parse("(empty (@param 0))"), Error::TypeMismatch { .. }));
    assert!(matches!(parse("(const (@param 0))"), Error::TypeMismatch { .. }));
    assert!(matches!(parse("(plus (@param 0) (@param 1)"), Error::Parse { .. }));
    assert!(matches!(parse("(@param 0) (@param 1)"), Error::Parse { .. }));
    assert!(matches!(parse("3"), Error::Parse { .. }));
}

#[test]
fn values_parse_and_print() {
    let v = parse_value("(1 \"a\\\"b\" (-2))").unwrap();

    assert_eq!(v, Value::List(vec![
        Value::Int(1),
        Value::from("a\"b"),
        Value::List(vec![Value::Int(-2)]),
    ]));
    assert_eq!(v.to_string(), "(1 \"a\\\"b\" (-2))");
    assert!(parse_value("foo").is_err());
}

#[test]
fn type_ids_of_another_grammar_are_rejected() {
    let (spec, sig) = toy_fixture();

    let mut b = Spec::builder();
    for name in ["A", "B", "C", "D"] {
        b.value_type(name).unwrap();
    }
    b.enum_type("E", [Value::Int(0)]).unwrap();
    let other = b.build();

    let foreign = Expr::literal(other.type_id("E").unwrap(), 0i64);
    assert!(matches!(Program::new(&spec, foreign.clone(), sig.clone()), Err(Error::UnknownSymbol(_))));
    assert!(matches!(spec.type_of(&foreign, &sig), Err(Error::UnknownSymbol(_))));

    let other_sig = other.signature(&["D"], "E").unwrap();
    assert!(matches!(Program::new(&spec, Expr::Param(0), other_sig), Err(Error::UnknownSymbol(_))));
}
