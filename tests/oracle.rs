mod common;

use dslsynth::oracle::{Unordered, ValueEquality};
use dslsynth::sexp::parse_program;
use dslsynth::{
    generate, toy, Decider, DomainExecutor, Example, Generator, GeneratorConfig, HandlerTable,
    Interpreter, NullExecutor, Program, RepeatScope, SanityPolicy, Session, Spec, StructuralRule,
    Value,
};

use common::{
    handle_rows, init_logging, loaded, rows, table_fixture, table_handlers, table_input_fixture,
    toy_fixture, MemTables,
};

fn ints(xs: &[i64]) -> Vec<Value> {
    xs.iter().copied().map(Value::Int).collect()
}

fn toy_program(text: &str) -> Program {
    let (spec, sig) = toy_fixture();
    parse_program(&spec, &sig, text).unwrap()
}

fn decider(policy: SanityPolicy) -> Decider<NullExecutor> {
    Decider::new(ValueEquality, policy)
}

#[test]
fn identity_output_is_insane() {
    let prog = toy_program("(@param 0)");
    let example = Example::new(ints(&[4, 3]), Value::Int(4));

    assert!(!Decider::default().is_sane(&NullExecutor, &prog, &example));

    let lenient = decider(SanityPolicy {
        reject_identity: false,
        ..SanityPolicy::default()
    });
    assert!(lenient.is_sane(&NullExecutor, &prog, &example));
}

#[test]
fn missing_output_is_insane() {
    let prog = toy_program("(plus (@param 0) (@param 1))");

    assert!(!Decider::default().is_sane(&NullExecutor, &prog, &Example::partial(ints(&[4, 3]))));
}

#[test]
fn repeated_productions_follow_scope() {
    let adjacent = toy_program("(plus (plus (@param 0) (@param 1)) (@param 1))");
    let distant = toy_program("(plus (minus (plus (@param 0) (@param 1)) (@param 1)) (@param 1))");
    let example = Example::new(ints(&[4, 3]), Value::Int(100));

    let scoped = |scope| decider(SanityPolicy {
        repeat_scope: scope,
        ..SanityPolicy::default()
    });

    assert!(!scoped(RepeatScope::Adjacent).is_sane(&NullExecutor, &adjacent, &example));
    assert!(scoped(RepeatScope::Adjacent).is_sane(&NullExecutor, &distant, &example));
    assert!(!scoped(RepeatScope::Path).is_sane(&NullExecutor, &distant, &example));
    assert!(scoped(RepeatScope::Off).is_sane(&NullExecutor, &adjacent, &example));
}

#[test]
fn structural_rules_apply() {
    let (spec, _) = toy_fixture();
    let policy = SanityPolicy::default()
        .with_rule(StructuralRule::root_is(&spec, "mult").unwrap());
    let strict = decider(policy);
    let example = Example::new(ints(&[4, 3]), Value::Int(100));

    assert!(!strict.is_sane(&NullExecutor, &toy_program("(plus (@param 0) (@param 1))"), &example));
    assert!(strict.is_sane(&NullExecutor, &toy_program("(mult (@param 0) (@param 1))"), &example));
    assert!(StructuralRule::root_is(&spec, "select").is_err());
}

#[test]
fn empty_tables_are_insane() {
    let (spec, sig) = table_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let mut session = Session::new(MemTables::default());
    let prog = parse_program(&spec, &sig, "(take (load (@param 0)) 0)").unwrap();
    let input = vec![rows(&[1, 2])];

    let output = interp.eval_program(&mut session, &prog, &input).unwrap();
    let example = Example::new(input, output.clone());

    assert!(!Decider::default().is_sane(session.executor(), &prog, &example));

    let lenient = Decider::new(ValueEquality, SanityPolicy {
        require_nonempty: false,
        ..SanityPolicy::default()
    });
    assert!(lenient.is_sane(session.executor(), &prog, &example));

    session.release(&output);
}

#[test]
fn unordered_lists_match_as_multisets() {
    let ordered = decider(SanityPolicy::default());
    let unordered = Decider::<NullExecutor>::new(Unordered, SanityPolicy::default());
    let l = Value::List(ints(&[1, 2, 1]));
    let r = Value::List(ints(&[2, 1, 1]));
    let other = Value::List(ints(&[2, 2, 1]));

    assert!(!ordered.matches(&NullExecutor, &l, &r));
    assert!(unordered.matches(&NullExecutor, &l, &r));
    assert!(!unordered.matches(&NullExecutor, &l, &other));
    assert!(unordered.matches(&NullExecutor, &Value::Int(3), &Value::Int(3)));
}

/// Every program of this grammar computes its input.
fn identity_grammar() -> (Spec, Interpreter<NullExecutor>) {
    let mut b = Spec::builder();
    b.value_type("Int").unwrap();
    b.production("id", "Int", &["Int"]).unwrap();
    let spec = b.build();

    let handlers = HandlerTable::<NullExecutor>::new().with("id", |_, _, args| Ok(args[0].clone()));
    let interp = Interpreter::new(&spec, handlers).unwrap();

    (spec, interp)
}

#[test]
fn generator_gives_up_on_identity_grammar() {
    init_logging();
    let (spec, interp) = identity_grammar();
    let sig = spec.signature(&["Int"], "Int").unwrap();
    let decider = Decider::default();
    let mut session = Session::new(NullExecutor);
    let config = GeneratorConfig::default();

    for depth in 1..=2 {
        let res = generate(&spec, &sig, &ints(&[5]), depth, &config, &interp, &decider, &mut session);
        assert_eq!(res.unwrap(), None);
    }
}

#[test]
fn generator_gives_up_on_infeasible_depth() {
    let (spec, interp) = identity_grammar();
    let sig = spec.signature(&[], "Int").unwrap();
    let decider = Decider::default();
    let mut generator = Generator::new(&spec, sig, &interp, &decider, GeneratorConfig::default());
    let mut session = Session::new(NullExecutor);

    assert_eq!(generator.generate(&mut session, 2, &Example::partial(Vec::new())), None);
}

#[test]
fn generator_produces_sane_examples() {
    init_logging();
    let (spec, sig) = toy_fixture();
    let interp = Interpreter::new(&spec, toy::handlers()).unwrap();
    let decider = Decider::default();
    let mut session = Session::new(NullExecutor);
    let config = GeneratorConfig {
        seed: 9,
        ..GeneratorConfig::default()
    };
    let mut generator = Generator::new(&spec, sig, &interp, &decider, config);
    let partial = Example::partial(ints(&[4, 3]));

    for _ in 0..5 {
        let (prog, example) = generator.generate(&mut session, 2, &partial)
            .expect("depth 2 has sane programs");
        let output = example.output.clone().unwrap();

        assert_eq!(example.input, partial.input);
        assert_eq!(prog.root().depth(), 2);
        assert!(!partial.input.contains(&output));
        assert_eq!(interp.eval_program(&mut session, &prog, &example.input), Ok(output));
        assert!(decider.is_sane(&NullExecutor, &prog, &example));
    }
}

#[test]
fn generated_tables_are_owned_by_the_caller() {
    let (spec, sig) = table_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let decider = Decider::default();
    let mut session = Session::new(MemTables::default());

    let res = generate(
        &spec,
        &sig,
        &[rows(&[1, 2])],
        3,
        &GeneratorConfig::default(),
        &interp,
        &decider,
        &mut session,
    );
    let (_, example) = res.unwrap().expect("depth 3 has non-empty tables");

    let output = example.output.unwrap();
    assert!(session.executor().query_nonempty(output.as_handle().unwrap()));
    assert_eq!(session.executor().live(), 1);

    session.release(&output);
    assert_eq!(session.executor().live(), 0);
}

#[test]
fn rejected_identity_keeps_the_input_table() {
    init_logging();
    let (spec, sig) = table_input_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let decider = Decider::default();
    let mut session = Session::new(MemTables::default());
    let mut generator = Generator::new(&spec, sig, &interp, &decider, GeneratorConfig::default());

    let input = loaded(&mut session, &[1, 2, 3]);
    let partial = Example::partial(vec![input.clone()]);

    // depth 1 only has `(@param 0)`, which is the identity
    assert_eq!(generator.generate(&mut session, 1, &partial), None);
    assert_eq!(handle_rows(&session, &input), Some(vec![1, 2, 3]));

    let (_, example) = generator.generate(&mut session, 2, &partial)
        .expect("rev and take give sane tables");
    let output = example.output.unwrap();

    assert_ne!(output, input);
    assert_eq!(handle_rows(&session, &input), Some(vec![1, 2, 3]));
    assert_eq!(session.executor().live(), 2);

    session.release(&output);
    session.release(&input);
    assert_eq!(session.executor().live(), 0);
}

#[test]
fn generator_samples_its_own_inputs() {
    init_logging();
    let (spec, sig) = table_input_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let decider = Decider::default();
    let mut session = Session::new(MemTables::default());
    let mut generator = Generator::new(&spec, sig, &interp, &decider, GeneratorConfig::default());

    let (_, example) = generator.generate_sampled(&mut session, 2)
        .unwrap()
        .expect("rev and take give sane tables");

    let input = &example.input[0];
    let output = example.output.as_ref().unwrap();
    let n = handle_rows(&session, input).unwrap().len();
    assert!((5..=10).contains(&n));
    assert!(handle_rows(&session, output).is_some());

    session.release(output);
    session.release(input);
    assert_eq!(session.executor().live(), 0);
}

#[test]
fn sampled_inputs_are_released_when_nothing_is_sane() {
    let (spec, sig) = table_input_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let decider = Decider::default();
    let mut session = Session::new(MemTables::default());
    let mut generator = Generator::new(&spec, sig, &interp, &decider, GeneratorConfig::default());

    assert_eq!(generator.generate_sampled(&mut session, 1), Ok(None));
    assert_eq!(session.executor().live(), 0);
}
