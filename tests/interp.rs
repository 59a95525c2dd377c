mod common;

use dslsynth::sexp::parse_program;
use dslsynth::{
    toy, Error, EvalError, Expr, HandlerTable, Interpreter, NullExecutor, Session, Value,
};

use common::{init_logging, rows, table_fixture, table_handlers, toy_fixture, MemTables};

fn ints(xs: &[i64]) -> Vec<Value> {
    xs.iter().copied().map(Value::Int).collect()
}

#[test]
fn toy_program_evaluates() {
    init_logging();
    let (spec, sig) = toy_fixture();
    let interp = Interpreter::new(&spec, toy::handlers()).unwrap();
    let mut session = Session::new(NullExecutor);
    let prog = parse_program(&spec, &sig, "(mult (minus (@param 0) (@param 1)) (@param 1))").unwrap();

    let outputs = [[4, 3], [6, 3], [1, 2], [1, 1]]
        .iter()
        .map(|x| interp.eval_program(&mut session, &prog, &ints(x)).unwrap())
        .collect::<Vec<_>>();

    assert_eq!(outputs, ints(&[3, 9, -2, 0]));
}

#[test]
fn evaluation_is_pure() {
    let (spec, sig) = toy_fixture();
    let interp = Interpreter::new(&spec, toy::handlers()).unwrap();
    let mut session = Session::new(NullExecutor);
    let good = parse_program(&spec, &sig, "(plus (const 2) (@param 1))").unwrap();
    let bad = parse_program(&spec, &sig, "(mult (@param 0) (@param 0))").unwrap();
    let input = ints(&[i64::MAX, 5]);

    let first = interp.eval_program(&mut session, &good, &input);
    assert_eq!(first, Ok(Value::Int(7)));
    assert_eq!(interp.eval_program(&mut session, &good, &input), first);

    let first = interp.eval_program(&mut session, &bad, &input);
    assert!(matches!(first, Err(EvalError::Prune { .. })));
    assert_eq!(interp.eval_program(&mut session, &bad, &input), first);
}

#[test]
fn overflow_prunes() {
    let (spec, sig) = toy_fixture();
    let interp = Interpreter::new(&spec, toy::handlers()).unwrap();
    let mut session = Session::new(NullExecutor);
    let prog = parse_program(&spec, &sig, "(plus (@param 0) (@param 1))").unwrap();

    let res = interp.eval_program(&mut session, &prog, &ints(&[i64::MAX, 1]));

    assert!(res.unwrap_err().is_prune());
}

#[test]
fn missing_handler_is_rejected() {
    let (spec, _) = toy_fixture();
    let table = HandlerTable::<NullExecutor>::new()
        .with("const", |_, _, args| Ok(args[0].clone()))
        .with("plus", |_, _, args| Ok(args[0].clone()))
        .with("minus", |_, _, args| Ok(args[0].clone()))
        .with("mult", |_, _, args| Ok(args[0].clone()));

    assert_eq!(
        Interpreter::new(&spec, table).err(),
        Some(Error::MissingHandler("empty".into())),
    );
}

#[test]
fn stray_handler_is_rejected() {
    let (spec, _) = toy_fixture();
    let table = toy::handlers::<NullExecutor>()
        .with("divide", |_, _, args| Ok(args[0].clone()));

    assert_eq!(
        Interpreter::new(&spec, table).err(),
        Some(Error::UnknownSymbol("divide".into())),
    );
}

#[test]
fn malformed_tree_is_an_execution_error() {
    let (spec, _) = toy_fixture();
    let interp = Interpreter::new(&spec, toy::handlers()).unwrap();
    let mut session = Session::new(NullExecutor);
    let plus = spec.production_id("plus").unwrap();

    let dangling = Expr::apply(plus, vec![Expr::Param(0), Expr::Param(5)]);
    let res = interp.evaluate(&mut session, &dangling, &ints(&[1, 2]));
    assert!(matches!(res, Err(EvalError::Execution { .. })));

    let short = Expr::apply(plus, vec![Expr::Param(0)]);
    let res = interp.evaluate(&mut session, &short, &ints(&[1, 2]));
    assert!(matches!(res, Err(EvalError::Execution { .. })));
}

#[test]
fn intermediate_tables_are_released() {
    init_logging();
    let (spec, sig) = table_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let mut session = Session::new(MemTables::default());
    let prog = parse_program(&spec, &sig, "(rev (take (load (@param 0)) 2))").unwrap();

    let res = interp.eval_program(&mut session, &prog, &[rows(&[1, 2, 3])]).unwrap();
    let h = res.as_handle().unwrap();

    assert_eq!(session.executor().live(), 1);
    assert_eq!(session.executor().rows(h), Some(&[2, 1][..]));
    assert_eq!(session.handles().issued(), 3);

    session.release(&res);
    assert_eq!(session.executor().live(), 0);
}

#[test]
fn prune_releases_everything() {
    let (spec, sig) = table_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let mut session = Session::new(MemTables::default());
    let prog = parse_program(&spec, &sig, "(take (rev (load (@param 0))) 2)").unwrap();

    let res = interp.eval_program(&mut session, &prog, &[rows(&[7])]);

    assert!(matches!(res, Err(EvalError::Prune { .. })));
    assert_eq!(session.executor().live(), 0);
}

#[test]
fn executor_failure_is_distinct_from_prune() {
    let (spec, sig) = table_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let mut session = Session::new(MemTables::failing_on("rev"));
    let prog = parse_program(&spec, &sig, "(rev (load (@param 0)))").unwrap();

    let res = interp.eval_program(&mut session, &prog, &[rows(&[1, 2])]);

    match res {
        Err(EvalError::Execution { detail }) => assert!(detail.contains("rev")),
        other => panic!("expected an execution error, got {other:?}"),
    }
    assert_eq!(session.executor().live(), 0);
}

#[test]
fn handles_are_session_scoped() {
    let (spec, sig) = table_fixture();
    let interp = Interpreter::new(&spec, table_handlers()).unwrap();
    let prog = parse_program(&spec, &sig, "(load (@param 0))").unwrap();

    let mut first = Session::new(MemTables::default());
    let mut second = Session::new(MemTables::default());

    let a = interp.eval_program(&mut first, &prog, &[rows(&[1])]).unwrap();
    let b = interp.eval_program(&mut first, &prog, &[rows(&[1])]).unwrap();
    let c = interp.eval_program(&mut second, &prog, &[rows(&[1])]).unwrap();

    assert_eq!(a.to_string(), "#<RET_DF1>");
    assert_eq!(b.to_string(), "#<RET_DF2>");
    assert_eq!(c.to_string(), "#<RET_DF1>");
}
