#![allow(dead_code)]

use std::collections::HashMap;

use dslsynth::interp::{handle_arg, int_arg, require};
use dslsynth::{
    toy, DomainExecutor, ExecutorFailure, Handle, HandlerTable, ProgramSignature, Session, Spec,
    Value,
};

pub fn init_logging() {
    let _ = colog::default_builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub fn toy_fixture() -> (Spec, ProgramSignature) {
    let spec = toy::spec().expect("toy grammar is well-formed");
    let sig = toy::signature(&spec, 2).expect("toy signature");

    (spec, sig)
}

/// `bit: Int -> Bit`, `neg: Int -> Int`, `add: Int -> Int, Int` with
/// `Bit = {0, 1}` and programs `(Int) -> Int`.
pub fn tiny_fixture() -> (Spec, ProgramSignature) {
    let mut b = Spec::builder();
    b.enum_type("Bit", [Value::Int(0), Value::Int(1)]).unwrap();
    b.value_type("Int").unwrap();
    b.production("bit", "Int", &["Bit"]).unwrap();
    b.production("neg", "Int", &["Int"]).unwrap();
    b.production("add", "Int", &["Int", "Int"]).unwrap();

    let spec = b.build();
    let sig = spec.signature(&["Int"], "Int").unwrap();

    (spec, sig)
}

/// Tables are plain row lists kept in memory, keyed by handle. Counts
/// the tables it holds so tests can check nothing leaks.
#[derive(Debug, Default)]
pub struct MemTables {
    tables: HashMap<Handle, Vec<i64>>,
    /// Production the executor refuses to run.
    pub fail_on: Option<String>,
}

impl MemTables {
    pub fn failing_on(production: &str) -> Self {
        Self {
            tables: HashMap::new(),
            fail_on: Some(production.to_string()),
        }
    }

    pub fn live(&self) -> usize {
        self.tables.len()
    }

    pub fn rows(&self, h: Handle) -> Option<&[i64]> {
        self.tables.get(&h).map(|x| x.as_slice())
    }

    fn table(&self, args: &[Value], idx: usize) -> Result<&Vec<i64>, ExecutorFailure> {
        args.get(idx)
            .and_then(Value::as_handle)
            .and_then(|h| self.tables.get(&h))
            .ok_or_else(|| ExecutorFailure(format!("argument #{idx} is not a live table")))
    }
}

impl DomainExecutor for MemTables {
    fn apply(
        &mut self,
        production: &str,
        args: &[Value],
        into: Handle,
    ) -> Result<(), ExecutorFailure> {
        if self.fail_on.as_deref() == Some(production) {
            return Err(ExecutorFailure(format!("{production} is broken")));
        }

        let rows = match production {
            "load" => args.first()
                .and_then(Value::as_list)
                .ok_or_else(|| ExecutorFailure("load wants a row list".into()))?
                .iter()
                .map(|x| x.as_int().ok_or_else(|| ExecutorFailure("rows are ints".into())))
                .collect::<Result<Vec<_>, _>>()?,
            "take" => {
                let n = args.get(1).and_then(Value::as_int).unwrap_or(0) as usize;
                self.table(args, 0)?.iter().copied().take(n).collect()
            },
            "rev" => self.table(args, 0)?.iter().rev().copied().collect(),
            other => return Err(ExecutorFailure(format!("unknown operation {other}"))),
        };

        self.tables.insert(into, rows);
        Ok(())
    }

    fn load(&mut self, data: &Value, into: Handle) -> Result<(), ExecutorFailure> {
        let items = data.as_list()
            .ok_or_else(|| ExecutorFailure("tables load from lists".into()))?;

        let rows = match items.first() {
            // A sampled table comes as columns, only its row count is kept.
            Some(Value::List(column)) => (0..column.len() as i64).collect(),
            _ => items.iter()
                .map(|x| x.as_int().ok_or_else(|| ExecutorFailure("rows are ints".into())))
                .collect::<Result<Vec<_>, _>>()?,
        };

        self.tables.insert(into, rows);
        Ok(())
    }

    fn query_nonempty(&self, handle: Handle) -> bool {
        self.tables.get(&handle).is_some_and(|x| !x.is_empty())
    }

    fn equivalent(&self, lhs: Handle, rhs: Handle) -> bool {
        match (self.tables.get(&lhs), self.tables.get(&rhs)) {
            (Some(l), Some(r)) => l == r,
            _ => false,
        }
    }

    fn release(&mut self, handle: Handle) {
        self.tables.remove(&handle);
    }
}

/// `load: Table -> Rows`, `take: Table -> Table, Count`,
/// `rev: Table -> Table` with `Count = {0, 1, 2}` and programs
/// `(Rows) -> Table`.
pub fn table_fixture() -> (Spec, ProgramSignature) {
    let mut b = Spec::builder();
    b.enum_type("Count", (0..3).map(Value::Int)).unwrap();
    b.value_type("Rows").unwrap();
    b.value_type("Table").unwrap();
    b.production("load", "Table", &["Rows"]).unwrap();
    b.production("take", "Table", &["Table", "Count"]).unwrap();
    b.production("rev", "Table", &["Table"]).unwrap();

    let spec = b.build();
    let sig = spec.signature(&["Rows"], "Table").unwrap();

    (spec, sig)
}

pub fn table_handlers() -> HandlerTable<MemTables> {
    HandlerTable::<MemTables>::new()
        .with("load", |ctx, node, args| ctx.execute(node, args))
        .with("take", |ctx, node, args| {
            let table = handle_arg(args, 0)?;
            let n = int_arg(args, 1)?;
            let have = ctx.executor().rows(table).map_or(0, |x| x.len());
            require(n as usize <= have, || format!("take {n} of {have} rows"))?;

            ctx.execute(node, args)
        })
        .with("rev", |ctx, node, args| ctx.execute(node, args))
}

pub fn rows(xs: &[i64]) -> Value {
    Value::List(xs.iter().copied().map(Value::Int).collect())
}

/// The table fixture's grammar with programs `(Table) -> Table`, whose
/// input is a handle the caller loaded.
pub fn table_input_fixture() -> (Spec, ProgramSignature) {
    let (spec, _) = table_fixture();
    let sig = spec.signature(&["Table"], "Table").unwrap();

    (spec, sig)
}

pub fn loaded(session: &mut Session<MemTables>, xs: &[i64]) -> Value {
    session.load(&rows(xs)).unwrap()
}

pub fn handle_rows(session: &Session<MemTables>, value: &Value) -> Option<Vec<i64>> {
    value.as_handle()
        .and_then(|h| session.executor().rows(h))
        .map(|x| x.to_vec())
}
