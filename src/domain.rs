//! The boundary to whatever engine actually computes on opaque values.

use log::trace;

use crate::value::{Handle, Value};

/// Failure reported by the engine itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorFailure(pub String);

/// The only place real computation on opaque values happens. The core
/// never inlines domain semantics.
pub trait DomainExecutor {
    /// Runs `production` on `args` and binds the result to the fresh
    /// handle `into`.
    fn apply(
        &mut self,
        production: &str,
        args: &[Value],
        into: Handle,
    ) -> Result<(), ExecutorFailure>;

    /// Whether the value behind `handle` is non-degenerate (e.g. has at
    /// least one cell).
    fn query_nonempty(&self, handle: Handle) -> bool;

    /// Domain equivalence of two opaque values.
    fn equivalent(&self, lhs: Handle, rhs: Handle) -> bool;

    /// Binds raw data, such as a sampled input table, to the fresh handle
    /// `into`. Engines that only compute on their own values refuse.
    fn load(&mut self, _data: &Value, _into: Handle) -> Result<(), ExecutorFailure> {
        Err(ExecutorFailure("engine does not load raw data".into()))
    }

    /// Drops the value behind `handle`. Engines that manage their own
    /// lifecycle may ignore this.
    fn release(&mut self, _handle: Handle) {}
}

/// Executor for grammars without opaque values. Every `apply` fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullExecutor;

impl DomainExecutor for NullExecutor {
    fn apply(&mut self, production: &str, _args: &[Value], _into: Handle) -> Result<(), ExecutorFailure> {
        Err(ExecutorFailure(format!("no engine to run {production}")))
    }

    fn query_nonempty(&self, _handle: Handle) -> bool {
        false
    }

    fn equivalent(&self, lhs: Handle, rhs: Handle) -> bool {
        lhs == rhs
    }
}

/// Mints handle names. Monotonic within a session and never shared
/// between sessions.
#[derive(Debug, Clone)]
pub struct HandleAllocator {
    next: u64,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn fresh(&mut self) -> Handle {
        let h = Handle(self.next);
        self.next += 1;
        h
    }

    /// How many handles were handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-owner state of one synthesis session: the engine and the
/// allocator naming its intermediate values. Evaluations borrow it
/// mutably, so at most one is in flight at a time.
#[derive(Debug)]
pub struct Session<E> {
    executor: E,
    handles: HandleAllocator,
}

impl<E: DomainExecutor> Session<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            handles: HandleAllocator::new(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn handles(&self) -> &HandleAllocator {
        &self.handles
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Allocates a fresh handle and asks the engine to fill it.
    pub(crate) fn apply(
        &mut self,
        production: &str,
        args: &[Value],
    ) -> Result<Handle, ExecutorFailure> {
        let h = self.handles.fresh();
        trace!("{production} -> {h}");

        if let Err(e) = self.executor.apply(production, args, h) {
            self.executor.release(h);
            return Err(e);
        }

        Ok(h)
    }

    /// Hands raw data to the engine and returns the handle it now lives
    /// under. The caller owns it.
    pub fn load(&mut self, data: &Value) -> Result<Value, ExecutorFailure> {
        let h = self.handles.fresh();
        trace!("load -> {h}");

        if let Err(e) = self.executor.load(data, h) {
            self.executor.release(h);
            return Err(e);
        }

        Ok(Value::Handle(h))
    }

    /// Releases every handle in `value`. Callers use this once they are
    /// done with an evaluation result.
    pub fn release(&mut self, value: &Value) {
        for h in value.handles() {
            self.executor.release(h);
        }
    }

    /// Releases the handles of an evaluation result except those that
    /// also occur in `inputs`. A program may hand back one of its inputs
    /// unchanged and those stay with whoever passed them in.
    pub fn release_result(&mut self, value: &Value, inputs: &[Value]) {
        let borrowed = inputs.iter().flat_map(Value::handles).collect::<Vec<_>>();

        for h in value.handles() {
            if !borrowed.contains(&h) {
                self.executor.release(h);
            }
        }
    }
}
