//! Inverse mode: manufacture fresh examples from inputs alone.

use log::{debug, info};

use crate::config::GeneratorConfig;
use crate::domain::{DomainExecutor, Session};
use crate::error::Result;
use crate::expr::Program;
use crate::inputs::InputSampler;
use crate::interp::Interpreter;
use crate::oracle::{Decider, Example};
use crate::spec::{ProgramSignature, Spec};
use crate::synth::random_enum::{DepthTarget, RandomEnum};
use crate::synth::Enumerator;

pub struct Generator<'a, E: DomainExecutor> {
    spec: &'a Spec,
    sig: ProgramSignature,
    interp: &'a Interpreter<E>,
    decider: &'a Decider<E>,
    config: GeneratorConfig,
    // Bumped per call, so repeated calls don't replay the same draws.
    calls: u64,
}

impl<'a, E: DomainExecutor> Generator<'a, E> {
    pub fn new(
        spec: &'a Spec,
        sig: ProgramSignature,
        interp: &'a Interpreter<E>,
        decider: &'a Decider<E>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            spec,
            sig,
            interp,
            decider,
            config,
            calls: 0,
        }
    }

    /// Draws random programs of depth `target_depth`, runs them on the
    /// inputs of `partial` and returns the first sane one together with
    /// the completed example. Every failed run or insane result uses up
    /// one retry; `None` once the budget is gone.
    pub fn generate(
        &mut self,
        session: &mut Session<E>,
        target_depth: usize,
        partial: &Example,
    ) -> Option<(Program, Example)> {
        let seed = self.config.seed.wrapping_add(self.calls);
        self.calls += 1;

        let mut draws = RandomEnum::new(
            self.spec,
            self.sig.clone(),
            DepthTarget::Exact(target_depth),
            self.config.max_size,
            &self.config.policy,
            seed,
        );

        for retry in 0..self.config.retry_budget {
            let Ok(cand) = draws.next_expr() else {
                debug!("No program of depth {target_depth} exists");
                return None;
            };

            let output = match self.interp.eval_program(session, &cand, &partial.input) {
                Ok(output) => output,
                Err(e) => {
                    debug!("Retry #{retry}: {e}");
                    continue;
                },
            };

            let example = Example::new(partial.input.clone(), output);
            if self.decider.is_sane(session.executor(), &cand, &example) {
                info!("Generated {}", cand.to_sexp(self.spec));
                return Some((cand, example));
            }

            debug!("Retry #{retry}: {} is not sane", cand.to_sexp(self.spec));
            if let Some(output) = &example.output {
                session.release_result(output, &partial.input);
            }
        }

        info!("Retry budget of {} used up", self.config.retry_budget);
        None
    }

    /// [`Generator::generate`] on inputs drawn from the configured
    /// [`InputPolicy`](crate::config::InputPolicy). The inputs end up in
    /// the returned example, and are released again when nothing sane
    /// turns up.
    pub fn generate_sampled(
        &mut self,
        session: &mut Session<E>,
        target_depth: usize,
    ) -> Result<Option<(Program, Example)>> {
        let seed = self.config.seed.wrapping_add(self.calls);
        let mut sampler = InputSampler::new(self.config.inputs.clone(), seed)?;
        let partial = Example::partial(sampler.inputs(self.spec, &self.sig, session)?);

        let res = self.generate(session, target_depth, &partial);
        if res.is_none() {
            for v in &partial.input {
                session.release(v);
            }
        }

        Ok(res)
    }
}
