//! Typed-DSL program synthesis: bounded enumeration of candidate programs
//! over a user grammar, interpretation against input/output examples and
//! acceptance through a pluggable oracle. The same machinery runs in
//! reverse to manufacture fresh examples.

pub mod config;
pub mod conv;
pub mod domain;
pub mod error;
pub mod expr;
pub mod gen;
pub mod inputs;
pub mod interp;
pub mod oracle;
pub mod search;
pub mod sexp;
pub mod spec;
pub mod synth;
pub mod toy;
pub mod value;

use log::info;

pub use config::{
    Bounds, ColumnKind, GeneratorConfig, InputPolicy, Mode, SamplingPolicy, SynthConfig,
};
pub use domain::{DomainExecutor, ExecutorFailure, HandleAllocator, NullExecutor, Session};
pub use error::{Error, EvalError, EvalResult, Result, SearchExhausted};
pub use expr::{Expr, Program};
pub use gen::Generator;
pub use inputs::InputSampler;
pub use interp::{EvalCtx, HandlerTable, Interpreter};
pub use oracle::{Decider, Equivalence, Example, RepeatScope, SanityPolicy, StructuralRule};
pub use search::{Search, SearchStep};
pub use spec::{ProgramSignature, Spec, SpecBuilder, TypeId};
pub use value::{Handle, Value};

use synth::brute_enum::ExhaustiveEnum;
use synth::random_enum::{DepthTarget, RandomEnum};
use synth::smt_enum::SmtEnum;

fn check_inputs(spec: &Spec, sig: &ProgramSignature, input: &[Value]) -> Result<()> {
    if input.len() != sig.arity() {
        return Err(Error::mismatch(
            format!("{} inputs", sig.arity()),
            format!("{} inputs", input.len()),
        ));
    }

    for (ty, value) in sig.inputs.iter().zip(input) {
        if spec.ty(*ty).is_enum() {
            spec.check_literal(*ty, value)?;
        }
    }

    Ok(())
}

/// Looks for a program consistent with every example. `Ok(None)` means
/// the search space (or the attempt cap in random mode) ran out, or that
/// no example has an output to check against.
pub fn synthesize<E: DomainExecutor>(
    spec: &Spec,
    sig: &ProgramSignature,
    examples: &[Example],
    config: &SynthConfig,
    interp: &Interpreter<E>,
    decider: &Decider<E>,
    session: &mut Session<E>,
) -> Result<Option<Program>> {
    spec.check_signature(sig)?;
    for example in examples {
        check_inputs(spec, sig, &example.input)?;
    }

    if examples.iter().all(|e| e.output.is_none()) {
        info!("No example carries an output, nothing to synthesize against");
        return Ok(None);
    }

    let bounds = config.bounds;
    info!(
        "Synthesis: {} examples, depth <= {}, size <= {}, {:?}",
        examples.len(),
        bounds.max_depth,
        bounds.max_size,
        config.mode,
    );

    let res = match &config.mode {
        Mode::Exhaustive => {
            let synth = ExhaustiveEnum::new(spec, sig.clone(), bounds);
            Search::new(spec, synth, interp, decider, session, examples).run()
        },
        Mode::Random { seed, max_attempts } => {
            let synth = RandomEnum::new(
                spec,
                sig.clone(),
                DepthTarget::UpTo(bounds.max_depth),
                bounds.max_size,
                &config.policy,
                *seed,
            );
            Search::new(spec, synth, interp, decider, session, examples)
                .with_max_attempts(*max_attempts)
                .run()
        },
        Mode::Guided => {
            let z3 = z3::Context::new(&z3::Config::new());
            let synth = SmtEnum::new(&z3, spec, sig.clone(), bounds);
            Search::new(spec, synth, interp, decider, session, examples).run()
        },
    };

    Ok(res)
}

/// Manufactures a fresh example for `input` from a random program of
/// depth `target_depth`. `Ok(None)` once the retry budget is used up.
#[allow(clippy::too_many_arguments)]
pub fn generate<E: DomainExecutor>(
    spec: &Spec,
    sig: &ProgramSignature,
    input: &[Value],
    target_depth: usize,
    config: &GeneratorConfig,
    interp: &Interpreter<E>,
    decider: &Decider<E>,
    session: &mut Session<E>,
) -> Result<Option<(Program, Example)>> {
    spec.check_signature(sig)?;
    check_inputs(spec, sig, input)?;

    let mut generator = Generator::new(spec, sig.clone(), interp, decider, config.clone());

    Ok(generator.generate(session, target_depth, &Example::partial(input.to_vec())))
}
