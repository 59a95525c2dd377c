use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};

use dslsynth::config::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE, DEFAULT_RETRY_BUDGET, DEFAULT_SEED,
};
use dslsynth::sexp::{parse_program, parse_value};
use dslsynth::{
    toy, Bounds, Decider, Example, GeneratorConfig, Generator, Interpreter, Mode, NullExecutor,
    Session, SynthConfig, Value,
};

/// Synthesizes programs over the toy integer grammar.
#[derive(Debug, Parser)]
#[command(name = "dslsynth")]
struct Cli {
    /// More output, repeat for even more
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find a program consistent with the examples
    Synth(SynthArgs),
    /// Produce fresh examples from random programs
    Gen(GenArgs),
    /// Run a stored program
    Eval(EvalArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Exhaustive,
    Random,
    Guided,
}

#[derive(Debug, Args)]
struct SynthArgs {
    /// Example in the form `4,3=>3`
    #[arg(short, long = "example", required = true)]
    examples: Vec<String>,
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: usize,
    /// Bound on the number of production applications
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    size: usize,
    #[arg(long, value_enum, default_value_t = ModeArg::Exhaustive)]
    mode: ModeArg,
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: usize,
}

#[derive(Debug, Args)]
struct GenArgs {
    /// Inputs in the form `4,3`
    #[arg(short, long)]
    input: String,
    #[arg(long, default_value_t = 2)]
    depth: usize,
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    #[arg(long, default_value_t = DEFAULT_RETRY_BUDGET)]
    retries: usize,
}

#[derive(Debug, Args)]
struct EvalArgs {
    /// The program, e.g. `(plus (@param 0) (const 1))`
    program: String,
    /// Inputs in the form `4,3`
    #[arg(short, long)]
    input: String,
}

fn parse_inputs(text: &str) -> dslsynth::Result<Vec<Value>> {
    text.split(',')
        .map(|x| parse_value(x.trim()))
        .collect()
}

fn parse_example(text: &str) -> Result<Example, Box<dyn Error>> {
    let (input, output) = text.split_once("=>")
        .ok_or_else(|| format!("example {text:?} lacks `=>`"))?;

    Ok(Example::new(parse_inputs(input)?, parse_value(output.trim())?))
}

fn synth(args: SynthArgs) -> Result<(), Box<dyn Error>> {
    let spec = toy::spec()?;
    let examples = args.examples.iter()
        .map(|x| parse_example(x))
        .collect::<Result<Vec<_>, _>>()?;
    let arity = examples.first().map_or(0, |x| x.input.len());
    let sig = toy::signature(&spec, arity)?;

    let interp = Interpreter::new(&spec, toy::handlers())?;
    let decider = Decider::default();
    let mut session = Session::new(NullExecutor);
    let config = SynthConfig {
        bounds: Bounds::new(args.depth, args.size),
        mode: match args.mode {
            ModeArg::Exhaustive => Mode::Exhaustive,
            ModeArg::Random => Mode::Random { seed: args.seed, max_attempts: args.max_attempts },
            ModeArg::Guided => Mode::Guided,
        },
        ..SynthConfig::default()
    };

    match dslsynth::synthesize(&spec, &sig, &examples, &config, &interp, &decider, &mut session)? {
        Some(prog) => println!("{}", prog.to_sexp(&spec)),
        None => println!("no solution"),
    }

    Ok(())
}

fn gen(args: GenArgs) -> Result<(), Box<dyn Error>> {
    let spec = toy::spec()?;
    let input = parse_inputs(&args.input)?;
    let sig = toy::signature(&spec, input.len())?;

    let interp = Interpreter::new(&spec, toy::handlers())?;
    let decider = Decider::default();
    let mut session = Session::new(NullExecutor);
    let config = GeneratorConfig {
        retry_budget: args.retries,
        seed: args.seed,
        ..GeneratorConfig::default()
    };
    let mut generator = Generator::new(&spec, sig, &interp, &decider, config);
    let partial = Example::partial(input);

    for _ in 0..args.count {
        let Some((prog, example)) = generator.generate(&mut session, args.depth, &partial) else {
            println!("no example");
            continue;
        };
        let output = example.output.map(|x| x.to_string()).unwrap_or_default();
        println!("{}\t=> {output}", prog.to_sexp(&spec));
    }

    Ok(())
}

fn eval(args: EvalArgs) -> Result<(), Box<dyn Error>> {
    let spec = toy::spec()?;
    let input = parse_inputs(&args.input)?;
    let sig = toy::signature(&spec, input.len())?;
    let prog = parse_program(&spec, &sig, &args.program)?;

    let interp = Interpreter::new(&spec, toy::handlers())?;
    let mut session = Session::new(NullExecutor);

    match interp.eval_program(&mut session, &prog, &input) {
        Ok(value) => println!("{value}"),
        Err(e) => println!("{e}"),
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    colog::default_builder()
        .filter_level(level)
        .init();

    info!("Started");

    match cli.command {
        Command::Synth(args) => synth(args),
        Command::Gen(args) => gen(args),
        Command::Eval(args) => eval(args),
    }
}
