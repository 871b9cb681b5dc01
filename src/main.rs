use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ltlf_synt::logic::Arena;
use ltlf_synt::parser::parse;
use ltlf_synt::partition::Partition;
use ltlf_synt::synthesis::{ForwardSynthesis, Realizability, SearchOptions};

/// Decide realizability of an LTLf specification.
///
/// Prints REALIZABLE or UNREALIZABLE and exits with status 0 or 1
/// accordingly (2 on errors).
#[derive(Parser)]
#[command(name = "ltlf-synt", version, about)]
struct Cli {
    /// The LTLf formula.
    #[arg(short, long, required_unless_present = "formula_file", conflicts_with = "formula_file")]
    formula: Option<String>,

    /// Read the formula from a file instead.
    #[arg(long)]
    formula_file: Option<PathBuf>,

    /// Partition file declaring `.inputs:` and `.outputs:`.
    #[arg(short, long)]
    partition: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Order system moves by the syntactic distance heuristic.
    #[arg(long)]
    heuristic: bool,

    /// Disable the one-step realizability pre-filters.
    #[arg(long)]
    no_one_step: bool,

    /// Rule out the empty trace.
    #[arg(long)]
    non_empty: bool,

    /// Write the compiled root obligation in Graphviz DOT format.
    #[arg(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Write the variable tree in the libsdd textual format.
    #[arg(long, value_name = "FILE")]
    dump_vtree: Option<PathBuf>,
}

fn main() -> ExitCode {
    if let Err(e) = color_eyre::install() {
        eprintln!("{e}");
        return ExitCode::from(2);
    }
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Info,
        2 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    if let Err(e) = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    ) {
        eprintln!("{e}");
        return ExitCode::from(2);
    }

    match run(&cli) {
        Ok(Realizability::Realizable) => {
            println!("{}", Realizability::Realizable);
            ExitCode::SUCCESS
        }
        Ok(Realizability::Unrealizable) => {
            println!("{}", Realizability::Unrealizable);
            ExitCode::from(1)
        }
        Err(report) => {
            eprintln!("Error: {report:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> color_eyre::Result<Realizability> {
    let text = match (&cli.formula, &cli.formula_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => unreachable!("clap enforces one of --formula/--formula-file"),
    };

    let arena = Arena::new();
    let formula = parse(&arena, text.trim())?;
    log::info!("specification: {}", arena.fmt(formula));

    let partition = Partition::load(&cli.partition)?;
    log::info!(
        "partition: {} inputs, {} outputs",
        partition.inputs.len(),
        partition.outputs.len()
    );

    let options = SearchOptions {
        one_step_checks: !cli.no_one_step,
        hamming_heuristic: cli.heuristic,
        require_nonempty: cli.non_empty,
    };
    let mut synth = ForwardSynthesis::with_options(&arena, formula, &partition, options)?;

    if let Some(path) = &cli.dump_vtree {
        std::fs::write(path, synth.manager().vtree().serialize())?;
    }
    if let Some(path) = &cli.dot {
        let root = synth.compiled_root()?;
        std::fs::write(path, synth.manager().to_dot(root))?;
    }

    Ok(synth.realizability()?)
}
