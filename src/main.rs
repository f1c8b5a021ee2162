//! Command-line entry point: loads a dataset, runs the evolutionary search
//! and prints the winning program.

use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use symgp::AbsoluteError;
use symgp::ClassificationFormat;
use symgp::DEFAULT_MISSING_VALUE;
use symgp::Engine;
use symgp::GenerationStats;
use symgp::GpConfig;
use symgp::Misclassification;
use symgp::NodeFactory;
use symgp::Op;
use symgp::Primitives;
use symgp::Progress;
use symgp::RunOutcome;
use symgp::dataset;

/// Progress is printed once per this many generations.
const REPORT_EVERY: usize = 25;

#[derive(Parser, Debug)]
#[command(name = "symgp", version, about = "Evolves arithmetic programs that fit a dataset")]
struct Cli {
    /// JSON file overriding the default hyperparameters.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Fixed random seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Function set drawn from add, sub, mul, div.
    #[arg(long, value_delimiter = ',', default_value = "add,sub,mul,div")]
    functions: Vec<Op>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit a regressor to a two-column (x, y) table.
    Regression {
        /// Table file with a two-line heading.
        data: PathBuf,
    },
    /// Fit a binary classifier to comma-separated `id,attr...,class` records.
    Classification {
        /// Training records.
        train: PathBuf,
        /// Held-out records scored after the run.
        test: PathBuf,
        /// Attribute name file, one name per line.
        names: PathBuf,
        /// Value substituted for a `?` attribute field.
        #[arg(long, default_value_t = DEFAULT_MISSING_VALUE)]
        missing_value: f64,
    },
}

struct PeriodicReport;

impl Progress for PeriodicReport {
    fn on_generation(&mut self, stats: &GenerationStats) {
        if (stats.generation - 1) % REPORT_EVERY == 0 {
            println!(
                "generation {}, best {:.6}, mean {:.6}, best so far {:.6}",
                stats.generation, stats.best_fitness, stats.mean_fitness, stats.best_so_far
            );
        }
    }
}

fn main() -> symgp::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.params {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => GpConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    log::info!(
        "function set: {}",
        cli.functions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    );

    match cli.command {
        Command::Regression { data } => run_regression(config, cli.functions, &data),
        Command::Classification {
            train,
            test,
            names,
            missing_value,
        } => run_classification(config, cli.functions, &train, &test, &names, missing_value),
    }
}

fn run_regression(config: GpConfig, functions: Vec<Op>, data: &Path) -> symgp::Result<()> {
    let cases = dataset::load_regression(data)?;
    println!("loaded {} cases from {}", cases.len(), data.display());
    let evaluator = AbsoluteError::new(cases)?;

    let primitives = Primitives {
        functions,
        variables: vec!["X".to_string()],
        constants: Some((-1.0, 10.0)),
    };
    let names = primitives.variables.clone();

    let mut engine = Engine::new(config, NodeFactory::new(primitives)?)?;
    let outcome = engine.run(&evaluator, &mut PeriodicReport)?;
    report(&outcome, &names);
    Ok(())
}

fn run_classification(
    config: GpConfig,
    functions: Vec<Op>,
    train: &Path,
    test: &Path,
    names_file: &Path,
    missing_value: f64,
) -> symgp::Result<()> {
    let format = ClassificationFormat {
        missing_value,
        ..Default::default()
    };
    let training = dataset::load_classification(train, names_file, format)?;
    let held_out = dataset::load_classification(test, names_file, format)?;
    println!(
        "loaded {} training and {} test instances over {} attributes",
        training.instances.len(),
        held_out.instances.len(),
        training.names.len()
    );

    let names = training.names.clone();
    let primitives = Primitives {
        functions,
        variables: names.clone(),
        constants: Some((-1.0, 10.0)),
    };

    let trainer = Misclassification::new(training)?;
    let tester = Misclassification::new(held_out)?;

    let mut engine = Engine::new(config, NodeFactory::new(primitives)?)?;
    let outcome = engine.run(&trainer, &mut PeriodicReport)?;
    report(&outcome, &names);

    println!(
        "training instances correctly classified: {:.4}%",
        trainer.accuracy(&outcome.best) * 100.0
    );
    println!(
        "test instances correctly classified:     {:.4}%",
        tester.accuracy(&outcome.best) * 100.0
    );
    Ok(())
}

fn report(outcome: &RunOutcome, names: &[String]) {
    println!();
    println!(
        "after {} generations the best program had a fitness of {:.6}",
        outcome.generations, outcome.fitness
    );
    println!("best program: {}", outcome.best.expression(names));

    let mut simplified = outcome.best.clone();
    simplified.simplify();
    println!("simplified:   {}", simplified.expression(names));
}
