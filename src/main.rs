use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use steptrace::config::TracerConfig;
use steptrace::demos;
use steptrace::error::TraceResult;
use steptrace::runtime::shell::Progress;
use steptrace::terminal::{ConsoleShell, Session, Writer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "steptrace", about = "Step through algorithm tracing exercises in the console")]
struct Cli {
    /// YAML file with delays, language and seed.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured random seed.
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Lists the built-in exercises.
    List,
    /// Runs one exercise, reading commands from stdin.
    Run {
        #[arg(default_value = "linked-list")]
        exercise: String,

        /// Persisted state to resume from.
        #[arg(long)]
        state: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> TraceResult<()> {
    let mut config = match &cli.config {
        Some(path) => TracerConfig::load(path)?,
        None => TracerConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    let registry = demos::registry(&config);

    let (exercise, state) = match cli.command {
        Some(CliCommand::List) => {
            for id in registry.ids() {
                println!("{id}");
            }
            return Ok(());
        }
        Some(CliCommand::Run { exercise, state }) => (exercise, state),
        None => ("linked-list".to_string(), None),
    };
    let saved = match state {
        Some(path) => Some(Progress::from_json(&std::fs::read_to_string(path)?)?),
        None => None,
    };

    let writer = Rc::new(RefCell::new(Writer::stdout()));
    let shell = ConsoleShell::new(writer.clone())
        .with_saved(saved)
        .with_interactive(config.interactive);
    let driver = registry.driver(&exercise, Box::new(shell))?;
    let progress = Session::new(driver, writer).run(io::stdin().lock())?;
    println!("{}", progress.to_json()?);
    Ok(())
}
