//! scriptor CLI: score handwriting traces and follow curriculum progress.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

mod commands;

#[derive(Parser)]
#[command(name = "scriptor", version, about = "Cursive handwriting trace evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List letters that have a reference shape
    Letters,

    /// Print the reference trace for a letter
    Reference {
        /// Letter id (e.g. "i")
        #[arg(long)]
        letter: String,

        /// Anchor x (top-left of the letter box)
        #[arg(long, default_value = "120")]
        x: f64,

        /// Anchor y (top-left of the letter box)
        #[arg(long, default_value = "180")]
        y: f64,

        /// Scale factor (1.0 = 100 px letter box)
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Score a recorded trace against an exercise letter
    Evaluate {
        /// Trace JSON file ({"points": [{"x", "y", "timestamp_ms", "pressure"}]})
        #[arg(long)]
        trace: PathBuf,

        /// Exercise id (default: the next exercise for the student)
        #[arg(long)]
        exercise: Option<String>,

        /// Letter position inside the exercise
        #[arg(long)]
        letter_index: Option<usize>,

        /// Catalog file or directory (default: config, then builtin)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Mastery state JSON, created or updated after scoring
        #[arg(long)]
        state: Option<PathBuf>,

        /// JSONL evaluation log (default: <output_dir>/evaluations.jsonl)
        #[arg(long)]
        log: Option<PathBuf>,

        /// Pen-down time in ms since the Unix epoch (default: now)
        #[arg(long)]
        start_ms: Option<i64>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show mastery and the next exercise
    Progress {
        /// Mastery state JSON
        #[arg(long)]
        state: PathBuf,

        /// Catalog file or directory (default: config, then builtin)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate catalog TOML files
    Validate {
        /// Path to catalog file or directory
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Summarize an evaluation log
    Report {
        /// JSONL evaluation log (default: <output_dir>/evaluations.jsonl)
        #[arg(long)]
        log: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only include records from this session
        #[arg(long)]
        session: Option<Uuid>,

        /// Mastery state JSON to embed in the report
        #[arg(long)]
        state: Option<PathBuf>,

        /// Write the full report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create starter config and example catalog
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scriptor=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Letters => commands::letters::execute(),
        Commands::Reference {
            letter,
            x,
            y,
            scale,
            format,
        } => commands::reference::execute(letter, x, y, scale, format),
        Commands::Evaluate {
            trace,
            exercise,
            letter_index,
            catalog,
            config,
            state,
            log,
            start_ms,
            format,
        } => commands::evaluate::execute(commands::evaluate::EvaluateArgs {
            trace,
            exercise,
            letter_index,
            catalog,
            config,
            state,
            log,
            start_ms,
            format,
        }),
        Commands::Progress {
            state,
            catalog,
            config,
        } => commands::progress::execute(state, catalog, config),
        Commands::Validate { catalog } => commands::validate::execute(catalog),
        Commands::Report {
            log,
            config,
            session,
            state,
            output,
        } => commands::report::execute(log, config, session, state, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
