//! fldiff CLI
//!
//! Command-line interface for tolerance-aware comparison of result streams

use clap::{Parser, Subcommand, ValueEnum};
use fldiff_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "fldiff")]
#[command(
    about = "fldiff - Compare result streams against references within tolerances",
    long_about = None
)]
struct Cli {
    /// Format of the diagnostic log written to stderr
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

impl From<LogFormat> for Profile {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => Profile::Development,
            LogFormat::Json => Profile::Production,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare a data stream with a reference stream and write reports
    Compare(commands::compare::CompareArgs),
    /// Print the tolerance configuration in effect for a label
    Tolerances(commands::tolerances::TolerancesArgs),
}

fn main() {
    let cli = Cli::parse();
    logging_facility::init(cli.log_format.into());

    let result = match cli.command {
        Commands::Compare(args) => commands::compare::execute(args),
        Commands::Tolerances(args) => commands::tolerances::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
