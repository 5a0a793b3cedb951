use std::fs::OpenOptions;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use picobase::repl;
use picobase::storage::table::Table;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "picobase", version = VERSION, about = "A minimal persistent single-table database.")]
struct Cli {
    /// Path to the database file. Created if it does not exist.
    filename: String,
}

fn main() -> ExitCode {
    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open("picobase.log")
        .expect("failed to open log file");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut table = match Table::open(&cli.filename) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match repl::run(&mut table) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
