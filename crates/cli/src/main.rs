// leadtrace CLI - trace transactions between general ledger lead sheets

mod columns;
mod exit_codes;
mod trace;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use leadtrace_recon::resolve::DEFAULT_CUTOFF;
use leadtrace_recon::ReconError;

use exit_codes::{recon_exit_code, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "ltrace")]
#[command(about = "Trace transactions between general ledger lead sheets (existence and completeness testing)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); LEADTRACE_LOG overrides when unset
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest which ledger column holds each required field
    #[command(after_help = "\
Examples:
  ltrace columns gl.xlsx
  ltrace columns gl.xlsx --sheet Ledger --cutoff 0.6
  ltrace columns gl.csv --toml >> job.toml")]
    Columns {
        /// Ledger file (.csv, .tsv, .txt, .xlsx, .xlsm, .xls, .xlsb, .ods)
        ledger: PathBuf,

        /// Worksheet to read (first sheet by default)
        #[arg(long)]
        sheet: Option<String>,

        /// Minimum similarity for a label to be suggested
        #[arg(long, default_value_t = DEFAULT_CUTOFF)]
        cutoff: f64,

        /// Output JSON to stdout
        #[arg(long, conflicts_with = "toml")]
        json: bool,

        /// Output a [columns] block for a job file
        #[arg(long)]
        toml: bool,
    },

    /// List the lead sheet numbers present in a ledger column
    #[command(after_help = "\
Examples:
  ltrace leads gl.xlsx --lead-column 'Lead Sheet'
  ltrace leads gl.csv --lead-column Lead --json")]
    Leads {
        /// Ledger file
        ledger: PathBuf,

        /// Ledger column holding lead sheet numbers
        #[arg(long)]
        lead_column: String,

        /// Worksheet to read (first sheet by default)
        #[arg(long)]
        sheet: Option<String>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Trace both directions for a job file and write the results workbook
    #[command(after_help = "\
Examples:
  ltrace trace cash.trace.toml
  ltrace trace cash.trace.toml --output out/cash.xlsx --csv-dir out/cash
  ltrace trace cash.trace.toml --json --fail-on-exceptions")]
    Trace {
        /// Path to the job .toml file
        config: PathBuf,

        /// Output the full report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Results workbook (overrides output.xlsx)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write one CSV per table into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Exit 3 when any transaction is not found or does not offset
        #[arg(long)]
        fail_on_exceptions: bool,
    },

    /// Validate a job file (and its ledger, when present) without tracing
    #[command(after_help = "\
Examples:
  ltrace validate cash.trace.toml")]
    Validate {
        /// Path to the job .toml file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  leadtrace-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

/// Logs go to stderr. `-v` flags win; otherwise LEADTRACE_LOG, default warn.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("LEADTRACE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    // log records from the library crates arrive through the tracing-log bridge
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Columns { ledger, sheet, cutoff, json, toml } => {
            columns::cmd_columns(ledger, sheet, cutoff, json, toml)
        }
        Commands::Leads { ledger, lead_column, sheet, json } => {
            columns::cmd_leads(ledger, lead_column, sheet, json)
        }
        Commands::Trace { config, json, output, csv_dir, fail_on_exceptions } => {
            trace::cmd_trace(trace::TraceArgs {
                config,
                json,
                output,
                csv_dir,
                fail_on_exceptions,
            })
        }
        Commands::Validate { config } => trace::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::new(recon_exit_code(&err), err.to_string())
    }
}
