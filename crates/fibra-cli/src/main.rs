mod commands;
mod output;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fibra",
    version,
    about = "OTDR report reader and fiber span diagnosis"
)]
struct Cli {
    /// Log extraction decisions to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose a fiber from an OTDR report (PDF, CSV, XLSX/XLS/ODS, SOR or trace JSON)
    Diagnose {
        /// Report for the current period
        current: PathBuf,

        /// Report for an earlier period of the same fiber, to compare against
        #[arg(long, value_name = "FILE")]
        prior: Option<PathBuf>,

        /// Nominal span length in km (default: span length printed in the report)
        #[arg(short, long = "expected-km", value_name = "KM", value_parser = parse_positive)]
        expected_km: Option<Decimal>,

        /// Test wavelength in nm; 1310 and 1550 have a loss budget
        #[arg(short, long, default_value_t = 1550)]
        wavelength: u32,

        /// Maximum allowed loss in dB (overrides the wavelength budget)
        #[arg(long = "max-loss", value_name = "DB", value_parser = parse_positive)]
        max_loss: Option<Decimal>,

        /// Fiber identifier (default: file name)
        #[arg(long)]
        fiber_id: Option<String>,

        /// Period label for the current report, e.g. Q2
        #[arg(long)]
        period: Option<String>,

        /// Period label for the prior report, e.g. Q1
        #[arg(long)]
        prior_period: Option<String>,

        /// JSON diagnosis profile
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,

        /// Output format: table (default), json or csv
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write results to a file (.csv: summary columns, .xlsx: workbook, otherwise JSON)
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Append the summary to a consolidated history CSV
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// List every event, not just the critical ones
        #[arg(long)]
        show_events: bool,
    },
    /// Extract fields and events from a report without diagnosing
    Parse {
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// JSON diagnosis profile
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
    },
    /// Find the cell most similar to a query and print the value below it
    Lookup {
        input_file: PathBuf,

        /// Text to look for, e.g. "Fim de Fibra"
        query: String,

        /// Minimum similarity in percent
        #[arg(short, long, default_value_t = 85, value_parser = clap::value_parser!(u8).range(0..=100))]
        threshold: u8,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Compute the loss budget for a span
    MaxLoss {
        /// Span length in km
        #[arg(value_parser = parse_positive)]
        distance_km: Decimal,

        /// Wavelength in nm
        #[arg(short, long, default_value_t = 1550)]
        wavelength: u32,
    },
    /// Inspect or delete a consolidated history file
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Inspect and validate diagnosis profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Print all stored summaries
    Show { file: PathBuf },
    /// Delete the history file
    Clear { file: PathBuf },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print the effective profile (defaults when no file is given)
    Show { file: Option<PathBuf> },
    /// Validate a profile file
    Validate { file: PathBuf },
}

fn parse_positive(s: &str) -> Result<Decimal, String> {
    let value: Decimal = s
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|e| format!("'{s}' is not a number: {e}"))?;
    if value <= Decimal::ZERO {
        return Err(format!("'{s}' must be greater than zero"));
    }
    Ok(value)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Diagnose {
            current,
            prior,
            expected_km,
            wavelength,
            max_loss,
            fiber_id,
            period,
            prior_period,
            profile,
            output,
            out,
            history,
            show_events,
        } => commands::diagnose::run(commands::diagnose::DiagnoseOptions {
            current,
            prior,
            expected_km,
            wavelength,
            max_loss,
            fiber_id,
            period,
            prior_period,
            profile,
            output_format: output,
            out,
            history,
            show_events,
        }),
        Commands::Parse {
            input_file,
            output,
            profile,
        } => commands::parse::run(input_file, &output, profile),
        Commands::Lookup {
            input_file,
            query,
            threshold,
            output,
        } => commands::lookup::run(&input_file, &query, threshold, &output),
        Commands::MaxLoss {
            distance_km,
            wavelength,
        } => commands::diagnose::max_loss(distance_km, wavelength),
        Commands::History { action } => match action {
            HistoryAction::Show { file } => commands::history::show(&file),
            HistoryAction::Clear { file } => commands::history::clear(&file),
        },
        Commands::Profile { action } => match action {
            ProfileAction::Show { file } => commands::profile::show(file.as_deref()),
            ProfileAction::Validate { file } => commands::profile::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
