use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

use iban_checksum::{check_digits, check_file, explain, logging, normalize, BatchConfig, Config};

#[derive(Parser, Debug)]
#[command(name = "iban-check", version, about = "Validate IBAN checksums (ISO 13616 mod-97)")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate one or more IBANs
    Check {
        /// IBANs to validate (quote values that contain spaces)
        #[arg(required = true)]
        ibans: Vec<String>,

        /// Print the full pipeline breakdown as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every stage of the checksum pipeline for one IBAN
    Explain {
        iban: String,
    },

    /// Compute check digits for a country code and BBAN
    CheckDigits {
        /// Two-letter country code
        country: String,

        /// Basic bank account number
        bban: String,
    },

    /// Validate every IBAN in a CSV or one-per-line file
    Batch {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Header name of the IBAN column
        #[arg(long)]
        column: Option<String>,

        /// Treat the first row as data
        #[arg(long)]
        no_headers: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = Config::load_or_default(cli.config.as_deref())?;
    debug!(?config, "Configuration loaded");

    match cli.command {
        Commands::Check { ibans, json } => run_check(&ibans, json),
        Commands::Explain { iban } => run_explain(&iban),
        Commands::CheckDigits { country, bban } => run_check_digits(&country, &bban),
        Commands::Batch {
            file,
            format,
            column,
            no_headers,
        } => {
            let mut batch = config.batch;
            if let Some(column) = column {
                batch.column = column;
            }
            if no_headers {
                batch.has_headers = false;
            }
            run_batch(&file, &batch, format)
        }
    }
}

fn exit_code(all_valid: bool) -> ExitCode {
    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_check(ibans: &[String], json: bool) -> Result<ExitCode> {
    let breakdowns: Vec<_> = ibans.iter().map(|iban| explain(iban)).collect();
    let all_valid = breakdowns.iter().all(|b| b.valid);

    if json {
        let out = serde_json::to_string_pretty(&breakdowns).context("Failed to serialize results")?;
        println!("{}", out);
    } else {
        for breakdown in &breakdowns {
            println!("{:<8} {}", breakdown.status(), breakdown.input);
        }
    }

    Ok(exit_code(all_valid))
}

fn run_explain(iban: &str) -> Result<ExitCode> {
    let breakdown = explain(iban);
    let remainder = breakdown
        .remainder
        .map(|r| r.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("input:      {}", breakdown.input);
    println!("normalized: {}", breakdown.normalized);
    println!("rearranged: {}", breakdown.rearranged);
    println!("digits:     {}", breakdown.digits);
    println!("mod 97:     {}", remainder);
    println!("result:     {}", breakdown.status());

    Ok(exit_code(breakdown.valid))
}

fn run_check_digits(country: &str, bban: &str) -> Result<ExitCode> {
    let digits = check_digits(country, bban)
        .with_context(|| format!("Cannot compute check digits for {} {}", country, bban))?;

    println!("{}{}{}", normalize(country), digits, normalize(bban));
    Ok(ExitCode::SUCCESS)
}

fn run_batch(file: &Path, batch: &BatchConfig, format: OutputFormat) -> Result<ExitCode> {
    let report = check_file(file, batch)?;

    match format {
        OutputFormat::Text => {
            for entry in report.invalid_entries() {
                println!("line {:>5}: INVALID {}", entry.line_number, entry.input);
            }
            println!("{}", report.summary());
        }
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Csv => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            report.write_csv(&mut handle)?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(exit_code(report.all_valid()))
}
