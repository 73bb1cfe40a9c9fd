//! medpredict - symptom-based disease prediction CLI
//!
//! Usage:
//!   medpredict train --dataset dataset.csv      # Train and save model.bin
//!   medpredict predict fever cough              # Predict a disease
//!   medpredict symptoms                         # List known symptoms
//!   medpredict serve --port 5001                # Start the HTTP API
//!   medpredict --config medpredict.toml train   # Settings from a file

use clap::{Parser, Subcommand};
use medpredict::config::MedPredictConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

use commands::{predict, serve, symptoms, train};
use error::Result;

/// medpredict - symptom-based disease prediction
///
/// Train a classifier from a labeled symptom dataset, then predict
/// diseases from the command line or over HTTP.
#[derive(Parser, Debug)]
#[command(name = "medpredict")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train candidate classifiers and save the best as a model artifact
    Train(train::TrainArgs),

    /// Predict a disease from symptoms
    Predict {
        /// Symptoms; an entry may hold several joined by ',', ';' or '|'
        #[arg(value_name = "SYMPTOM", required = true)]
        symptoms: Vec<String>,

        /// Model artifact
        #[arg(short, long, value_name = "FILE")]
        model: Option<PathBuf>,
    },

    /// List the symptoms a model knows
    Symptoms {
        /// Model artifact
        #[arg(short, long, value_name = "FILE")]
        model: Option<PathBuf>,
    },

    /// Start the HTTP prediction server
    Serve {
        /// Model artifact
        #[arg(short, long, value_name = "FILE")]
        model: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Disable permissive CORS
        #[arg(long)]
        no_cors: bool,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<MedPredictConfig> {
    match path {
        Some(path) => Ok(MedPredictConfig::load(path)?),
        None => Ok(MedPredictConfig::default()),
    }
}

fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Train(args) => {
            let training = args.apply(config.training)?;
            train::run(&training, cli.json)
        }

        Commands::Predict { symptoms, model } => {
            let model = model.unwrap_or(config.service.artifact);
            predict::run(&model, &symptoms, cli.json)
        }

        Commands::Symptoms { model } => {
            let model = model.unwrap_or(config.service.artifact);
            symptoms::run(&model, cli.json)
        }

        Commands::Serve {
            model,
            host,
            port,
            no_cors,
        } => {
            let mut service = config.service;
            if let Some(model) = model {
                service = service.with_artifact(model);
            }
            if let Some(host) = host {
                service = service.with_host(host);
            }
            if let Some(port) = port {
                service = service.with_port(port);
            }
            if no_cors {
                service = service.with_cors(false);
            }
            service.validate()?;
            serve::run(&service)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            e.exit_code()
        }
    }
}
