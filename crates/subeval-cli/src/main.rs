//! subeval - benchmark submission validation and scoring
//!
//! ## Commands
//!
//! - `validate`: check a submission archive against the ground truth
//! - `evaluate`: score a submission and print the result as JSON

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use subeval_core::{EvalError, EvaluationParams, Harness, HarnessConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "subeval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate and score benchmark submissions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "SUBEVAL_CONFIG")]
    config: Option<PathBuf>,

    /// Scorer program (overrides config and SUBEVAL_SCORER)
    #[arg(long, global = true)]
    scorer: Option<String>,

    /// Scorer timeout in seconds, 0 to wait indefinitely
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Directory under which extraction workspaces are created
    #[arg(long, global = true)]
    temp_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check file names and formats of a submission
    Validate {
        #[command(flatten)]
        inputs: Inputs,
    },

    /// Compute metrics for a submission
    Evaluate {
        #[command(flatten)]
        inputs: Inputs,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(clap::Args)]
struct Inputs {
    /// Ground-truth zip archive
    #[arg(long)]
    gt: PathBuf,

    /// Submission zip archive
    #[arg(long)]
    submission: PathBuf,

    /// Evaluation parameters as a JSON object
    #[arg(long, default_value = "{}")]
    params: String,
}

impl Inputs {
    fn params(&self) -> Result<EvaluationParams> {
        serde_json::from_str(&self.params).context("--params must be a JSON object")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    subeval_core::init_tracing(cli.json, level);

    let config = resolve_config(&cli)?;
    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());
    let harness = Harness::from_config(config).with_cancellation(cancel);

    match cli.command {
        Commands::Validate { inputs } => cmd_validate(&harness, &inputs).await,
        Commands::Evaluate { inputs, pretty } => cmd_evaluate(&harness, &inputs, pretty).await,
    }
}

/// Defaults, then the config file, then `SUBEVAL_*` variables, then flags.
fn resolve_config(cli: &Cli) -> Result<HarnessConfig> {
    resolve_config_with(cli, |key| std::env::var(key).ok())
}

fn resolve_config_with(
    cli: &Cli,
    vars: impl Fn(&str) -> Option<String>,
) -> Result<HarnessConfig> {
    let config = match &cli.config {
        Some(path) => HarnessConfig::from_file(path)?,
        None => HarnessConfig::default(),
    };
    let mut config = config.with_vars(vars)?;

    if let Some(scorer) = &cli.scorer {
        config.scorer_program = scorer.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.scorer_timeout_secs = secs;
    }
    if let Some(root) = &cli.temp_root {
        config.temp_root = Some(root.clone());
    }
    Ok(config)
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

async fn cmd_validate(harness: &Harness, inputs: &Inputs) -> Result<()> {
    let params = inputs.params()?;
    harness
        .validate_data(&inputs.gt, &inputs.submission, &params)
        .await
        .map_err(|e| user_error(e, &inputs.submission))?;

    info!("Submission is valid");
    println!("✓ Submission is valid");
    Ok(())
}

async fn cmd_evaluate(harness: &Harness, inputs: &Inputs, pretty: bool) -> Result<()> {
    let params = inputs.params()?;
    let outcome = harness
        .evaluate_method(&inputs.gt, &inputs.submission, &params)
        .await
        .map_err(|e| user_error(e, &inputs.submission))?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&outcome)?
    } else {
        serde_json::to_string(&outcome)?
    };
    println!("{}", rendered);
    Ok(())
}

fn user_error(err: EvalError, submission: &Path) -> anyhow::Error {
    let kind = err.kind();
    anyhow::Error::new(err).context(format!(
        "{} failed for {}",
        kind,
        submission.display()
    ))
}
