//! StoryPipe CLI
//!
//! Thin glue around the pipeline library:
//!
//! - `run`: process a feature request through the full agent pipeline
//! - `validate`: validate a contract JSON document
//! - `score`: run the DNA compliance analysis on a feature request

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use storypipe_core::{
    init_tracing, ContractValidator, DnaComplianceChecker, FeatureRequest, PipelineConfig,
    StoryPipeline,
};
use storypipe_state::{MemoryProjectLedger, ProjectLedger, SurrealStore};

#[derive(Parser)]
#[command(name = "storypipe")]
#[command(version = storypipe_core::VERSION)]
#[command(about = "Contract-driven AI software team pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a feature request through the full pipeline
    Run {
        /// Path to the feature request file (JSON)
        #[arg(short, long)]
        feature: PathBuf,

        /// Optional pipeline configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Persist the run to the configured SurrealDB endpoint instead
        /// of the in-memory ledger (honours STORYPIPE_DB_URL)
        #[arg(long)]
        persist: bool,
    },

    /// Validate a contract document against the schema
    Validate {
        /// Path to the contract file (JSON)
        #[arg(short, long)]
        contract: PathBuf,
    },

    /// Score a feature request against the DNA principles
    Score {
        /// Path to the feature request file (JSON)
        #[arg(short, long)]
        feature: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json, cli.verbose);

    match cli.command {
        Commands::Run {
            feature,
            config,
            persist,
        } => run_pipeline(feature, config, persist).await,
        Commands::Validate { contract } => validate_contract(contract),
        Commands::Score { feature } => score_feature(feature),
    }
}

fn load_feature(path: &PathBuf) -> Result<FeatureRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading feature request {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing feature request {}", path.display()))
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig> {
    match path {
        None => Ok(PipelineConfig::default()),
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
        }
    }
}

async fn run_pipeline(feature: PathBuf, config: Option<PathBuf>, persist: bool) -> Result<()> {
    let feature = load_feature(&feature)?;
    let config = load_config(config)?;

    let ledger: Arc<dyn ProjectLedger> = if persist {
        Arc::new(SurrealStore::from_env().await?)
    } else {
        Arc::new(MemoryProjectLedger::new())
    };

    let pipeline = StoryPipeline::new(config, ledger);
    let outcome = pipeline.run_story(&feature).await?;

    info!(
        story_id = %outcome.story_id,
        approved = outcome.approved,
        rework_cycles = outcome.rework_cycles,
        "pipeline finished"
    );

    let summary = json!({
        "story_id": outcome.story_id,
        "approved": outcome.approved,
        "final_target": outcome.final_target,
        "rework_cycles": outcome.rework_cycles,
        "duration_ms": outcome.duration_ms,
        "stages": outcome
            .trail
            .iter()
            .map(|t| json!({
                "stage": t.stage,
                "target": t.target,
                "contract_digest": t.contract_digest,
            }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if outcome.approved {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn validate_contract(path: PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading contract {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing contract {}", path.display()))?;

    let report = ContractValidator::new().validate_contract(&value);
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "is_valid": report.is_valid,
            "errors": report.errors,
        }))?
    );

    if report.is_valid {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn score_feature(path: PathBuf) -> Result<()> {
    let feature = load_feature(&path)?;
    let analysis = DnaComplianceChecker::new().analyze(&feature);

    println!("{}", serde_json::to_string_pretty(&analysis)?);

    if analysis.compliant() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
