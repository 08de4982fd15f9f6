//! factsync
//!
//! Unattended entry point: load configuration, run one reconciliation,
//! exit 0 when the fact loop completed and non-zero on a fatal error.

use std::process::ExitCode;

use anyhow::{Context, Result};

use factsync::{
    telemetry, FactMapper, Orchestrator, PuppetDbFactSource, RunReport, SatelliteClient,
    SyncConfig,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match SyncConfig::load() {
        Ok(config) => config,
        Err(e) => {
            // Subscriber not installed yet
            eprintln!("factsync: {}", e);
            return ExitCode::FAILURE;
        }
    };
    telemetry::init(config.verbose);

    match run(&config).await {
        Ok(report) => {
            tracing::debug!(skipped = report.skipped(), "Exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Reconciliation aborted: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &SyncConfig) -> Result<RunReport> {
    let mapper = FactMapper::new(config.mapping.clone());

    let mut facts = PuppetDbFactSource::new(&config.facts, config.http_timeout())
        .context("Failed to create fact feed client")?;
    if config.facts.filter_mapped {
        facts = facts.with_name_filter(mapper.rule());
    }
    let inventory = SatelliteClient::new(&config.inventory, config.http_timeout())
        .context("Failed to create inventory client")?;

    tracing::info!(
        facts_url = %facts.url(),
        inventory_url = %inventory.url(),
        mapped_facts = mapper.rule().len(),
        "Starting reconciliation"
    );

    let report = Orchestrator::new(&facts, &inventory, &mapper, config.credentials())
        .run()
        .await?;
    Ok(report)
}
