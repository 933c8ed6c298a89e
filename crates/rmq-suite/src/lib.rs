//! RabbitMQ server configuration suite: CLI settings, the scenario catalog
//! and report output for the `rmq-suite` binary.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod output;
pub mod scenarios;
pub mod ssl_assets;

use anyhow::{bail, Result};
use rmq_verify::{Scenario, SuiteReport};

use crate::cli::Cli;
use crate::config::SuiteConfig;
use crate::output::emit_report;
use crate::scenarios::{build_scenario, select_scenarios, SCENARIO_CATALOG};

pub fn list_scenarios() -> String {
    SCENARIO_CATALOG
        .iter()
        .map(|(name, summary)| format!("{name:<18} {summary}\n"))
        .collect()
}

pub fn selected_scenarios(config: &SuiteConfig) -> Result<Vec<Scenario>> {
    select_scenarios(&config.scenario_filter)?
        .into_iter()
        .map(|name| build_scenario(name, &config.targets, &config.ssl_assets_dir))
        .collect()
}

pub async fn run_cli(cli: Cli) -> Result<SuiteReport> {
    let config = SuiteConfig::from_cli(&cli)?;
    let scenarios = selected_scenarios(&config)?;
    let runner = config.build_runner()?;
    tracing::info!(
        deployment = %config.bosh.deployment,
        scenarios = scenarios.len(),
        "starting rabbitmq server suite"
    );
    let report = runner.run_all(&scenarios).await;
    emit_report(&report, &config.output)?;
    Ok(report)
}

pub fn ensure_passed(report: &SuiteReport) -> Result<()> {
    if !report.all_passed() {
        bail!(
            "{} scenario(s) failed and {} errored",
            report.failed,
            report.errored
        );
    }
    Ok(())
}
