use anyhow::Result;
use clap::Parser;
use rmq_suite::bootstrap::init_tracing;
use rmq_suite::cli::Cli;
use rmq_suite::{ensure_passed, list_scenarios, run_cli};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if cli.list {
        print!("{}", list_scenarios());
        return Ok(());
    }
    let report = run_cli(cli).await?;
    ensure_passed(&report)
}
