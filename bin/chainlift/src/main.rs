//! chainlift deploys a token contract to one or more EVM networks and
//! registers each deployment with the network's source-verification
//! service.

mod cli;

use anyhow::Result;
use clap::Parser;
use comfy_table::Table;

use chainlift_deploy::{CampaignConfig, CampaignReport, CancelFlag, Credentials, run_campaign};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    let campaign = if let Some(config_path) = &cli.config {
        let campaign = CampaignConfig::load_from_file(config_path)?;
        tracing::info!(
            config_path = %config_path.display(),
            targets = campaign.targets.len(),
            "Running campaign from config file..."
        );
        campaign
    } else {
        cli.to_campaign()
    };

    if let Some(path) = &cli.save_config {
        campaign.save_to_file(path)?;
    }

    let credentials = Credentials::from_env();

    // Honor Ctrl+C at stage boundaries; an in-flight broadcast is never
    // abandoned.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received; stopping at the next stage boundary");
                cancel.cancel();
            }
        });
    }

    let report = run_campaign(&campaign, &credentials, &cancel).await?;
    print_summary(&report);

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(report: &CampaignReport) {
    let mut table = Table::new();
    table.set_header(vec!["network", "stage", "tx hash", "contract", "error"]);

    for outcome in &report.outcomes {
        let record = &outcome.record;
        table.add_row(vec![
            record.network.to_string(),
            outcome.stage.to_string(),
            record
                .tx_hash
                .map(|hash| hash.to_string())
                .unwrap_or_else(|| "-".into()),
            record
                .contract_address
                .map(|address| address.to_string())
                .unwrap_or_else(|| "-".into()),
            outcome
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".into()),
        ]);
    }

    let elapsed = report.finished_at - report.started_at;
    println!("{table}");
    println!(
        "Campaign finished in {}s: {}/{} targets succeeded",
        elapsed.num_seconds(),
        report.succeeded_count(),
        report.outcomes.len()
    );
}
