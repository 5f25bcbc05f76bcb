use anyhow::Result;
use clap::Parser;
use levelbot_cli::{init_tracing, Cli};
use levelbot_slack_runtime::run_slack_level_bot;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    cli.validate()?;
    run_slack_level_bot(cli.to_runtime_config())
        .await
        .inspect_err(|error| tracing::error!("level bot stopped: {error:#}"))
}
