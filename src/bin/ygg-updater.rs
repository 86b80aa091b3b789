use anyhow::Result;
use clap::Parser;
use ygg_updater::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    ygg_updater::setup_logging();

    let cli = Cli::parse();
    cli.run().await?;

    Ok(())
}
