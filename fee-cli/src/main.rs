use std::io;

use clap::Parser;
use tracing::debug;

use fee_cli::commands::Cli;
use fee_cli::config::PortalConfig;
use fee_cli::{app, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Up before the config is read so loading problems are logged too.
    logging::init_logging("info");

    let config = PortalConfig::load_or_default(cli.config.as_deref())?
        .with_overrides(cli.overrides());

    if std::env::var_os("RUST_LOG").is_none() {
        logging::set_log_level(&config.logging.level)?;
    }
    if let Some(path) = &config.logging.file {
        logging::enable_file_logging(path)?;
    }
    debug!(?config, "configuration resolved");

    let mut stdout = io::stdout().lock();
    app::run(cli.command, &config, &mut stdout).await
}
