use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tracing::info;

use bake_advisor::{config, server};

/// Execute the start command
///
/// This will:
/// 1. Load configuration
/// 2. Start the server (fails fast when the gold file is missing)
pub async fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Starting advisor in foreground mode...".green());

    let cfg = config::load_config(config_path)?;

    info!(
        "Configuration loaded: gold data at {}, default market {}",
        cfg.data.gold_path.display(),
        cfg.data.default_market
    );

    // Start the server (blocks until shutdown)
    server::start_server(cfg).await?;

    Ok(())
}
