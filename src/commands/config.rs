use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use bake_advisor::config;

/// Display the effective configuration as TOML
pub fn show(config_path: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let toml_string = toml::to_string_pretty(&cfg)?;
    println!("{}", toml_string);
    Ok(())
}

/// Validate the configuration file
pub fn validate(config_path: &Path) -> Result<()> {
    match config::load_config(config_path) {
        Ok(_) => {
            println!("{}", "✓ Configuration is valid".green());
            Ok(())
        }
        Err(err) => {
            eprintln!("{} {}", "✗ Configuration invalid:".red(), err);
            Err(err)
        }
    }
}
