use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub baking: BakingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Path to the gold CSV produced by the upstream pipeline
    #[serde(default = "default_gold_path")]
    pub gold_path: PathBuf,
    /// Market preselected when the table contains it
    #[serde(default = "default_market")]
    pub default_market: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BakingConfig {
    /// Average oven draw in kW
    #[serde(default = "default_oven_power_kw")]
    pub oven_power_kw: f64,
    /// Assumed bake duration in hours
    #[serde(default = "default_bake_hours")]
    pub bake_hours: f64,
    /// Default best/worst hours count (slider default)
    #[serde(default = "default_extreme_hours")]
    pub default_extreme_hours: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_gold_path() -> PathBuf {
    PathBuf::from("data/gold.csv")
}

fn default_market() -> String {
    "netherlands_nl".to_string()
}

fn default_oven_power_kw() -> f64 {
    2.5
}

fn default_bake_hours() -> f64 {
    1.0
}

fn default_extreme_hours() -> usize {
    3
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            gold_path: default_gold_path(),
            default_market: default_market(),
        }
    }
}

impl Default for BakingConfig {
    fn default() -> Self {
        Self {
            oven_power_kw: default_oven_power_kw(),
            bake_hours: default_bake_hours(),
            default_extreme_hours: default_extreme_hours(),
        }
    }
}

impl BakingConfig {
    /// Energy used by one bake, in kWh
    pub fn bake_kwh(&self) -> f64 {
        self.oven_power_kw * self.bake_hours
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("BAKE_ADVISOR").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.data.gold_path.as_os_str().is_empty() {
        anyhow::bail!("data.gold_path cannot be empty");
    }

    if cfg.data.default_market.is_empty() {
        anyhow::bail!("data.default_market cannot be empty");
    }

    if cfg.baking.oven_power_kw <= 0.0 {
        anyhow::bail!(
            "baking.oven_power_kw must be positive, got {}",
            cfg.baking.oven_power_kw
        );
    }

    if cfg.baking.bake_hours <= 0.0 {
        anyhow::bail!(
            "baking.bake_hours must be positive, got {}",
            cfg.baking.bake_hours
        );
    }

    if !(1..=8).contains(&cfg.baking.default_extreme_hours) {
        anyhow::bail!(
            "baking.default_extreme_hours must be within 1..=8, got {}",
            cfg.baking.default_extreme_hours
        );
    }

    match cfg.server.log_format.as_str() {
        "pretty" | "json" => {}
        other => anyhow::bail!("server.log_format must be 'pretty' or 'json', got '{}'", other),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.data.default_market, "netherlands_nl");
        assert_eq!(cfg.baking.default_extreme_hours, 3);
    }

    #[test]
    fn test_bake_kwh_uses_both_constants() {
        let baking = BakingConfig::default();
        assert!((baking.bake_kwh() - 2.5).abs() < f64::EPSILON);

        let baking = BakingConfig {
            oven_power_kw: 3.0,
            bake_hours: 0.5,
            default_extreme_hours: 3,
        };
        assert!((baking.bake_kwh() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_config_rejects_nonpositive_oven_power() {
        let mut cfg = Config::default();
        cfg.baking.oven_power_kw = 0.0;

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("oven_power_kw must be positive"));
    }

    #[test]
    fn test_validate_config_rejects_out_of_range_extreme_hours() {
        let mut cfg = Config::default();
        cfg.baking.default_extreme_hours = 9;

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("1..=8"));
    }

    #[test]
    fn test_validate_config_rejects_unknown_log_format() {
        let mut cfg = Config::default();
        cfg.server.log_format = "yaml".to_string();

        assert!(validate_config(&cfg).is_err());
    }
}
