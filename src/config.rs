use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::data::Asset;

const DEFAULT_DB_FILE: &str = "crypto_data.db";
const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5006";

/// Process-wide settings, passed explicitly to every component.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub api_base_url: String,
    pub vs_currency: String,
    /// Trailing window requested from the API on every sync.
    pub history_days: u32,
    /// Tracked assets, in the order they are synced.
    pub assets: Vec<Asset>,
    /// Selectable dashboard windows, in days.
    pub durations: Vec<u32>,
    pub default_days: u32,
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub bind_addr: String,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            api_base_url: DEFAULT_API_URL.to_string(),
            vs_currency: "usd".to_string(),
            history_days: 365,
            assets: Asset::ALL.to_vec(),
            durations: vec![7, 30, 180, 365],
            default_days: 7,
            page_size: 10,
            request_timeout_secs: 30,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            debug: true,
        }
    }
}

impl AppConfig {
    /// Build from defaults, an optional TOML file and environment overrides.
    ///
    /// | Env Var | Default | Purpose |
    /// |---------|---------|---------|
    /// | `CRYPTOSIGHT_CONFIG` | (none) | TOML file layered over the defaults |
    /// | `CRYPTOSIGHT_DB` | `crypto_data.db` | SQLite file |
    /// | `CRYPTOSIGHT_API_URL` | CoinGecko v3 | Market data API root |
    /// | `CRYPTOSIGHT_BIND` | `127.0.0.1:5006` | Dashboard listen address |
    /// | `CRYPTOSIGHT_DEBUG` | `true` | Debug-level logging |
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var("CRYPTOSIGHT_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        if let Ok(db) = std::env::var("CRYPTOSIGHT_DB") {
            config.db_path = PathBuf::from(db);
        }
        if let Ok(url) = std::env::var("CRYPTOSIGHT_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(addr) = std::env::var("CRYPTOSIGHT_BIND") {
            config.bind_addr = addr;
        }
        if let Ok(flag) = std::env::var("CRYPTOSIGHT_DEBUG") {
            config.debug = parse_flag(&flag)
                .with_context(|| format!("Invalid CRYPTOSIGHT_DEBUG value: {flag}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.assets.is_empty() {
            bail!("at least one asset must be configured");
        }
        if self.durations.is_empty() {
            bail!("at least one duration must be configured");
        }
        if self.durations.contains(&0) {
            bail!("durations must be positive");
        }
        if !self.durations.contains(&self.default_days) {
            bail!(
                "default_days ({}) must be one of the configured durations {:?}",
                self.default_days,
                self.durations
            );
        }
        if self.page_size == 0 {
            bail!("page_size must be positive");
        }
        if self.history_days == 0 {
            bail!("history_days must be positive");
        }
        Ok(())
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        if self.debug {
            "cryptosight=debug,tower_http=debug"
        } else {
            "cryptosight=info"
        }
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_track_all_assets() {
        let config = AppConfig::default();
        assert_eq!(config.assets.len(), 5);
        assert_eq!(config.durations, vec![7, 30, 180, 365]);
        assert_eq!(config.history_days, 365);
        config.validate().unwrap();
    }

    #[test]
    fn toml_overrides_only_named_fields() {
        let config = AppConfig::from_toml(
            r#"
            db_path = "/tmp/other.db"
            assets = ["bitcoin", "solana"]
            debug = false
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.assets, vec![Asset::Bitcoin, Asset::Solana]);
        assert!(!config.debug);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.log_directive(), "cryptosight=info");
    }

    #[test]
    fn unknown_asset_is_rejected() {
        assert!(AppConfig::from_toml(r#"assets = ["litecoin"]"#).is_err());
    }

    #[test]
    fn default_days_must_be_selectable() {
        let err = AppConfig::from_toml("durations = [30, 90]").unwrap_err();
        assert!(err.to_string().contains("default_days"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        assert!(AppConfig::from_toml("page_size = 0").is_err());
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
