//! Configuration module for fleetadmin.
//!
//! Handles loading and managing configuration from:
//! - Default values
//! - Config file (~/.config/fleetadmin/config.toml)
//! - Environment variables

mod schema;

pub use schema::{ApiConfig, Config, DisplayConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Returns the config directory path.
///
/// Checks `FLEETADMIN_CONFIG_DIR` environment variable first, then falls
/// back to the system default (~/.config/fleetadmin on Linux/macOS).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("FLEETADMIN_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join("fleetadmin"))
}

/// Returns the default config file path (~/.config/fleetadmin/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Returns the log file path (~/.config/fleetadmin/fleetadmin.log).
/// The console owns the terminal, so logs go to a file instead.
pub fn log_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("fleetadmin.log"))
}

/// Load configuration from the default path or return defaults
pub fn load_config() -> Result<Config> {
    if let Some(path) = config_path() {
        if path.exists() {
            return load_config_from(&path);
        }
    }
    Ok(Config::default())
}

/// Load configuration from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.display.page_size, 25);
        assert!(config.display.page_size_options.contains(&0));
        assert!(config.api.base_url.is_none());
    }

    #[test]
    fn test_config_paths() {
        if let (Some(dir), Some(cfg), Some(log)) = (config_dir(), config_path(), log_path()) {
            assert!(cfg.starts_with(&dir));
            assert!(log.starts_with(&dir));
            assert!(cfg.ends_with("config.toml"));
            assert!(log.ends_with("fleetadmin.log"));
        }
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[display]
page_size = 50
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.display.page_size, 50);
        // Other fields should be default
        assert_eq!(config.display.null_indicator, Config::default().display.null_indicator);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://fleet.local/api\"").unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("http://fleet.local/api"));
    }

    #[test]
    fn test_load_config_from_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not toml [ at all").unwrap();
        assert!(load_config_from(file.path()).is_err());
    }
}
