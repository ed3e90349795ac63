//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Fleet API settings
    pub api: ApiConfig,
    /// Display settings
    pub display: DisplayConfig,
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the fleet API (overridden by FLEET_API_URL)
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 10,
        }
    }
}

/// Display-related settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Initial rows per page (0 = all rows on one page)
    pub page_size: usize,
    /// Page sizes the pager cycles through; 0 means "all"
    pub page_size_options: Vec<usize>,
    /// Text shown for null cells
    pub null_indicator: String,
    /// Minimum column width
    pub min_column_width: u16,
    /// Maximum column width
    pub max_column_width: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            page_size_options: vec![10, 25, 50, 100, 0],
            null_indicator: "-".to_string(),
            min_column_width: 4,
            max_column_width: 40,
        }
    }
}
