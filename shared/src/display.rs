//! Kitchen display configuration
//!
//! Externally owned (admin CRUD) and consumed read-only by the KDS core.

use serde::{Deserialize, Serialize};

fn default_refresh_interval() -> u64 {
    5
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_font_size() -> String {
    "medium".to_string()
}

/// Configuration record for a single kitchen display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KitchenDisplay {
    pub id: String,
    pub display_name: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font_size")]
    pub font_size: String,
    /// Play an audible alert on each new-order push
    #[serde(default)]
    pub sound_alerts: bool,
    /// Polling cadence of the display's reconciliation loop
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
}

impl KitchenDisplay {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            theme: default_theme(),
            font_size: default_font_size(),
            sound_alerts: false,
            refresh_interval_seconds: default_refresh_interval(),
        }
    }
}
