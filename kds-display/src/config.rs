//! Display client configuration

use shared::display::KitchenDisplay;
use std::time::Duration;

/// Everything a display client needs to run its reconciliation loop
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// KDS server HTTP base URL (e.g. `http://localhost:3000`)
    pub server_base_url: String,
    /// KDS event channel address (e.g. `localhost:8081`)
    pub channel_addr: String,
    /// Tenant the display belongs to
    pub tenant_id: String,
    /// Display identity
    pub display_id: String,
    /// Polling cadence of the reconciliation loop
    pub refresh_interval: Duration,
    /// Play an audible alert on each new-order push
    pub sound_alerts: bool,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl DisplayConfig {
    pub fn new(
        server_base_url: impl Into<String>,
        channel_addr: impl Into<String>,
        tenant_id: impl Into<String>,
        display_id: impl Into<String>,
    ) -> Self {
        Self {
            server_base_url: server_base_url.into(),
            channel_addr: channel_addr.into(),
            tenant_id: tenant_id.into(),
            display_id: display_id.into(),
            refresh_interval: Duration::from_secs(5),
            sound_alerts: false,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Apply the admin-managed display record on top of the endpoints
    pub fn with_display(mut self, display: &KitchenDisplay) -> Self {
        self.display_id = display.id.clone();
        self.sound_alerts = display.sound_alerts;
        self.refresh_interval = Duration::from_secs(display.refresh_interval_seconds.max(1));
        self
    }
}
