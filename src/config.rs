//! Configuration types.

use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote identity service.
    pub identity_base_url: String,
    /// Per-request timeout for identity service calls.
    pub request_timeout: Duration,
    /// Delay before the terminal states hand off to the host application.
    pub handoff_delay: Duration,
    /// Country preselected in the phone entry step.
    pub default_country: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            identity_base_url: "http://localhost:4000".to_string(),
            request_timeout: Duration::from_secs(10),
            handoff_delay: Duration::from_millis(1500),
            default_country: "US".to_string(),
        }
    }
}
