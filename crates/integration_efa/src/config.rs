//! EFA provider configuration

use serde::{Deserialize, Serialize};

/// Static configuration of an EFA provider
///
/// Endpoint paths are appended to `base_url` verbatim, so the base URL
/// is expected to end with a slash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EfaConfig {
    /// Base URL of the EFA installation
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the departure monitor endpoint
    #[serde(default = "default_departure_monitor_endpoint")]
    pub departure_monitor_endpoint: String,

    /// Path of the stop finder endpoint (reserved)
    #[serde(default = "default_stop_finder_endpoint")]
    pub stop_finder_endpoint: String,

    /// Path of the trip request endpoint (reserved)
    #[serde(default = "default_trip_endpoint")]
    pub trip_endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://efa.avv-augsburg.de/avv/".to_string()
}

fn default_departure_monitor_endpoint() -> String {
    "XML_DM_REQUEST".to_string()
}

fn default_stop_finder_endpoint() -> String {
    "XML_STOPFINDER_REQUEST".to_string()
}

fn default_trip_endpoint() -> String {
    "XML_TRIP_REQUEST".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("efa-departures/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for EfaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            departure_monitor_endpoint: default_departure_monitor_endpoint(),
            stop_finder_endpoint: default_stop_finder_endpoint(),
            trip_endpoint: default_trip_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl EfaConfig {
    /// Create a configuration pointing at the given base URL
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            base_url: "http://127.0.0.1:1/".to_string(),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Full URL of the departure monitor endpoint
    #[must_use]
    pub fn departure_monitor_url(&self) -> String {
        format!("{}{}", self.base_url, self.departure_monitor_endpoint)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.departure_monitor_endpoint.trim().is_empty() {
            return Err("departure_monitor_endpoint must not be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}
