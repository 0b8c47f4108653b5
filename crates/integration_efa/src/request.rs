//! Departure monitor request parameters

use crate::models::Stop;

/// Result limit used when resolving a stop by name
pub const FIND_STOP_LIMIT: u32 = 5;

/// Form parameters of an `XML_DM_REQUEST`
///
/// The endpoint accepts either a free-text stop name or a numeric stop id
/// in the same `name_dm` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureMonitorRequest {
    /// Stop name or stop id, sent as `name_dm`
    pub name: String,
    /// Maximum number of departures
    pub limit: u32,
}

impl DepartureMonitorRequest {
    /// Request resolving a stop by (part of) its name
    #[must_use]
    pub fn for_stop_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limit: FIND_STOP_LIMIT,
        }
    }

    /// Request listing departures of an already resolved stop
    #[must_use]
    pub fn for_stop(stop: &Stop, limit: u32) -> Self {
        Self {
            name: stop.id.to_string(),
            limit,
        }
    }

    /// Form fields sent in the POST body
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("type_dm", "stop".to_string()),
            ("name_dm", self.name.clone()),
            ("useRealtime", "1".to_string()),
            ("locationServerActive", "1".to_string()),
            ("dmLineSelection", "all".to_string()),
            ("limit", self.limit.to_string()),
            ("mode", "direct".to_string()),
        ]
    }
}
