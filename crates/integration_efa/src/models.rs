//! EFA data models
//!
//! Typed representations of the stop, departure and line data carried by an
//! EFA departure monitor response.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::EfaError;

/// Wire token the server uses for a uniquely identified stop
pub const IDENTIFIED: &str = "identified";

/// Stop identification state reported by the server
///
/// Only [`IDENTIFIED`] is known to mean success. The server uses further
/// tokens (e.g. `list`, `notidentified`) that are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StopState {
    /// The name or id resolved to exactly one stop
    Identified,
    /// Any other state: not found, ambiguous, or something undocumented
    Other(String),
}

impl StopState {
    /// Whether the stop can be used for further requests
    #[must_use]
    pub const fn is_identified(&self) -> bool {
        matches!(self, Self::Identified)
    }

    /// The state token as sent by the server
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Identified => IDENTIFIED,
            Self::Other(state) => state,
        }
    }
}

impl From<String> for StopState {
    fn from(state: String) -> Self {
        if state == IDENTIFIED {
            Self::Identified
        } else {
            Self::Other(state)
        }
    }
}

impl From<&str> for StopState {
    fn from(state: &str) -> Self {
        Self::from(state.to_string())
    }
}

impl From<StopState> for String {
    fn from(state: StopState) -> Self {
        match state {
            StopState::Identified => IDENTIFIED.to_string(),
            StopState::Other(state) => state,
        }
    }
}

impl fmt::Display for StopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transit stop as resolved by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    /// Human-readable stop name
    pub name: String,
    /// Stop identifier, usable as query value in later requests
    pub id: u64,
    /// Server-reported confidence of the name match
    pub match_quality: i64,
    /// Identification state
    pub state: StopState,
}

impl Stop {
    /// Create an identified stop
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id,
            match_quality: 0,
            state: StopState::Identified,
        }
    }

    /// Set the match quality
    #[must_use]
    pub const fn with_match_quality(mut self, match_quality: i64) -> Self {
        self.match_quality = match_quality;
        self
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Routing metadata of a departure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Line designator (e.g. "3", "N71", "RE 9")
    pub number: String,
    /// Destination or direction text
    pub direction: String,
}

/// Scheduled date and time of a departure, as reported by the server
///
/// Fields are passed through without validation; use
/// [`ScheduledAt::to_naive_date_time`] to get a checked value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledAt {
    /// Day of month
    pub day: u32,
    /// Month (1-12)
    pub month: u32,
    /// Year
    pub year: i32,
    /// Hour (0-23)
    pub hour: u32,
    /// Minute (0-59)
    pub minute: u32,
}

impl ScheduledAt {
    /// Convert into a calendar date/time, if the fields form a valid one
    #[must_use]
    pub fn to_naive_date_time(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?.and_hms_opt(
            self.hour,
            self.minute,
            0,
        )
    }
}

impl fmt::Display for ScheduledAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

/// A single departure event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    /// Minutes until departure
    pub countdown: i64,
    /// Platform designation, possibly empty
    pub platform: String,
    /// Scheduled date and time
    pub scheduled_at: ScheduledAt,
    /// Serving line
    pub line: Line,
}

impl Departure {
    /// Human-readable countdown, e.g. "due in 4 minutes"
    #[must_use]
    pub fn due_text(&self) -> String {
        let plural = if self.countdown == 1 { "" } else { "s" };
        format!("due in {} minute{plural}", self.countdown)
    }
}

impl fmt::Display for Departure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} --> {}",
            self.line.number,
            self.due_text(),
            self.line.direction
        )
    }
}

/// Decoded departure monitor response: the stop block and its departures
///
/// Departures keep the order in which the server listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureMonitorResult {
    /// Stop the server resolved the query to
    pub stop: Stop,
    /// Departures in server order
    pub departures: Vec<Departure>,
}

impl DepartureMonitorResult {
    /// Reject the result unless the stop was identified
    ///
    /// # Errors
    ///
    /// Returns [`EfaError::StopNotResolved`] for any state other than
    /// `identified`. The departures are discarded in that case.
    pub fn into_identified(self) -> Result<(Stop, Vec<Departure>), EfaError> {
        match self.stop.state {
            StopState::Identified => Ok((self.stop, self.departures)),
            StopState::Other(state) => Err(EfaError::StopNotResolved { state }),
        }
    }
}
