//! EFA departure monitor client
//!
//! Client for the departure monitor of EFA (Elektronische Fahrplanauskunft)
//! installations such as the one of the Augsburger Verkehrs- und Tarifverbund.
//! Given a stop name or id it resolves the stop and lists its upcoming
//! departures.
//!
//! # Architecture
//!
//! A call is a pipeline of independently usable steps:
//! [`DepartureMonitorRequest`] builds the form parameters, an [`EfaTransport`]
//! sends them ([`ReqwestTransport`] over HTTP), [`decode`] maps the XML answer
//! (in whatever charset it declares) onto [`DepartureMonitorResult`], and
//! [`DepartureMonitorResult::into_identified`] rejects every stop state other
//! than `identified`. [`EfaClient`] wires the steps together behind the
//! [`DepartureMonitor`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_efa::{DepartureMonitor, EfaClient, EfaConfig};
//!
//! let client = EfaClient::new(EfaConfig::default())?;
//!
//! let stop = client.find_stop("Königsplatz").await?;
//! for departure in client.departures(&stop, 5).await? {
//!     println!("{} {}", departure.line.number, departure.due_text());
//! }
//! ```

mod client;
mod config;
mod decode;
mod error;
mod models;
mod request;
mod transport;

pub use client::{DepartureMonitor, EfaClient};
pub use config::EfaConfig;
pub use decode::decode;
pub use error::EfaError;
pub use models::{
    Departure, DepartureMonitorResult, IDENTIFIED, Line, ScheduledAt, Stop, StopState,
};
pub use request::{DepartureMonitorRequest, FIND_STOP_LIMIT};
pub use transport::{EfaTransport, RawResponse, ReqwestTransport};
