//! EFA departure monitor client
//!
//! Each operation runs the same pipeline: build the form parameters, POST
//! them to the departure monitor endpoint, decode the XML answer and reject
//! it unless the server identified the stop.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::config::EfaConfig;
use crate::decode::decode;
use crate::error::EfaError;
use crate::models::{Departure, DepartureMonitorResult, Stop};
use crate::request::DepartureMonitorRequest;
use crate::transport::{EfaTransport, ReqwestTransport};

/// Trait for departure monitor clients
#[async_trait]
pub trait DepartureMonitor: Send + Sync {
    /// Resolve a stop name (or id) to exactly one stop
    async fn find_stop(&self, name: &str) -> Result<Stop, EfaError>;

    /// List upcoming departures of a resolved stop, in server order
    async fn departures(&self, stop: &Stop, limit: u32) -> Result<Vec<Departure>, EfaError>;
}

/// EFA client talking to the `XML_DM_REQUEST` endpoint
///
/// Holds no state besides its configuration and transport, so a shared
/// reference can serve concurrent calls.
#[derive(Debug)]
pub struct EfaClient<T = ReqwestTransport> {
    config: EfaConfig,
    transport: T,
}

impl EfaClient<ReqwestTransport> {
    /// Create a client using HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: EfaConfig) -> Result<Self, EfaError> {
        config.validate().map_err(EfaError::Configuration)?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: EfaTransport> EfaClient<T> {
    /// Create a client with a custom transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_transport(config: EfaConfig, transport: T) -> Result<Self, EfaError> {
        config.validate().map_err(EfaError::Configuration)?;
        Ok(Self { config, transport })
    }

    /// The configuration this client was built with
    #[must_use]
    pub const fn config(&self) -> &EfaConfig {
        &self.config
    }

    /// Send a departure monitor request and decode the answer
    ///
    /// The stop state is not checked here.
    ///
    /// # Errors
    ///
    /// Returns a transport error or [`EfaError::MalformedResponse`].
    pub async fn query(
        &self,
        request: &DepartureMonitorRequest,
    ) -> Result<DepartureMonitorResult, EfaError> {
        let url = self.config.departure_monitor_url();
        let fields = request.form_fields();

        debug!(
            %url,
            name = %request.name,
            limit = request.limit,
            "Sending departure monitor request"
        );

        let response = self.transport.post_form(&url, &fields).await?;
        decode(&response.body, response.charset.as_deref())
    }
}

#[async_trait]
impl<T: EfaTransport> DepartureMonitor for EfaClient<T> {
    #[instrument(skip(self))]
    async fn find_stop(&self, name: &str) -> Result<Stop, EfaError> {
        let request = DepartureMonitorRequest::for_stop_name(name);
        let (stop, _) = self.query(&request).await?.into_identified()?;

        debug!(id = stop.id, name = %stop.name, "Stop identified");
        Ok(stop)
    }

    #[instrument(skip(self, stop), fields(stop_id = stop.id))]
    async fn departures(&self, stop: &Stop, limit: u32) -> Result<Vec<Departure>, EfaError> {
        let request = DepartureMonitorRequest::for_stop(stop, limit);
        let (_, departures) = self.query(&request).await?.into_identified()?;

        debug!(count = departures.len(), "Departures received");
        Ok(departures)
    }
}
