//! HTTP transport for EFA requests

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use crate::config::EfaConfig;
use crate::error::EfaError;

/// Undecoded response of an EFA endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Response body bytes
    pub body: Vec<u8>,
    /// `charset` parameter of the `Content-Type` header
    pub charset: Option<String>,
}

/// Sends form-encoded requests to an EFA server
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EfaTransport: Send + Sync {
    /// POST the form fields to `url` and return the raw response
    async fn post_form(
        &self,
        url: &str,
        fields: &[(&'static str, String)],
    ) -> Result<RawResponse, EfaError>;
}

/// [`EfaTransport`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestTransport {
    /// Create a transport with the timeout and user agent from `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &EfaConfig) -> Result<Self, EfaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| EfaError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    fn map_error(&self, e: &reqwest::Error) -> EfaError {
        if e.is_timeout() {
            EfaError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            EfaError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl EfaTransport for ReqwestTransport {
    #[instrument(skip(self, fields))]
    async fn post_form(
        &self,
        url: &str,
        fields: &[(&'static str, String)],
    ) -> Result<RawResponse, EfaError> {
        let response = self
            .client
            .post(url)
            .form(&fields)
            .send()
            .await
            .map_err(|e| self.map_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EfaError::HttpStatus(status.as_u16()));
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_error(&e))?;

        debug!(bytes = body.len(), ?charset, "Received EFA response");

        Ok(RawResponse {
            body: body.to_vec(),
            charset,
        })
    }
}

/// Extract the `charset` parameter of a `Content-Type` value
fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if name.trim().eq_ignore_ascii_case("charset") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}
