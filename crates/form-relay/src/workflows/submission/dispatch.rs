use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::{info, warn};

use super::repository::{DispatchError, DispatchEvent, DispatchPublisher};
use crate::config::DispatchConfig;

/// Blocking webhook client posting dispatch events to the build system.
///
/// Must not be driven from inside an async task; the router hands
/// submissions to `spawn_blocking` before they reach this client.
#[derive(Debug)]
pub struct HttpDispatchPublisher {
    client: Client,
    url: Option<String>,
    token: Option<String>,
}

impl HttpDispatchPublisher {
    pub fn from_config(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| DispatchError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
        })
    }

    /// Builds the client on the blocking pool. The blocking client spins up and
    /// tears down its own runtime, which panics on an async worker thread.
    pub async fn spawn_from_config(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::from_config(&config))
            .await
            .map_err(|err| DispatchError::Transport(err.to_string()))?
    }

    fn target(&self) -> Result<(&str, &str), DispatchError> {
        let url = self
            .url
            .as_deref()
            .ok_or(DispatchError::NotConfigured { setting: "url" })?;
        let token = self
            .token
            .as_deref()
            .ok_or(DispatchError::NotConfigured { setting: "token" })?;
        Ok((url, token))
    }
}

impl DispatchPublisher for HttpDispatchPublisher {
    fn verify(&self) -> Result<(), DispatchError> {
        self.target().map(|_| ())
    }

    fn publish(&self, event: &DispatchEvent) -> Result<(), DispatchError> {
        let (url, token) = self.target()?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("form-relay/", env!("CARGO_PKG_VERSION")))
            .json(event)
            .send()
            .map_err(|err| DispatchError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(status = status.as_u16(), %body, "dispatch endpoint rejected event");
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            event_type = %event.event_type,
            case_id = %event.client_payload.complaint_id,
            status = status.as_u16(),
            "dispatch accepted"
        );
        Ok(())
    }
}
