//! `social-media healthcheck`: probe the local `/health` endpoint and
//! exit 0 or 1. Used as the container health command.

use reqwest::StatusCode;
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::config;
use crate::error::ConfigurationError;

const TIMEOUT: Duration = Duration::from_secs(2);
const HEALTHY_BODY: &str = "Healthy";

#[derive(Error, Debug)]
pub enum HealthcheckError {
    #[error("Healthcheck failed: {0}")]
    Config(#[from] ConfigurationError),

    #[error("Healthcheck failed: could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Healthcheck failed: request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Healthcheck failed: {url} returned status {status}")]
    Status { url: String, status: StatusCode },

    #[error("Healthcheck failed: {url} answered {body:?}")]
    UnexpectedBody { url: String, body: String },
}

/// Probe the port named by `HTTP_PORT`. No profile is required.
pub async fn healthcheck() -> Result<(), HealthcheckError> {
    let port = config::http_port_from(|key| env::var(key).ok())?;
    healthcheck_with_port(port).await
}

/// Probe `127.0.0.1:<port>/health`. Succeeds only on a 2xx `Healthy` reply.
pub async fn healthcheck_with_port(port: u16) -> Result<(), HealthcheckError> {
    let client = reqwest::Client::builder()
        .timeout(TIMEOUT)
        .build()
        .map_err(HealthcheckError::Client)?;

    let url = format!("http://127.0.0.1:{port}/health");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|source| HealthcheckError::Request {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HealthcheckError::Status { url, status });
    }

    let body = response
        .text()
        .await
        .map_err(|source| HealthcheckError::Request {
            url: url.clone(),
            source,
        })?;
    if body.trim() != HEALTHY_BODY {
        return Err(HealthcheckError::UnexpectedBody { url, body });
    }
    Ok(())
}
