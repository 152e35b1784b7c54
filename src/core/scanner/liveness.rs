// src/core/scanner/liveness.rs

use reqwest::redirect::Policy;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::core::config::USER_AGENT;
use crate::core::engine::Probe;
use crate::core::error::ProbeError;
use crate::core::models::{Candidate, ProbeOutcome};

/// Anything that can GET a URL and report the final status code.
pub trait StatusFetcher: Send + Sync + 'static {
    fn fetch_status(&self, url: &str) -> impl Future<Output = Result<u16, ProbeError>> + Send;
}

impl StatusFetcher for reqwest::Client {
    async fn fetch_status(&self, url: &str) -> Result<u16, ProbeError> {
        let response = self
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Http(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

/// Shared client for liveness checks: follows redirects, bounded by `timeout`.
pub fn build_liveness_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(Policy::limited(10))
        .build()
}

/// Confirms a subname that answers `GET http://<name>` with a status below 500.
#[derive(Debug)]
pub struct HttpLivenessProbe<F> {
    fetcher: F,
}

impl<F: StatusFetcher> HttpLivenessProbe<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: StatusFetcher> Probe for HttpLivenessProbe<F> {
    type Finding = String;

    async fn probe(&self, target: &Candidate) -> ProbeOutcome<String> {
        let Candidate::Subname(name) = target else {
            return ProbeOutcome::Errored(ProbeError::Unsupported(target.to_string()));
        };
        let url = format!("http://{name}");
        match self.fetcher.fetch_status(&url).await {
            Ok(status) if status < 500 => {
                debug!(%url, status, "Endpoint is live.");
                ProbeOutcome::Confirmed(name.clone())
            }
            Ok(status) => {
                debug!(%url, status, "Endpoint answered with a server error.");
                ProbeOutcome::Absent
            }
            Err(e) => ProbeOutcome::Errored(e),
        }
    }
}
