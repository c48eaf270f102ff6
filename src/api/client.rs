use reqwest::Client;
use thiserror::Error;

use crate::{
    config::ApiConfig,
    domain::{EmailRecord, Verdict},
    messenger::{Messenger, Request},
};

/// Failures talking to the backend. None of these ever reach the end user
/// as raw text; the renderer and chat client translate them.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure or non-success HTTP status.
    #[error("request to classification backend failed")]
    Network(#[source] reqwest::Error),
    /// The backend answered but the body did not match the expected shape.
    #[error("classification backend returned a malformed response")]
    Protocol(#[source] reqwest::Error),
    /// The report endpoint rejected the submission.
    #[error("report submission failed")]
    Report(#[source] reqwest::Error),
}

/// Client for the classify and report endpoints. One blocking exchange per
/// call: no retry, no backoff, no client-side timeout. Scans are manual,
/// user-initiated actions; a failure is reported once and left to the user
/// to re-trigger.
#[derive(Clone)]
pub struct GuardianClient {
    http: Client,
    config: ApiConfig,
    events: Messenger,
}

impl GuardianClient {
    pub fn new(http: Client, config: ApiConfig, events: Messenger) -> Self {
        Self {
            http,
            config,
            events,
        }
    }

    /// Classify one extracted email. On success a stats update is fired
    /// through the messenger; that side channel is fire-and-forget and its
    /// failure never affects the returned verdict.
    pub async fn classify(&self, record: &EmailRecord) -> Result<Verdict, ApiError> {
        let response = self
            .http
            .post(format!("{}/classify", self.config.base_url))
            .json(record)
            .send()
            .await
            .map_err(ApiError::Network)?
            .error_for_status()
            .map_err(ApiError::Network)?;

        let verdict: Verdict = response.json().await.map_err(ApiError::Protocol)?;

        self.events.notify(Request::UpdateStats {
            is_phish: verdict.is_phishing,
        });

        Ok(verdict)
    }

    /// Submit an email to the report endpoint. Any 2xx status is success.
    pub async fn report(&self, record: &EmailRecord) -> Result<(), ApiError> {
        self.http
            .post(format!("{}/report", self.config.base_url))
            .json(record)
            .send()
            .await
            .map_err(ApiError::Report)?
            .error_for_status()
            .map_err(ApiError::Report)?;
        Ok(())
    }
}
