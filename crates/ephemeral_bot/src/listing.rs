//! Client for the bot listing service.

use crate::ListingConfig;
use ephemeral_error::HttpError;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct ServerCount {
    server_count: usize,
}

/// Posts the bot's guild count to the listing service.
#[derive(Debug, Clone)]
pub struct ListingClient {
    http: reqwest::Client,
    config: ListingConfig,
}

impl ListingClient {
    /// Creates a client for the given credentials.
    pub fn new(config: ListingConfig) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HttpError::new(format!("Failed to build listing client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Endpoint that receives the stats update.
    pub fn stats_url(&self) -> String {
        format!("{}/bots/{}/stats", self.config.base_url, self.config.bot_id)
    }

    /// Reports the current guild count.
    #[instrument(skip(self), fields(bot_id = %self.config.bot_id))]
    pub async fn post_server_count(&self, count: usize) -> Result<(), HttpError> {
        let response = self
            .http
            .post(self.stats_url())
            .header(AUTHORIZATION, &self.config.token)
            .json(&ServerCount {
                server_count: count,
            })
            .send()
            .await
            .map_err(|e| HttpError::new(format!("Listing update failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::with_status(
                status.as_u16(),
                format!("Listing service rejected update: {body}"),
            ));
        }

        debug!(count, "Listing service updated");
        Ok(())
    }
}
