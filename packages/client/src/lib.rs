#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the worm watch API, plus the small projections a
//! front end needs on top of it: heatmap points and the season banner.

pub mod heatmap;
pub mod season;

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use worm_watch_server_models::{
    ApiCreatedReport, ApiDeleteParams, ApiDeleteResult, ApiError, ApiNewReport, ApiReport,
    ApiStats,
};

pub use heatmap::{HeatmapPoint, to_heatmap_points};
pub use season::{SeasonStatus, is_first_year};

/// Base URL used when `WORM_WATCH_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Errors returned by [`ApiClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The server's `error` message, or the raw body.
        message: String,
    },
}

impl ClientError {
    /// HTTP status of an [`ClientError::Api`] error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(_) | Self::Json(_) => None,
        }
    }
}

/// Thin wrapper around the worm watch REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Creates a client for `WORM_WATCH_API_URL`, or [`DEFAULT_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ClientError> {
        let url =
            std::env::var("WORM_WATCH_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&url)
    }

    /// The API root this client sends requests to, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/reports`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the server rejects it.
    pub async fn get_reports(&self) -> Result<Vec<ApiReport>, ClientError> {
        let resp = self.client.get(self.url("/api/reports")).send().await?;
        read(resp).await
    }

    /// `POST /api/reports`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 400 or 429 when the server
    /// rejects the submission.
    pub async fn submit_report(&self, report: &ApiNewReport) -> Result<ApiCreatedReport, ClientError> {
        let resp = self
            .client
            .post(self.url("/api/reports"))
            .json(report)
            .send()
            .await?;
        read(resp).await
    }

    /// `GET /api/stats`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the server rejects it.
    pub async fn get_stats(&self) -> Result<ApiStats, ClientError> {
        let resp = self.client.get(self.url("/api/stats")).send().await?;
        read(resp).await
    }

    /// `DELETE /api/admin/reports`
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] with status 401 for a bad secret.
    pub async fn delete_reports(
        &self,
        secret: &str,
        filter: &ApiDeleteParams,
    ) -> Result<ApiDeleteResult, ClientError> {
        let resp = self
            .client
            .delete(self.url("/api/admin/reports"))
            .header(ADMIN_SECRET_HEADER, secret)
            .query(filter)
            .send()
            .await?;
        read(resp).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.text().await?;
    decode(status, &body)
}

fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ClientError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ApiError>(body)
            .map_or_else(|_| format!("HTTP {status}: {body}"), |e| e.error);
        log::debug!("API request failed with {status}: {message}");
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ApiClient::new("http://example.test:8080/").unwrap();
        assert_eq!(client.base_url(), "http://example.test:8080");
        assert_eq!(client.url("/api/stats"), "http://example.test:8080/api/stats");
    }

    #[test]
    fn decode_reads_success_body() {
        let created: ApiCreatedReport = decode(
            StatusCode::CREATED,
            r#"{"id": 7, "created_at": "2026-06-01T12:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(created.id, 7);
    }

    #[test]
    fn decode_surfaces_server_error_message() {
        let err = decode::<ApiCreatedReport>(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": "Too many reports. Please wait before submitting again."}"#,
        )
        .unwrap_err();

        assert_eq!(err.status(), Some(429));
        assert!(matches!(
            err,
            ClientError::Api { ref message, .. } if message.starts_with("Too many reports")
        ));
    }

    #[test]
    fn decode_falls_back_to_raw_body() {
        let err = decode::<ApiStats>(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();

        assert!(matches!(
            err,
            ClientError::Api { status: 502, ref message } if message.contains("upstream down")
        ));
    }

    #[test]
    fn decode_rejects_unexpected_json() {
        let err = decode::<ApiStats>(StatusCode::OK, "[]").unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }
}
