use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::query::Query;

/// Report endpoint of the Metrika Stat API.
pub const ENDPOINT: &str = "https://api-metrika.yandex.ru/stat/v1/data.json";

/// Error type the provider returns when a query spans too much data to
/// evaluate. The code is matched literally; any other code is fatal.
const QUERY_TOO_COMPLEX: &str = "query_error";

/// One result entry: dimension objects in the order requested, metric values
/// in the order of the `metrics` parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEntry {
    pub dimensions: Vec<HashMap<String, Value>>,
    pub metrics: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub error_type: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// The two body shapes the provider produces.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse {
    Success { data: Vec<ApiEntry> },
    Failure { errors: Vec<ApiError> },
}

/// Whether an error payload contains the recoverable "query too complex"
/// code. Recovery (splitting the period) is the request processor's job.
pub fn contains_too_complex(errors: &[ApiError]) -> bool {
    errors.iter().any(|e| e.error_type == QUERY_TOO_COMPLEX)
}

/// Fatal provider failure, carrying the originating query and the raw error
/// payload for diagnosis.
#[derive(Debug, Error)]
#[error("analytics query failed: {}", describe(.errors))]
pub struct ProviderQueryError {
    pub query: Query,
    pub errors: Vec<ApiError>,
}

fn describe(errors: &[ApiError]) -> String {
    let descriptions: Vec<String> = errors
        .iter()
        .map(|e| match &e.message {
            Some(message) => format!("{} ({})", e.error_type, message),
            None => e.error_type.clone(),
        })
        .collect();
    descriptions.join("; ")
}

/// Executes one analytics query against the provider.
///
/// Implementations do not retry and do not interpret error payloads; both are
/// the caller's responsibility.
pub trait AnalyticsApi {
    fn execute(&self, query: &Query) -> Result<ApiResponse>;
}

/// Blocking HTTP client for the Metrika Stat API.
pub struct MetrikaClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl MetrikaClient {
    /// The token is an opaque OAuth credential obtained out-of-band.
    pub fn new(token: String) -> Self {
        MetrikaClient {
            http: Client::new(),
            endpoint: ENDPOINT.to_string(),
            token,
        }
    }

    pub fn with_endpoint(token: String, endpoint: String) -> Self {
        MetrikaClient {
            http: Client::new(),
            endpoint,
            token,
        }
    }
}

impl AnalyticsApi for MetrikaClient {
    fn execute(&self, query: &Query) -> Result<ApiResponse> {
        let params: Vec<(&str, &str)> = query.iter().collect();
        log::debug!("GET {} {:?}", self.endpoint, params);

        // The provider wants the token both as a parameter and as a header.
        let response = self
            .http
            .get(&self.endpoint)
            .query(&params)
            .query(&[("oauth_token", self.token.as_str())])
            .header(
                reqwest::header::AUTHORIZATION,
                format!("OAuth {}", self.token),
            )
            .send()
            .context("Failed to send analytics request")?;

        response
            .json()
            .context("Failed to parse analytics response")
    }
}
