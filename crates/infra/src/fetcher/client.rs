use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::{BearerFetcher, FetchError};

pub const GET_BEARER_QUERY: &str =
    "{ admin { getBearer { token adviseMessage { code description level } } } }";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches full tokens from the admin GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlBearerFetcher {
    client: reqwest::Client,
    url: String,
}

impl GraphqlBearerFetcher {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BearerFetcher for GraphqlBearerFetcher {
    async fn fetch(&self, member_id: &str, authorization: &str) -> Result<String, FetchError> {
        debug!(member_id, url = %self.url, "fetching full token");

        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "query": GET_BEARER_QUERY }))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(member_id, status = status.as_u16(), "full token fetch failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        token_from_response(body)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response shape
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<BearerData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BearerData {
    admin: AdminData,
}

#[derive(Debug, Deserialize)]
struct AdminData {
    #[serde(rename = "getBearer")]
    get_bearer: GetBearer,
}

#[derive(Debug, Deserialize)]
struct GetBearer {
    token: Option<String>,
    #[serde(rename = "adviseMessage", default)]
    advise_message: Option<Vec<AdviseMessage>>,
}

#[derive(Debug, Deserialize)]
struct AdviseMessage {
    code: String,
    description: String,
    #[serde(default)]
    level: Option<String>,
}

/// Any advise message fails the fetch; the first one is reported.
fn token_from_response(body: GraphqlResponse) -> Result<String, FetchError> {
    if let Some(err) = body.errors.first() {
        return Err(FetchError::Decode(err.message.clone()));
    }

    let bearer = body.data.ok_or(FetchError::MissingToken)?.admin.get_bearer;

    if let Some(advise) = bearer.advise_message.unwrap_or_default().into_iter().next() {
        return Err(FetchError::Advise {
            code: advise.code,
            description: advise.description,
            level: advise.level,
        });
    }

    bearer
        .token
        .filter(|t| !t.is_empty())
        .ok_or(FetchError::MissingToken)
}
