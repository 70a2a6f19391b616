//! Transport used by the screen controllers to reach the JSON API.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("resource not found")]
    NotFound,

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Sends one JSON request. `Ok(None)` means the server answered 204.
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError>;
}

/// [`CrmApi`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CrmApi for HttpApi {
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method.clone(), &url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            tracing::error!(%method, %url, "API call failed: {err}");
            ApiError::from(err)
        })?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            status if !status.is_success() => {
                tracing::error!(%method, %url, status = status.as_u16(), "API call rejected");
                Err(ApiError::Status(status.as_u16()))
            }
            _ => Ok(Some(response.json::<Value>().await?)),
        }
    }
}
