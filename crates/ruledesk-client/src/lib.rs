use std::sync::Arc;

use anyhow::anyhow;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use ruledesk_core::session::SessionContext;

pub mod actions;
pub mod auth;
pub mod error;
pub mod fields;
pub mod groups;
pub mod meta;
pub mod rules;
pub mod smtp;
pub mod webhooks;

pub use auth::{AuthClient, AuthOutcome};
pub use error::ClientError;
use error::ResponseExt;

const ADMIN_API: &str = "/admin/v1/api";

/// Client for the rule engine's admin API. Every request carries the session's
/// bearer token when there is one; a 401 clears the session.
#[derive(Clone)]
pub struct RuleEngineClient {
    url: String,
    client: reqwest::Client,
    session: Arc<dyn SessionContext>,
}

impl RuleEngineClient {
    pub fn new(url: impl Into<String>, session: Arc<dyn SessionContext>) -> Result<Self, ClientError> {
        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            client: build_http_client()?,
            session,
        })
    }

    fn endpoint(&self, resource: &str) -> String {
        format!("{}{}/{}", self.url, ADMIN_API, resource)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        authorized(self.client.request(method, url), self.session.as_ref())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        send(request, self.session.as_ref()).await
    }
}

pub(crate) fn build_http_client() -> Result<reqwest::Client, ClientError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::CONTENT_TYPE,
        reqwest::header::HeaderValue::from_static("application/json"),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| ClientError::Generic(anyhow!("unable to build http client: {e}")))
}

pub(crate) fn authorized(request: RequestBuilder, session: &dyn SessionContext) -> RequestBuilder {
    match session.token() {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

pub(crate) async fn send(
    request: RequestBuilder,
    session: &dyn SessionContext,
) -> Result<Response, ClientError> {
    let result = request.send().await.map_client_error().await;
    if let Err(ClientError::Unauthorized(_)) = &result {
        tracing::warn!("server rejected credentials, clearing session");
        if let Err(e) = session.clear() {
            tracing::warn!(error = %e, "failed to clear session");
        }
    }
    result
}

pub(crate) async fn parse_json<T: DeserializeOwned>(
    response: Response,
    operation: &str,
) -> Result<T, ClientError> {
    response.json::<T>().await.map_err(|e| {
        ClientError::Generic(anyhow!(
            "unable to parse response from {}: {}",
            operation,
            e.to_string()
        ))
    })
}

/// Mutation responses are informational and may be empty.
pub(crate) async fn parse_optional_json(response: Response) -> serde_json::Value {
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, "unable to read response body");
            return serde_json::Value::Null;
        }
    };
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(&text).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "response body is not json");
        serde_json::Value::Null
    })
}
