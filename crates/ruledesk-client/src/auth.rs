use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};

use ruledesk_core::adapter::pick_token;
use ruledesk_core::session::{Session, SessionContext};

use crate::error::ClientError;
use crate::{authorized, build_http_client, parse_optional_json, send};

/// What the auth server answered to a login or signup.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    pub token: Option<String>,
    pub user: Option<Value>,
    pub raw: Value,
}

impl AuthOutcome {
    fn from_response(raw: Value) -> Self {
        AuthOutcome {
            token: pick_token(&raw),
            user: raw.get("user").filter(|u| !u.is_null()).cloned(),
            raw,
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    /// The server expects the password base64 encoded.
    password: String,
}

impl<'a> Credentials<'a> {
    fn new(email: &'a str, password: &str) -> Self {
        Credentials {
            email,
            password: STANDARD.encode(password),
        }
    }
}

#[derive(Clone)]
pub struct AuthClient {
    url: String,
    client: reqwest::Client,
    session: Arc<dyn SessionContext>,
}

impl AuthClient {
    pub fn new(url: impl Into<String>, session: Arc<dyn SessionContext>) -> Result<Self, ClientError> {
        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            client: build_http_client()?,
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/{}", self.url, path)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<Value, ClientError> {
        let request = authorized(
            self.client.request(Method::POST, self.endpoint(path)),
            self.session.as_ref(),
        )
        .json(body);
        let response = send(request, self.session.as_ref()).await?;
        Ok(parse_optional_json(response).await)
    }

    /// Signs in and stores the returned token in the session. When the server
    /// does not describe the user, the email is remembered instead.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, ClientError> {
        let raw = self.post("login", &Credentials::new(email, password)).await?;
        let outcome = AuthOutcome::from_response(raw);
        self.remember(email, &outcome)?;
        Ok(outcome)
    }

    /// Creates an account. The server does not sign the user in, but a token
    /// in the answer is stored all the same.
    #[tracing::instrument(skip(self, password))]
    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthOutcome, ClientError> {
        let raw = self.post("signup", &Credentials::new(email, password)).await?;
        let outcome = AuthOutcome::from_response(raw);
        if outcome.token.is_some() {
            self.remember(email, &outcome)?;
        }
        Ok(outcome)
    }

    /// Revokes the server side credentials. The local session is cleared even
    /// when the server call fails.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self, email: &str) -> Result<Value, ClientError> {
        let result = self.post("logout", &json!({ "email": email })).await;
        self.session
            .clear()
            .map_err(|e| ClientError::Generic(e.into()))?;
        result
    }

    fn remember(&self, email: &str, outcome: &AuthOutcome) -> Result<(), ClientError> {
        let Some(token) = outcome.token.clone() else {
            tracing::warn!("auth server answered without a token");
            return Ok(());
        };
        let user = outcome
            .user
            .clone()
            .unwrap_or_else(|| json!({ "email": email }));
        self.session
            .set(Session {
                token: Some(token),
                user: Some(user),
            })
            .map_err(|e| ClientError::Generic(e.into()))
    }
}
