use reqwest::Method;
use ruledesk_core::model::{Action, Listing};

use super::RuleEngineClient;
use crate::error::ClientError;
use crate::{parse_json, parse_optional_json};

const RESOURCE: &str = "actions";

impl RuleEngineClient {
    #[tracing::instrument(skip(self))]
    pub async fn list_actions(&self) -> Result<Vec<Action>, ClientError> {
        let response = self
            .send(self.request(Method::GET, self.endpoint(RESOURCE)))
            .await?;
        let listing: Listing<Action> = parse_json(response, "list_actions").await?;
        Ok(listing.into_vec())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_action(&self, id: &str) -> Result<Action, ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        let response = self.send(self.request(Method::GET, url)).await?;
        parse_json(response, "get_action").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_action(&self, action: &Action) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::POST, self.endpoint(RESOURCE)).json(action);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    /// Unlike the other resources, actions are updated at `/{id}`.
    #[tracing::instrument(skip(self))]
    pub async fn update_action(
        &self,
        id: &str,
        action: &Action,
    ) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        let request = self.request(Method::PUT, url).json(action);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_action(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
