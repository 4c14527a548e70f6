use reqwest::Method;
use ruledesk_core::model::{Listing, Webhook};

use super::RuleEngineClient;
use crate::error::ClientError;
use crate::{parse_json, parse_optional_json};

const RESOURCE: &str = "webhook";

// Webhooks carry credentials, so payloads are kept out of spans.
impl RuleEngineClient {
    #[tracing::instrument(skip(self))]
    pub async fn list_webhooks(&self) -> Result<Vec<Webhook>, ClientError> {
        let response = self
            .send(self.request(Method::GET, self.endpoint(RESOURCE)))
            .await?;
        let listing: Listing<Webhook> = parse_json(response, "list_webhooks").await?;
        Ok(listing.into_vec())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_webhook(&self, id: &str) -> Result<Webhook, ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        let response = self.send(self.request(Method::GET, url)).await?;
        parse_json(response, "get_webhook").await
    }

    #[tracing::instrument(skip(self, webhook), fields(id = %webhook.id))]
    pub async fn create_webhook(&self, webhook: &Webhook) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::POST, self.endpoint(RESOURCE)).json(webhook);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    #[tracing::instrument(skip(self, webhook), fields(id = %webhook.id))]
    pub async fn update_webhook(&self, webhook: &Webhook) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::PUT, self.endpoint(RESOURCE)).json(webhook);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_webhook(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
