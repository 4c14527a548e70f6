use reqwest::Method;
use ruledesk_core::model::{Listing, SmtpConfig};

use super::RuleEngineClient;
use crate::error::ClientError;
use crate::{parse_json, parse_optional_json};

const RESOURCE: &str = "smtp";

impl RuleEngineClient {
    #[tracing::instrument(skip(self))]
    pub async fn list_smtp_configs(&self) -> Result<Vec<SmtpConfig>, ClientError> {
        let response = self
            .send(self.request(Method::GET, self.endpoint(RESOURCE)))
            .await?;
        let listing: Listing<SmtpConfig> = parse_json(response, "list_smtp_configs").await?;
        Ok(listing.into_vec())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_smtp_config(&self, id: &str) -> Result<SmtpConfig, ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        let response = self.send(self.request(Method::GET, url)).await?;
        parse_json(response, "get_smtp_config").await
    }

    #[tracing::instrument(skip(self, config), fields(name = %config.config_name))]
    pub async fn create_smtp_config(
        &self,
        config: &SmtpConfig,
    ) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::POST, self.endpoint(RESOURCE)).json(config);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    /// `config.id` must be set.
    #[tracing::instrument(skip(self, config), fields(name = %config.config_name))]
    pub async fn update_smtp_config(
        &self,
        config: &SmtpConfig,
    ) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::PUT, self.endpoint(RESOURCE)).json(config);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_smtp_config(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
