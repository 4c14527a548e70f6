use reqwest::Method;
use ruledesk_core::model::{Field, Listing};

use super::RuleEngineClient;
use crate::error::ClientError;
use crate::{parse_json, parse_optional_json};

const RESOURCE: &str = "fields";

impl RuleEngineClient {
    /// All fields, including inactive ones; filter with `Field::is_active`.
    #[tracing::instrument(skip(self))]
    pub async fn list_fields(&self) -> Result<Vec<Field>, ClientError> {
        let response = self
            .send(self.request(Method::GET, self.endpoint(RESOURCE)))
            .await?;
        let listing: Listing<Field> = parse_json(response, "list_fields").await?;
        Ok(listing.into_vec())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_field(&self, id: &str) -> Result<Field, ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        let response = self.send(self.request(Method::GET, url)).await?;
        parse_json(response, "get_field").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_field(&self, field: &Field) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::POST, self.endpoint(RESOURCE)).json(field);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    /// The backend replaces the whole record; `field.id` selects it.
    #[tracing::instrument(skip(self))]
    pub async fn update_field(&self, field: &Field) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::PUT, self.endpoint(RESOURCE)).json(field);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_field(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
