use reqwest::Method;
use ruledesk_core::model::DefaultValuesMeta;

use super::RuleEngineClient;
use crate::error::ClientError;
use crate::parse_json;

const RESOURCE: &str = "default-values";

impl RuleEngineClient {
    /// Operator catalogue per value type.
    #[tracing::instrument(skip(self))]
    pub async fn list_default_values_meta(&self) -> Result<DefaultValuesMeta, ClientError> {
        let response = self
            .send(self.request(Method::GET, self.endpoint(RESOURCE)))
            .await?;
        let raw: serde_json::Value = parse_json(response, "list_default_values_meta").await?;
        Ok(DefaultValuesMeta::from_response(&raw))
    }
}
