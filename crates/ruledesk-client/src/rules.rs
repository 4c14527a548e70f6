use reqwest::Method;
use ruledesk_core::model::{Listing, Rule};

use super::RuleEngineClient;
use crate::error::ClientError;
use crate::{parse_json, parse_optional_json};

const RESOURCE: &str = "rules";

impl RuleEngineClient {
    #[tracing::instrument(skip(self))]
    pub async fn list_rules(&self) -> Result<Vec<Rule>, ClientError> {
        let response = self
            .send(self.request(Method::GET, self.endpoint(RESOURCE)))
            .await?;
        let listing: Listing<Rule> = parse_json(response, "list_rules").await?;
        Ok(listing.into_vec())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, id: &str) -> Result<Rule, ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        let response = self.send(self.request(Method::GET, url)).await?;
        parse_json(response, "get_rule").await
    }

    #[tracing::instrument(skip(self, rule), fields(name = %rule.rule_name))]
    pub async fn create_rule(&self, rule: &Rule) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::POST, self.endpoint(RESOURCE)).json(rule);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    #[tracing::instrument(skip(self, rule), fields(name = %rule.rule_name))]
    pub async fn update_rule(&self, rule: &Rule) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::PUT, self.endpoint(RESOURCE)).json(rule);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    /// Rules are deleted by query parameter rather than path.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::DELETE, self.endpoint(RESOURCE))
            .query(&[("id", id)]);
        self.send(request).await?;
        Ok(())
    }
}
