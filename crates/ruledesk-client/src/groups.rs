use reqwest::Method;
use ruledesk_core::model::{CreateGroupRequest, Group, Listing, UpdateGroupRulesRequest};

use super::RuleEngineClient;
use crate::error::ClientError;
use crate::{parse_json, parse_optional_json};

const RESOURCE: &str = "group";

impl RuleEngineClient {
    #[tracing::instrument(skip(self))]
    pub async fn list_groups(&self) -> Result<Vec<Group>, ClientError> {
        let response = self
            .send(self.request(Method::GET, self.endpoint(RESOURCE)))
            .await?;
        let listing: Listing<Group> = parse_json(response, "list_groups").await?;
        Ok(listing.into_vec())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_group(&self, id: &str) -> Result<Group, ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        let response = self.send(self.request(Method::GET, url)).await?;
        parse_json(response, "get_group").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_group(
        &self,
        group: &CreateGroupRequest,
    ) -> Result<serde_json::Value, ClientError> {
        let request = self.request(Method::POST, self.endpoint(RESOURCE)).json(group);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    /// Replaces the set of rules assigned to a group.
    #[tracing::instrument(skip(self))]
    pub async fn update_group_rules(
        &self,
        update: &UpdateGroupRulesRequest,
    ) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/", self.endpoint(RESOURCE));
        let request = self.request(Method::PUT, url).json(update);
        Ok(parse_optional_json(self.send(request).await?).await)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_group(&self, id: &str) -> Result<(), ClientError> {
        let url = format!("{}/{}", self.endpoint(RESOURCE), id);
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}
