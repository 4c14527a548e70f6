//! Commands that talk to the auth server or the rule engine.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

use ruledesk_client::{AuthClient, ClientError, RuleEngineClient};
use ruledesk_core::adapter::{self, PLACEHOLDER};
use ruledesk_core::form::{FormEvent, FormState, RuleDraft};
use ruledesk_core::model::Rule;
use ruledesk_core::session::{FileSession, SessionContext};
use ruledesk_core::settings::ConsoleSettings;

use crate::print_json;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Resource {
    Fields,
    Actions,
    Groups,
    Webhooks,
    Smtp,
    Rules,
    /// Operators offered per value type
    Operators,
}

fn failed(e: ClientError) -> anyhow::Error {
    match e {
        ClientError::Unauthorized(_) => anyhow!("{}; run `ruledesk login`", e.user_message()),
        other => anyhow!(other.user_message()),
    }
}

/// Backend handles built from the resolved settings and the on-disk session.
pub struct Remote {
    settings: ConsoleSettings,
    session: Arc<dyn SessionContext>,
}

impl Remote {
    pub fn new(settings: ConsoleSettings) -> Self {
        Remote {
            settings,
            session: Arc::new(FileSession::default_location()),
        }
    }

    fn auth(&self) -> anyhow::Result<AuthClient> {
        AuthClient::new(self.settings.auth_server_url.as_str(), self.session.clone()).map_err(failed)
    }

    fn engine(&self) -> anyhow::Result<RuleEngineClient> {
        RuleEngineClient::new(self.settings.rule_engine_url.as_str(), self.session.clone())
            .map_err(failed)
    }

    pub async fn login(&self, email: &str, password: &str) -> anyhow::Result<()> {
        let outcome = self.auth()?.login(email, password).await.map_err(failed)?;
        if outcome.token.is_none() {
            bail!("the auth server did not return a token");
        }
        eprintln!("signed in as {email}");
        Ok(())
    }

    pub async fn signup(&self, email: &str, password: &str) -> anyhow::Result<()> {
        let outcome = self.auth()?.signup(email, password).await.map_err(failed)?;
        print_json(&outcome.raw)
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        let email =
            signed_in_email(self.session.as_ref()).ok_or_else(|| anyhow!("not signed in"))?;
        self.auth()?.logout(&email).await.map_err(failed)?;
        eprintln!("signed out");
        Ok(())
    }

    pub fn whoami(&self) -> anyhow::Result<()> {
        if !self.session.is_authenticated() {
            bail!("not signed in");
        }
        let who = self
            .session
            .user()
            .and_then(|user| adapter::first_text(&user, &["email", "userId", "name"]))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        println!("{who}");
        Ok(())
    }

    pub async fn list(&self, resource: Resource, all: bool, json: bool) -> anyhow::Result<()> {
        list(&self.engine()?, resource, all, json).await
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> anyhow::Result<()> {
        delete(&self.engine()?, resource, id).await?;
        eprintln!("deleted {id}");
        Ok(())
    }

    pub async fn save_rule(&self, file: &Path, id: Option<String>) -> anyhow::Result<()> {
        save_rule(&self.engine()?, file, id).await
    }

    pub async fn preview_webhook(&self, id: &str) -> anyhow::Result<()> {
        let webhook = self.engine()?.get_webhook(id).await.map_err(failed)?;
        println!("{}", webhook.preview_request().to_curl());
        Ok(())
    }
}

fn signed_in_email(session: &dyn SessionContext) -> Option<String> {
    session
        .user()
        .and_then(|user| adapter::first_text(&user, &["email", "userId"]))
}

fn print_rows<T: Serialize>(items: &[T], json: bool, label: fn(&Value) -> String) -> anyhow::Result<()> {
    if json {
        return print_json(&items);
    }
    for item in items {
        let record = serde_json::to_value(item)?;
        let id = adapter::first_text(&record, &["id"]).unwrap_or_else(|| PLACEHOLDER.to_string());
        println!("{id}\t{}", label(&record));
    }
    Ok(())
}

fn rule_label(record: &Value) -> String {
    adapter::first_text(record, &["rule_name"]).unwrap_or_else(|| PLACEHOLDER.to_string())
}

async fn list(
    client: &RuleEngineClient,
    resource: Resource,
    all: bool,
    json: bool,
) -> anyhow::Result<()> {
    match resource {
        Resource::Fields => {
            let mut fields = client.list_fields().await.map_err(failed)?;
            fields.retain(|f| all || f.is_active());
            print_rows(&fields, json, adapter::field_label)
        }
        Resource::Actions => {
            let mut actions = client.list_actions().await.map_err(failed)?;
            actions.retain(|a| all || a.is_active());
            print_rows(&actions, json, adapter::action_label)
        }
        Resource::Groups => {
            let groups = client.list_groups().await.map_err(failed)?;
            print_rows(&groups, json, adapter::group_name)
        }
        Resource::Webhooks => {
            let webhooks = client.list_webhooks().await.map_err(failed)?;
            print_rows(&webhooks, json, adapter::webhook_label)
        }
        Resource::Smtp => {
            let configs = client.list_smtp_configs().await.map_err(failed)?;
            print_rows(&configs, json, adapter::smtp_label)
        }
        Resource::Rules => {
            let rules = client.list_rules().await.map_err(failed)?;
            print_rows(&rules, json, rule_label)
        }
        Resource::Operators => {
            let meta = client.list_default_values_meta().await.map_err(failed)?;
            if json {
                return print_json(&meta);
            }
            let mut types: Vec<_> = meta.type_operator_mapping.keys().collect();
            types.sort();
            for value_type in types {
                println!("{value_type}\t{}", meta.operators(value_type).join(", "));
            }
            Ok(())
        }
    }
}

async fn delete(client: &RuleEngineClient, resource: Resource, id: &str) -> anyhow::Result<()> {
    let result = match resource {
        Resource::Fields => client.delete_field(id).await,
        Resource::Actions => client.delete_action(id).await,
        Resource::Groups => client.delete_group(id).await,
        Resource::Webhooks => client.delete_webhook(id).await,
        Resource::Smtp => client.delete_smtp_config(id).await,
        Resource::Rules => client.delete_rule(id).await,
        Resource::Operators => bail!("operators are read-only"),
    };
    result.map_err(failed)
}

/// Runs a rule file through the editor's create/edit flow so it gets the same
/// checks as the console before it is sent.
async fn save_rule(
    client: &RuleEngineClient,
    file: &Path,
    id: Option<String>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let rule: Rule = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a rule definition", file.display()))?;
    let draft = RuleDraft::from_rule(&rule);

    let opened = match id {
        Some(id) => FormState::<RuleDraft>::Viewing.reduce(FormEvent::StartEdit { id, draft })?,
        None => FormState::<RuleDraft>::Viewing.reduce(FormEvent::StartCreate(draft))?,
    };
    let state = opened.reduce(FormEvent::Submit)?;
    if let Some(error) = state.error() {
        bail!("{error}");
    }
    let (editing, payload) = match state.submission() {
        Some((id, draft)) => (id.map(str::to_string), draft.to_payload(id)),
        None => bail!("rule was not submitted"),
    };

    let result = match editing {
        Some(_) => client.update_rule(&payload).await,
        None => client.create_rule(&payload).await,
    };
    match result {
        Ok(answer) => {
            state.reduce(FormEvent::Saved)?;
            if !answer.is_null() {
                print_json(&answer)?;
            }
            Ok(())
        }
        Err(e) => {
            let message = e.user_message();
            let state = state.reduce(FormEvent::Failed(message.clone()))?;
            tracing::debug!(state = state.name(), "rule save failed");
            Err(failed(e))
        }
    }
}
