mod remote;

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

use remote::Remote;

use ruledesk_core::settings::{resolve_settings, write_settings, ConsoleSettings};
use ruledesk_core::{label, normalize_key, parse_free_text_list, parse_key, ValueKind, WireValue};

#[derive(Parser)]
#[command(name = "ruledesk", version, about = "Administer the rule engine from the terminal")]
struct Args {
    /// Auth server base URL (defaults to ~/.ruledesk/settings.json)
    #[arg(long, global = true, env = "RULEDESK_AUTH_SERVER_URL")]
    auth_url: Option<String>,

    /// Rule engine base URL (defaults to ~/.ruledesk/settings.json)
    #[arg(long, global = true, env = "RULEDESK_RULE_ENGINE_URL")]
    rule_engine_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the normalized key of a JSON value
    Key { json: String },
    /// Print the display label of a JSON value
    Label { json: String },
    /// Decode a normalized key into its wire form
    ParseKey { key: String },
    /// Split comma separated text into typed values
    ParseList {
        #[arg(value_parser = parse_kind)]
        kind: ValueKind,
        text: String,
    },
    /// Print the JSON schema of a wire type
    Schema {
        #[arg(value_enum, default_value = "value")]
        target: SchemaTarget,
    },
    /// Show the resolved backend URLs, optionally saving them
    Settings {
        #[arg(long)]
        save: bool,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RULEDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RULEDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show who is signed in
    Whoami,
    /// List a resource from the rule engine
    List {
        #[arg(value_enum)]
        resource: remote::Resource,
        /// Include inactive fields and actions
        #[arg(long)]
        all: bool,
        /// Print raw JSON instead of `id  label` lines
        #[arg(long)]
        json: bool,
    },
    /// Delete a resource by id
    Delete {
        #[arg(value_enum)]
        resource: remote::Resource,
        id: String,
    },
    /// Validate a rule file and save it
    SaveRule {
        file: PathBuf,
        /// Update the rule with this id instead of creating one
        #[arg(long)]
        id: Option<String>,
    },
    /// Show the request a webhook would send, as curl
    PreviewWebhook { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaTarget {
    Value,
    Rule,
    Field,
    Action,
    Group,
    Webhook,
    Smtp,
}

fn parse_kind(raw: &str) -> Result<ValueKind, String> {
    ValueKind::from_declared(raw).ok_or_else(|| {
        let known: Vec<_> = ValueKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown kind `{raw}`, expected one of {}", known.join(", "))
    })
}

fn parse_json_arg(raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("`{raw}` is not valid JSON"))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn schema(target: SchemaTarget) -> schemars::Schema {
    use ruledesk_core::model::{Action, Field, Group, Rule, SmtpConfig, Webhook};
    match target {
        SchemaTarget::Value => schemars::schema_for!(WireValue),
        SchemaTarget::Rule => schemars::schema_for!(Rule),
        SchemaTarget::Field => schemars::schema_for!(Field),
        SchemaTarget::Action => schemars::schema_for!(Action),
        SchemaTarget::Group => schemars::schema_for!(Group),
        SchemaTarget::Webhook => schemars::schema_for!(Webhook),
        SchemaTarget::Smtp => schemars::schema_for!(SmtpConfig),
    }
}

fn settings(args: &Args) -> ConsoleSettings {
    let mut settings = resolve_settings();
    if let Some(url) = args.auth_url.as_ref().filter(|u| !u.trim().is_empty()) {
        settings.auth_server_url = url.clone();
    }
    if let Some(url) = args.rule_engine_url.as_ref().filter(|u| !u.trim().is_empty()) {
        settings.rule_engine_url = url.clone();
    }
    settings
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::try_from_env("RULEDESK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let args = Args::parse();
    let settings = settings(&args);
    tracing::debug!(?settings, "resolved backend urls");

    match args.command {
        Command::Key { json } => println!("{}", normalize_key(&parse_json_arg(&json)?)),
        Command::Label { json } => println!("{}", label(&parse_json_arg(&json)?)),
        Command::ParseKey { key } => {
            let value = parse_key(&key).ok_or_else(|| anyhow!("`{key}` is not a normalized key"))?;
            print_json(&value)?;
        }
        Command::ParseList { kind, text } => {
            let values: Vec<_> = parse_free_text_list(kind, &text).collect();
            print_json(&values)?;
        }
        Command::Schema { target } => print_json(&schema(target))?,
        Command::Settings { save } => {
            if save {
                write_settings(&settings)?;
            }
            print_json(&settings)?;
        }
        Command::Login { email, password } => {
            Remote::new(settings).login(&email, &password).await?
        }
        Command::Signup { email, password } => {
            Remote::new(settings).signup(&email, &password).await?
        }
        Command::Logout => Remote::new(settings).logout().await?,
        Command::Whoami => Remote::new(settings).whoami()?,
        Command::List {
            resource,
            all,
            json,
        } => Remote::new(settings).list(resource, all, json).await?,
        Command::Delete { resource, id } => Remote::new(settings).delete(resource, &id).await?,
        Command::SaveRule { file, id } => Remote::new(settings).save_rule(&file, id).await?,
        Command::PreviewWebhook { id } => Remote::new(settings).preview_webhook(&id).await?,
    }
    Ok(())
}
