use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{data_dir, write_atomic, CoreError};

pub const AUTH_SERVER_URL_ENV: &str = "RULEDESK_AUTH_SERVER_URL";
pub const RULE_ENGINE_URL_ENV: &str = "RULEDESK_RULE_ENGINE_URL";

const DEFAULT_AUTH_SERVER_URL: &str = "http://localhost:8000";
const DEFAULT_RULE_ENGINE_URL: &str = "http://localhost:8080";

/// Where the two backend services live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSettings {
    #[serde(default = "default_auth_server_url")]
    pub auth_server_url: String,
    #[serde(default = "default_rule_engine_url")]
    pub rule_engine_url: String,
}

fn default_auth_server_url() -> String {
    DEFAULT_AUTH_SERVER_URL.to_string()
}

fn default_rule_engine_url() -> String {
    DEFAULT_RULE_ENGINE_URL.to_string()
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        ConsoleSettings {
            auth_server_url: default_auth_server_url(),
            rule_engine_url: default_rule_engine_url(),
        }
    }
}

impl ConsoleSettings {
    /// Apply overrides from a variable lookup; empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(AUTH_SERVER_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.auth_server_url = url;
        }
        if let Some(url) = lookup(RULE_ENGINE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.rule_engine_url = url;
        }
        self
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }
}

pub fn settings_path() -> PathBuf {
    data_dir().join("settings.json")
}

/// Settings file, then environment. Never fails.
pub fn resolve_settings() -> ConsoleSettings {
    read_settings_from(&settings_path()).with_env_overrides()
}

/// Missing or unreadable files fall back to defaults.
pub fn read_settings_from(path: &Path) -> ConsoleSettings {
    if !path.exists() {
        return ConsoleSettings::default();
    }
    match fs::read_to_string(path).map(|s| serde_json::from_str(&s)) {
        Ok(Ok(settings)) => settings,
        Ok(Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
            ConsoleSettings::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read settings file");
            ConsoleSettings::default()
        }
    }
}

pub fn write_settings(settings: &ConsoleSettings) -> Result<(), CoreError> {
    write_settings_to(&settings_path(), settings)
}

pub fn write_settings_to(path: &Path, settings: &ConsoleSettings) -> Result<(), CoreError> {
    let json = serde_json::to_string_pretty(settings)?;
    write_atomic(path, &json)
}
