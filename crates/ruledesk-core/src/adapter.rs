//! Display-name and type lookups over loosely shaped backend records.
//!
//! The same property shows up under several names depending on which backend
//! version wrote the record. Each lookup here owns one fixed priority list.

use serde_json::Value;

use crate::codec::{label, normalize_key};
use crate::value::{NormalizedKey, ValueKind};

pub const PLACEHOLDER: &str = "—";

const ACTION_LABEL: &[&str] = &["field_name", "fieldName", "name", "field", "comment", "id"];
const FIELD_LABEL: &[&str] = &["field_name", "fieldName", "name", "field", "id"];
const WEBHOOK_LABEL: &[&str] = &["name", "id"];
const SMTP_LABEL: &[&str] = &["config_name", "configName", "mail_username", "id"];
const GROUP_LABEL: &[&str] = &["group_name", "groupName", "name", "id"];
const DECLARED_TYPE: &[&str] = &["field_type", "fieldType", "value_type", "valueType"];
const VALUE_LISTS: &[&str] = &["default_values", "defaultValues", "values"];
const TOKEN: &[&str] = &["token", "accessToken", "access_token", "jwt"];

/// First property in `names` holding a non-empty string or a number, as text.
pub fn first_text(record: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match record.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        n @ Value::Number(_) => Some(label(n)),
        _ => None,
    })
}

fn text_or_placeholder(record: &Value, names: &[&str]) -> String {
    first_text(record, names).unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn action_label(record: &Value) -> String {
    text_or_placeholder(record, ACTION_LABEL)
}

pub fn field_label(record: &Value) -> String {
    text_or_placeholder(record, FIELD_LABEL)
}

pub fn webhook_label(record: &Value) -> String {
    text_or_placeholder(record, WEBHOOK_LABEL)
}

pub fn smtp_label(record: &Value) -> String {
    text_or_placeholder(record, SMTP_LABEL)
}

pub fn group_name(record: &Value) -> String {
    text_or_placeholder(record, GROUP_LABEL)
}

/// Kind a field or action declares for its values, if it declares a known one.
pub fn declared_kind(record: &Value) -> Option<ValueKind> {
    first_text(record, DECLARED_TYPE).and_then(|t| ValueKind::from_declared(&t))
}

/// A selectable chip: the key kept in form state and the text shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipOption {
    pub key: NormalizedKey,
    pub label: String,
}

/// Picklist options from the first value list the record carries. Values
/// that normalize to an empty key are dropped.
pub fn value_options(record: &Value) -> Vec<ChipOption> {
    let values = VALUE_LISTS
        .iter()
        .find_map(|name| record.get(name).and_then(Value::as_array));
    values
        .into_iter()
        .flatten()
        .map(|v| ChipOption {
            key: normalize_key(v),
            label: label(v),
        })
        .filter(|o| !o.key.is_empty())
        .collect()
}

/// Case-insensitive substring filter used by the picklist search box.
pub fn filter_options<'a>(options: &'a [ChipOption], query: &str) -> Vec<&'a ChipOption> {
    let q = query.trim().to_lowercase();
    options
        .iter()
        .filter(|o| q.is_empty() || o.label.to_lowercase().contains(&q))
        .collect()
}

/// Bearer token from an auth server response, whichever spelling it used.
pub fn pick_token(response: &Value) -> Option<String> {
    first_text(response, TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_label_priority() {
        assert_eq!(action_label(&json!({ "name": "n", "fieldName": "fn" })), "fn");
        assert_eq!(action_label(&json!({ "field_name": "", "comment": "c" })), "c");
        assert_eq!(action_label(&json!({ "id": 7 })), "7");
        assert_eq!(action_label(&json!({})), PLACEHOLDER);
    }

    #[test]
    fn smtp_and_webhook_labels() {
        assert_eq!(smtp_label(&json!({ "configName": "prod", "mail_username": "u" })), "prod");
        assert_eq!(smtp_label(&json!({ "mail_username": "u", "id": "s1" })), "u");
        assert_eq!(webhook_label(&json!({ "id": "w1" })), "w1");
        assert_eq!(group_name(&json!({ "groupName": "vip" })), "vip");
    }

    #[test]
    fn declared_kind_is_lenient() {
        assert_eq!(declared_kind(&json!({ "fieldType": "date" })), Some(ValueKind::Date));
        assert_eq!(declared_kind(&json!({ "value_type": "DATETIME" })), Some(ValueKind::DateTime));
        assert_eq!(declared_kind(&json!({ "field_type": "blob" })), None);
    }

    #[test]
    fn options_from_default_values() {
        let action = json!({
            "defaultValues": [
                { "type": "INT", "intValue": 5 },
                null,
                { "type": "DATE", "localDate": "2026-01-12" },
            ]
        });
        let options = value_options(&action);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].key.as_str(), "INT:5");
        assert_eq!(options[1].label, "2026-01-12");

        let hits = filter_options(&options, " 2026 ");
        assert_eq!(hits.len(), 1);
        assert_eq!(filter_options(&options, "").len(), 2);
    }

    #[test]
    fn token_spellings() {
        assert_eq!(pick_token(&json!({ "access_token": "t" })), Some("t".to_string()));
        assert_eq!(pick_token(&json!({ "token": "a", "jwt": "b" })), Some("a".to_string()));
        assert_eq!(pick_token(&json!({ "user": {} })), None);
    }
}
