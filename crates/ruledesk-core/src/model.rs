use std::collections::{BTreeMap, HashMap};

use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::codec::label;
use crate::value::{TypedValue, ValueKind, WireValue};

// --- Types (matching the rule engine's admin API) ---

/// A typed attribute rules can test, e.g. `order_total` of type `DOUBLE`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct Field {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "field_name", alias = "fieldName")]
    pub name: String,
    #[serde(default, alias = "fieldType", alias = "value_type")]
    pub field_type: String,
    /// Picklist values. Older records hold plain strings, newer ones tagged values.
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_status: Option<String>,
}

impl Field {
    pub fn kind(&self) -> Option<ValueKind> {
        ValueKind::from_declared(&self.field_type)
    }

    pub fn is_active(&self) -> bool {
        is_active(self.db_status.as_deref())
    }
}

/// Something a rule can do when it matches, optionally carrying typed values.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct Action {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "fieldName", alias = "name")]
    pub field_name: String,
    #[serde(default, alias = "fieldType")]
    pub field_type: String,
    #[serde(default, alias = "defaultValues")]
    pub default_values: Vec<Value>,
    #[serde(default)]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_status: Option<String>,
}

impl Action {
    pub fn kind(&self) -> Option<ValueKind> {
        ValueKind::from_declared(&self.field_type)
    }

    pub fn is_active(&self) -> bool {
        is_active(self.db_status.as_deref())
    }
}

/// Records without a status are live; otherwise only `ACTIVE` (any case) is.
fn is_active(status: Option<&str>) -> bool {
    status.map_or(true, |s| s.is_empty() || s.eq_ignore_ascii_case("ACTIVE"))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct Group {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "groupName", alias = "name")]
    pub group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,
    #[serde(default)]
    pub rules_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct CreateGroupRequest {
    pub group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_group_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct UpdateGroupRulesRequest {
    pub id: String,
    #[serde(rename = "groupName")]
    pub group_name: String,
    pub rules_ids: Vec<String>,
}

// --- Webhooks ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookAuth {
    #[default]
    None,
    ApiKey,
    Basic,
    Jwt,
}

/// Methods the rule engine will use for webhook delivery.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    #[default]
    Post,
    Put,
    Patch,
}

impl WebhookMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookMethod::Post => "POST",
            WebhookMethod::Put => "PUT",
            WebhookMethod::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct BodyField {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: WebhookMethod,
    #[serde(rename = "timeout_ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub auth_type: WebhookAuth,
    #[serde(default = "default_api_key_header")]
    pub auth_apikey_header: String,
    #[serde(default)]
    pub auth_api_key_value: String,
    #[serde(default)]
    pub auth_username: String,
    #[serde(default)]
    pub auth_password: String,
    #[serde(default)]
    pub auth_jwt_token: String,
    #[serde(default)]
    pub body_fields: Vec<BodyField>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_enabled() -> bool {
    true
}

fn default_api_key_header() -> String {
    "Authorization".to_string()
}

impl Default for Webhook {
    fn default() -> Self {
        Webhook {
            id: String::new(),
            name: String::new(),
            url: String::new(),
            method: WebhookMethod::Post,
            timeout_ms: default_timeout_ms(),
            auth_type: WebhookAuth::None,
            auth_apikey_header: default_api_key_header(),
            auth_api_key_value: String::new(),
            auth_username: String::new(),
            auth_password: String::new(),
            auth_jwt_token: String::new(),
            body_fields: vec![BodyField {
                key: "rule_id".to_string(),
                value: "{{rule.id}}".to_string(),
            }],
            enabled: true,
            description: String::new(),
        }
    }
}

/// The request the rule engine would send for a webhook, for display only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookPreview {
    pub method: WebhookMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Map<String, Value>,
    pub timeout_ms: u64,
}

impl Webhook {
    pub fn preview_request(&self) -> WebhookPreview {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        match self.auth_type {
            WebhookAuth::None => {}
            WebhookAuth::ApiKey => {
                let header = if self.auth_apikey_header.is_empty() {
                    default_api_key_header()
                } else {
                    self.auth_apikey_header.clone()
                };
                headers.insert(header, self.auth_api_key_value.clone());
            }
            WebhookAuth::Basic => {
                let credentials = format!("{}:{}", self.auth_username, self.auth_password);
                let token = base64::engine::general_purpose::STANDARD.encode(credentials);
                headers.insert("Authorization".to_string(), format!("Basic {token}"));
            }
            WebhookAuth::Jwt => {
                headers.insert("Authorization".to_string(), format!("Bearer {}", self.auth_jwt_token));
            }
        }

        let body = self
            .body_fields
            .iter()
            .filter(|f| !f.key.is_empty())
            .map(|f| (f.key.clone(), Value::String(f.value.clone())))
            .collect();

        WebhookPreview {
            method: self.method,
            url: self.url.clone(),
            headers,
            body,
            timeout_ms: self.timeout_ms,
        }
    }
}

impl WebhookPreview {
    /// Shell command reproducing the request, single quotes escaped for POSIX shells.
    pub fn to_curl(&self) -> String {
        let quote = |s: &str| s.replace('\'', r"'\''");
        let mut out = format!("curl -X {} '{}' \\\n", self.method.as_str(), quote(&self.url));
        for (k, v) in &self.headers {
            out.push_str(&format!("  -H '{}: {}' \\\n", k, quote(v)));
        }
        let body = serde_json::to_string(&self.body).unwrap_or_default();
        out.push_str(&format!("  -d '{}'", quote(&body)));
        out
    }
}

// --- SMTP ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct SmtpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "configName")]
    pub config_name: String,
    pub mail_host: String,
    pub mail_port: u16,
    pub mail_username: String,
    #[serde(default)]
    pub mail_app_password: String,
}

// --- Rules ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// One field test: `field_id <operator> any of default_values`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct FieldOperatorValue {
    pub field_id: String,
    pub data_type: String,
    pub operator: String,
    #[serde(default, deserialize_with = "stored_values")]
    #[schemars(with = "Vec<WireValue>")]
    pub default_values: Vec<TypedValue>,
}

/// Reads stored values leniently: a mismatched tag is re-read from whichever
/// payload field is present, and anything unrecognizable is kept as `STRING`.
fn stored_values<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<TypedValue>, D::Error> {
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .iter()
        .map(|v| TypedValue::coerce(v).unwrap_or_else(|| TypedValue::String(label(v))))
        .collect())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct ConditionBlock {
    #[serde(rename = "logica_Operator")]
    pub logical_operator: LogicalOperator,
    #[serde(default)]
    pub field_operator_values: Vec<FieldOperatorValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct ApplicableAction {
    pub id: String,
    pub field_type: String,
    #[serde(default, deserialize_with = "stored_values")]
    #[schemars(with = "Vec<WireValue>")]
    pub values: Vec<TypedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct SmtpDetails {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub recipient_ids: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

/// IF/THEN rule definition as the rule engine stores it. The engine evaluates it; this crate only builds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub group_id: String,
    pub rule_name: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(rename = "logica_Operator", default)]
    pub logical_operator: LogicalOperator,
    #[serde(default)]
    pub conditions: Vec<ConditionBlock>,
    #[serde(rename = "applicableActions", default)]
    pub applicable_actions: Vec<ApplicableAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_details: Option<SmtpDetails>,
    #[serde(default)]
    pub description: String,
}

fn default_priority() -> i64 {
    1
}

impl Rule {
    /// The block joined with `op`, if present.
    pub fn block(&self, op: LogicalOperator) -> Option<&ConditionBlock> {
        self.conditions.iter().find(|b| b.logical_operator == op)
    }
}

// --- Metadata ---

/// Operator catalogue keyed by value type, e.g. `"INT" -> ["EQUALS", "GREATER_THAN"]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, schemars::JsonSchema)]
pub struct DefaultValuesMeta {
    #[serde(default)]
    pub type_operator_mapping: HashMap<String, Vec<String>>,
}

impl DefaultValuesMeta {
    /// Reads the catalogue from either the bare object or a `{ "data": {..} }` envelope.
    pub fn from_response(value: &Value) -> DefaultValuesMeta {
        let mapping = value
            .get("type_operator_mapping")
            .or_else(|| value.get("data").and_then(|d| d.get("type_operator_mapping")));
        mapping
            .and_then(|m| serde_json::from_value(m.clone()).ok())
            .map(|type_operator_mapping| DefaultValuesMeta { type_operator_mapping })
            .unwrap_or_default()
    }

    pub fn operators(&self, value_type: &str) -> &[String] {
        self.type_operator_mapping
            .get(value_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `EQUALS` when offered, otherwise the first operator.
    pub fn default_operator(&self, value_type: &str) -> Option<&str> {
        let ops = self.operators(value_type);
        ops.iter()
            .find(|op| *op == "EQUALS")
            .or_else(|| ops.first())
            .map(String::as_str)
    }
}

/// List responses arrive either as a bare array or wrapped in `{ "data": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> Listing<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) | Listing::Wrapped { data: items } => items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn action_accepts_camel_case_aliases() {
        let a: Action = serde_json::from_value(json!({
            "id": "a1",
            "fieldName": "discount",
            "fieldType": "double",
            "defaultValues": [{ "type": "DOUBLE", "doubleValue": 0.1 }],
        }))
        .unwrap();
        assert_eq!(a.field_name, "discount");
        assert_eq!(a.kind(), Some(ValueKind::Double));
        assert_eq!(a.default_values.len(), 1);
        assert!(a.is_active());
    }

    #[test]
    fn inactive_records_are_filtered() {
        let f: Field = serde_json::from_value(json!({ "id": "f", "name": "n", "field_type": "INT", "db_status": "deleted" }))
            .unwrap();
        assert!(!f.is_active());
        let f: Field = serde_json::from_value(json!({ "id": "f", "name": "n", "field_type": "INT", "db_status": "active" }))
            .unwrap();
        assert!(f.is_active());
    }

    #[test]
    fn rule_serializes_backend_keys() {
        let rule = Rule {
            id: None,
            group_id: "g1".into(),
            rule_name: "vip".into(),
            priority: 2,
            logical_operator: LogicalOperator::And,
            conditions: vec![ConditionBlock {
                logical_operator: LogicalOperator::Or,
                field_operator_values: vec![FieldOperatorValue {
                    field_id: "age".into(),
                    data_type: "INT".into(),
                    operator: "EQUALS".into(),
                    default_values: vec![TypedValue::Int(30)],
                }],
            }],
            applicable_actions: vec![],
            webhook_id: None,
            smtp_details: None,
            description: String::new(),
        };
        let v = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            v,
            json!({
                "group_id": "g1",
                "rule_name": "vip",
                "priority": 2,
                "logica_Operator": "AND",
                "conditions": [{
                    "logica_Operator": "OR",
                    "field_operator_values": [{
                        "field_id": "age",
                        "data_type": "INT",
                        "operator": "EQUALS",
                        "default_values": [{ "type": "INT", "intValue": 30 }],
                    }],
                }],
                "applicableActions": [],
                "description": "",
            })
        );
    }

    #[test]
    fn one_odd_stored_value_does_not_reject_the_listing() {
        let listing: Listing<Rule> = serde_json::from_value(json!({
            "data": [
                {
                    "id": "r1",
                    "group_id": "g1",
                    "rule_name": "ok",
                    "conditions": [{
                        "logica_Operator": "AND",
                        "field_operator_values": [{
                            "field_id": "age",
                            "data_type": "INT",
                            "operator": "EQUALS",
                            "default_values": [{ "type": "INT", "intValue": 30 }],
                        }],
                    }],
                },
                {
                    "id": "r2",
                    "group_id": "g1",
                    "rule_name": "odd",
                    "conditions": [{
                        "logica_Operator": "AND",
                        "field_operator_values": [{
                            "field_id": "age",
                            "data_type": "INT",
                            "operator": "EQUALS",
                            "default_values": [
                                { "type": "INT", "doubleValue": 20.0 },
                                "gold",
                                { "foo": 1 },
                            ],
                        }],
                    }],
                    "applicableActions": [{
                        "id": "a1",
                        "field_type": "BOOLEAN",
                        "values": [{ "type": "BOOLEAN", "booleanValue": true }],
                    }],
                },
            ]
        }))
        .unwrap();
        let rules = listing.into_vec();
        assert_eq!(rules.len(), 2);

        let values = &rules[1].conditions[0].field_operator_values[0].default_values;
        assert_eq!(
            values,
            &vec![
                TypedValue::Double(20.0),
                TypedValue::String("gold".into()),
                TypedValue::String(r#"{"foo":1}"#.into()),
            ]
        );
        assert_eq!(rules[1].applicable_actions[0].values, vec![TypedValue::Boolean(true)]);
    }

    #[test]
    fn webhook_preview_basic_auth() {
        let hook = Webhook {
            name: "n".into(),
            url: "https://example.com/hook".into(),
            auth_type: WebhookAuth::Basic,
            auth_username: "user".into(),
            auth_password: "pass".into(),
            ..Webhook::default()
        };
        let preview = hook.preview_request();
        assert_eq!(preview.headers["Authorization"], "Basic dXNlcjpwYXNz");
        assert_eq!(preview.body["rule_id"], json!("{{rule.id}}"));

        let curl = preview.to_curl();
        assert!(curl.starts_with("curl -X POST 'https://example.com/hook'"));
        assert!(curl.contains("-H 'Content-Type: application/json'"));
    }

    #[test]
    fn webhook_reads_camel_case_contract() {
        let hook: Webhook = serde_json::from_value(json!({
            "id": "w1",
            "name": "notify",
            "url": "https://x",
            "method": "PUT",
            "timeout_ms": 1000,
            "authType": "API_KEY",
            "authApikeyHeader": "X-Key",
            "authApiKeyValue": "secret",
        }))
        .unwrap();
        assert_eq!(hook.method, WebhookMethod::Put);
        assert_eq!(hook.auth_type, WebhookAuth::ApiKey);
        assert_eq!(hook.preview_request().headers["X-Key"], "secret");
    }

    #[test]
    fn meta_default_operator() {
        let meta = DefaultValuesMeta::from_response(&json!({
            "data": { "type_operator_mapping": { "INT": ["GREATER_THAN", "EQUALS"], "DATE": ["BEFORE"] } }
        }));
        assert_eq!(meta.default_operator("INT"), Some("EQUALS"));
        assert_eq!(meta.default_operator("DATE"), Some("BEFORE"));
        assert_eq!(meta.default_operator("TIME"), None);
    }

    #[test]
    fn listing_unwraps_envelope() {
        let bare: Listing<Group> = serde_json::from_value(json!([{ "id": "g" }])).unwrap();
        let wrapped: Listing<Group> = serde_json::from_value(json!({ "data": [{ "id": "g" }] })).unwrap();
        assert_eq!(bare.into_vec(), wrapped.into_vec());
    }
}
