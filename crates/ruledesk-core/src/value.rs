use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MissingPayload, UnknownKind};

// --- Kinds ---

/// The closed set of value-type tags the rule engine accepts in condition and action values.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, schemars::JsonSchema,
)]
pub enum ValueKind {
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "INT")]
    Int,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "DATETIME")]
    DateTime,
    #[serde(rename = "TIME")]
    Time,
}

impl ValueKind {
    pub const ALL: [ValueKind; 7] = [
        ValueKind::String,
        ValueKind::Int,
        ValueKind::Double,
        ValueKind::Boolean,
        ValueKind::Date,
        ValueKind::DateTime,
        ValueKind::Time,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "STRING",
            ValueKind::Int => "INT",
            ValueKind::Double => "DOUBLE",
            ValueKind::Boolean => "BOOLEAN",
            ValueKind::Date => "DATE",
            ValueKind::DateTime => "DATETIME",
            ValueKind::Time => "TIME",
        }
    }

    /// Name of the JSON property that carries the payload for this kind.
    pub fn payload_field(self) -> &'static str {
        match self {
            ValueKind::String => "stringValue",
            ValueKind::Int => "intValue",
            ValueKind::Double => "doubleValue",
            ValueKind::Boolean => "boolValue",
            ValueKind::Date => "localDate",
            ValueKind::DateTime => "localDateTime",
            ValueKind::Time => "localTime",
        }
    }

    /// Lenient lookup for the `field_type` strings the backend stores on fields and
    /// actions (`"int"`, `" Date "`). Key prefixes go through the strict `FromStr`.
    pub fn from_declared(raw: &str) -> Option<ValueKind> {
        raw.trim().to_ascii_uppercase().parse().ok()
    }
}

impl FromStr for ValueKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Values ---

/// A payload tagged with its kind. Serializes to the backend's
/// `{ "type": "<KIND>", "<payloadField>": value }` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireValue", try_from = "WireValue")]
pub enum TypedValue {
    String(String),
    Int(i64),
    Double(f64),
    Boolean(bool),
    /// `YYYY-MM-DD`, unvalidated.
    Date(String),
    /// `YYYY-MM-DDTHH:mm[:ss]`, unvalidated.
    DateTime(String),
    /// `HH:mm[:ss]`, unvalidated.
    Time(String),
}

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::String(_) => ValueKind::String,
            TypedValue::Int(_) => ValueKind::Int,
            TypedValue::Double(_) => ValueKind::Double,
            TypedValue::Boolean(_) => ValueKind::Boolean,
            TypedValue::Date(_) => ValueKind::Date,
            TypedValue::DateTime(_) => ValueKind::DateTime,
            TypedValue::Time(_) => ValueKind::Time,
        }
    }

    /// Human-readable rendering of the payload alone.
    pub fn label(&self) -> String {
        match self {
            TypedValue::String(s)
            | TypedValue::Date(s)
            | TypedValue::DateTime(s)
            | TypedValue::Time(s) => s.clone(),
            TypedValue::Int(i) => i.to_string(),
            TypedValue::Double(d) => format_double(*d),
            TypedValue::Boolean(b) => b.to_string(),
        }
    }

    pub fn key(&self) -> NormalizedKey {
        NormalizedKey::tagged(self.kind().as_str(), &self.label())
    }

    /// False for payloads the backend cannot accept (non-finite doubles).
    pub fn is_submittable(&self) -> bool {
        match self {
            TypedValue::Double(d) => d.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Renders doubles the way the console always has: no trailing `.0`, and
/// `NaN`/`Infinity` spelled out.
pub(crate) fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        let text = if d > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        format!("{d}")
    }
}

/// Flat wire shape of a [`TypedValue`]; exactly one payload field is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WireValue {
    #[serde(rename = "type")]
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
    #[serde(default, alias = "booleanValue", skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_date_time: Option<String>,
    #[serde(default, alias = "time", skip_serializing_if = "Option::is_none")]
    pub local_time: Option<String>,
}

impl WireValue {
    fn empty(kind: ValueKind) -> Self {
        WireValue {
            kind,
            string_value: None,
            int_value: None,
            double_value: None,
            bool_value: None,
            local_date: None,
            local_date_time: None,
            local_time: None,
        }
    }
}

impl From<TypedValue> for WireValue {
    fn from(value: TypedValue) -> Self {
        let mut wire = WireValue::empty(value.kind());
        match value {
            TypedValue::String(s) => wire.string_value = Some(s),
            TypedValue::Int(i) => wire.int_value = Some(i),
            TypedValue::Double(d) => wire.double_value = Some(d),
            TypedValue::Boolean(b) => wire.bool_value = Some(b),
            TypedValue::Date(s) => wire.local_date = Some(s),
            TypedValue::DateTime(s) => wire.local_date_time = Some(s),
            TypedValue::Time(s) => wire.local_time = Some(s),
        }
        wire
    }
}

impl TryFrom<WireValue> for TypedValue {
    type Error = MissingPayload;

    fn try_from(wire: WireValue) -> Result<Self, Self::Error> {
        let kind = wire.kind;
        let value = match kind {
            ValueKind::String => wire.string_value.map(TypedValue::String),
            ValueKind::Int => wire.int_value.map(TypedValue::Int),
            ValueKind::Double => wire.double_value.map(TypedValue::Double),
            ValueKind::Boolean => wire.bool_value.map(TypedValue::Boolean),
            ValueKind::Date => wire.local_date.map(TypedValue::Date),
            ValueKind::DateTime => wire.local_date_time.map(TypedValue::DateTime),
            ValueKind::Time => wire.local_time.map(TypedValue::Time),
        };
        value.ok_or(MissingPayload {
            kind: kind.as_str(),
            field: kind.payload_field(),
        })
    }
}

// --- Keys ---

/// Flat `"<KIND>:<payload>"` selection key. Primitive inputs produce bare keys
/// without a prefix, and `""` stands for "no value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn new(raw: impl Into<String>) -> Self {
        NormalizedKey(raw.into())
    }

    pub(crate) fn tagged(tag: &str, payload: &str) -> Self {
        NormalizedKey(format!("{tag}:{payload}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Text shown on a chip: everything after the first colon, or the whole key.
    pub fn chip_text(&self) -> &str {
        self.0.split_once(':').map(|(_, rest)| rest).unwrap_or(&self.0)
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for NormalizedKey {
    fn from(raw: String) -> Self {
        NormalizedKey(raw)
    }
}

impl From<&str> for NormalizedKey {
    fn from(raw: &str) -> Self {
        NormalizedKey(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_prefix_is_case_sensitive() {
        assert_eq!("DATETIME".parse::<ValueKind>(), Ok(ValueKind::DateTime));
        assert!("int".parse::<ValueKind>().is_err());
        assert_eq!(ValueKind::from_declared(" int "), Some(ValueKind::Int));
        assert_eq!(ValueKind::from_declared(""), None);
    }

    #[test]
    fn no_kind_name_contains_a_colon() {
        assert!(ValueKind::ALL.iter().all(|k| !k.as_str().contains(':')));
    }

    #[test]
    fn serializes_to_backend_shape() {
        let v = serde_json::to_value(TypedValue::Date("2026-01-12".into())).unwrap();
        assert_eq!(v, json!({ "type": "DATE", "localDate": "2026-01-12" }));

        let v = serde_json::to_value(TypedValue::Boolean(false)).unwrap();
        assert_eq!(v, json!({ "type": "BOOLEAN", "boolValue": false }));
    }

    #[test]
    fn deserialize_requires_matching_payload() {
        let v: TypedValue =
            serde_json::from_value(json!({ "type": "INT", "intValue": 20 })).unwrap();
        assert_eq!(v, TypedValue::Int(20));

        let err = serde_json::from_value::<TypedValue>(json!({ "type": "INT", "stringValue": "20" }))
            .unwrap_err();
        assert!(err.to_string().contains("intValue"));
    }

    #[test]
    fn accepts_legacy_payload_names() {
        let v: TypedValue =
            serde_json::from_value(json!({ "type": "BOOLEAN", "booleanValue": true })).unwrap();
        assert_eq!(v, TypedValue::Boolean(true));

        let v: TypedValue = serde_json::from_value(json!({ "type": "TIME", "time": "08:00" })).unwrap();
        assert_eq!(v, TypedValue::Time("08:00".into()));
    }

    #[test]
    fn double_labels_drop_trailing_zero() {
        assert_eq!(TypedValue::Double(20.0).label(), "20");
        assert_eq!(TypedValue::Double(2.5).label(), "2.5");
        assert_eq!(TypedValue::Double(f64::NAN).label(), "NaN");
        assert!(!TypedValue::Double(f64::INFINITY).is_submittable());
    }

    #[test]
    fn chip_text_keeps_later_colons() {
        let key = TypedValue::Time("10:30".into()).key();
        assert_eq!(key.as_str(), "TIME:10:30");
        assert_eq!(key.chip_text(), "10:30");
        assert_eq!(NormalizedKey::from("plain").chip_text(), "plain");
    }
}
