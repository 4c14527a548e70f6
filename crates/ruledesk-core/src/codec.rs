//! Conversions between backend tagged values, selection keys and free text.
//!
//! Every function here is total: malformed input degrades to a `STRING` value,
//! `None`, or an empty sequence, and the form layer decides whether that is
//! acceptable.

use serde_json::{Map, Number, Value};

use crate::value::{format_double, NormalizedKey, TypedValue, ValueKind};

/// Payload fields in the order `label` checks them. `booleanValue` and `time`
/// are legacy spellings still present in stored values.
const LABEL_ORDER: &[(&str, Presence)] = &[
    ("stringValue", Presence::NonNull),
    ("intValue", Presence::NonNull),
    ("doubleValue", Presence::NonNull),
    ("boolValue", Presence::NonNull),
    ("booleanValue", Presence::NonNull),
    ("localDate", Presence::Truthy),
    ("localDateTime", Presence::Truthy),
    ("localTime", Presence::Truthy),
    ("time", Presence::Truthy),
];

/// Payload fields in the order `normalize_key` checks them, with the kind each one maps to.
const KEY_ORDER: &[(&str, ValueKind, Presence)] = &[
    ("localDate", ValueKind::Date, Presence::Truthy),
    ("localDateTime", ValueKind::DateTime, Presence::Truthy),
    ("time", ValueKind::Time, Presence::Truthy),
    ("localTime", ValueKind::Time, Presence::Truthy),
    ("intValue", ValueKind::Int, Presence::NonNull),
    ("doubleValue", ValueKind::Double, Presence::NonNull),
    ("stringValue", ValueKind::String, Presence::NonNull),
    ("boolValue", ValueKind::Boolean, Presence::NonNull),
    ("booleanValue", ValueKind::Boolean, Presence::NonNull),
];

#[derive(Clone, Copy)]
enum Presence {
    /// Present and not `null`.
    NonNull,
    /// Present, not `null`, and not an empty string, zero or `false`.
    Truthy,
}

impl Presence {
    fn admits(self, v: &Value) -> bool {
        match (self, v) {
            (_, Value::Null) => false,
            (Presence::NonNull, _) => true,
            (Presence::Truthy, Value::Bool(b)) => *b,
            (Presence::Truthy, Value::String(s)) => !s.is_empty(),
            (Presence::Truthy, Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            (Presence::Truthy, _) => true,
        }
    }
}

fn field<'a>(map: &'a Map<String, Value>, name: &str, presence: Presence) -> Option<&'a Value> {
    map.get(name).filter(|v| presence.admits(v))
}

/// Human-readable text for any backend value: `""` for null, the primitive's
/// own text, the first populated payload field, or a JSON rendering.
pub fn label(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => render_number(n),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => LABEL_ORDER
            .iter()
            .find_map(|&(name, presence)| field(map, name, presence))
            .map(label)
            .unwrap_or_else(|| render_json(value)),
        Value::Array(_) => render_json(value),
    }
}

/// Stable selection key for any backend value. Primitives are used as-is,
/// tagged objects become `"<KIND>:<payload>"`, anything else `"JSON:<label>"`.
pub fn normalize_key(value: &Value) -> NormalizedKey {
    match value {
        Value::Null => NormalizedKey::default(),
        Value::String(_) | Value::Number(_) | Value::Bool(_) => NormalizedKey::new(label(value)),
        Value::Object(map) => KEY_ORDER
            .iter()
            .find_map(|&(name, kind, presence)| {
                field(map, name, presence).map(|v| NormalizedKey::tagged(kind.as_str(), &label(v)))
            })
            .unwrap_or_else(|| NormalizedKey::tagged("JSON", &label(value))),
        Value::Array(_) => NormalizedKey::tagged("JSON", &label(value)),
    }
}

/// Rebuilds a value from a key. `None` when there is no colon or nothing
/// before it; unknown prefixes become `STRING` with the rest of the key.
pub fn parse_key(key: &str) -> Option<TypedValue> {
    let (prefix, raw) = key.split_once(':')?;
    if prefix.is_empty() {
        return None;
    }
    Some(match prefix.parse::<ValueKind>() {
        Ok(kind) => convert(kind, raw),
        Err(_) => TypedValue::String(raw.to_string()),
    })
}

/// Splits comma-separated text into values of `kind`, trimming segments and
/// skipping empty ones. The iterator is lazy; clone it to walk the text again.
pub fn parse_free_text_list(kind: ValueKind, text: &str) -> FreeTextValues<'_> {
    FreeTextValues {
        kind,
        segments: text.split(','),
    }
}

#[derive(Debug, Clone)]
pub struct FreeTextValues<'a> {
    kind: ValueKind,
    segments: std::str::Split<'a, char>,
}

impl FreeTextValues<'_> {
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

impl Iterator for FreeTextValues<'_> {
    type Item = TypedValue;

    fn next(&mut self) -> Option<TypedValue> {
        loop {
            let segment = self.segments.next()?.trim();
            if !segment.is_empty() {
                return Some(convert(self.kind, segment));
            }
        }
    }
}

impl TypedValue {
    /// Lenient conversion of whatever the backend sent: `normalize_key` then
    /// `parse_key`. Bare primitives carry no kind and yield `None`.
    pub fn coerce(value: &Value) -> Option<TypedValue> {
        parse_key(normalize_key(value).as_str())
    }
}

/// Per-kind conversion shared by key parsing and free-text entry.
pub fn convert(kind: ValueKind, raw: &str) -> TypedValue {
    let fallback = || TypedValue::String(raw.to_string());
    match kind {
        ValueKind::String => TypedValue::String(raw.to_string()),
        ValueKind::Int => parse_int(raw).map(TypedValue::Int).unwrap_or_else(fallback),
        ValueKind::Double => parse_double(raw).map(TypedValue::Double).unwrap_or_else(fallback),
        ValueKind::Boolean => TypedValue::Boolean(raw == "true"),
        ValueKind::Date => TypedValue::Date(raw.to_string()),
        ValueKind::DateTime => TypedValue::DateTime(raw.to_string()),
        ValueKind::Time => TypedValue::Time(raw.to_string()),
    }
}

/// Integers go through the float reading so `"20.0"` and `"2e3"` are accepted,
/// then truncate toward zero. Exact integer text is taken directly to keep
/// values above 2^53 intact.
fn parse_int(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Some(i);
    }
    parse_double(raw)
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

fn parse_double(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(format_double).unwrap_or_else(|| n.to_string())
    }
}

fn render_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
}
