use proptest::prelude::*;
use ruledesk_core::{label, normalize_key, parse_free_text_list, parse_key, TypedValue, ValueKind};
use serde_json::json;

fn kind() -> impl Strategy<Value = ValueKind> {
    prop::sample::select(ValueKind::ALL.to_vec())
}

/// Values whose wire form has a populated payload field. Non-finite doubles
/// serialize as `null` and empty temporal strings are not considered set, so
/// both are left out.
fn typed_value() -> impl Strategy<Value = TypedValue> {
    prop_oneof![
        any::<String>().prop_map(TypedValue::String),
        any::<i64>().prop_map(TypedValue::Int),
        (-1.0e12f64..1.0e12).prop_map(TypedValue::Double),
        any::<bool>().prop_map(TypedValue::Boolean),
        "[0-9]{4}-[0-9]{2}-[0-9]{2}".prop_map(TypedValue::Date),
        "[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}(:[0-9]{2})?".prop_map(TypedValue::DateTime),
        "[0-9]{2}:[0-9]{2}(:[0-9]{2})?".prop_map(TypedValue::Time),
    ]
}

proptest! {
    #[test]
    fn key_round_trip_preserves_kind_and_rendering(v in typed_value()) {
        let wire = serde_json::to_value(&v).unwrap();
        let key = normalize_key(&wire);
        prop_assert_eq!(&key, &v.key());

        let back = parse_key(key.as_str()).unwrap();
        prop_assert_eq!(back.kind(), v.kind());
        prop_assert_eq!(back.label(), v.label());
        prop_assert_eq!(label(&wire), v.label());
    }

    #[test]
    fn keys_of_different_kinds_never_collide(a in typed_value(), b in typed_value()) {
        prop_assume!(a.kind() != b.kind());
        prop_assert_ne!(a.key(), b.key());
    }

    #[test]
    fn free_text_yields_one_value_per_non_blank_segment(k in kind(), text in "[a-z0-9 .:,-]{0,40}") {
        let expected = text.split(',').filter(|s| !s.trim().is_empty()).count();
        let values = parse_free_text_list(k, &text);
        prop_assert_eq!(values.clone().count(), expected);
        prop_assert_eq!(values.count(), expected);
    }

    #[test]
    fn parse_key_never_panics(key in "\\PC{0,30}") {
        let _ = parse_key(&key);
    }

    #[test]
    fn free_text_ints_match_key_parsing(n in any::<i32>()) {
        let text = format!(" {n} ,");
        let from_text: Vec<_> = parse_free_text_list(ValueKind::Int, &text).collect();
        let from_key = parse_key(&format!("INT:{n}")).unwrap();
        prop_assert_eq!(from_text, vec![from_key]);
    }
}

#[test]
fn documented_examples() {
    assert_eq!(normalize_key(&serde_json::Value::Null).as_str(), "");
    assert_eq!(parse_key(""), None);
    assert_eq!(parse_key("garbage-no-colon"), None);
    assert_eq!(parse_key("INT:20.0"), Some(TypedValue::Int(20)));
    assert_eq!(parse_key("BOOLEAN:TRUE"), Some(TypedValue::Boolean(false)));
    assert_eq!(
        parse_free_text_list(ValueKind::Int, " 1, , 2 ").collect::<Vec<_>>(),
        vec![TypedValue::Int(1), TypedValue::Int(2)]
    );
    assert_eq!(label(&json!({ "type": "DATE", "localDate": "2026-01-12" })), "2026-01-12");
}

#[test]
fn wire_shape_round_trips_through_serde() {
    let values = vec![
        TypedValue::String("a:b".into()),
        TypedValue::Int(-4),
        TypedValue::Double(0.25),
        TypedValue::Boolean(true),
        TypedValue::Date("2026-01-12".into()),
        TypedValue::DateTime("2026-01-12T08:30".into()),
        TypedValue::Time("08:30:00".into()),
    ];
    let json = serde_json::to_string(&values).unwrap();
    let back: Vec<TypedValue> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, values);
}
