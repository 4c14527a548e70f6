use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ruledesk_client::{AuthClient, ClientError, RuleEngineClient};
use ruledesk_core::model::{LogicalOperator, Rule, UpdateGroupRulesRequest};
use ruledesk_core::session::{MemorySession, Session, SessionContext};
use ruledesk_core::TypedValue;

fn signed_in() -> Arc<MemorySession> {
    Arc::new(MemorySession::new(Session::with_token("tok")))
}

#[tokio::test]
async fn list_fields_sends_bearer_and_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/v1/api/fields"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "f1", "field_name": "order_total", "fieldType": "DOUBLE" },
                { "id": "f2", "name": "country", "field_type": "STRING", "db_status": "INACTIVE" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = RuleEngineClient::new(format!("{}/", server.uri()), signed_in()).unwrap();
    let fields = client.list_fields().await.unwrap();

    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "order_total");
    assert_eq!(fields[0].field_type, "DOUBLE");
    assert!(fields[0].is_active());
    assert!(!fields[1].is_active());
}

#[tokio::test]
async fn unauthorized_clears_the_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/v1/api/rules"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "token expired" })))
        .mount(&server)
        .await;

    let session = signed_in();
    let client = RuleEngineClient::new(server.uri(), session.clone()).unwrap();
    let err = client.list_rules().await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized(ref m) if m == "token expired"));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn backend_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/v1/api/fields/f9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Field not found" })))
        .mount(&server)
        .await;

    let client = RuleEngineClient::new(server.uri(), signed_in()).unwrap();
    match client.delete_field("f9").await {
        Err(ClientError::NetworkError { status_code, message }) => {
            assert_eq!(status_code, 404);
            assert_eq!(message, "Field not found");
        }
        other => panic!("expected a network error, got {other:?}"),
    }
}

#[tokio::test]
async fn rules_are_deleted_by_query_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/v1/api/rules"))
        .and(query_param("id", "r1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = RuleEngineClient::new(server.uri(), signed_in()).unwrap();
    client.delete_rule("r1").await.unwrap();
}

#[tokio::test]
async fn create_rule_posts_engine_wire_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/v1/api/rules"))
        .and(body_json(json!({
            "group_id": "g1",
            "rule_name": "big orders",
            "priority": 1,
            "logica_Operator": "AND",
            "conditions": [{
                "logica_Operator": "AND",
                "field_operator_values": [{
                    "field_id": "f1",
                    "data_type": "INT",
                    "operator": "GREATER_THAN",
                    "default_values": [{ "type": "INT", "intValue": 100 }]
                }]
            }],
            "applicableActions": [],
            "description": ""
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "r7" })))
        .expect(1)
        .mount(&server)
        .await;

    let rule: Rule = serde_json::from_value(json!({
        "group_id": "g1",
        "rule_name": "big orders",
        "conditions": [{
            "logica_Operator": "AND",
            "field_operator_values": [{
                "field_id": "f1",
                "data_type": "INT",
                "operator": "GREATER_THAN",
                "default_values": [{ "type": "INT", "intValue": 100 }]
            }]
        }]
    }))
    .unwrap();
    assert_eq!(
        rule.block(LogicalOperator::And).unwrap().field_operator_values[0].default_values,
        vec![TypedValue::Int(100)]
    );

    let client = RuleEngineClient::new(server.uri(), signed_in()).unwrap();
    let created = client.create_rule(&rule).await.unwrap();
    assert_eq!(created, json!({ "id": "r7" }));
}

#[tokio::test]
async fn group_rules_update_uses_trailing_slash() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/admin/v1/api/group/"))
        .and(body_json(json!({ "id": "g1", "groupName": "vip", "rules_ids": ["r1", "r2"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = RuleEngineClient::new(server.uri(), signed_in()).unwrap();
    let answer = client
        .update_group_rules(&UpdateGroupRulesRequest {
            id: "g1".into(),
            group_name: "vip".into(),
            rules_ids: vec!["r1".into(), "r2".into()],
        })
        .await
        .unwrap();
    assert_eq!(answer, serde_json::Value::Null);
}

#[tokio::test]
async fn non_json_mutation_answer_reads_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/v1/api/fields"))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;

    let client = RuleEngineClient::new(server.uri(), signed_in()).unwrap();
    let field = ruledesk_core::model::Field {
        name: "tier".into(),
        field_type: "STRING".into(),
        ..Default::default()
    };
    let answer = client.create_field(&field).await.unwrap();
    assert_eq!(answer, serde_json::Value::Null);
}

#[tokio::test]
async fn operator_catalogue_is_read_from_meta_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/v1/api/default-values"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type_operator_mapping": { "INT": ["GREATER_THAN", "EQUALS"] }
        })))
        .mount(&server)
        .await;

    let client = RuleEngineClient::new(server.uri(), signed_in()).unwrap();
    let meta = client.list_default_values_meta().await.unwrap();
    assert_eq!(meta.default_operator("INT"), Some("EQUALS"));
    assert!(meta.operators("BOOLEAN").is_empty());
}

#[tokio::test]
async fn login_encodes_password_and_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "czNjcmV0IQ==" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-1",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(MemorySession::default());
    let auth = AuthClient::new(server.uri(), session.clone()).unwrap();
    let outcome = auth.login("ada@example.com", "s3cret!").await.unwrap();

    assert_eq!(outcome.token.as_deref(), Some("jwt-1"));
    assert_eq!(outcome.user, None);
    assert_eq!(session.token().as_deref(), Some("jwt-1"));
    assert_eq!(session.user(), Some(json!({ "email": "ada@example.com" })));
}

#[tokio::test]
async fn rejected_login_leaves_session_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Invalid credentials Or User Not Exist"
        })))
        .mount(&server)
        .await;

    let session = Arc::new(MemorySession::default());
    let auth = AuthClient::new(server.uri(), session.clone()).unwrap();
    let err = auth.login("ada@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid credentials Or User Not Exist");
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn logout_clears_session_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(body_json(json!({ "email": "ada@example.com" })))
        .respond_with(ResponseTemplate::new(502).set_body_json(json!({ "error": "gateway down" })))
        .mount(&server)
        .await;

    let session = signed_in();
    let auth = AuthClient::new(server.uri(), session.clone()).unwrap();
    assert!(auth.logout("ada@example.com").await.is_err());
    assert!(!session.is_authenticated());
}
