use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use steeple_adapter::error::AdapterError;
use steeple_adapter::traits::{
    EntityCreate, EntityDelete, EntityFetch, EntityList, EntityUpdate, FetchToken,
    WebhookCapable,
};
use steeple_adapter_pco::{PcoAdapter, PcoConfig};
use steeple_core::EntityType;

fn adapter_for(server: &MockServer) -> PcoAdapter {
    PcoAdapter::new(
        PcoConfig::new("app-id", "app-secret")
            .with_base_url(server.uri())
            .with_page_size(2),
    )
    .unwrap()
}

fn auth_header() -> String {
    format!("Basic {}", BASE64.encode("app-id:app-secret"))
}

fn person(id: &str, first_name: &str) -> serde_json::Value {
    json!({
        "type": "Person",
        "id": id,
        "attributes": {
            "first_name": first_name,
            "last_name": "Tester",
            "updated_at": "2026-01-10T09:30:00Z"
        },
        "relationships": {
            "primary_campus": {"data": {"type": "Campus", "id": "c1"}}
        }
    })
}

#[tokio::test]
async fn test_token_is_the_encoded_credential_pair() {
    let server = MockServer::start().await;
    let token = adapter_for(&server).fetch_token().await.unwrap();

    // PCO personal access tokens are static basic-auth pairs, so the
    // bearer value is just the encoded credentials with no expiry.
    assert_eq!(token.token, BASE64.encode("app-id:app-secret"));
    assert!(token.expires_at.is_none());
}

#[tokio::test]
async fn test_listing_follows_offset_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people/v2/people"))
        .and(query_param("offset", "0"))
        .and(query_param("per_page", "2"))
        .and(header("authorization", auth_header().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [person("1", "Ann"), person("2", "Ben")],
            "meta": {"total_count": 3, "next": {"offset": 2}}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/people/v2/people"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [person("3", "Cal")],
            "meta": {"total_count": 3}
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);

    let first = adapter
        .list_entity_page(EntityType::Person, None)
        .await
        .unwrap();
    assert_eq!(first.records.len(), 2);
    assert_eq!(first.total, Some(3));
    assert_eq!(first.next_cursor.as_deref(), Some("2"));

    let second = adapter
        .list_entity_page(EntityType::Person, first.next_cursor.as_deref())
        .await
        .unwrap();
    assert_eq!(second.records.len(), 1);
    assert_eq!(second.records[0].id, "3");
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn test_fetch_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people/v2/people/271"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": person("271", "Ann")})),
        )
        .mount(&server)
        .await;

    let record = adapter_for(&server)
        .fetch_entity_by_id(EntityType::Person, "271")
        .await
        .unwrap();

    assert_eq!(record.id, "271");
    assert_eq!(record.attributes["first_name"], json!("Ann"));
}

#[tokio::test]
async fn test_missing_record_is_entity_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people/v2/people/999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{"status": "404", "title": "Not Found"}]
        })))
        .mount(&server)
        .await;

    let err = adapter_for(&server)
        .fetch_entity_by_id(EntityType::Person, "999")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AdapterError::EntityNotFound { external_id, .. } if external_id == "999"
    ));
}

#[tokio::test]
async fn test_create_sends_jsonapi_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/people/v2/people"))
        .and(body_partial_json(json!({
            "data": {
                "type": "Person",
                "attributes": {"first_name": "Foo", "last_name": "Bar"}
            }
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"data": person("500", "Foo")})),
        )
        .mount(&server)
        .await;

    let mut attributes = serde_json::Map::new();
    attributes.insert("first_name".to_string(), json!("Foo"));
    attributes.insert("last_name".to_string(), json!("Bar"));

    let record = adapter_for(&server)
        .create_entity(EntityType::Person, &attributes)
        .await
        .unwrap();

    assert_eq!(record.id, "500");
}

#[tokio::test]
async fn test_update_patches_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/people/v2/people/271"))
        .and(body_partial_json(json!({
            "data": {"type": "Person", "id": "271"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": person("271", "Foo")})),
        )
        .mount(&server)
        .await;

    let mut attributes = serde_json::Map::new();
    attributes.insert("first_name".to_string(), json!("Foo"));

    let record = adapter_for(&server)
        .update_entity(EntityType::Person, "271", &attributes)
        .await
        .unwrap();
    assert_eq!(record.id, "271");
}

#[tokio::test]
async fn test_delete() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/people/v2/people/271"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    adapter_for(&server)
        .delete_entity(EntityType::Person, "271")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people/v2/people"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = adapter_for(&server)
        .list_entity_page(EntityType::Person, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::AuthenticationFailed));
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people/v2/people"))
        .respond_with(
            ResponseTemplate::new(429).insert_header("Retry-After", "20"),
        )
        .mount(&server)
        .await;

    let err = adapter_for(&server)
        .list_entity_page(EntityType::Person, None)
        .await
        .unwrap_err();

    match err {
        AdapterError::RateLimited { retry_after_secs } => {
            assert_eq!(retry_after_secs, Some(20));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(AdapterError::RateLimited {
        retry_after_secs: Some(20)
    }
    .is_transient());
}

#[tokio::test]
async fn test_webhook_subscription_lifecycle() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/webhooks/v2/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "type": "Subscription",
                "id": "sub-1",
                "attributes": {
                    "name": "people.v2.events.person.updated",
                    "url": "https://sync.example.com/hooks/pco",
                    "active": false,
                    "authenticity_secret": "whsec-1"
                }
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/webhooks/v2/subscriptions"))
        .and(body_partial_json(json!({
            "data": {
                "type": "Subscription",
                "attributes": {
                    "name": "people.v2.events.person.created",
                    "url": "https://sync.example.com/hooks/pco",
                    "active": true
                }
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "type": "Subscription",
                "id": "sub-2",
                "attributes": {
                    "name": "people.v2.events.person.created",
                    "url": "https://sync.example.com/hooks/pco",
                    "active": true,
                    "authenticity_secret": "whsec-2"
                }
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/webhooks/v2/subscriptions/sub-1"))
        .and(body_partial_json(json!({
            "data": {"id": "sub-1", "attributes": {"active": true}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "type": "Subscription",
                "id": "sub-1",
                "attributes": {
                    "name": "people.v2.events.person.updated",
                    "url": "https://sync.example.com/hooks/pco",
                    "active": true,
                    "authenticity_secret": "whsec-1"
                }
            }
        })))
        .mount(&server)
        .await;

    let adapter = adapter_for(&server);

    let listed = adapter.list_webhook_subscriptions().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "sub-1");
    assert!(!listed[0].active);
    assert_eq!(listed[0].secret.as_deref(), Some("whsec-1"));

    let created = adapter
        .create_webhook_subscription(
            "https://sync.example.com/hooks/pco",
            "people.v2.events.person.created",
        )
        .await
        .unwrap();
    assert_eq!(created.id, "sub-2");
    assert!(created.active);

    let activated = adapter
        .activate_webhook_subscription("sub-1")
        .await
        .unwrap();
    assert!(activated.active);
}
