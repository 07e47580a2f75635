//! Pagination cursor integration tests
//!
//! Drives the lazy cursor against a mock server that chains pages through
//! `after_cursor` continuation tokens, and checks the client-side cap
//! semantics for fixed-limit list calls.

use serde_json::json;
use veridian_sdk::{Role, User, VeridianClient};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_envelope() -> serde_json::Value {
    json!({
        "status": {"error": false, "code": 200, "type": "success", "message": "Success"},
        "data": [{
            "access_token": "at_test",
            "refresh_token": "rt_test",
            "expires_in": 36000
        }]
    })
}

async fn mount_token_endpoint(mock_server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_envelope()))
        .mount(mock_server)
        .await;
}

fn user_page(ids: &[i64], after_cursor: Option<&str>) -> serde_json::Value {
    let records: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| json!({"id": id, "email": format!("user{}@acme.test", id)}))
        .collect();
    json!({
        "status": {"error": false, "code": 200, "type": "success", "message": "Success"},
        "pagination": {
            "before_cursor": null,
            "after_cursor": after_cursor,
            "previous_link": null,
            "next_link": null
        },
        "data": records
    })
}

fn role_page(ids: &[i64], after_cursor: Option<&str>) -> serde_json::Value {
    let records: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| json!({"id": id, "name": format!("role-{}", id)}))
        .collect();
    json!({
        "status": {"error": false, "code": 200, "type": "success", "message": "Success"},
        "pagination": {"before_cursor": null, "after_cursor": after_cursor},
        "data": records
    })
}

#[tokio::test]
async fn test_pages_chain_in_server_order() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(header("Authorization", "bearer:at_test"))
        .and(query_param_is_missing("after_cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[1, 2], Some("c1"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(query_param("after_cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[3, 4], Some("c2"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(query_param("after_cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[5], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let users: Vec<User> = client
        .get_users(Vec::new())
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_page_fetches_are_lazy() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(query_param_is_missing("after_cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[1, 2], Some("c1"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    // the second page must not be requested while page one still has
    // buffered records
    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(query_param("after_cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[3], None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let mut cursor = client.get_users(Vec::new()).await.unwrap();

    let first = cursor.next_record().await.unwrap().unwrap();
    assert_eq!(first.id, 1);
    assert!(cursor.has_more());
    // cursor dropped with one record still buffered: no second fetch
}

#[tokio::test]
async fn test_cap_bounds_records_and_page_fetches() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    // limit 3 with pages of 2: two fetches, three records, page three
    // never requested
    Mock::given(method("GET"))
        .and(path("/api/1/roles"))
        .and(query_param("limit", "3"))
        .and(query_param_is_missing("after_cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(role_page(&[1, 2], Some("c1"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/1/roles"))
        .and(query_param("after_cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(role_page(&[3, 4], Some("c2"))))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/1/roles"))
        .and(query_param("after_cursor", "c2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(role_page(&[5, 6], None)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let roles: Vec<Role> = client
        .get_roles(Some(3))
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    let ids: Vec<i64> = roles.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_cap_above_total_yields_everything_available() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/roles"))
        .and(query_param_is_missing("after_cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(role_page(&[1, 2], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let roles = client
        .get_roles(Some(50))
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(roles.len(), 2);
}

#[tokio::test]
async fn test_limit_above_page_maximum_is_not_forwarded() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/roles"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(role_page(&[1, 2, 3], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let roles = client
        .get_roles(Some(1500))
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(roles.len(), 3);
}

#[tokio::test]
async fn test_absent_after_cursor_terminates_sequence() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[1, 2], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let mut cursor = client.get_users(Vec::new()).await.unwrap();

    assert_eq!(cursor.next_record().await.unwrap().unwrap().id, 1);
    assert_eq!(cursor.next_record().await.unwrap().unwrap().id, 2);
    // buffer drained, no continuation token: no further fetch attempted
    assert!(cursor.next_record().await.unwrap().is_none());
    assert!(!cursor.has_more());
    assert!(cursor.next_record().await.unwrap().is_none());
}

#[tokio::test]
async fn test_empty_first_page_yields_empty_sequence() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[], None)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let users = client
        .get_users(Vec::new())
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert!(users.is_empty());
}

#[tokio::test]
async fn test_independent_cursors_yield_identical_sequences() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(query_param_is_missing("after_cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[7, 8], Some("c1"))))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(query_param("after_cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[9], None)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let first: Vec<i64> = client
        .get_users(Vec::new())
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    let second: Vec<i64> = client
        .get_users(Vec::new())
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();

    assert_eq!(first, second);
    assert_eq!(first, vec![7, 8, 9]);
}

#[tokio::test]
async fn test_failed_page_fetch_exhausts_cursor() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(query_param_is_missing("after_cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_page(&[1, 2], Some("c1"))))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/1/users"))
        .and(query_param("after_cursor", "c1"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "status": {"error": true, "code": 503, "type": "error", "message": "Service Unavailable"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let mut cursor = client.get_users(Vec::new()).await.unwrap();

    assert!(cursor.next_record().await.unwrap().is_some());
    assert!(cursor.next_record().await.unwrap().is_some());

    let err = cursor.next_record().await.unwrap_err();
    assert_eq!(err.code(), "503");
    assert_eq!(err.description(), "Service Unavailable");

    // the cursor stays exhausted; no further fetch is attempted
    assert!(!cursor.has_more());
    assert!(cursor.next_record().await.unwrap().is_none());
}

#[tokio::test]
async fn test_base_query_parameters_sent_on_every_page() {
    let mock_server = MockServer::start().await;
    mount_token_endpoint(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/1/events"))
        .and(query_param("event_type_id", "5"))
        .and(query_param_is_missing("after_cursor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"type": "success", "message": "Success"},
            "pagination": {"after_cursor": "c1"},
            "data": [{"id": 100, "event_type_id": 5}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/1/events"))
        .and(query_param("event_type_id", "5"))
        .and(query_param("after_cursor", "c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"type": "success", "message": "Success"},
            "pagination": {"after_cursor": null},
            "data": [{"id": 101, "event_type_id": 5}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut client = VeridianClient::new(mock_server.uri(), "id", "secret");
    let events = client
        .get_events(vec![("event_type_id".to_string(), "5".to_string())])
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, 100);
    assert_eq!(events[1].id, 101);
}
