//! Gateway integration tests against a wiremock backend

use chrono::{Datelike, NaiveDate, TimeZone, Timelike, Utc};
use pistech_admin::api::{ApiClient, ApiError, EntityGateway};
use pistech_admin::models::{
    ClientCharge, ClientChargeFilters, Credentials, Currency, EntityKind, LogAction, MoneyFilters,
    Note, NoteDraft, NoteFilters, NotePatch, Project,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn note_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "content": "body",
        "tags": ["ops"],
        "createdAt": "2024-03-01T10:00:00.000Z",
        "updatedAt": "2024-03-02T08:30:00",
        "deletedAt": null
    })
}

fn notes(client: &ApiClient) -> &dyn EntityGateway<Note> {
    client
}

fn charges(client: &ApiClient) -> &dyn EntityGateway<ClientCharge> {
    client
}

async fn authed_client(server: &MockServer) -> ApiClient {
    let client = ApiClient::new(server.uri());
    client.set_token(Some("tok-123".into()));
    client
}

// ============================================================================
// Request shape and decoding
// ============================================================================

#[tokio::test]
async fn test_list_attaches_bearer_and_materializes_dates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([note_json("n1", "First"), note_json("n2", "Second")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let list = notes(&client).list(None).await.unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(
        list[0].created_at,
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    );
    // Naive timestamps are read as UTC
    assert_eq!(list[0].updated_at.day(), 2);
    assert_eq!(list[0].updated_at.hour(), 8);
    assert!(list[0].deleted_at.is_none());

    // No filters, no query string
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query().is_none());
}

#[tokio::test]
async fn test_no_token_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/n1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_json("n1", "First")))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let note = notes(&client).get("n1").await.unwrap();
    assert_eq!(note.title, "First");

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_create_and_update_send_json_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .and(body_json(json!({"title": "New", "content": "text"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(note_json("n9", "New")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/notes/n9"))
        .and(body_json(json!({"title": "Renamed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_json("n9", "Renamed")))
        .expect(1)
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let draft = NoteDraft {
        title: "New".into(),
        content: "text".into(),
        tags: None,
    };
    let created = notes(&client).create(&draft).await.unwrap();
    assert_eq!(created.id, "n9");

    let patch = NotePatch {
        title: Some("Renamed".into()),
        ..Default::default()
    };
    let updated = notes(&client).update("n9", &patch).await.unwrap();
    assert_eq!(updated.title, "Renamed");
}

#[tokio::test]
async fn test_recovery_routes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/notes/n1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/notes/n1/restore"))
        .respond_with(ResponseTemplate::new(200).set_body_json(note_json("n1", "Back")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/notes/n1/hard"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    notes(&client).delete("n1").await.unwrap();
    let restored = notes(&client).restore("n1").await.unwrap();
    assert!(restored.deleted_at.is_none());
    notes(&client).hard_delete("n1").await.unwrap();
}

#[tokio::test]
async fn test_paginated_defaults_and_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/paginated"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [note_json("n1", "First")],
            "total": 11,
            "page": 1,
            "limit": 10,
            "totalPages": 2,
            "hasNext": true,
            "hasPrev": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let page = notes(&client)
        .list_paginated(&NoteFilters::default())
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.total, 11);
    assert_eq!(page.total_pages, 2);
    assert!(page.has_next);
    assert!(!page.has_prev);
}

#[tokio::test]
async fn test_paginated_filters_use_backend_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/client-charges/paginated"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "5"))
        .and(query_param("includeDeleted", "true"))
        .and(query_param("minAmount", "100"))
        .and(query_param("currency", "USD"))
        .and(query_param("startDate", "2024-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "total": 0,
            "page": 1,
            "limit": 5,
            "totalPages": 0,
            "hasNext": false,
            "hasPrev": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let mut filters = ClientChargeFilters {
        money: MoneyFilters {
            min_amount: Some(100.0),
            currency: Some(Currency::Usd),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            description: Some(String::new()),
            ..Default::default()
        },
        ..Default::default()
    };
    // Page 0 is raised to 1
    filters.paging.page = Some(0);
    filters.paging.limit = Some(5);
    filters.paging.include_deleted = Some(true);

    let page = charges(&client).list_paginated(&filters).await.unwrap();
    assert!(page.data.is_empty());

    // Blank filters are not sent
    let requests = server.received_requests().await.unwrap();
    let query = requests[0].url.query().unwrap_or_default().to_string();
    assert!(!query.contains("description"));
}

#[tokio::test]
async fn test_nested_dates_in_project_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects/p1/with-charges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "name": "Website",
            "status": "active",
            "amount": 1000,
            "currency": "USD",
            "createdAt": "2024-01-01",
            "updatedAt": "2024-01-01T00:00:00Z",
            "clientCharges": [{
                "id": "c1",
                "projectId": "p1",
                "amount": 400,
                "currency": "USD",
                "date": "2024-02-10",
                "paymentMethod": "transfer",
                "createdAt": "2024-02-10T12:00:00Z",
                "updatedAt": "2024-02-10T12:00:00Z"
            }],
            "partnerPayments": [],
            "totalClientCharges": 400,
            "totalPartnerPayments": 0,
            "netAmount": 400
        })))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let summary = client.project_with_charges("p1").await.unwrap();

    assert_eq!(summary.project.name, "Website");
    assert_eq!(summary.client_charges.len(), 1);
    assert_eq!(
        summary.client_charges[0].date,
        Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap()
    );
    assert_eq!(summary.net_amount, 400.0);
}

#[tokio::test]
async fn test_logs_by_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/logs/type/Project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "l1",
            "userId": "u1",
            "action": "UPDATE",
            "entityType": "Project",
            "entityId": "p1",
            "changes": ["amount"],
            "createdAt": "2024-05-05T05:05:05Z"
        }])))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let entries = client.logs_by_type(EntityKind::Project).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, LogAction::Update);
    assert_eq!(entries[0].entity_type, EntityKind::Project);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_401_drops_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    client.set_token(Some("expired".into()));

    let err = EntityGateway::<Project>::list(&client, None)
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::AuthenticationFailed);
    assert_eq!(err.to_string(), "Authentication failed. Please login again.");
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_403_is_an_auth_failure_too() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/notes/n1/hard"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    let err = notes(&client).hard_delete("n1").await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(!client.has_token());
}

#[tokio::test]
async fn test_rejection_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": ["title should not be empty", "content must be a string"],
            "statusCode": 400
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Note not found"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/boom"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;

    let err = notes(&client)
        .create(&NoteDraft::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "title should not be empty, content must be a string"
    );
    assert_eq!(err.status(), Some(400));

    let err = notes(&client).get("missing").await.unwrap_err();
    assert_eq!(err.to_string(), "Note not found");

    let err = notes(&client).get("boom").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error 500");

    // Rejections leave the session alone
    assert!(client.has_token());
}

#[tokio::test]
async fn test_invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/empty"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = authed_client(&server).await;
    assert!(matches!(
        notes(&client).list(None).await,
        Err(ApiError::Decode(_))
    ));
    assert_eq!(
        notes(&client).get("empty").await.unwrap_err(),
        ApiError::EmptyResponse
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = ApiClient::new(uri);
    let err = notes(&client).list(None).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

// ============================================================================
// Auth endpoints
// ============================================================================

#[tokio::test]
async fn test_login_holds_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "admin@pistech.dev", "password": "pw"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": "jwt-abc",
            "user": {
                "id": "u1",
                "email": "admin@pistech.dev",
                "role": "admin",
                "createdAt": "2024-01-01T00:00:00Z",
                "updatedAt": "2024-01-01T00:00:00Z"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    let response = client
        .login(&Credentials {
            email: "admin@pistech.dev".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();

    assert_eq!(response.user.unwrap().id, "u1");
    assert_eq!(client.token().as_deref(), Some("jwt-abc"));
}

#[tokio::test]
async fn test_validate_token_posts_token_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/validate-token"))
        .and(body_json(json!({"token": "good"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "good"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/validate-token"))
        .and(body_json(json!({"token": "stale"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": null})))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri());
    assert!(client.validate_token("good").await.unwrap());
    assert!(!client.validate_token("stale").await.unwrap());
}
