use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Duration, NaiveDate, Utc};
use library_circulation::adapters::memory::InMemoryLibrary;
use library_circulation::api::handlers::AppState;
use library_circulation::api::router::create_router;
use library_circulation::application::circulation::ServiceDependencies;
use library_circulation::domain::value_objects::*;
use library_circulation::ports::catalog::{BookRecord, MemberRecord};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// E2Eテスト用のアプリケーションセットアップ
///
/// インメモリストアと実際のAPIルーターを使用します。
/// ストアはテスト側からシードできるように共有して返します。
fn setup_e2e_app() -> (Arc<InMemoryLibrary>, axum::Router) {
    let store = Arc::new(InMemoryLibrary::new());

    let service_deps = ServiceDependencies {
        catalog: store.clone(),
        request_ledger: store.clone(),
        lending_store: store.clone(),
    };

    let app_state = Arc::new(AppState { service_deps });

    (store.clone(), create_router(app_state))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// テスト用の会員と書籍をシードする
fn seed_test_entities(store: &InMemoryLibrary) {
    store.add_member(MemberRecord {
        member_id: MemberId::new("M001").unwrap(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        phone: "000-0000".to_string(),
        joined_on: date(2020, 1, 1),
        strike_count: StrikeCount::zero(),
    });
    store.add_member(MemberRecord {
        member_id: MemberId::new("M002").unwrap(),
        name: "Bob".to_string(),
        email: "bob@example.com".to_string(),
        phone: "000-0001".to_string(),
        joined_on: date(2019, 1, 1),
        strike_count: StrikeCount::from_value(2),
    });
    store.add_book(BookRecord {
        book_id: BookId::new("B001").unwrap(),
        title: "Dune".to_string(),
        author: "Frank Herbert".to_string(),
        edition: "First".to_string(),
        condition: "Good".to_string(),
        status: BookStatus::Available,
    });
}

async fn send_json(app: &axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send_get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn submit_request_for(app: &axum::Router, requester: &str) -> String {
    let (status, body) = send_json(
        app,
        "POST",
        "/requests",
        json!({
            "requester_id": requester,
            "owner_id": "M002",
            "book_id": "B001",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["request_id"].as_str().unwrap().to_string()
}

// ============================================================================
// E2Eシナリオ
// ============================================================================

#[tokio::test]
async fn test_full_lifecycle_submit_approve_return() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    // 1. リクエストを作成
    let request_id = submit_request_for(&app, "M001").await;

    // 2. 待ち行列に現れる
    let (status, queue) = send_get(&app, "/books/B001/queue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.as_array().unwrap().len(), 1);
    assert_eq!(queue[0]["request_id"], request_id.as_str());
    assert_eq!(queue[0]["priority"], 1);

    // 3. 承認すると貸出が作成され、期限はデフォルトの+14日
    let (status, loan) = send_json(
        &app,
        "POST",
        &format!("/requests/{}/approve", request_id),
        json!({ "approved_by": "A001" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let expected_due = (today() + Duration::days(14)).to_string();
    assert_eq!(loan["due_on"], expected_due.as_str());
    assert_eq!(loan["borrower_id"], "M001");
    let loan_id = loan["loan_id"].as_str().unwrap().to_string();

    // 4. 貸出中一覧に現れる
    let (status, loans) = send_get(&app, "/loans/active").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loans.as_array().unwrap().len(), 1);
    assert_eq!(loans[0]["loan_id"], loan_id.as_str());
    assert_eq!(loans[0]["book_title"], "Dune");

    // 5. 返却すると書籍は再び貸出可能になる
    let (status, receipt) = send_json(
        &app,
        "POST",
        &format!("/loans/{}/return", loan_id),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["strike_issued"], false);
    assert_eq!(
        store.book_status_of(&BookId::new("B001").unwrap()),
        Some(BookStatus::Available)
    );
}

#[tokio::test]
async fn test_ranking_puts_fewer_strikes_first_over_http() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    // M2（ストライク2）が先にリクエスト、M1（ストライク0）が後
    submit_request_for(&app, "M002").await;
    submit_request_for(&app, "M001").await;

    let (status, queue) = send_get(&app, "/books/B001/queue").await;
    assert_eq!(status, StatusCode::OK);
    let queue = queue.as_array().unwrap();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue[0]["requester_id"], "M001");
    assert_eq!(queue[0]["strike_count"], 0);
    assert_eq!(queue[1]["requester_id"], "M002");
    assert_eq!(queue[1]["strike_count"], 2);
}

#[tokio::test]
async fn test_approve_conflict_returns_409() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    let first = submit_request_for(&app, "M001").await;
    let second = submit_request_for(&app, "M002").await;

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/requests/{}/approve", first),
        json!({ "approved_by": "A001" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // 2件目の承認は書籍が貸出中のため409
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/requests/{}/approve", second),
        json!({ "approved_by": "A001" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "BOOK_UNAVAILABLE");
}

#[tokio::test]
async fn test_malformed_due_date_returns_400() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    let request_id = submit_request_for(&app, "M001").await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/requests/{}/approve", request_id),
        json!({ "approved_by": "A001", "due_date": "not-a-date" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    // 過去の期限も400
    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/requests/{}/approve", request_id),
        json!({ "approved_by": "A001", "due_date": "2000-01-01" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    // リクエストはPendingのまま
    let (_, queue) = send_get(&app, "/books/B001/queue").await;
    assert_eq!(queue.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_requester_returns_422() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    let (status, body) = send_json(
        &app,
        "POST",
        "/requests",
        json!({
            "requester_id": "M999",
            "owner_id": "M002",
            "book_id": "B001",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "MEMBER_NOT_FOUND");
}

#[tokio::test]
async fn test_return_of_unknown_loan_returns_404() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    let (status, body) = send_json(&app, "POST", "/loans/T999/return", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "LOAN_NOT_FOUND");
}

#[tokio::test]
async fn test_deny_request_returns_204_and_removes_from_queue() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    let request_id = submit_request_for(&app, "M001").await;

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/requests/{}/deny", request_id),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, queue) = send_get(&app, "/books/B001/queue").await;
    assert!(queue.as_array().unwrap().is_empty());

    // 履歴には却下として残る
    let (status, history) = send_get(&app, "/requests?member_id=M001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history[0]["detail"], "Request denied");
}

#[tokio::test]
async fn test_pending_worklist_endpoint() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    submit_request_for(&app, "M001").await;
    submit_request_for(&app, "M002").await;

    let (status, worklist) = send_get(&app, "/requests/pending").await;
    assert_eq!(status, StatusCode::OK);
    let worklist = worklist.as_array().unwrap();
    assert_eq!(worklist.len(), 1);
    assert_eq!(worklist[0]["book_id"], "B001");
    assert_eq!(worklist[0]["title"], "Dune");
    assert_eq!(worklist[0]["pending_count"], 2);
}

#[tokio::test]
async fn test_missing_member_id_query_returns_400() {
    let (store, app) = setup_e2e_app();
    seed_test_entities(&store);

    let (status, body) = send_get(&app, "/requests").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_health_check() {
    let (_store, app) = setup_e2e_app();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
