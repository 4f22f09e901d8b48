//! Dashboard fetchers against a mock server.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use pocketbook_api::Pocketbook;
use pocketbook_fetch::HttpTransport;
use pocketbook_store::SessionStore;

fn api_for(server: &MockServer) -> Pocketbook {
    let transport = HttpTransport::builder(server.base_url().parse().unwrap())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let session = SessionStore::new();
    session.set_token("token");
    Pocketbook::with_transport(Arc::new(transport), session)
}

#[tokio::test]
async fn test_fetch_user_caches_profile() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/user/data")
            .header("authorization", "Bearer token");
        then.status(200)
            .json_body(json!({"user": {"name": "Asha", "email": "asha@example.com", "income": 5000}}));
    });

    let api = api_for(&server);
    api.session().set_authorized(false);
    let user = api.summary().fetch_user().await.unwrap();

    assert_eq!(user.name(), Some("Asha"));
    assert_eq!(api.session().user(), Some(user));
    assert!(api.session().is_authorized());
}

#[tokio::test]
async fn test_fetch_user_records_server_error() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/user/data");
        then.status(404).json_body(json!({"error": "User not found"}));
    });

    let api = api_for(&server);
    let err = api.summary().fetch_user().await.unwrap_err();

    assert_eq!(err.server_message(), Some("User not found"));
    assert_eq!(api.session().last_error().as_deref(), Some("User not found"));
    assert!(api.session().user().is_none());
}

#[tokio::test]
async fn test_expenses_are_reshaped_into_twelve_months() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/expense/expenses-per-month")
            .json_body(json!({"year": 2025}));
        then.status(200).json_body(json!({
            "expenses": [{"month": 3, "total": 150}, {"month": 12, "total": 20}]
        }));
    });

    let api = api_for(&server);
    let series = api.summary().get_expenses_per_month(2025).await.unwrap();

    mock.assert();
    let mut expected = [0.0; 12];
    expected[2] = 150.0;
    expected[11] = 20.0;
    assert_eq!(series.as_slice(), &expected);
    assert_eq!(api.session().expenses_per_month(), Some(series));
}

#[tokio::test]
async fn test_missing_expenses_field_is_malformed() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/api/expense/expenses-per-month");
        then.status(200).json_body(json!({}));
    });

    let api = api_for(&server);
    let err = api.summary().get_expenses_per_month(2025).await.unwrap_err();

    assert!(matches!(
        err.fetch_error(),
        Some(pocketbook_fetch::FetchError::MalformedResponse { field: "expenses", .. })
    ));
    assert_eq!(
        api.session().last_error().as_deref(),
        Some("Failed to get expenses per months")
    );
    assert!(api.session().expenses_per_month().is_none());
}

#[tokio::test]
async fn test_donut_failure_leaves_last_error_alone() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/expense/top-five-expenses");
        then.status(500).json_body(json!({"error": "boom"}));
    });

    let api = api_for(&server);
    assert!(api.summary().get_donut_data().await.is_err());
    assert!(api.session().last_error().is_none());
}

#[tokio::test]
async fn test_refresh_all_tolerates_partial_failure() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/user/data");
        then.status(200).json_body(json!({"user": {"name": "Asha"}}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/expense/expenses-per-month");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/expense/top-five-expenses");
        then.status(200).json_body(json!({
            "categories": [{"category": "Rent", "amount": 900}, {"category": "Food", "amount": 250}]
        }));
    });

    let api = api_for(&server);
    let report = api.summary().refresh_all_summary_data(2025).await;

    assert_eq!(report.failed, vec!["expenses"]);
    let state = api.session().snapshot();
    assert!(state.user.is_some());
    assert!(state.expenses_per_month.is_none());
    assert_eq!(state.category_breakdown.map(|c| c.len()), Some(2));
}

#[tokio::test]
async fn test_refresh_auth_token_stores_new_token() {
    let server = MockServer::start_async().await;
    let refresh = server.mock(|when, then| {
        when.method(GET).path("/api/user/refresh");
        then.status(200)
            .delay(Duration::from_millis(100))
            .json_body(json!({"accessToken": "renewed"}));
    });

    let api = api_for(&server);
    api.session().set_error("stale error");
    let summary = api.summary();
    let (a, b) = tokio::join!(summary.refresh_auth_token(), summary.refresh_auth_token());

    assert_eq!(a.unwrap(), "renewed");
    assert_eq!(b.unwrap(), "renewed");
    refresh.assert_hits(1);
    assert_eq!(api.session().token().as_deref(), Some("renewed"));
    assert!(api.session().last_error().is_none());
}

#[tokio::test]
async fn test_refresh_auth_token_failure_clears_token() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/user/refresh");
        then.status(401).json_body(json!({"error": "No refresh token"}));
    });

    let api = api_for(&server);
    let err = api.summary().refresh_auth_token().await.unwrap_err();

    assert!(err.is_session_terminal());
    assert!(api.session().token().is_none());
    assert_eq!(api.session().last_error().as_deref(), Some("No refresh token"));
}

#[tokio::test]
async fn test_concurrent_refresh_auth_token_single_call() {
    let server = MockServer::start_async().await;
    let refresh = server.mock(|when, then| {
        when.method(GET).path("/api/user/refresh");
        then.status(200)
            .delay(Duration::from_millis(200))
            .json_body(json!({"accessToken": "fresh"}));
    });

    let api = api_for(&server);
    let other = api.clone();
    let first = api.summary();
    let second = other.summary();
    let (a, b) = tokio::join!(first.refresh_auth_token(), second.refresh_auth_token());

    assert_eq!(a.unwrap(), "fresh");
    assert_eq!(b.unwrap(), "fresh");
    assert_eq!(refresh.hits(), 1);
    assert!(api.session().is_authorized());
}

#[tokio::test]
async fn test_rate_limited_refresh_auth_token_records_hint() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/user/refresh");
        then.status(429)
            .json_body(json!({"error": "Too many requests", "retryAfter": "30 seconds"}));
    });

    let api = api_for(&server);
    let err = api.summary().refresh_auth_token().await.unwrap_err();

    assert!(err.is_rate_limited());
    assert!(!err.is_session_terminal());
    assert!(api.session().is_rate_limited());
    assert_eq!(api.session().retry_after_secs(), 30);
}
