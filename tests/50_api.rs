mod common;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::{Hits, MockApi};
use vms_client::api::dashboard::{self, Card};
use vms_client::api::dictionary::{self, DictionaryKind};
use vms_client::api::users::{self, User};
use vms_client::api::{appointments, master_records, visitors, Freshness};
use vms_client::types::RecordId;
use vms_client::validation::SuggestionBinding;
use vms_client::{ClientError, StateStore};

fn user(active: bool) -> User {
    serde_json::from_value(json!({ "id": 12, "userName": "guard1", "isActive": active })).unwrap()
}

#[tokio::test]
async fn test_toggle_rolls_back_on_failure() {
    let router = Router::new().route(
        "/users/:id/toggle",
        patch(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "Toggle failed" }))) }),
    );
    let api = MockApi::spawn(router).await.unwrap();

    let mut guard = user(true);
    let err = users::toggle_active(&api.client(), &mut guard).await.unwrap_err();
    assert_eq!(err.to_string(), "Toggle failed");
    assert!(guard.is_active);
}

#[tokio::test]
async fn test_toggle_sends_new_value() {
    let seen = Arc::new(Mutex::new(None));
    let captured = seen.clone();
    let router = Router::new().route(
        "/users/:id/toggle",
        patch(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = Some(body);
                StatusCode::NO_CONTENT
            }
        }),
    );
    let api = MockApi::spawn(router).await.unwrap();

    let mut guard = user(true);
    let response = users::toggle_active(&api.client(), &mut guard).await.unwrap();
    assert!(response.is_success_sentinel());
    assert!(!guard.is_active);
    assert_eq!(seen.lock().unwrap().clone(), Some(json!({ "isActive": false })));
}

#[tokio::test]
async fn test_users_body_without_users_is_rejected() {
    let router = Router::new().route("/users", get(|| async { Json(json!([{ "id": 1 }])) }));
    let api = MockApi::spawn(router).await.unwrap();

    let err = users::list(&api.client(), 1, 10, None).await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedShape(_)));
}

#[tokio::test]
async fn test_users_list_passes_paging_and_search() {
    let router = Router::new().route(
        "/users",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            Json(json!({
                "users": [{ "id": 1, "userName": format!("{}-{}-{}", q["page"], q["limit"], q["search"]), "isActive": true }],
                "total": 1
            }))
        }),
    );
    let api = MockApi::spawn(router).await.unwrap();

    let listed = users::list(&api.client(), 2, 25, Some("ja")).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].user_name.as_deref(), Some("2-25-ja"));
    assert_eq!(listed[0].id, RecordId::Int(1));
}

#[tokio::test]
async fn test_person_name_confirmed_against_search() {
    let router = Router::new().route(
        "/users/search",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            let users = if "john smith".starts_with(&q["query"].to_lowercase()) {
                json!([{ "firstName": "John", "lastName": "Smith", "department": "IT", "designation": "Manager" }])
            } else {
                json!([])
            };
            Json(json!({ "users": users }))
        }),
    );
    let api = MockApi::spawn(router).await.unwrap();
    let client = api.client();
    let mut binding = SuggestionBinding::new();

    assert!(binding.confirm(&client, "John Smith (IT & Manager)").await.unwrap());
    assert_eq!(binding.selected().map(|s| s.label()).as_deref(), Some("John Smith (IT & Manager)"));

    assert!(!binding.confirm(&client, "John").await.unwrap());
    assert!(!binding.confirm(&client, "Jonathan").await.unwrap());
    assert!(!binding.is_confirmed());
}

fn visitor_list() -> Value {
    json!([
        { "id": 1, "isApproved": true, "exit": false },
        { "id": 2, "isApproved": false, "exit": true },
        { "id": 3, "isApproved": null },
        { "id": 4, "isApproved": true, "exit": true }
    ])
}

#[tokio::test]
async fn test_dashboard_counts_fall_back_to_cache() {
    let live = MockApi::spawn(Router::new().route("/visitors", get(|| async { Json(visitor_list()) })))
        .await
        .unwrap();
    let mut store = StateStore::in_memory();

    let counts = dashboard::counts(&live.client(), &mut store).await;
    let live_counts: Vec<(Card, usize)> = counts
        .into_iter()
        .map(|(card, count)| {
            let count = count.unwrap();
            assert_eq!(count.freshness, Freshness::Live);
            (card, count.count)
        })
        .collect();
    assert_eq!(
        live_counts,
        vec![(Card::Total, 4), (Card::Approved, 2), (Card::Disapproved, 1), (Card::Exit, 2)]
    );

    let down = MockApi::spawn(Router::new().route(
        "/visitors",
        get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    ))
    .await
    .unwrap();

    for (card, count) in dashboard::counts(&down.client(), &mut store).await {
        let count = count.unwrap();
        assert_eq!(count.freshness, Freshness::Cached);
        let expected = live_counts.iter().find(|(c, _)| *c == card).map(|(_, n)| *n);
        assert_eq!(Some(count.count), expected);
    }

    // No cache at all: each card reports its own error
    let mut empty = StateStore::in_memory();
    for (_, count) in dashboard::counts(&down.client(), &mut empty).await {
        assert_eq!(count.unwrap_err().status_code(), Some(502));
    }
}

#[tokio::test]
async fn test_visitor_list_is_newest_first() {
    let api = MockApi::spawn(Router::new().route("/visitors", get(|| async { Json(visitor_list()) })))
        .await
        .unwrap();
    let mut store = StateStore::in_memory();

    let (records, freshness) = visitors::list(&api.client(), &mut store).await.unwrap();
    assert_eq!(freshness, Freshness::Live);
    let ids: Vec<i64> = records.iter().map(|r| r.id.ordinal()).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
}

#[tokio::test]
async fn test_dictionary_create_trims_name() {
    let hits = Hits::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (counter, captured) = (hits.clone(), seen.clone());
    let router = Router::new().route(
        "/visitor-type",
        post(move |Json(body): Json<Value>| {
            let (counter, captured) = (counter.clone(), captured.clone());
            async move {
                counter.hit();
                captured.lock().unwrap().push(body);
                (StatusCode::CREATED, Json(json!({ "id": 9, "name": "Vendor" })))
            }
        }),
    );
    let api = MockApi::spawn(router).await.unwrap();

    dictionary::create(&api.client(), DictionaryKind::VisitorType, "  Vendor ").await.unwrap();
    assert_eq!(seen.lock().unwrap().as_slice(), &[json!({ "name": "Vendor" })]);

    let err = dictionary::create(&api.client(), DictionaryKind::VisitorType, "   ").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(hits.count(), 1);
}

#[tokio::test]
async fn test_master_record_lookup_treats_missing_as_none() {
    let router = Router::new().route(
        "/master-records/by-contact",
        get(|Query(q): Query<HashMap<String, String>>| async move {
            if q.get("contactnumber").map(String::as_str) == Some("5550100") {
                (StatusCode::OK, Json(json!({ "firstname": "Jane", "lastname": "Doe" })))
            } else {
                (StatusCode::NOT_FOUND, Json(json!({ "message": "Not found" })))
            }
        }),
    );
    let api = MockApi::spawn(router).await.unwrap();

    let found = master_records::by_contact(&api.client(), "5550100").await.unwrap();
    assert_eq!(found.unwrap()["firstname"], json!("Jane"));
    assert!(master_records::by_contact(&api.client(), "000").await.unwrap().is_none());
}

#[tokio::test]
async fn test_appointment_list_falls_back_to_cached_page() {
    let live = MockApi::spawn(Router::new().route(
        "/appointment",
        get(|| async {
            Json(json!({
                "data": [{ "id": 7, "firstname": "Jane" }, { "id": 9, "firstname": "Omar" }],
                "total": 42
            }))
        }),
    ))
    .await
    .unwrap();
    let mut store = StateStore::in_memory();

    let page = appointments::list(&live.client(), &mut store, 1, 10).await.unwrap();
    assert_eq!(page.freshness, Freshness::Live);
    assert_eq!(page.total, 42);
    assert_eq!(page.records[0].id, RecordId::Int(9));

    let down = MockApi::spawn(Router::new().route(
        "/appointment",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "message": "Maintenance" }))) }),
    ))
    .await
    .unwrap();

    let cached = appointments::list(&down.client(), &mut store, 1, 10).await.unwrap();
    assert_eq!(cached.freshness, Freshness::Cached);
    assert_eq!(cached.total, 2);
    let ids: Vec<i64> = cached.records.iter().map(|r| r.id.ordinal()).collect();
    assert_eq!(ids, vec![9, 7]);

    let err = appointments::list(&down.client(), &mut StateStore::in_memory(), 1, 10)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Maintenance");
}
