mod common;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::patch;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use common::{Hits, MockApi};
use vms_client::notify::{MemoryNotifier, ToastKind};
use vms_client::store::CacheKey;
use vms_client::types::EntityRef;
use vms_client::workflow::{StatusFlags, StatusWorkflow, VisitorStatus, WorkflowError};
use vms_client::{RetryPolicy, StateStore};

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(5))
}

fn failing_router(hits: Hits) -> Router {
    Router::new().route(
        "/appointment/:id/status/:status",
        patch(move || {
            let hits = hits.clone();
            async move {
                hits.hit();
                (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "message": "Database unavailable" })))
            }
        }),
    )
}

fn accepting_router(hits: Hits, bodies: Arc<std::sync::Mutex<Vec<Value>>>) -> Router {
    Router::new().route(
        "/visitors/:id/status/:status",
        patch(move |Path((id, status)): Path<(String, String)>, Json(body): Json<Value>| {
            let hits = hits.clone();
            let bodies = bodies.clone();
            async move {
                hits.hit();
                tokio::time::sleep(Duration::from_millis(50)).await;
                bodies.lock().unwrap().push(json!({ "id": id, "status": status, "body": body }));
                Json(json!({ "message": "Status updated" }))
            }
        }),
    )
}

#[tokio::test]
async fn test_retry_exhaustion_raises_one_error_and_commits_nothing() {
    let hits = Hits::default();
    let api = MockApi::spawn(failing_router(hits.clone())).await.unwrap();
    let notifier = Arc::new(MemoryNotifier::new());
    let workflow = StatusWorkflow::new(api.client(), fast_retry(), notifier.clone());

    let mut store = StateStore::in_memory();
    let entity = EntityRef::appointment(5);
    let cached = vec![json!({ "id": 5, "isApproved": null })];
    store.put_cache(CacheKey::Appointments, cached.clone()).unwrap();

    let err = workflow
        .transition(&mut store, &entity, StatusFlags::default(), VisitorStatus::Disapprove)
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Client(_)));
    assert_eq!(err.to_string(), "Database unavailable");
    assert_eq!(hits.count(), 3);

    let toasts = notifier.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);

    assert!(!store.is_disapproved(&entity));
    assert_eq!(store.cached(CacheKey::Appointments), cached.as_slice());
}

#[tokio::test]
async fn test_successful_transitions_commit_flag_and_cache() {
    let hits = Hits::default();
    let bodies = Arc::new(std::sync::Mutex::new(Vec::new()));
    let api = MockApi::spawn(accepting_router(hits.clone(), bodies.clone())).await.unwrap();
    let notifier = Arc::new(MemoryNotifier::new());
    let workflow = StatusWorkflow::new(api.client(), fast_retry(), notifier.clone());

    let mut store = StateStore::in_memory();
    let entity = EntityRef::visitor(8);
    store.put_cache(CacheKey::Visitors, vec![json!({ "id": 8 })]).unwrap();

    let flags = workflow
        .transition(&mut store, &entity, StatusFlags::default(), VisitorStatus::Disapprove)
        .await
        .unwrap();
    assert!(store.is_disapproved(&entity));
    assert_eq!(flags.is_approved, Some(false));
    assert_eq!(store.cached(CacheKey::Visitors)[0]["isApproved"], json!(false));

    // A disapproved visitor can only exit; approving again is refused locally
    let refused = workflow
        .transition(&mut store, &entity, flags, VisitorStatus::Approve)
        .await
        .unwrap_err();
    assert!(matches!(refused, WorkflowError::NotAvailable { .. }));
    assert_eq!(refused.to_string(), "Cannot approve: visitor is disapproved");
    assert_eq!(hits.count(), 1);

    let flags = workflow
        .transition(&mut store, &entity, flags, VisitorStatus::Exit)
        .await
        .unwrap();
    assert!(flags.exit);
    // Exit leaves the disapproval flag alone
    assert!(store.is_disapproved(&entity));

    let bodies = bodies.lock().unwrap();
    assert_eq!(bodies[0]["status"], json!("disapprove"));
    assert_eq!(bodies[0]["body"], json!({ "sendEmail": false, "isApproved": false, "complete": false }));
    assert_eq!(bodies[1]["body"], json!({ "sendEmail": false, "exit": true }));
    assert_eq!(notifier.count(ToastKind::Success), 2);
}

#[tokio::test]
async fn test_concurrent_identical_transitions_share_one_request() {
    let hits = Hits::default();
    let bodies = Arc::new(std::sync::Mutex::new(Vec::new()));
    let api = MockApi::spawn(accepting_router(hits.clone(), bodies)).await.unwrap();
    let notifier = Arc::new(MemoryNotifier::new());
    let workflow = StatusWorkflow::new(api.client(), fast_retry(), notifier.clone());
    let entity = EntityRef::visitor(3);

    let (a, b) = tokio::join!(
        workflow.send(&entity, VisitorStatus::Approve),
        workflow.send(&entity, VisitorStatus::Approve),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(hits.count(), 1);
    assert_eq!(notifier.toasts().len(), 1);
    assert!(!workflow.is_pending(&entity, VisitorStatus::Approve));
}
