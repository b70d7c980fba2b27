mod support;

use serde_json::{json, Value};

use itam_console::dashboard;
use itam_console::models::{AllocationKey, Asset, AssetFilter, Role};
use itam_console::query::{ListQuery, Sort, SortOrder};
use itam_console::resources::{Allocations, Assets, Employees};
use itam_console::{ConsoleError, SessionManager};
use support::{issue_token, MockBackend};

#[tokio::test]
async fn test_login_with_access_token_lands_admin() {
    let backend = MockBackend::start().await;
    let token = issue_token(json!({"role": "Admin", "sub": "alice"}));
    backend.respond("POST", "/authentication/login", 200, json!({ "accessToken": token }));

    let session = SessionManager::in_memory();
    let client = backend.client(session.clone());
    let outcome = client.login("alice", "x").await.unwrap();

    assert_eq!(outcome.landing, "/admin");
    assert_eq!(session.retrieve().unwrap(), Some(token));
    assert_eq!(session.identity().unwrap().role, Some(Role::Admin));
    assert_eq!(session.display_name().unwrap().as_deref(), Some("alice"));

    let sent = backend.last("POST", "/authentication/login").unwrap();
    assert_eq!(sent.body, json!({"username": "alice", "password": "x"}));
}

#[tokio::test]
async fn test_employee_login_lands_employee() {
    let backend = MockBackend::start().await;
    let token = issue_token(json!({"role": "Employee", "username": "bob", "employeeId": 7}));
    backend.respond("POST", "/authentication/login", 200, json!(token));

    let client = backend.client(SessionManager::in_memory());
    let outcome = client.login("bob", "pw").await.unwrap();
    assert_eq!(outcome.landing, "/employee");
    assert_eq!(outcome.identity.unwrap().user_id, Some(7));
}

#[tokio::test]
async fn test_login_without_role_lands_employee() {
    let backend = MockBackend::start().await;
    let token = issue_token(json!({"sub": "carol", "role": "admin"}));
    backend.respond("POST", "/authentication/login", 200, json!({ "token": token }));

    let session = SessionManager::in_memory();
    let client = backend.client(session.clone());
    let outcome = client.login("carol", "pw").await.unwrap();

    assert_eq!(outcome.identity.unwrap().role, None);
    assert_eq!(outcome.landing, "/employee");
    assert!(session.retrieve().unwrap().is_some());
}

#[tokio::test]
async fn test_login_rejects_blank_credentials_without_calling_backend() {
    let backend = MockBackend::start().await;
    let client = backend.client(SessionManager::in_memory());

    let err = client.login("  ", "pw").await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));
    assert!(backend.recorded().is_empty());
}

#[tokio::test]
async fn test_login_without_token_in_response_fails() {
    let backend = MockBackend::start().await;
    backend.respond("POST", "/authentication/login", 200, json!({"user": "alice"}));

    let session = SessionManager::in_memory();
    let client = backend.client(session.clone());
    let err = client.login("alice", "pw").await.unwrap_err();
    assert!(matches!(err, ConsoleError::UnexpectedResponse(_)));
    assert_eq!(session.retrieve().unwrap(), None);
}

#[tokio::test]
async fn test_bearer_attached_only_when_token_stored() {
    let backend = MockBackend::start().await;
    backend.respond("GET", "/assets", 200, json!([]));

    let session = SessionManager::in_memory();
    let client = backend.client(session.clone());

    client.resource::<Assets>().list().await.unwrap();
    assert_eq!(backend.last("GET", "/assets").unwrap().authorization, None);

    session.store("abc.def.ghi").unwrap();
    client.resource::<Assets>().list().await.unwrap();
    assert_eq!(
        backend.last("GET", "/assets").unwrap().authorization.as_deref(),
        Some("Bearer abc.def.ghi")
    );
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_redirects() {
    let backend = MockBackend::start().await;
    backend.respond("GET", "/employees", 401, json!({"message": "Token expired"}));

    let session = SessionManager::in_memory();
    session
        .store(&issue_token(json!({"Role": "Admin", "sub": "alice"})))
        .unwrap();
    session.set_display_name("alice").unwrap();
    let client = backend.client(session.clone());

    let err = client.resource::<Employees>().list().await.unwrap_err();
    assert_eq!(err.redirect(), Some("/login"));
    assert_eq!(err.to_string(), "Token expired");
    assert_eq!(session.retrieve().unwrap(), None);
    assert_eq!(session.identity(), None);
    assert_eq!(session.display_name().unwrap(), None);
}

#[tokio::test]
async fn test_asset_search_sends_blank_name_as_null() {
    let backend = MockBackend::start().await;
    backend.respond(
        "POST",
        "/assets/search",
        200,
        json!({"items": [{"assetId": 1, "assetName": "Laptop"}], "totalCount": 47}),
    );

    let client = backend.client(SessionManager::in_memory());
    let assets = client.resource::<Assets>();
    let mut query = assets.query();
    query.set_filters(AssetFilter {
        asset_name: Some(String::new()),
        ..AssetFilter::default()
    });
    query.go_to_page(10).unwrap();

    let page = assets.search(&query.request()).await.unwrap();
    assert_eq!(page.items[0].asset_name.as_deref(), Some("Laptop"));
    assert_eq!(page.page_count(query.page_size()), 10);

    let sent = backend.last("POST", "/assets/search").unwrap().body;
    assert_eq!(sent["AssetName"], Value::Null);
    assert_eq!(sent["pageNumber"], json!(10));
    assert_eq!(sent["pageSize"], json!(5));
    assert_eq!(sent["sortBy"], json!("AssetName"));
    assert_eq!(sent["sortOrder"], json!("asc"));
}

#[tokio::test]
async fn test_invalid_search_never_reaches_backend() {
    let backend = MockBackend::start().await;
    let client = backend.client(SessionManager::in_memory());

    let mut request = ListQuery::new(
        AssetFilter::default(),
        5,
        Some(Sort::new("AssetName", SortOrder::Asc)),
    )
    .request();
    request.page_number = 0;

    let err = client.resource::<Assets>().search(&request).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(_)));
    assert!(backend.recorded().is_empty());
}

#[tokio::test]
async fn test_employee_search_page_shape() {
    let backend = MockBackend::start().await;
    backend.respond(
        "POST",
        "/employees/search",
        200,
        json!({
            "Employees": [{"employeeId": 3, "firstName": "Dana"}, {"employeeId": 4}],
            "TotalNumberOfRecords": 12
        }),
    );

    let client = backend.client(SessionManager::in_memory());
    let employees = client.resource::<Employees>();
    let query = employees.query();
    let page = employees.search(&query.request()).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_count, 12);
    assert_eq!(page.page_count(query.page_size()), 3);
    let sent = backend.last("POST", "/employees/search").unwrap().body;
    assert_eq!(sent["sortBy"], json!("CreatedAt"));
    assert_eq!(sent["sortOrder"], json!("desc"));
}

#[tokio::test]
async fn test_allocation_composite_key_paths() {
    let backend = MockBackend::start().await;
    backend.respond_raw("DELETE", "/allocations/asset/12/employee/7", 204, "");
    backend.respond(
        "GET",
        "/allocations/asset/12/employee/7",
        200,
        json!({"assetId": 12, "employeeId": 7, "status": "Allocated", "isActive": true}),
    );

    let client = backend.client(SessionManager::in_memory());
    let allocations = client.resource::<Allocations>();
    let key: AllocationKey = "12:7".parse().unwrap();

    let allocation = allocations.get(&key).await.unwrap();
    assert!(allocation.is_active);
    allocations.remove(&key).await.unwrap();
    assert!(backend.last("DELETE", "/allocations/asset/12/employee/7").is_some());
}

#[tokio::test]
async fn test_delete_failure_carries_server_message() {
    let backend = MockBackend::start().await;
    backend.respond(
        "DELETE",
        "/assets/5",
        409,
        json!({"message": "Asset is currently allocated"}),
    );
    backend.respond_raw("DELETE", "/assets/6", 500, "");

    let client = backend.client(SessionManager::in_memory());
    let assets = client.resource::<Assets>();

    let err = assets.remove(&5).await.unwrap_err();
    assert_eq!(err.user_message("Delete failed"), "Asset is currently allocated");

    let err = assets.remove(&6).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Api { status: 500, .. }));
    assert_eq!(err.user_message("Delete failed"), "Delete failed");
}

#[tokio::test]
async fn test_create_returns_echoed_record() {
    let backend = MockBackend::start().await;
    backend.respond(
        "POST",
        "/assets",
        201,
        json!({"assetId": 30, "assetName": "Dock", "categoryId": 2, "statusId": 1}),
    );
    backend.respond_raw("PUT", "/assets/30", 204, "");

    let client = backend.client(SessionManager::in_memory());
    let assets = client.resource::<Assets>();
    let draft = Asset {
        asset_name: Some("Dock".into()),
        category_id: Some(2),
        status_id: Some(1),
        ..Asset::default()
    };

    let created = assets.create(&draft).await.unwrap().unwrap();
    assert_eq!(created.asset_id, Some(30));
    let sent = backend.last("POST", "/assets").unwrap().body;
    assert!(sent.get("assetId").is_none());

    assert_eq!(assets.update(&30, &created).await.unwrap(), None);
}

#[tokio::test]
async fn test_text_confirmation_is_a_successful_save() {
    let backend = MockBackend::start().await;
    backend.respond_raw("POST", "/assets", 200, "Asset created successfully");
    backend.respond_raw("PUT", "/employees/4", 200, "Updated");

    let client = backend.client(SessionManager::in_memory());
    let created = client.resource::<Assets>().create(&Asset::default()).await.unwrap();
    assert_eq!(created, None);

    let employees = client.resource::<Employees>();
    let updated = employees.update(&4, &Default::default()).await.unwrap();
    assert_eq!(updated, None);
    assert!(backend.last("PUT", "/employees/4").is_some());
}

#[tokio::test]
async fn test_asset_statuses_normalized() {
    let backend = MockBackend::start().await;
    backend.respond(
        "GET",
        "/assets/statuses",
        200,
        json!([{"id": 1, "name": "Available"}, {"id": 2, "name": "Allocated"}]),
    );

    let client = backend.client(SessionManager::in_memory());
    let statuses = client.resource::<Assets>().statuses().await.unwrap();
    assert_eq!(statuses[1].status_id, 2);
    assert_eq!(statuses[1].status_name.as_deref(), Some("Allocated"));
}

fn dashboard_backend(backend: &MockBackend) {
    backend.respond("GET", "/assets", 200, json!([{"assetId": 1}, {"assetId": 2}, {"assetId": 3}]));
    backend.respond("GET", "/assets/allocated/count", 200, json!(2));
    backend.respond(
        "GET",
        "/assets/byCategory",
        200,
        json!([{"categoryName": "Laptops", "count": 2}, {"CategoryId": 4, "Count": 1}]),
    );
    backend.respond("GET", "/servicerequests/pending/count", 200, json!({"count": 5}));
    backend.respond(
        "GET",
        "/servicerequests/monthly",
        200,
        json!([{"month": "2025-02", "count": 4}, {"count": 9}]),
    );
    backend.respond("GET", "/auditrequests/ongoing/count", 200, json!("1"));
    let logs: Vec<Value> = (0..12)
        .map(|i| json!({"adminLogId": i, "action": "Update", "timestamp": "2025-03-01T09:30:00"}))
        .collect();
    backend.respond("GET", "/adminlogs/recent", 200, Value::Array(logs));
}

#[tokio::test]
async fn test_dashboard_snapshot() {
    let backend = MockBackend::start().await;
    dashboard_backend(&backend);

    let client = backend.client(SessionManager::in_memory());
    let snapshot = dashboard::load(&client).await.unwrap();

    assert_eq!(snapshot.total_assets, 3);
    assert_eq!(snapshot.allocated_assets, 2);
    assert_eq!(snapshot.pending_requests, 5);
    assert_eq!(snapshot.ongoing_audits, 1);
    assert_eq!(snapshot.asset_distribution[1].name, "Category 4");
    assert_eq!(snapshot.requests_trend.len(), 1);
    assert_eq!(snapshot.requests_trend[0].month, "Feb 2025");
    assert_eq!(snapshot.recent_activity.len(), dashboard::RECENT_ACTIVITY_LIMIT);
}

#[tokio::test]
async fn test_dashboard_total_from_summary_object() {
    let backend = MockBackend::start().await;
    dashboard_backend(&backend);
    backend.respond("GET", "/assets", 200, json!({"total": 41}));

    let client = backend.client(SessionManager::in_memory());
    assert_eq!(dashboard::load(&client).await.unwrap().total_assets, 41);
}

#[tokio::test]
async fn test_dashboard_fails_as_a_batch() {
    let backend = MockBackend::start().await;
    dashboard_backend(&backend);
    backend.respond("GET", "/servicerequests/monthly", 500, json!({"title": "boom"}));

    let client = backend.client(SessionManager::in_memory());
    let err = dashboard::load(&client).await.unwrap_err();
    assert!(matches!(err, ConsoleError::Api { status: 500, .. }));
    assert_eq!(err.to_string(), "boom");
}

#[tokio::test]
async fn test_my_assets_filters_by_own_employee_id() {
    let backend = MockBackend::start().await;
    backend.respond(
        "POST",
        "/allocations/search",
        200,
        json!({"items": [{"assetId": 8, "employeeId": 7}], "totalCount": 1}),
    );

    let client = backend.client(SessionManager::in_memory());
    let page = client.resource::<Allocations>().for_employee(7).await.unwrap();
    assert_eq!(page.items[0].asset_id, 8);

    let sent = backend.last("POST", "/allocations/search").unwrap().body;
    assert_eq!(sent["employeeId"], json!(7));
    assert_eq!(sent["assetId"], Value::Null);
    assert_eq!(sent["pageSize"], json!(10));
}
