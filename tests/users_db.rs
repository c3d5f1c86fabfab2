//! Repository and session behaviour against a real PostgreSQL.
//!
//! Runs only when `DATABASE_URL` is set. Each test works in its own schema, dropped afterwards.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use project_api::config::DatabaseSettings;
use project_api::db::migration_connection;
use project_api::models::{User, UserCreate, UserUpdate, ENTITIES};
use project_api::sql::{SortOrder, UserSort, UserSortField};
use project_api::{app, apply_schema, AppError, AppState, Database, DbError, Environment, Settings, UserRepository};
use serde_json::{json, Value};
use sqlx::{Connection, PgConnection};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

struct TestDb {
    db: Arc<Database>,
    url: String,
    schema: String,
}

async fn setup(max_connections: u32) -> Option<TestDb> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping");
        return None;
    };
    let schema = format!("test_{}", Uuid::new_v4().simple());
    let mut conn = PgConnection::connect(&url).await.unwrap();
    sqlx::query(&format!("CREATE SCHEMA \"{}\"", schema))
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();

    let settings = DatabaseSettings {
        url: url.clone(),
        schema: Some(schema.clone()),
        max_connections,
        acquire_timeout: Duration::from_secs(5),
        ..DatabaseSettings::default()
    };
    let mut conn = migration_connection(&settings).await.unwrap();
    apply_schema(&mut conn, ENTITIES).await.unwrap();
    // Second run is a no-op.
    apply_schema(&mut conn, ENTITIES).await.unwrap();
    conn.close().await.unwrap();

    let db = Database::new(settings);
    db.init().unwrap();
    Some(TestDb {
        db: Arc::new(db),
        url,
        schema,
    })
}

async fn teardown(t: TestDb) {
    t.db.dispose().await;
    let mut conn = PgConnection::connect(&t.url).await.unwrap();
    sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", t.schema))
        .execute(&mut conn)
        .await
        .unwrap();
    conn.close().await.unwrap();
}

async fn create(db: &Database, name: &str, title: Option<&str>) -> User {
    let input = UserCreate {
        id: None,
        name: Some(name.to_string()),
        title: title.map(str::to_string),
    };
    db.with_session(|s| {
        Box::pin(async move {
            let user = UserRepository::create(s, input).await?;
            s.commit().await?;
            Ok::<_, AppError>(user)
        })
    })
    .await
    .unwrap()
}

async fn update(db: &Database, id: Uuid, version: i32, title: &str) -> Result<User, AppError> {
    let changes = UserUpdate {
        version,
        name: None,
        title: Some(title.to_string()),
    };
    db.with_session(|s| {
        Box::pin(async move {
            let user = UserRepository::update(s, id, changes).await?;
            s.commit().await?;
            Ok::<_, AppError>(user)
        })
    })
    .await
}

async fn count(db: &Database) -> i64 {
    db.with_session(|s| Box::pin(async move { UserRepository::count(s, None).await }))
        .await
        .unwrap()
}

#[tokio::test]
async fn versioned_update_and_delete() {
    let Some(t) = setup(5).await else { return };
    let created = create(&t.db, "Ada", None).await;
    assert_eq!(created.version, 1);

    let updated = update(&t.db, created.id, 1, "Engineer").await.unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.name.as_deref(), Some("Ada"));
    assert_eq!(updated.title.as_deref(), Some("Engineer"));
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    let again = update(&t.db, created.id, 2, "Engineer").await.unwrap();
    assert_eq!(again.version, 3);
    assert!(again.updated_at > updated.updated_at);

    let stale = update(&t.db, created.id, 1, "Overwrite").await.unwrap_err();
    assert!(matches!(stale, AppError::Db(DbError::StaleData { expected_version: 1, .. })));

    let id = created.id;
    let stale_delete = t
        .db
        .with_session(|s| Box::pin(async move { UserRepository::delete(s, id, 2).await }))
        .await
        .unwrap_err();
    assert!(matches!(stale_delete, AppError::Db(DbError::StaleData { .. })));

    t.db.with_session(|s| {
        Box::pin(async move {
            UserRepository::delete(s, id, 3).await?;
            s.commit().await?;
            Ok::<_, AppError>(())
        })
    })
    .await
    .unwrap();

    let missing = t
        .db
        .with_session(|s| Box::pin(async move { UserRepository::get(s, id).await }))
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
    let missing = update(&t.db, id, 3, "Ghost").await.unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));

    teardown(t).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_conflicting_updates() {
    let Some(t) = setup(5).await else { return };
    let user = create(&t.db, "Grace", None).await;

    let mut handles = Vec::new();
    for title in ["Admiral", "Professor"] {
        let db = t.db.clone();
        let id = user.id;
        handles.push(tokio::spawn(async move { update(&db, id, 1, title).await }));
    }
    let mut ok = 0;
    let mut stale = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(u) => {
                assert_eq!(u.version, 2);
                ok += 1;
            }
            Err(AppError::Db(DbError::StaleData { .. })) => stale += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!((ok, stale), (1, 1));

    let id = user.id;
    let current = t
        .db
        .with_session(|s| Box::pin(async move { UserRepository::get(s, id).await }))
        .await
        .unwrap();
    assert_eq!(current.version, 2);

    teardown(t).await;
}

#[tokio::test]
async fn failed_unit_of_work_is_rolled_back() {
    let Some(t) = setup(5).await else { return };
    let res: Result<(), AppError> = t
        .db
        .with_session(|s| {
            Box::pin(async move {
                UserRepository::create(s, UserCreate::default()).await?;
                Err::<(), _>(AppError::internal("Test", "abort"))
            })
        })
        .await;
    assert!(res.is_err());

    // Closed without commit.
    t.db.with_session(|s| Box::pin(async move { UserRepository::create(s, UserCreate::default()).await }))
        .await
        .unwrap();

    assert_eq!(count(&t.db).await, 0);
    teardown(t).await;
}

#[tokio::test]
async fn cancelled_request_releases_its_connection() {
    let Some(t) = setup(1).await else { return };
    let db = t.db.clone();
    let work = db.with_session(|s| {
        Box::pin(async move {
            UserRepository::create(s, UserCreate::default()).await?;
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AppError>(())
        })
    });
    assert!(tokio::time::timeout(Duration::from_millis(300), work).await.is_err());

    // The only pooled connection is available again and the insert never committed.
    assert_eq!(count(&t.db).await, 0);
    teardown(t).await;
}

#[tokio::test]
async fn list_pages_oldest_first() {
    let Some(t) = setup(5).await else { return };
    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(create(&t.db, &format!("user{i}"), None).await.id);
    }
    let page = t
        .db
        .with_session(|s| Box::pin(async move { UserRepository::list(s, 1, 2).await }))
        .await
        .unwrap();
    assert_eq!(page.iter().map(|u| u.id).collect::<Vec<_>>(), ids[1..3].to_vec());

    let all = t
        .db
        .with_session(|s| Box::pin(async move { UserRepository::list(s, 0, 100).await }))
        .await
        .unwrap();
    assert_eq!(all.len(), 5);
    teardown(t).await;
}

#[tokio::test]
async fn search_matches_name_or_title_literally() {
    let Some(t) = setup(5).await else { return };
    create(&t.db, "Ada Lovelace", Some("Analyst")).await;
    create(&t.db, "Grace Hopper", Some("Admiral")).await;
    create(&t.db, "100%_real", None).await;

    let (total, users) = t
        .db
        .with_session(|s| {
            Box::pin(async move {
                let sort = UserSort {
                    field: UserSortField::Name,
                    order: SortOrder::Desc,
                };
                let total = UserRepository::count(s, Some("AD")).await?;
                let users = UserRepository::search(s, Some("AD"), sort, 0, 10).await?;
                Ok::<_, AppError>((total, users))
            })
        })
        .await
        .unwrap();
    assert_eq!(total, 2);
    let names: Vec<_> = users.iter().filter_map(|u| u.name.as_deref()).collect();
    assert_eq!(names, vec!["Grace Hopper", "Ada Lovelace"]);

    let literal = t
        .db
        .with_session(|s| Box::pin(async move { UserRepository::count(s, Some("%_")).await }))
        .await
        .unwrap();
    assert_eq!(literal, 1);
    teardown(t).await;
}

fn router(t: &TestDb) -> Router {
    let state = AppState {
        settings: Arc::new(Settings {
            environment: Environment::Test,
            database: t.db.settings().clone(),
            ..Settings::default()
        }),
        db: t.db.clone(),
    };
    app(state).unwrap()
}

async fn send(t: &TestDb, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = router(t).oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn http_crud_round_trip() {
    let Some(t) = setup(5).await else { return };

    let (status, created) = send(&t, "POST", "/api/v1/users", Some(json!({"name": "Ada", "title": "Analyst"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["version"], 1);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = send(&t, "GET", &format!("/api/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Ada");

    let (status, updated) = send(
        &t,
        "PATCH",
        &format!("/api/v1/users/{id}"),
        Some(json!({"version": 1, "title": "Engineer"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["version"], 2);
    assert_eq!(updated["title"], "Engineer");

    let (status, stale) = send(
        &t,
        "PATCH",
        &format!("/api/v1/users/{id}"),
        Some(json!({"version": 1, "title": "Overwrite"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(stale["error"]["type"], "database_error");
    assert_eq!(stale["error"]["message"], "A database error occurred");

    let (status, body) = send(&t, "DELETE", &format!("/api/v1/users/{id}?version=2"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, missing) = send(&t, "GET", &format!("/api/v1/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"]["type"], "not_found");

    teardown(t).await;
}
