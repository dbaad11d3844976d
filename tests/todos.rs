//! Integration flows for the todo endpoints.
//!
//! The `#[ignore]`d tests require a running Postgres with DATABASE_URL set;
//! run them with `cargo test -- --ignored`.

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{http::header, test, web, App};
use dotenv::dotenv;
use serde_json::json;
use sqlx::PgPool;
use std::time::Instant;

use todoforge::auth::{generate_token, AuthMiddleware, AuthResponse};
use todoforge::models::{Todo, TodoPriority};
use todoforge::routes;
use todoforge::routes::health::ServerStart;

// Helper struct to hold auth details
struct TestUser {
    id: i32,
    token: String,
}

async fn setup_pool() -> PgPool {
    dotenv().ok();
    std::env::set_var("JWT_SECRET", "todos_integration_secret");
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    todoforge::db::init_schema(&pool)
        .await
        .expect("Failed to initialize schema");
    pool
}

async fn register_user(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    email: &str,
    username: &str,
) -> Result<TestUser, String> {
    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "username": username,
            "email": email,
            "password": "TestPass123"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;

    if !status.is_success() {
        return Err(format!(
            "Failed to register user. Status: {}. Body: {}",
            status,
            String::from_utf8_lossy(&body)
        ));
    }
    let auth_response: AuthResponse = serde_json::from_slice(&body)
        .map_err(|e| format!("Failed to parse registration response: {}", e))?;

    Ok(TestUser {
        id: auth_response.user.id,
        token: auth_response.token,
    })
}

async fn cleanup_user(pool: &PgPool, email: &str) {
    // todos cascade-delete with their owner
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

async fn create_todo(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    token: &str,
    payload: serde_json::Value,
) -> Todo {
    let req = test::TestRequest::post()
        .uri("/todos")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    serde_json::from_value(body["todo"].clone()).expect("create response carries a todo")
}

macro_rules! build_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .app_data(web::Data::new(ServerStart(Instant::now())))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header()
                        .max_age(3600),
                )
                .wrap(Logger::default())
                .service(routes::health::health)
                .service(
                    web::scope("")
                        .wrap(AuthMiddleware)
                        .configure(routes::config),
                ),
        )
        .await
    };
}

// No database here: a lazy pool defers connecting, so this exercises the
// page/offset arithmetic before any query runs. An extreme page value must
// reach storage (and fail there, 500) instead of overflowing on the way.
#[actix_rt::test]
async fn test_extreme_page_value_does_not_overflow() {
    std::env::set_var("JWT_SECRET", "todos_integration_secret");
    let pool = PgPool::connect_lazy("postgres://localhost:1/unreachable")
        .expect("lazy pool construction is infallible for a well-formed URL");
    let app = build_app!(pool);
    let token = generate_token(1).unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/todos?page={}&limit=100", i64::MAX))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let resp = test::try_call_service(&app, req).await;

    match resp {
        Ok(resp) => assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        ),
        Err(err) => assert_eq!(
            err.error_response().status(),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        ),
    }
}

#[ignore]
#[actix_rt::test]
async fn test_todo_crud_flow() {
    let pool = setup_pool().await;
    let app = build_app!(pool);

    let email = "crud_user@example.com";
    cleanup_user(&pool, email).await;
    let user = register_user(&app, email, "crud_user")
        .await
        .expect("Failed to register test user");

    // Create
    let created = create_todo(
        &app,
        &user.token,
        json!({
            "title": "CRUD Todo 1",
            "description": "Initial description",
            "priority": "medium"
        }),
    )
    .await;
    assert_eq!(created.title, "CRUD Todo 1");
    assert_eq!(created.priority, TodoPriority::Medium);
    assert!(!created.completed, "new todos default to incomplete");
    assert_eq!(created.user_id, user.id);

    // Get by id
    let req = test::TestRequest::get()
        .uri(&format!("/todos/{}", created.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let fetched: Todo = test::read_body_json(resp).await;
    assert_eq!(fetched.id, created.id);

    // Partial update: only `completed`; everything else must survive and
    // updated_at must advance strictly
    let req = test::TestRequest::put()
        .uri(&format!("/todos/{}", created.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let updated: Todo = serde_json::from_value(body["todo"].clone()).unwrap();
    assert!(updated.completed);
    assert_eq!(updated.title, "CRUD Todo 1");
    assert_eq!(updated.description.as_deref(), Some("Initial description"));
    assert_eq!(updated.priority, TodoPriority::Medium);
    assert!(
        updated.updated_at > created.updated_at,
        "updated_at must be refreshed on every mutation"
    );

    // Explicit null clears the nullable description
    let req = test::TestRequest::put()
        .uri(&format!("/todos/{}", created.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .set_json(json!({ "description": null }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["todo"]["description"].is_null());

    // Empty update body is a validation failure, not a silent no-op
    let req = test::TestRequest::put()
        .uri(&format!("/todos/{}", created.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    // Delete
    let req = test::TestRequest::delete()
        .uri(&format!("/todos/{}", created.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    // Further operations on the deleted todo are 404
    let req = test::TestRequest::get()
        .uri(&format!("/todos/{}", created.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    cleanup_user(&pool, email).await;
}

#[ignore]
#[actix_rt::test]
async fn test_todo_ownership_is_not_found_for_others() {
    let pool = setup_pool().await;
    let app = build_app!(pool);

    let email_a = "owner_a@example.com";
    let email_b = "other_b@example.com";
    cleanup_user(&pool, email_a).await;
    cleanup_user(&pool, email_b).await;

    let user_a = register_user(&app, email_a, "owner_a").await.unwrap();
    let user_b = register_user(&app, email_b, "other_b").await.unwrap();

    let todo_a = create_todo(&app, &user_a.token, json!({ "title": "A's todo" })).await;

    // B's list never contains A's todo
    let req = test::TestRequest::get()
        .uri("/todos")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_b.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let todos = body["todos"].as_array().unwrap();
    assert!(!todos.iter().any(|t| t["id"] == todo_a.id));

    // Read, update, and delete through B all yield 404, never 403
    let req = test::TestRequest::get()
        .uri(&format!("/todos/{}", todo_a.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_b.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    let req = test::TestRequest::put()
        .uri(&format!("/todos/{}", todo_a.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_b.token)))
        .set_json(json!({ "title": "Hijacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    let req = test::TestRequest::delete()
        .uri(&format!("/todos/{}", todo_a.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_b.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    // Sanity: A still owns the intact todo
    let req = test::TestRequest::get()
        .uri(&format!("/todos/{}", todo_a.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user_a.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let intact: Todo = test::read_body_json(resp).await;
    assert_eq!(intact.title, "A's todo");

    cleanup_user(&pool, email_a).await;
    cleanup_user(&pool, email_b).await;
}

#[ignore]
#[actix_rt::test]
async fn test_filtering_is_conjunctive() {
    let pool = setup_pool().await;
    let app = build_app!(pool);

    let email = "filter_user@example.com";
    cleanup_user(&pool, email).await;
    let user = register_user(&app, email, "filter_user").await.unwrap();

    let high_incomplete = create_todo(
        &app,
        &user.token,
        json!({ "title": "high incomplete", "priority": "high" }),
    )
    .await;
    create_todo(
        &app,
        &user.token,
        json!({ "title": "low incomplete", "priority": "low" }),
    )
    .await;
    let high_complete = create_todo(
        &app,
        &user.token,
        json!({ "title": "high complete", "priority": "high" }),
    )
    .await;
    let req = test::TestRequest::put()
        .uri(&format!("/todos/{}", high_complete.id))
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/todos?priority=high&completed=false")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let todos = body["todos"].as_array().unwrap();
    assert_eq!(todos.len(), 1, "filters must combine conjunctively");
    assert_eq!(todos[0]["id"], high_incomplete.id);

    // An explicitly supplied invalid filter value is rejected up front
    let req = test::TestRequest::get()
        .uri("/todos?priority=urgent")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    cleanup_user(&pool, email).await;
}

#[ignore]
#[actix_rt::test]
async fn test_pagination_metadata() {
    let pool = setup_pool().await;
    let app = build_app!(pool);

    let email = "paging_user@example.com";
    cleanup_user(&pool, email).await;
    let user = register_user(&app, email, "paging_user").await.unwrap();

    create_todo(&app, &user.token, json!({ "title": "first" })).await;
    create_todo(&app, &user.token, json!({ "title": "second" })).await;

    let req = test::TestRequest::get()
        .uri("/todos?limit=1&page=1")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["totalCount"], 2);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["hasNext"], true);
    assert_eq!(body["pagination"]["hasPrev"], false);
    assert_eq!(body["todos"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/todos?limit=1&page=2")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["hasNext"], false);
    assert_eq!(body["pagination"]["hasPrev"], true);

    // limit outside 1..=100 is rejected, not clamped
    let req = test::TestRequest::get()
        .uri("/todos?limit=101")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

    cleanup_user(&pool, email).await;
}

#[ignore]
#[actix_rt::test]
async fn test_complete_all() {
    let pool = setup_pool().await;
    let app = build_app!(pool);

    let email = "complete_all_user@example.com";
    cleanup_user(&pool, email).await;
    let user = register_user(&app, email, "complete_all_user").await.unwrap();

    create_todo(&app, &user.token, json!({ "title": "todo one" })).await;
    create_todo(&app, &user.token, json!({ "title": "todo two" })).await;

    let req = test::TestRequest::patch()
        .uri("/todos/complete-all")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["updatedCount"], 2);

    // Second run has nothing left to change; zero is a valid outcome
    let req = test::TestRequest::patch()
        .uri("/todos/complete-all")
        .append_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["updatedCount"], 0);

    cleanup_user(&pool, email).await;
}
