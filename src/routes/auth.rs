use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, AuthenticatedUser,
        LoginRequest, RegisterRequest,
    },
    error::AppError,
    models::User,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns it together with a session token.
/// A username or email already in use is a 409 Conflict. The pre-insert
/// existence check leaves a race window; a concurrent insert surfaces as a
/// unique violation, which the error layer also translates to 409.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let existing_user: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 OR username = $2")
            .bind(&register_data.email)
            .bind(&register_data.username)
            .fetch_optional(&**pool)
            .await?;

    if existing_user.is_some() {
        return Err(AppError::Conflict(
            "A user with this email or username already exists".into(),
        ));
    }

    let password_hash = hash_password(&register_data.password)?;

    let user: User = sqlx::query_as(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3)
         RETURNING id, username, email, created_at",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await?;

    let token = generate_token(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        message: "User registered successfully".into(),
        user,
        token,
    }))
}

/// Login user
///
/// Authenticates a user and returns a session token. Unknown email and wrong
/// password fail identically so the response leaks nothing about which half
/// was wrong.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let row: Option<(i32, String, String, String, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    let (id, username, email, password_hash, created_at) = match row {
        Some(row) => row,
        None => return Err(AppError::Unauthenticated("Invalid email or password".into())),
    };

    if !verify_password(&login_data.password, &password_hash)? {
        return Err(AppError::Unauthenticated("Invalid email or password".into()));
    }

    let token = generate_token(id)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login successful".into(),
        user: User {
            id,
            username,
            email,
            created_at,
        },
        token,
    }))
}

/// Get current user profile
///
/// The token authenticates the request by itself, but the referenced user is
/// re-checked against storage; a stale token for a deleted account is a 404.
#[get("/profile")]
pub async fn profile(
    pool: web::Data<PgPool>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user: Option<User> =
        sqlx::query_as("SELECT id, username, email, created_at FROM users WHERE id = $1")
            .bind(identity.user_id)
            .fetch_optional(&**pool)
            .await?;

    match user {
        Some(user) => Ok(HttpResponse::Ok().json(json!({ "user": user }))),
        None => Err(AppError::NotFound("User not found".into())),
    }
}
