//! Database pool construction and idempotent schema bootstrap.
//!
//! The pool is created once at startup and injected into handlers as
//! `web::Data<PgPool>`; no component reaches for ambient global state.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;

/// Builds the bounded connection pool.
///
/// `max_connections` is the per-process concurrency ceiling for storage work;
/// requests queue on an exhausted pool and fail fast once `acquire_timeout`
/// elapses (surfaced to the client as a 500-category error).
pub async fn init_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect(&config.database_url)
        .await
}

/// Creates the schema if it does not exist yet.
///
/// All statements are idempotent so repeated startups are safe. `CREATE TYPE`
/// has no `IF NOT EXISTS` form, hence the `duplicate_object` guard.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            username VARCHAR(50) UNIQUE NOT NULL,
            email VARCHAR(100) UNIQUE NOT NULL,
            password_hash VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "DO $$ BEGIN
            CREATE TYPE todo_priority AS ENUM ('low', 'medium', 'high');
        EXCEPTION
            WHEN duplicate_object THEN NULL;
        END $$",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS todos (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title VARCHAR(255) NOT NULL,
            description TEXT,
            completed BOOLEAN NOT NULL DEFAULT FALSE,
            priority todo_priority NOT NULL DEFAULT 'medium',
            due_date TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_user_id ON todos(user_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos(completed)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_priority ON todos(priority)")
        .execute(pool)
        .await?;

    log::info!("Database schema initialized");
    Ok(())
}
