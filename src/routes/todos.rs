use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{
        todo::TODO_COLUMNS, CreateTodoRequest, SortKey, SortOrder, Todo, TodoListQuery,
        TodoPriority, UpdateTodoRequest,
    },
    query::{AssignmentList, Pagination, PredicateList, SqlParam},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

/// Retrieves a filtered, sorted, paginated window of the requester's todos.
///
/// The WHERE predicate always starts with the owner-equality clause, then
/// appends `completed` before `priority` for the supplied filters, so
/// parameter positions are deterministic. The count query runs against the
/// identical predicate set, keeping the pagination metadata consistent with
/// the page contents.
///
/// ## Query Parameters:
/// - `page` (optional, default 1): 1-based page number.
/// - `limit` (optional, default 10): page size, 1 to 100.
/// - `completed` (optional): filter by completion state.
/// - `priority` (optional): filter by "low", "medium", or "high".
/// - `sort` (optional, default `created_at`): one of `created_at`,
///   `updated_at`, `due_date`, `priority`.
/// - `order` (optional, default `desc`): `asc` or `desc`.
///
/// Explicitly supplied invalid values are a 400 before any query executes;
/// only absent fields fall back to defaults.
#[get("")]
pub async fn list_todos(
    pool: web::Data<PgPool>,
    query_params: web::Query<TodoListQuery>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    query_params.validate()?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);
    // saturating: an absurdly large page must yield an empty page, not
    // overflow into a negative OFFSET
    let offset = page.saturating_sub(1).saturating_mul(limit);
    let sort = query_params.sort.unwrap_or(SortKey::CreatedAt);
    let order = query_params.order.unwrap_or(SortOrder::Desc);

    let mut predicates = PredicateList::new();
    predicates.push("user_id", SqlParam::Int(identity.user_id));
    if let Some(completed) = query_params.completed {
        predicates.push("completed", SqlParam::Bool(completed));
    }
    if let Some(priority) = query_params.priority {
        predicates.push("priority", SqlParam::Priority(priority));
    }

    let where_clause = predicates.where_clause();

    let count_sql = format!("SELECT COUNT(*) FROM todos WHERE {}", where_clause);
    let total_count: i64 = sqlx::query_scalar_with(&count_sql, predicates.arguments())
        .fetch_one(&**pool)
        .await?;

    let limit_pos = predicates.next_placeholder();
    let list_sql = format!(
        "SELECT {} FROM todos WHERE {} ORDER BY {} {} LIMIT ${} OFFSET ${}",
        TODO_COLUMNS,
        where_clause,
        sort.as_sql(),
        order.as_sql(),
        limit_pos,
        limit_pos + 1
    );
    let mut list_args = predicates.arguments();
    SqlParam::BigInt(limit).add_to(&mut list_args);
    SqlParam::BigInt(offset).add_to(&mut list_args);
    let todos: Vec<Todo> = sqlx::query_as_with(&list_sql, list_args)
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "todos": todos,
        "pagination": Pagination::new(page, limit, total_count),
    })))
}

/// Creates a new todo owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: 1 to 255 characters after trimming (required).
/// - `description` (optional): at most 1000 characters.
/// - `priority` (optional): defaults to "medium".
/// - `due_date` (optional): ISO-8601 timestamp.
#[post("")]
pub async fn create_todo(
    pool: web::Data<PgPool>,
    todo_data: web::Json<CreateTodoRequest>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    todo_data.validate()?;

    let sql = format!(
        "INSERT INTO todos (user_id, title, description, priority, due_date)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        TODO_COLUMNS
    );
    let todo: Todo = sqlx::query_as(&sql)
        .bind(identity.user_id)
        .bind(todo_data.title.trim())
        .bind(&todo_data.description)
        .bind(todo_data.priority.unwrap_or(TodoPriority::Medium))
        .bind(todo_data.due_date)
        .fetch_one(&**pool)
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Todo created successfully",
        "todo": todo,
    })))
}

/// Retrieves a single todo by id.
///
/// The lookup filters by id AND owner in one query, so a todo owned by
/// someone else is indistinguishable from one that does not exist: both 404.
#[get("/{id}")]
pub async fn get_todo(
    pool: web::Data<PgPool>,
    todo_id: web::Path<i32>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let sql = format!(
        "SELECT {} FROM todos WHERE id = $1 AND user_id = $2",
        TODO_COLUMNS
    );
    let todo: Option<Todo> = sqlx::query_as(&sql)
        .bind(todo_id.into_inner())
        .bind(identity.user_id)
        .fetch_optional(&**pool)
        .await?;

    match todo {
        Some(todo) => Ok(HttpResponse::Ok().json(todo)),
        None => Err(AppError::NotFound("Todo not found".into())),
    }
}

/// Applies a sparse update to an owned todo.
///
/// Only fields present in the body are compiled into the statement (absent
/// is not the same as null). An empty field set is a 400. `updated_at` is
/// refreshed unconditionally, and the statement's own `id AND user_id`
/// predicate enforces ownership atomically with the mutation; zero rows
/// updated is a 404.
#[put("/{id}")]
pub async fn update_todo(
    pool: web::Data<PgPool>,
    todo_id: web::Path<i32>,
    todo_data: web::Json<UpdateTodoRequest>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let body = todo_data.into_inner();
    body.validate()?;

    if body.is_empty() {
        return Err(AppError::Validation(
            "At least one field must be provided for update".into(),
        ));
    }

    let mut assignments = AssignmentList::new();
    if let Some(title) = body.title {
        assignments.push(
            "title",
            SqlParam::Text(title.map(|t| t.trim().to_string())),
        );
    }
    if let Some(description) = body.description {
        assignments.push("description", SqlParam::Text(description));
    }
    if let Some(Some(completed)) = body.completed {
        assignments.push("completed", SqlParam::Bool(completed));
    }
    if let Some(Some(priority)) = body.priority {
        assignments.push("priority", SqlParam::Priority(priority));
    }
    if let Some(due_date) = body.due_date {
        assignments.push("due_date", SqlParam::Timestamp(due_date));
    }

    let (sql, params) =
        assignments.build_update(TODO_COLUMNS, todo_id.into_inner(), identity.user_id);
    let todo: Option<Todo> = sqlx::query_as_with(&sql, crate::query::build_arguments(params))
        .fetch_optional(&**pool)
        .await?;

    match todo {
        Some(todo) => Ok(HttpResponse::Ok().json(json!({
            "message": "Todo updated successfully",
            "todo": todo,
        }))),
        None => Err(AppError::NotFound("Todo not found".into())),
    }
}

/// Deletes an owned todo.
///
/// Ownership and deletion are one statement; zero affected rows is a 404.
#[delete("/{id}")]
pub async fn delete_todo(
    pool: web::Data<PgPool>,
    todo_id: web::Path<i32>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
        .bind(todo_id.into_inner())
        .bind(identity.user_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Todo not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Todo deleted successfully",
    })))
}

/// Marks all of the requester's incomplete todos as completed in a single
/// statement, refreshing `updated_at` on each changed row. Zero changed rows
/// is a valid 200 outcome, not an error.
#[patch("/complete-all")]
pub async fn complete_all(
    pool: web::Data<PgPool>,
    identity: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query(
        "UPDATE todos SET completed = TRUE, updated_at = NOW()
         WHERE user_id = $1 AND completed = FALSE",
    )
    .bind(identity.user_id)
    .execute(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "All todos marked as completed",
        "updatedCount": result.rows_affected(),
    })))
}
