use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Column list shared by every todo-returning statement, so responses are
/// shaped identically across create, read, update, and list paths.
pub const TODO_COLUMNS: &str =
    "id, user_id, title, description, completed, priority, due_date, created_at, updated_at";

/// Represents the priority of a todo.
/// Corresponds to the `todo_priority` SQL enum; declaration order gives
/// `ORDER BY priority` the low < medium < high semantics.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "todo_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TodoPriority {
    Low,
    Medium,
    High,
}

/// Represents a todo entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i32,
    /// Identifier of the owning user; every query touching this row carries
    /// an owner-equality predicate on this column.
    pub user_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: TodoPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Refreshed server-side on every mutating write.
    pub updated_at: DateTime<Utc>,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    // counted in chars, matching the derive-based limits elsewhere
    if trimmed.is_empty() || trimmed.chars().count() > 255 {
        let mut err = ValidationError::new("title_length");
        err.message = Some("Title must be between 1 and 255 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Input structure for creating a todo.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTodoRequest {
    /// The title of the todo. 1 to 255 characters after trimming.
    #[validate(custom = "validate_title")]
    pub title: String,

    /// An optional description, at most 1000 characters.
    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    pub description: Option<String>,

    /// The priority of the todo. Defaults to medium when absent.
    pub priority: Option<TodoPriority>,

    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
}

/// Deserializes a field so that absence and an explicit `null` are
/// distinguishable: absent stays `None`, `null` becomes `Some(None)`,
/// and a value becomes `Some(Some(v))`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Sparse update payload: only fields present in the request body are
/// compiled into the update statement. Set membership, not truthiness,
/// decides inclusion, so `{"description": null}` clears the description
/// while an omitted description is left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub completed: Option<Option<bool>>,
    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<TodoPriority>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTodoRequest {
    /// Validates the supplied fields. Nullable columns (`description`,
    /// `due_date`) accept an explicit null; the rest reject it up front
    /// instead of bouncing off the NOT NULL constraint.
    pub fn validate(&self) -> Result<(), AppError> {
        match &self.title {
            Some(Some(title)) => {
                validate_title(title)
                    .map_err(|_| AppError::Validation("Title must be between 1 and 255 characters".into()))?;
            }
            Some(None) => {
                return Err(AppError::Validation("Title cannot be null".into()));
            }
            None => {}
        }

        if let Some(Some(description)) = &self.description {
            if description.chars().count() > 1000 {
                return Err(AppError::Validation(
                    "Description must not exceed 1000 characters".into(),
                ));
            }
        }

        if let Some(None) = self.completed {
            return Err(AppError::Validation("Completed cannot be null".into()));
        }
        if let Some(None) = self.priority {
            return Err(AppError::Validation("Priority cannot be null".into()));
        }

        Ok(())
    }

    /// True when no field at all was supplied; such no-op updates are
    /// rejected rather than silently accepted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

/// Enumerated sort keys for listing todos. Anything outside this set fails
/// query-string deserialization before any SQL is built.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
}

impl SortKey {
    /// Column name for the ORDER BY clause. Only these fixed identifiers are
    /// ever interpolated into SQL; user values travel as bind parameters.
    pub fn as_sql(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "created_at",
            SortKey::UpdatedAt => "updated_at",
            SortKey::DueDate => "due_date",
            SortKey::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query parameters for listing todos. Absent fields take defaults; supplied
/// fields are validated strictly (no silent fallback for bad values).
#[derive(Debug, Deserialize, Validate)]
pub struct TodoListQuery {
    #[validate(range(min = 1, message = "Page must be a positive integer"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
    pub completed: Option<bool>,
    pub priority: Option<TodoPriority>,
    pub sort: Option<SortKey>,
    pub order: Option<SortOrder>,
}
