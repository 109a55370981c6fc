use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{Task, TaskInput, TaskUpdate, TaskWithCreator},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

const TASK_WITH_CREATOR: &str = "
    SELECT tasks.id, tasks.title, tasks.description, tasks.status, tasks.priority,
           tasks.created_by, users.username AS creator_name,
           tasks.created_at, tasks.updated_at
    FROM tasks
    JOIN users ON users.id = tasks.created_by";

/// Fetches one task joined with its owner's username.
async fn fetch_task(pool: &SqlitePool, task_id: i64) -> Result<Option<TaskWithCreator>, AppError> {
    let task = sqlx::query_as::<_, TaskWithCreator>(&format!(
        "{} WHERE tasks.id = ?",
        TASK_WITH_CREATOR
    ))
    .bind(task_id)
    .fetch_optional(pool)
    .await?;
    Ok(task)
}

/// List tasks
///
/// Admins see every task; everyone else sees only their own. Both orderings
/// are newest-first.
///
/// ## Responses:
/// - `200 OK`: `{success, count, tasks}`.
/// - `401 Unauthorized`: missing or invalid token.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<SqlitePool>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks: Vec<TaskWithCreator> = if caller.is_admin() {
        sqlx::query_as(&format!("{} ORDER BY tasks.created_at DESC", TASK_WITH_CREATOR))
            .fetch_all(&**pool)
            .await?
    } else {
        sqlx::query_as(&format!(
            "{} WHERE tasks.created_by = ? ORDER BY tasks.created_at DESC",
            TASK_WITH_CREATOR
        ))
        .bind(caller.id())
        .fetch_all(&**pool)
        .await?
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": tasks.len(),
        "tasks": tasks
    })))
}

/// Create a task
///
/// The owner is always the authenticated caller; any owner field in the
/// payload is ignored. Omitted fields take the documented defaults
/// (description `""`, status `pending`, priority `medium`).
///
/// ## Responses:
/// - `201 Created`: `{success, message, task}`.
/// - `400 Bad Request`: validation failure.
/// - `401 Unauthorized`: missing or invalid token.
#[post("")]
pub async fn create_task(
    pool: web::Data<SqlitePool>,
    task_data: web::Json<TaskInput>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let input = task_data.into_inner();
    let now = Utc::now();

    let task_id: i64 = sqlx::query_scalar(
        "INSERT INTO tasks (title, description, status, priority, created_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(&input.title)
    .bind(input.description.unwrap_or_default())
    .bind(input.status.unwrap_or_default())
    .bind(input.priority.unwrap_or_default())
    .bind(caller.id())
    .bind(now)
    .bind(now)
    .fetch_one(&**pool)
    .await?;

    let task = fetch_task(&pool, task_id)
        .await?
        .ok_or_else(|| AppError::Internal("Task created but missing on re-fetch".into()))?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Task created successfully",
        "task": task
    })))
}

/// Get a single task
///
/// Existence is checked before authorization, so an id that does not exist
/// is a 404 for everyone, while an existing task owned by someone else is a
/// 403 for a non-admin caller.
///
/// ## Responses:
/// - `200 OK`: `{success, task}`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `403 Forbidden`: caller is neither owner nor admin.
/// - `404 Not Found`: no such task.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<SqlitePool>,
    task_id: web::Path<i64>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = fetch_task(&pool, task_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if !caller.can_access(task.created_by) {
        return Err(AppError::Forbidden(
            "Not authorized to access this task".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "task": task
    })))
}

/// Update a task
///
/// Accepts any subset of task fields. Title, status and priority overwrite
/// only when supplied and non-empty; description overwrites whenever
/// supplied, including the explicit empty string. `updated_at` is bumped on
/// every successful update.
///
/// ## Responses:
/// - `200 OK`: `{success, message, task}`.
/// - `400 Bad Request`: validation failure.
/// - `401 Unauthorized`: missing or invalid token.
/// - `403 Forbidden`: caller is neither owner nor admin.
/// - `404 Not Found`: no such task (including one deleted concurrently).
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<SqlitePool>,
    task_id: web::Path<i64>,
    task_data: web::Json<TaskUpdate>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task_id = task_id.into_inner();
    let input = task_data.into_inner();

    let existing: Option<Task> = sqlx::query_as(
        "SELECT id, title, description, status, priority, created_by, created_at, updated_at
         FROM tasks WHERE id = ?",
    )
    .bind(task_id)
    .fetch_optional(&**pool)
    .await?;

    let existing = existing.ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if !caller.can_access(existing.created_by) {
        return Err(AppError::Forbidden(
            "Not authorized to update this task".into(),
        ));
    }

    let title = match input.title {
        Some(title) if !title.is_empty() => title,
        _ => existing.title,
    };
    // Empty string is a deliberate overwrite here, unlike title.
    let description = input.description.unwrap_or(existing.description);
    let status = input.status.unwrap_or(existing.status);
    let priority = input.priority.unwrap_or(existing.priority);

    let result = sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&title)
    .bind(&description)
    .bind(status)
    .bind(priority)
    .bind(Utc::now())
    .bind(task_id)
    .execute(&**pool)
    .await?;

    // The task can vanish between the ownership check and the mutation;
    // zero rows affected surfaces as a 404.
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    let task = fetch_task(&pool, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task updated successfully",
        "task": task
    })))
}

/// Delete a task
///
/// Same existence-then-authorization ordering as `get_task`.
///
/// ## Responses:
/// - `200 OK`: `{success, message}`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `403 Forbidden`: caller is neither owner nor admin.
/// - `404 Not Found`: no such task.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<SqlitePool>,
    task_id: web::Path<i64>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task_id = task_id.into_inner();

    let owner: Option<i64> = sqlx::query_scalar("SELECT created_by FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(&**pool)
        .await?;

    let owner = owner.ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if !caller.can_access(owner) {
        return Err(AppError::Forbidden(
            "Not authorized to delete this task".into(),
        ));
    }

    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Task deleted successfully"
    })))
}
