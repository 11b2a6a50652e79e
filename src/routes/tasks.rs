use crate::{
    auth::{AuthenticatedUser, RequireAdmin},
    error::AppError,
    events::Event,
    models::{Page, Task, TaskInput, TaskQuery, TaskUpdate},
    routes::MessageResponse,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

/// Loads a task the caller may see. Tasks of other users are reported as
/// missing rather than forbidden so their existence does not leak.
async fn load_accessible_task(
    state: &AppState,
    user: &AuthenticatedUser,
    task_id: Uuid,
) -> Result<Task, AppError> {
    match state.store.find_task(task_id).await? {
        Some(task) if user.can_access(task.user_id) => Ok(task),
        _ => Err(AppError::NotFound("Task not found".into())),
    }
}

/// Creates a new task owned by the authenticated user.
///
/// ## Request Body:
/// - `title`: required, not blank.
/// - `description` (optional).
/// - `dueDate` (optional): RFC 3339 timestamp.
/// - `priority` (optional): `High`, `Medium` or `Low`; defaults to `Medium`.
///
/// New tasks are always incomplete. Publishes `task_update`.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: invalid body.
/// - `401 Unauthorized`: missing or invalid token.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = Task::new(task_data.into_inner(), user.user_id);
    let task = state.store.insert_task(task).await?;
    state.events.publish(Event::task_created(&task));

    Ok(HttpResponse::Created().json(task))
}

/// Lists the authenticated user's own tasks, newest first.
#[get("")]
pub async fn get_own_tasks(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = state
        .store
        .list_tasks(Some(user.user_id), &TaskQuery::default(), Page::ALL)
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Lists every task. Admin only.
///
/// ## Query Parameters:
/// - `priority` (optional): `High`, `Medium` or `Low`.
/// - `status` (optional): `true` or `false`.
/// - `sortBy` (optional): `createdAt`, `updatedAt`, `dueDate`, `priority`, `title` or `status`.
/// - `order` (optional): `asc` (default) or `desc`.
/// - `page`, `limit` (optional): 1-based page and page size.
#[get("/admin", wrap = "RequireAdmin")]
pub async fn get_all_tasks(
    state: web::Data<AppState>,
    query: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let page = Page::from_query(query.page, query.limit)?;
    let tasks = state.store.list_tasks(None, &query, page).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Lists the tasks of one user. Admin only.
#[get("/user/{user_id}", wrap = "RequireAdmin")]
pub async fn get_user_tasks(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let tasks = state
        .store
        .list_tasks(Some(user_id.into_inner()), &TaskQuery::default(), Page::ALL)
        .await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Retrieves a task by id. Owner or Admin.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = load_accessible_task(&state, &user, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates the fields present in the body. Owner or Admin.
/// Publishes `task_update` with the updated task.
#[put("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let task = load_accessible_task(&state, &user, task_id.into_inner()).await?;

    let updated = state
        .store
        .update_task(task.id, task_data.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    state.events.publish(Event::task_updated(&updated));

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes a task. Owner or Admin. Publishes `task_update` with the task id.
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = load_accessible_task(&state, &user, task_id.into_inner()).await?;

    if !state.store.delete_task(task.id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }
    state.events.publish(Event::task_deleted(task.id));

    Ok(HttpResponse::Ok().json(MessageResponse::new("Task deleted successfully")))
}
