//! User management. The whole `/users` scope sits behind `Authenticate`
//! and `RequireAdmin`.

use crate::{
    auth::RegisterRequest,
    error::AppError,
    models::{Page, PublicUser, UserQuery, UserUpdate},
    routes::MessageResponse,
    state::AppState,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Creates a user with any role.
#[post("")]
pub async fn create_user(
    state: web::Data<AppState>,
    user_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;
    let data = user_data.into_inner();

    let user = state
        .auth
        .register(&data.name, &data.email, &data.password, data.role)
        .await?;

    Ok(HttpResponse::Created().json(UserResponse {
        message: "User created successfully".into(),
        user: user.into(),
    }))
}

/// Lists users, filtered by `role` and ordered by `sortBy`/`order`, paged by `page`/`limit`.
#[get("")]
pub async fn get_users(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<impl Responder, AppError> {
    let users: Vec<PublicUser> = state
        .auth
        .list_users(&query)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[get("/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let user = state.auth.get_user(user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}

/// Updates `name`, `email` and/or `role`. An email held by another user is rejected.
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
    user_data: web::Json<UserUpdate>,
) -> Result<impl Responder, AppError> {
    user_data.validate()?;

    let user = state
        .auth
        .update_user(user_id.into_inner(), user_data.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(UserResponse {
        message: "User updated successfully".into(),
        user: user.into(),
    }))
}

/// Deletes the user record. Its tasks and sessions are kept.
#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    state.auth.delete_user(user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}

/// Session history of a user, newest first. Also answers for deleted users,
/// whose audit trail outlives the account.
#[get("/{id}/sessions")]
pub async fn get_user_sessions(
    state: web::Data<AppState>,
    user_id: web::Path<Uuid>,
    query: web::Query<SessionQuery>,
) -> Result<impl Responder, AppError> {
    let page = Page::from_query(query.page, query.limit)?;
    let sessions = state
        .sessions
        .list_by_user(user_id.into_inner(), page)
        .await?;
    Ok(HttpResponse::Ok().json(sessions))
}
