pub mod auth;
pub mod events;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;
use serde::{Deserialize, Serialize};

use crate::auth::{Authenticate, RequireAdmin};
use crate::error::{json_error_handler, path_error_handler, query_error_handler};

/// Body of responses that only carry a confirmation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Registers every route. Expects `web::Data<AppState>` on the App and
/// `NormalizePath::trim()` so that `/tasks/` and `/tasks` are the same route.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::me)
        .service(events::stream_events)
        .service(
            web::scope("/tasks")
                .wrap(Authenticate)
                .service(tasks::create_task)
                .service(tasks::get_own_tasks)
                .service(tasks::get_all_tasks)
                .service(tasks::get_user_tasks)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        )
        .service(
            web::scope("/users")
                .wrap(RequireAdmin)
                .wrap(Authenticate)
                .service(users::create_user)
                .service(users::get_users)
                .service(users::get_user_sessions)
                .service(users::get_user)
                .service(users::update_user)
                .service(users::delete_user),
        );
}
