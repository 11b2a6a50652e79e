#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Domain models, storage backends, token-based authentication, the session"]
#![doc = "audit log, the event bus and the HTTP routes of the TaskDesk backend."]
#![doc = "The binary (`main.rs`) only reads configuration and starts the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
