//! Persistence collaborators.
//!
//! Handlers and services only see the traits below. Two implementations are
//! provided: [`MemoryStore`] for tests and single-process deployments, and
//! [`PgStore`] backed by Postgres through `sqlx`.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Page, SessionRecord, Task, TaskQuery, TaskUpdate, User, UserQuery, UserUpdate};

/// Credential store: user records keyed by id, unique by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Conditional insert. Fails with `DuplicateEmail` when the email is
    /// already held, without a separate existence check.
    async fn insert_user(&self, user: User) -> Result<User, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Looks up a user by an already normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Filtering and ordering come from `query`; `page` selects the window.
    async fn list_users(&self, query: &UserQuery, page: Page) -> Result<Vec<User>, AppError>;

    /// Applies the present fields. `DuplicateEmail` if the new email belongs
    /// to another user, `Ok(None)` if `id` does not exist.
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>, AppError>;

    /// Returns `false` when no such user existed.
    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Append-only storage for session audit records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn append_session(&self, record: SessionRecord) -> Result<SessionRecord, AppError>;

    /// Records of `user_id`, newest first, ties in reverse insertion order.
    async fn sessions_for_user(&self, user_id: Uuid, page: Page) -> Result<Vec<SessionRecord>, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: Task) -> Result<Task, AppError>;

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Lists tasks, restricted to `owner` when given. Without `sort_by` the
    /// newest task comes first.
    async fn list_tasks(&self, owner: Option<Uuid>, query: &TaskQuery, page: Page) -> Result<Vec<Task>, AppError>;

    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> Result<Option<Task>, AppError>;

    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Everything the application needs from persistence.
pub trait DataStore: UserStore + SessionStore + TaskStore {}

impl<T: UserStore + SessionStore + TaskStore> DataStore for T {}

pub type SharedStore = Arc<dyn DataStore>;
