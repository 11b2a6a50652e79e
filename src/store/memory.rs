use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Ordering;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SessionStore, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{
    Page, SessionRecord, SortOrder, Task, TaskQuery, TaskSortField, TaskUpdate, User, UserQuery,
    UserSortField, UserUpdate,
};

/// In-process store. Collections are kept in insertion order; each write
/// happens under a single lock so conditional inserts are atomic.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    sessions: RwLock<Vec<SessionRecord>>,
    tasks: RwLock<Vec<Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn compare_tasks(a: &Task, b: &Task, field: TaskSortField) -> Ordering {
    match field {
        TaskSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        TaskSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        TaskSortField::DueDate => a.due_date.cmp(&b.due_date),
        TaskSortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        TaskSortField::Title => a.title.cmp(&b.title),
        TaskSortField::Status => a.status.cmp(&b.status),
    }
}

fn compare_users(a: &User, b: &User, field: UserSortField) -> Ordering {
    match field {
        UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        UserSortField::Name => a.name.cmp(&b.name),
        UserSortField::Email => a.email.cmp(&b.email),
        UserSortField::Role => a.role.as_str().cmp(b.role.as_str()),
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::DuplicateEmail);
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, query: &UserQuery, page: Page) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self
            .users
            .read()
            .await
            .iter()
            .filter(|u| query.role.map_or(true, |role| u.role == role))
            .cloned()
            .collect();
        if let Some(field) = query.sort_by {
            users.sort_by(|a, b| directed(compare_users(a, b, field), query.order));
        }
        Ok(page.apply(users))
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        let Some(index) = users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = &update.email {
            if users
                .iter()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email))
            {
                return Err(AppError::DuplicateEmail);
            }
        }
        let user = &mut users[index];
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn append_session(&self, record: SessionRecord) -> Result<SessionRecord, AppError> {
        self.sessions.write().await.push(record.clone());
        Ok(record)
    }

    async fn sessions_for_user(&self, user_id: Uuid, page: Page) -> Result<Vec<SessionRecord>, AppError> {
        let mut records: Vec<SessionRecord> = self
            .sessions
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        // Already newest-inserted first; the stable sort only reorders on
        // timestamp and keeps that order for equal instants.
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(page.apply(records))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: Task) -> Result<Task, AppError> {
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self.tasks.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, owner: Option<Uuid>, query: &TaskQuery, page: Page) -> Result<Vec<Task>, AppError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .iter()
            .rev()
            .filter(|t| owner.map_or(true, |id| t.user_id == id))
            .filter(|t| query.priority.map_or(true, |p| t.priority == p))
            .filter(|t| query.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        if let Some(field) = query.sort_by {
            tasks.sort_by(|a, b| directed(compare_tasks(a, b, field), query.order));
        }
        Ok(page.apply(tasks))
    }

    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.iter_mut().find(|t| t.id == id).map(|task| {
            task.apply(update);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() != before)
    }
}
