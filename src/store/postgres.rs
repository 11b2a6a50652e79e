use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{SessionStore, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{Page, SessionRecord, Task, TaskQuery, TaskUpdate, User, UserQuery, UserUpdate};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";
const TASK_COLUMNS: &str =
    "id, user_id, title, description, due_date, priority, status, created_at, updated_at";

/// Postgres-backed store. Email uniqueness is enforced by the
/// `users_email_lower_key` index, so inserts and updates are single statements.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects and runs the embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::InternalError(format!("migration failed: {}", e)))?;
        Ok(Self { pool })
    }
}

fn push_page(builder: &mut QueryBuilder<'_, Postgres>, page: Page) {
    if let Some(limit) = page.limit {
        builder.push(" LIMIT ").push_bind(limit as i64);
    }
    if page.offset > 0 {
        builder.push(" OFFSET ").push_bind(page.offset as i64);
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: User) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {cols}",
            cols = USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_users(&self, query: &UserQuery, page: Page) -> Result<Vec<User>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM users WHERE TRUE", USER_COLUMNS));
        if let Some(role) = query.role {
            builder.push(" AND role = ").push_bind(role);
        }
        match query.sort_by {
            Some(field) => builder.push(format!(
                " ORDER BY {} {}, created_at ASC",
                field.column(),
                query.order.as_sql()
            )),
            None => builder.push(" ORDER BY created_at ASC"),
        };
        push_page(&mut builder, page);
        Ok(builder.build_query_as::<User>().fetch_all(&self.pool).await?)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET name = COALESCE($1, name), email = COALESCE($2, email), \
             role = COALESCE($3, role), updated_at = now() WHERE id = $4 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(update.name)
            .bind(update.email)
            .bind(update.role)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn append_session(&self, record: SessionRecord) -> Result<SessionRecord, AppError> {
        Ok(sqlx::query_as::<_, SessionRecord>(
            "INSERT INTO sessions (id, user_id, timestamp, kind) VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, timestamp, kind",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.timestamp)
        .bind(record.kind)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn sessions_for_user(&self, user_id: Uuid, page: Page) -> Result<Vec<SessionRecord>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT id, user_id, timestamp, kind FROM sessions WHERE user_id = ",
        );
        builder.push_bind(user_id);
        builder.push(" ORDER BY timestamp DESC, seq DESC");
        push_page(&mut builder, page);
        Ok(builder
            .build_query_as::<SessionRecord>()
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: Task) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {cols}",
            cols = TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(task.id)
            .bind(task.user_id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.due_date)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_tasks(&self, owner: Option<Uuid>, query: &TaskQuery, page: Page) -> Result<Vec<Task>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM tasks WHERE TRUE", TASK_COLUMNS));
        if let Some(owner) = owner {
            builder.push(" AND user_id = ").push_bind(owner);
        }
        if let Some(priority) = query.priority {
            builder.push(" AND priority = ").push_bind(priority);
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
        match query.sort_by {
            // task_priority is declared High, Medium, Low so enum order matches Priority::rank.
            Some(field) => builder.push(format!(
                " ORDER BY {} {}, created_at DESC",
                field.column(),
                query.order.as_sql()
            )),
            None => builder.push(" ORDER BY created_at DESC"),
        };
        push_page(&mut builder, page);
        Ok(builder.build_query_as::<Task>().fetch_all(&self.pool).await?)
    }

    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "UPDATE tasks SET title = COALESCE($1, title), description = COALESCE($2, description), \
             due_date = COALESCE($3, due_date), priority = COALESCE($4, priority), \
             status = COALESCE($5, status), updated_at = now() WHERE id = $6 RETURNING {}",
            TASK_COLUMNS
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(update.title.map(|t| t.trim().to_string()))
            .bind(update.description.map(|d| d.trim().to_string()))
            .bind(update.due_date)
            .bind(update.priority)
            .bind(update.status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
