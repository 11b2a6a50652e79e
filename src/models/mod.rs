pub mod session;
pub mod task;
pub mod user;

pub use session::{SessionRecord, SessionType};
pub use task::{Priority, Task, TaskInput, TaskQuery, TaskSortField, TaskUpdate};
pub use user::{PublicUser, Role, User, UserQuery, UserSortField, UserUpdate};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::ValidationError;

use crate::error::AppError;

/// Upper bound for `limit` on every listing endpoint.
pub const MAX_PAGE_SIZE: u32 = 100;

lazy_static! {
    pub static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
}

/// Rejects strings that are empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Canonical form of an email address: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `ORDER BY` suffix. Missing values rank lowest, matching `Option`'s ordering.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC NULLS FIRST",
            SortOrder::Desc => "DESC NULLS LAST",
        }
    }
}

/// Offset/limit window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Page {
    pub const ALL: Page = Page {
        offset: 0,
        limit: None,
    };

    /// Builds a window from 1-based `page` and optional `limit` query values.
    /// `page` without `limit` has no effect, matching an unbounded page size.
    pub fn from_query(page: Option<u32>, limit: Option<u32>) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::ValidationError("page must be at least 1".into()));
        }
        match limit {
            None => Ok(Page::ALL),
            Some(limit) if limit == 0 || limit > MAX_PAGE_SIZE => Err(AppError::ValidationError(
                format!("limit must be between 1 and {}", MAX_PAGE_SIZE),
            )),
            Some(limit) => Ok(Page {
                offset: (page as usize - 1) * limit as usize,
                limit: Some(limit as usize),
            }),
        }
    }

    /// Applies the window to an already ordered vector.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}
