use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of audit entry. Corresponds to the `session_type` SQL enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_type")]
pub enum SessionType {
    #[serde(rename = "Check-In")]
    #[sqlx(rename = "Check-In")]
    CheckIn,
    #[serde(rename = "Check-Out")]
    #[sqlx(rename = "Check-Out")]
    CheckOut,
}

/// One login or logout instant. Records are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SessionType,
}

impl SessionRecord {
    pub fn new(user_id: Uuid, kind: SessionType) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            timestamp: Utc::now(),
            kind,
        }
    }
}
