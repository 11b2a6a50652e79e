//! Append-only audit log of logins and logouts.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Page, SessionRecord, SessionType};
use crate::store::SharedStore;

/// Exposes only `record` and `list_by_user`; there is deliberately no way to
/// edit or remove an entry through the application.
#[derive(Clone)]
pub struct SessionLog {
    store: SharedStore,
}

impl SessionLog {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn record(&self, user_id: Uuid, kind: SessionType) -> Result<SessionRecord, AppError> {
        let record = self
            .store
            .append_session(SessionRecord::new(user_id, kind))
            .await?;
        log::info!("session {:?} recorded for user {}", kind, user_id);
        Ok(record)
    }

    /// Newest first.
    pub async fn list_by_user(&self, user_id: Uuid, page: Page) -> Result<Vec<SessionRecord>, AppError> {
        self.store.sessions_for_user(user_id, page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[actix_rt::test]
    async fn test_list_by_user_is_reverse_insertion_order() {
        let log = SessionLog::new(Arc::new(MemoryStore::new()));
        let user = Uuid::new_v4();

        let mut expected = Vec::new();
        for kind in [
            SessionType::CheckIn,
            SessionType::CheckOut,
            SessionType::CheckIn,
            SessionType::CheckOut,
        ] {
            expected.push(log.record(user, kind).await.unwrap());
        }
        expected.reverse();

        assert_eq!(log.list_by_user(user, Page::ALL).await.unwrap(), expected);

        let window = Page::from_query(Some(2), Some(3)).unwrap();
        assert_eq!(log.list_by_user(user, window).await.unwrap(), vec![expected[3].clone()]);

        assert!(log.list_by_user(Uuid::new_v4(), Page::ALL).await.unwrap().is_empty());
    }
}
