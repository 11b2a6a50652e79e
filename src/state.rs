use chrono::Duration;

use crate::auth::{AuthService, PasswordHasher, TokenCodec};
use crate::config::Config;
use crate::error::AppError;
use crate::events::EventBus;
use crate::sessions::SessionLog;
use crate::store::SharedStore;

/// Shared application state, registered once with `web::Data`.
///
/// All collaborators are built here at startup and handed to the components
/// that need them; nothing is looked up lazily from globals.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub auth: AuthService,
    pub sessions: SessionLog,
    pub events: EventBus,
    /// Honour the `role` field on public registration.
    pub allow_role_on_register: bool,
}

impl AppState {
    pub fn new(
        store: SharedStore,
        codec: TokenCodec,
        hasher: PasswordHasher,
        events: EventBus,
        token_ttl: Duration,
    ) -> Self {
        let sessions = SessionLog::new(store.clone());
        let auth = AuthService::new(
            store.clone(),
            codec,
            hasher,
            sessions.clone(),
            events.clone(),
            token_ttl,
        );
        Self {
            store,
            auth,
            sessions,
            events,
            allow_role_on_register: false,
        }
    }

    pub fn from_config(store: SharedStore, config: &Config) -> Result<Self, AppError> {
        let codec = TokenCodec::new(&config.jwt_secret)?;
        let mut state = Self::new(
            store,
            codec,
            PasswordHasher::new(config.bcrypt_cost),
            EventBus::new(config.event_bus_capacity),
            config.token_ttl(),
        );
        state.allow_role_on_register = config.allow_role_on_register;
        Ok(state)
    }

    pub fn with_role_on_register(mut self, allow: bool) -> Self {
        self.allow_role_on_register = allow;
        self
    }
}
