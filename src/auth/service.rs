//! Registration, login, logout and identity resolution.
//!
//! Every path that creates or edits a user goes through [`AuthService`], so
//! email normalisation and password hashing happen in exactly one place.

use chrono::Duration;
use uuid::Uuid;

use crate::auth::extractors::AuthenticatedUser;
use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenCodec;
use crate::config::BootstrapAdmin;
use crate::error::AppError;
use crate::events::{Event, EventBus};
use crate::models::{normalize_email, Page, Role, SessionRecord, SessionType, User, UserQuery, UserUpdate};
use crate::sessions::SessionLog;
use crate::store::SharedStore;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
    codec: TokenCodec,
    hasher: PasswordHasher,
    sessions: SessionLog,
    events: EventBus,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(
        store: SharedStore,
        codec: TokenCodec,
        hasher: PasswordHasher,
        sessions: SessionLog,
        events: EventBus,
        token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            codec,
            hasher,
            sessions,
            events,
            token_ttl,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Creates a user. `role` defaults to `User`; callers decide whether a
    /// requested role is honoured.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<Role>,
    ) -> Result<User, AppError> {
        let email = normalize_email(email);

        // Cheap rejection before paying for the hash. The insert below is
        // conditional, so a concurrent registration still cannot slip through.
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hasher.hash(password).await?;
        let user = User::new(
            name.trim().to_string(),
            email,
            password_hash,
            role.unwrap_or_default(),
        );
        let user = self.store.insert_user(user).await?;
        log::info!("registered user {} with role {}", user.id, user.role.as_str());
        Ok(user)
    }

    /// Verifies credentials, mints a token and records a Check-In.
    ///
    /// Unknown email and wrong password produce the same `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let email = normalize_email(email);
        let user = match self.store.find_user_by_email(&email).await? {
            Some(user) => user,
            None => return Err(AppError::InvalidCredentials),
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.codec.issue(user.id, user.role, self.token_ttl)?;
        self.sessions.record(user.id, SessionType::CheckIn).await?;
        self.events.publish(Event::user_login(user.id));

        Ok(LoginOutcome { token, user })
    }

    /// Records a Check-Out. The caller's token stays valid until it expires.
    pub async fn logout(&self, user_id: Uuid) -> Result<SessionRecord, AppError> {
        let record = self.sessions.record(user_id, SessionType::CheckOut).await?;
        self.events.publish(Event::user_logout(user_id));
        Ok(record)
    }

    pub async fn who_am_i(&self, user_id: Uuid) -> Result<User, AppError> {
        self.get_user(user_id).await
    }

    /// Two-stage check used by the authentication middleware: a stateless
    /// token verification followed by a credential store lookup.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let identity = self.codec.verify(token)?;
        let user = self
            .store
            .find_user(identity.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        Ok(AuthenticatedUser {
            user_id: user.id,
            role: user.role,
        })
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn list_users(&self, query: &UserQuery) -> Result<Vec<User>, AppError> {
        let page = Page::from_query(query.page, query.limit)?;
        self.store.list_users(query, page).await
    }

    pub async fn update_user(&self, user_id: Uuid, mut update: UserUpdate) -> Result<User, AppError> {
        update.name = update.name.map(|n| n.trim().to_string());
        update.email = update.email.as_deref().map(normalize_email);
        let user = self
            .store
            .update_user(user_id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        log::info!("updated user {}", user.id);
        Ok(user)
    }

    /// Removes the user record only; tasks and sessions are left in place.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_user(user_id).await? {
            return Err(AppError::NotFound("User not found".into()));
        }
        log::info!("deleted user {}", user_id);
        Ok(())
    }

    /// Registers the configured Admin unless its email is already taken.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, admin: &BootstrapAdmin) -> Result<bool, AppError> {
        match self
            .register(&admin.name, &admin.email, &admin.password, Some(Role::Admin))
            .await
        {
            Ok(_) => Ok(true),
            Err(AppError::DuplicateEmail) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
