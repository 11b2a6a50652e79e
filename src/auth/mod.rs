pub mod extractors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{validate_not_blank, Role, User, EMAIL_REGEX};

// Re-export necessary items
pub use extractors::AuthenticatedUser;
pub use middleware::{Authenticate, RequireAdmin};
pub use password::{
    hash_password, validate_password_length, verify_password, PasswordHasher, MAX_PASSWORD_BYTES,
};
pub use service::AuthService;
pub use token::{Claims, Identity, TokenCodec, TokenError};

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(regex(path = "EMAIL_REGEX", message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(custom = "validate_password_length")]
    pub password: String,
}

/// Payload of `POST /register` and of the Admin-only `POST /users`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 100), custom = "validate_not_blank")]
    pub name: String,
    #[validate(regex(path = "EMAIL_REGEX", message = "Email must be a valid email address"))]
    pub email: String,
    #[validate(custom = "validate_password_length")]
    pub password: String,
    pub role: Option<Role>,
}

/// Profile fields returned next to the token on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Response structure after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_login_request_validation() {
        let valid_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "pw".to_string(),
        };
        assert!(valid_login.validate().is_ok());

        let invalid_email_login = LoginRequest {
            email: "testexample.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(invalid_email_login.validate().is_err());

        let empty_password_login = LoginRequest {
            email: "test@example.com".to_string(),
            password: "".to_string(),
        };
        assert!(empty_password_login.validate().is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid_register = RegisterRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "pw".to_string(),
            role: None,
        };
        assert!(valid_register.validate().is_ok());

        let blank_name_register = RegisterRequest {
            name: "   ".to_string(),
            email: "a@x.com".to_string(),
            password: "pw".to_string(),
            role: None,
        };
        assert!(blank_name_register.validate().is_err());

        let bad_email_register = RegisterRequest {
            name: "A".to_string(),
            email: "a@x".to_string(),
            password: "pw".to_string(),
            role: Some(Role::Admin),
        };
        assert!(bad_email_register.validate().is_err());
    }
}
