use crate::error::AppError;
use actix_web::web;
use bcrypt::{hash, verify};
use validator::ValidationError;

/// bcrypt only reads this many bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Validator for password fields: non-empty and within bcrypt's input limit,
/// measured in UTF-8 bytes.
pub fn validate_password_length(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() || password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("password_length"));
    }
    Ok(())
}

/// Refuses passwords bcrypt would silently truncate.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::ValidationError(format!(
            "password must be at most {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    hash(password, cost)
        .map_err(|e| AppError::InternalError(format!("Failed to hash password: {}", e)))
}

/// A password longer than bcrypt accepts can never have been stored, so it never matches.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalError(format!("Failed to verify password: {}", e)))
}

/// bcrypt with a configurable cost. Both operations run on the blocking
/// thread pool so request handling threads are never held by hashing.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;
        web::block(move || hash_password(&password, cost)).await?
    }

    pub async fn verify(&self, password: &str, hashed_password: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hashed_password = hashed_password.to_owned();
        web::block(move || verify_password(&password, &hashed_password)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "test_password123";
        let hashed = hash_password(password, 4).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("wrong_password", &hashed).unwrap());
    }

    #[test]
    fn test_verify_with_invalid_hash() {
        match verify_password("test_password123", "invalidhashformat") {
            Err(AppError::InternalError(msg)) => {
                assert!(msg.contains("Failed to verify password"));
            }
            Ok(false) => {}
            Ok(true) => panic!("Password verification should fail for invalid hash format"),
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    #[test]
    fn test_passwords_beyond_bcrypt_limit_are_refused() {
        let stored = "a".repeat(MAX_PASSWORD_BYTES);
        let hashed = hash_password(&stored, 4).unwrap();
        assert!(verify_password(&stored, &hashed).unwrap());

        let longer = format!("{}b", stored);
        assert!(!verify_password(&longer, &hashed).unwrap());
        assert!(matches!(
            hash_password(&longer, 4),
            Err(AppError::ValidationError(_))
        ));

        assert!(validate_password_length(&stored).is_ok());
        assert!(validate_password_length(&longer).is_err());
        assert!(validate_password_length("").is_err());
        // 24 three-byte characters fill the limit exactly.
        assert!(validate_password_length(&"€".repeat(24)).is_ok());
        assert!(validate_password_length(&"€".repeat(25)).is_err());
    }

    #[actix_rt::test]
    async fn test_hasher_offloads_and_round_trips() {
        let hasher = PasswordHasher::new(4);
        let hashed = hasher.hash("pw").await.unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(hasher.verify("pw", &hashed).await.unwrap());
        assert!(!hasher.verify("PW", &hashed).await.unwrap());
    }
}
