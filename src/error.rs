use actix_web::{
    error::{BlockingError, JsonPayloadError, PathError, QueryPayloadError},
    http::StatusCode,
    HttpRequest, HttpResponse, ResponseError,
};
use serde_json::json;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use validator::ValidationErrors;

/// Whether internal error causes are echoed back to the client.
/// Set once at startup from `Config::environment`.
static EXPOSE_INTERNAL_DETAILS: AtomicBool = AtomicBool::new(false);

/// Enables or disables the `details` field on internal error responses.
pub fn expose_internal_details(enabled: bool) {
    EXPOSE_INTERNAL_DETAILS.store(enabled, Ordering::Relaxed);
}

/// Application-wide error type.
///
/// Every handler and middleware returns this type; the `ResponseError`
/// implementation below translates each variant into its HTTP status and a
/// `{"error": <kind>, "message": <text>}` JSON body.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or invalid input (HTTP 400).
    ValidationError(String),
    /// Unknown email or wrong password (HTTP 400). Both cases share one message.
    InvalidCredentials,
    /// Email already registered to another user (HTTP 400).
    DuplicateEmail,
    /// Missing, malformed or expired token (HTTP 401).
    Unauthenticated(String),
    /// Valid identity without the required role (HTTP 403).
    Forbidden(String),
    /// Referenced entity is absent (HTTP 404).
    NotFound(String),
    /// Unexpected failure: store unavailable, signing misconfigured, etc. (HTTP 500).
    /// The message is the underlying cause and is only shown to clients in development.
    InternalError(String),
}

impl AppError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "ValidationError",
            AppError::InvalidCredentials => "InvalidCredentials",
            AppError::DuplicateEmail => "DuplicateEmail",
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::Forbidden(_) => "Forbidden",
            AppError::NotFound(_) => "NotFound",
            AppError::InternalError(_) => "InternalError",
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::ValidationError(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::DuplicateEmail => "User already exists".to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::InvalidCredentials => write!(f, "Invalid credentials"),
            AppError::DuplicateEmail => write!(f, "Duplicate email"),
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidCredentials
            | AppError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": self.kind(),
            "message": self.client_message(),
        });

        if let AppError::InternalError(cause) = self {
            log::error!("internal error: {}", cause);
            if EXPOSE_INTERNAL_DETAILS.load(Ordering::Relaxed) {
                body["details"] = json!(cause);
            }
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// `RowNotFound` becomes `NotFound`, a unique-constraint violation becomes
/// `DuplicateEmail` (the only unique constraint besides primary keys is on
/// `lower(email)`), everything else is an internal error.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::DuplicateEmail
            }
            _ => AppError::InternalError(format!("database: {}", error)),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalError(format!("password hashing: {}", error))
    }
}

impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::InternalError(format!("blocking task: {}", error))
    }
}

/// Error handler for `web::JsonConfig` so that malformed bodies use the
/// application error shape.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// Error handler for `web::QueryConfig`.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// Error handler for `web::PathConfig`.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthenticated("Invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::ValidationError("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::InvalidCredentials;
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::DuplicateEmail;
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::Forbidden("Admins only".into());
        assert_eq!(error.error_response().status(), 403);

        let error = AppError::NotFound("Resource not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::InternalError("Server error".into());
        assert_eq!(error.error_response().status(), 500);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[test]
    fn test_internal_message_is_generic() {
        let error = AppError::InternalError("connection refused".into());
        assert_eq!(error.client_message(), "Internal server error");
        assert_eq!(error.kind(), "InternalError");
    }
}
