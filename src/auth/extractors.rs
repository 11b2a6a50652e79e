use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;

/// Identity attached to the request by the `Authenticate` middleware.
///
/// The role is the one currently stored for the user, not the one frozen
/// into the token, so demotions take effect on the next request.
///
/// As an extractor it fails with `Unauthenticated` when the middleware did
/// not run, which keeps handlers from ever seeing an anonymous caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Owners always pass; Admins pass for any owner.
    pub fn can_access(&self, owner: Uuid) -> bool {
        self.user_id == owner || self.is_admin()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().copied() {
            Some(user) => ready(Ok(user)),
            None => {
                let err = AppError::Unauthenticated("Unauthorized".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_success() {
        let req = actix_test::TestRequest::default().to_http_request();
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            role: Role::User,
        };
        req.extensions_mut().insert(user);

        let mut payload = Payload::None;
        let extracted = AuthenticatedUser::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap(), user);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_failure() {
        let req = actix_test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let err = AuthenticatedUser::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_can_access() {
        let owner = Uuid::new_v4();
        let user = AuthenticatedUser {
            user_id: owner,
            role: Role::User,
        };
        assert!(user.can_access(owner));
        assert!(!user.can_access(Uuid::new_v4()));

        let admin = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        assert!(admin.can_access(owner));
    }
}
