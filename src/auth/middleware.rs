use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::auth::extractors::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication layer.
///
/// Requires a bearer token, verifies it, re-resolves the user in the
/// credential store and attaches an [`AuthenticatedUser`] to the request.
/// Missing or invalid tokens yield 401; a token whose user has since been
/// deleted yields 404. Rejections are rendered as responses here and never
/// reach the wrapped service.
pub struct Authenticate;

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthenticateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthenticateMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let outcome = authenticate_request(&req).await;
            match outcome {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                Err(app_err) => {
                    log::debug!("rejected {} {}: {}", req.method(), req.path(), app_err);
                    Ok(req.error_response(app_err).map_into_right_body())
                }
            }
        })
    }
}

async fn authenticate_request(req: &ServiceRequest) -> Result<AuthenticatedUser, AppError> {
    let token = bearer_token(req.headers())
        .map(str::to_owned)
        .ok_or_else(|| AppError::Unauthenticated("Access denied: no token provided".into()))?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalError("AppState is not registered".into()))?;

    state.auth.authenticate(&token).await
}

/// Role gate. Must be composed inside [`Authenticate`]; without an attached
/// identity it answers 401, for a non-Admin identity 403.
pub struct RequireAdmin;

impl<S, B> Transform<S, ServiceRequest> for RequireAdmin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireAdminMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAdminMiddleware { service }))
    }
}

pub struct RequireAdminMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireAdminMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verdict = match req.extensions().get::<AuthenticatedUser>() {
            None => Err(AppError::Unauthenticated("Unauthorized: no user on request".into())),
            Some(user) if !user.is_admin() => Err(AppError::Forbidden("Forbidden: Admins only".into())),
            Some(_) => Ok(()),
        };

        match verdict {
            Ok(()) => {
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(app_err) => {
                let res = req.error_response(app_err).map_into_right_body();
                Box::pin(ready(Ok(res)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::{http::StatusCode, test as actix_test, App, HttpResponse};
    use uuid::Uuid;

    #[test]
    fn test_bearer_token_parsing() {
        let req = actix_test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(req.headers()), Some("abc.def.ghi"));

        let req = actix_test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert_eq!(bearer_token(req.headers()), None);

        let req = actix_test::TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer "))
            .to_http_request();
        assert_eq!(bearer_token(req.headers()), None);

        let req = actix_test::TestRequest::default().to_http_request();
        assert_eq!(bearer_token(req.headers()), None);
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_rt::test]
    async fn test_require_admin_without_identity_is_unauthenticated() {
        let app = actix_test::init_service(
            App::new().service(web::resource("/admin").wrap(RequireAdmin).to(ok)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/admin").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_require_admin_checks_role() {
        for (role, expected) in [(Role::User, StatusCode::FORBIDDEN), (Role::Admin, StatusCode::OK)] {
            let identity = AuthenticatedUser {
                user_id: Uuid::new_v4(),
                role,
            };
            let app = actix_test::init_service(
                App::new().service(
                    web::resource("/admin")
                        .wrap(RequireAdmin)
                        .wrap_fn(move |req, srv| {
                            req.extensions_mut().insert(identity);
                            srv.call(req)
                        })
                        .to(ok),
                ),
            )
            .await;

            let req = actix_test::TestRequest::get().uri("/admin").to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
        }
    }
}
