#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test;
use serde_json::{json, Value};
use uuid::Uuid;

use taskdesk::auth::{PasswordHasher, TokenCodec};
use taskdesk::events::EventBus;
use taskdesk::models::Role;
use taskdesk::state::AppState;
use taskdesk::store::{MemoryStore, SharedStore};

pub const PASSWORD: &str = "Password123!";

/// State backed by the in-memory store, with the cheapest bcrypt cost.
pub fn test_state() -> AppState {
    let store: SharedStore = Arc::new(MemoryStore::new());
    AppState::new(
        store,
        TokenCodec::new("integration-test-secret").unwrap(),
        PasswordHasher::new(4),
        EventBus::new(64),
        chrono::Duration::hours(24),
    )
}

/// Builds the application the same way `main.rs` does, minus CORS.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state.clone()))
                .wrap(actix_web::middleware::NormalizePath::trim())
                .wrap(actix_web::middleware::Logger::default())
                .configure(taskdesk::routes::config),
        )
        .await
    };
}

/// Sends a request and returns the status together with the parsed JSON body
/// (`Value::Null` for an empty body).
pub async fn send<S, B>(app: &S, req: Request) -> (u16, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("response is not JSON: {:?}", String::from_utf8_lossy(&body))
        })
    };
    (status, json)
}

pub async fn register<S, B>(app: &S, name: &str, email: &str) -> u16
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "name": name, "email": email, "password": PASSWORD }))
        .to_request();
    send(app, req).await.0
}

/// Logs in and returns `(token, user id)`.
pub async fn login<S, B>(app: &S, email: &str) -> (String, Uuid)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, 200, "login failed: {}", body);

    let token = body["token"].as_str().expect("token missing").to_string();
    let id = body["user"]["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .expect("user id missing");
    (token, id)
}

pub async fn register_and_login<S, B>(app: &S, name: &str, email: &str) -> (String, Uuid)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    assert_eq!(register(app, name, email).await, 201);
    login(app, email).await
}

/// Creates an Admin directly through the service layer and logs it in.
pub async fn admin_token<S, B>(app: &S, state: &AppState, email: &str) -> (String, Uuid)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    state
        .auth
        .register("Admin", email, PASSWORD, Some(Role::Admin))
        .await
        .expect("admin registration failed");
    login(app, email).await
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
