use crate::{
    auth::{Authenticate, AuthenticatedUser, LoginRequest, LoginResponse, RegisterRequest, UserSummary},
    error::AppError,
    models::{PublicUser, Role},
    routes::MessageResponse,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// The requested `role` is only honoured when `ALLOW_ROLE_ON_REGISTER` is
/// enabled; otherwise every self-registered account is a `User`.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let data = register_data.into_inner();

    let role = if state.allow_role_on_register {
        data.role
    } else {
        if data.role == Some(Role::Admin) {
            log::warn!("ignoring Admin role requested during self-registration");
        }
        None
    };

    state
        .auth
        .register(&data.name, &data.email, &data.password, role)
        .await?;

    Ok(HttpResponse::Created().json(MessageResponse::new("User registered successfully")))
}

/// Login user
///
/// Returns a bearer token and the user's profile, and records a Check-In.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let outcome = state.auth.login(&login_data.email, &login_data.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        token: outcome.token,
        user: UserSummary::from(&outcome.user),
    }))
}

/// Logout user
///
/// Records a Check-Out. The token itself remains valid until it expires.
#[post("/logout", wrap = "Authenticate")]
pub async fn logout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    state.auth.logout(user.user_id).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("User logged out successfully")))
}

/// Profile of the authenticated caller, without the password hash.
#[get("/me", wrap = "Authenticate")]
pub async fn me(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = state.auth.who_am_i(user.user_id).await?;
    Ok(HttpResponse::Ok().json(PublicUser::from(user)))
}
