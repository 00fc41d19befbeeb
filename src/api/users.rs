use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::domain::{rules, User};
use crate::schemas::auth::{PasswordGrantForm, TokenResponse};
use crate::schemas::user::{UserProfile, UserSignup};


pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/token", post(token))
        .route("/me", get(me))
}

async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<UserSignup>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    rules::validate_email(&payload.email)?;
    rules::validate_name(&payload.first_name, "first name")?;
    rules::validate_name(&payload.last_name, "last name")?;
    rules::validate_password(&payload.password)?;

    let existing = state
        .store()
        .users()
        .get(&payload.email)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict("User with this email already exists".to_string()));
    }

    let password_hash = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let user = state
        .store()
        .users()
        .persist(User {
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            password_hash,
            disabled: false,
        })
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    tracing::info!(email = %user.email, action = "user_signup", "User registered");

    Ok((StatusCode::CREATED, Json(UserProfile::from_entity(user))))
}

async fn token(
    State(state): State<AppState>,
    Form(form): Form<PasswordGrantForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    const BAD_LOGIN: &str = "Incorrect email or password";

    let user = state
        .store()
        .users()
        .get(&form.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized(BAD_LOGIN))?;

    let verified = security::verify_password(&form.password, &user.password_hash)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified || user.disabled {
        return Err(ApiError::Unauthorized(BAD_LOGIN));
    }

    let access_token = security::create_access_token(&user.email, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to issue token"))?;

    Ok(Json(TokenResponse::bearer(access_token)))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::from_entity(user))
}
