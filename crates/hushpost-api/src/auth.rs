use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use hushpost_types::api::{AuthPayload, Claims, Envelope, LoginRequest, RegisterRequest};

use crate::error::AppError;
use crate::state::{AppState, with_db};

const SESSION_DAYS: i64 = 30;

/// 2-20 characters, ASCII letters, digits and underscores.
pub fn validate_username(username: &str) -> Result<(), AppError> {
    let len = username.chars().count();
    if !(2..=20).contains(&len) {
        return Err(AppError::Validation(
            "Username must be between 2 and 20 characters".into(),
        ));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::Validation(
            "Username may only contain letters, digits and underscores".into(),
        ));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    validate_username(&req.username)?;
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let user_id = Uuid::new_v4();
    let username = req.username.clone();
    let password = req.password;

    // Argon2 hashing blocks, run it on the blocking pool with the insert
    let created = with_db(&state, move |db| -> anyhow::Result<bool> {
        let password_hash = hash_password(&password)?;
        db.create_user(&user_id.to_string(), &username, &email, &password_hash)
    })
    .await?;

    if !created {
        return Err(AppError::Conflict(
            "Username or email is already registered".into(),
        ));
    }

    let token = create_token(&state.jwt_secret, user_id, &req.username)?;
    info!("Registered user {}", req.username);

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok_with_message(
            "User registered successfully",
            AuthPayload {
                user_id,
                username: req.username,
                token,
            },
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let identifier = req.identifier.trim().to_string();
    let password = req.password;

    let user = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_identifier(&identifier)? else {
            return Ok(None);
        };

        let verified = verify_password(&user.password, &password)?;

        Ok::<_, anyhow::Error>(verified.then_some(user))
    })
    .await?
    .ok_or(AppError::Unauthorized)?;

    let user_id: Uuid = user
        .id
        .parse::<Uuid>()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let token = create_token(&state.jwt_secret, user_id, &user.username)?;

    Ok(Json(Envelope::ok(AuthPayload {
        user_id,
        username: user.username,
        token,
    })))
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

fn verify_password(stored: &str, password: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("stored password hash is invalid: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
