//! Login, password reset and the current-account endpoint.

pub mod accounts;
pub mod password_codes;

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use chrono::Utc;
use diesel::Connection;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::shared::error::{ApiError, StorageError};
use crate::core::shared::models::PasswordCode;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::core::urls::ApiUrls;
use crate::directory::organization::normalize_phone;
use crate::security::password::{hash_password, validate_password, verify_password};
use crate::security::{AuthError, Identity, Role};
use accounts::{find_account, find_account_by_identity, set_password_hash, Account};
use password_codes::{find_code, generate_code, is_code_valid, remove_code, upsert_code};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub role: Role,
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub identity: Identity,
}

#[derive(Debug, Deserialize)]
pub struct PasswordCodeRequest {
    pub role: Role,
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub role: Role,
    pub login: String,
    pub code: String,
    pub password: String,
}

/// Canonical form of a login as stored: normalized phone or lowercased e-mail.
fn login_key(role: Role, raw: &str) -> String {
    if role.logs_in_by_phone() {
        normalize_phone(raw).unwrap_or_else(|_| raw.trim().to_string())
    } else {
        raw.trim().to_lowercase()
    }
}

async fn load_account(
    state: &AppState,
    role: Role,
    login: &str,
) -> Result<Option<Account>, StorageError> {
    let login = login_key(role, login);
    with_conn(&state.conn, move |conn| Ok(find_account(conn, role, &login)?)).await
}

async fn blocking<T, F>(f: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let account = load_account(&state, req.role, &req.login)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let hash = account
        .password_hash()
        .map(str::to_string)
        .ok_or(AuthError::PasswordResetRequired)?;

    let password = req.password;
    if !blocking(move || verify_password(&password, &hash)).await? {
        warn!("Failed login for {} {}", account.role(), account.login());
        return Err(AuthError::InvalidCredentials.into());
    }

    let identity = account.identity();
    let token = state.jwt.issue(identity.clone())?;
    info!("{} logged in", identity.subject());

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.ttl_seconds(),
        identity,
    }))
}

/// Issues a reset code. Unknown logins get the same answer as known ones.
pub async fn request_password_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordCodeRequest>,
) -> Result<StatusCode, ApiError> {
    let Some(account) = load_account(&state, req.role, &req.login).await? else {
        warn!("Password code requested for unknown {} {:?}", req.role, req.login);
        return Ok(StatusCode::NO_CONTENT);
    };

    let code = PasswordCode {
        role: account.role().as_str().to_string(),
        login: account.login().to_string(),
        code: generate_code(),
        created_at: Utc::now(),
    };
    let sent = code.code.clone();

    with_conn(&state.conn, move |conn| Ok(upsert_code(conn, &code)?)).await?;

    state
        .code_sender
        .send_code(&account.contact(), &sent)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validate_password(&req.password).map_err(AuthError::WeakPassword)?;

    let account = load_account(&state, req.role, &req.login)
        .await?
        .ok_or(AuthError::InvalidCode)?;

    let role = req.role;
    let login = account.login().to_string();
    let stored = with_conn(&state.conn, move |conn| Ok(find_code(conn, role, &login)?))
        .await?
        .ok_or(AuthError::InvalidCode)?;

    let ttl = state.config.auth.password_code_ttl;
    if !is_code_valid(&stored, &req.code, Utc::now(), ttl) {
        return Err(AuthError::InvalidCode.into());
    }

    let password = req.password;
    let hash = blocking(move || hash_password(&password)).await?;

    let subject = account.identity().subject();
    with_conn(&state.conn, move |conn| {
        conn.transaction(|conn| {
            remove_code(conn, role, account.login())?;
            set_password_hash(conn, &account, &hash)?;
            Ok(())
        })
    })
    .await?;

    info!("Password set for {}", subject);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_entity(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Account>, ApiError> {
    let account = with_conn(&state.conn, move |conn| {
        Ok(find_account_by_identity(conn, &identity)?)
    })
    .await?
    .ok_or(AuthError::UnknownAccount)?;
    Ok(Json(account))
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::LOGIN, post(login))
        .route(ApiUrls::PASSWORD_CODE, post(request_password_code))
        .route(ApiUrls::PASSWORD, post(reset_password))
        .route(ApiUrls::ENTITY, get(current_entity))
}
