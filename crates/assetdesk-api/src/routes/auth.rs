//! 로그인/회원가입 endpoint.
//!
//! 인증 게이트의 공개 경로입니다.
//!
//! # 엔드포인트
//!
//! - `POST /api/auth/login` - 이메일/비밀번호 로그인
//! - `POST /api/auth/register` - 회원가입 (USER 역할, 활성 상태)

use std::sync::Arc;

use assetdesk_core::{NewUser, Role, User, UserId};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::JsonBody;
use crate::auth::{hash_password_blocking, verify_password_blocking, IdentityClaim, PasswordError};
use crate::error::{internal_store_error, ApiError, ApiResult};
use crate::repository::StoreError;
use crate::state::AppState;
use crate::validation::{self, non_blank};

const MSG_LOGIN_REQUIRED: &str = "Email and password are required";
const MSG_REGISTER_REQUIRED: &str = "Name, email, and password are required";
const MSG_EMAIL_REGISTERED: &str = "Email already registered";
const MSG_INTERNAL: &str = "Internal server error";

/// 로그인 요청.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// 회원가입 요청.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// 응답에 포함되는 사용자 정보.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// 로그인/회원가입 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: AuthUser,
    pub token: String,
}

fn issue_for(state: &AppState, user: &User) -> ApiResult<AuthResponse> {
    let claim = IdentityClaim::new(user.id, user.email.clone(), user.role);
    let token = state.tokens.issue(&claim).map_err(|e| {
        tracing::error!(user_id = user.id, error = %e, "Token issuance failed");
        ApiError::internal(MSG_INTERNAL)
    })?;

    Ok(AuthResponse {
        user: AuthUser::from(user),
        token,
    })
}

/// 이메일/비밀번호 로그인.
///
/// 알 수 없는 이메일, 비밀번호 불일치, 비밀번호가 없는 계정은 모두 같은 401을 반환합니다.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (Some(email), Some(_)) = (
        non_blank(req.email.as_deref()),
        non_blank(req.password.as_deref()),
    ) else {
        return Err(ApiError::validation(MSG_LOGIN_REQUIRED));
    };
    let email = email.to_lowercase();
    let password = req.password.as_deref().unwrap_or_default();

    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| internal_store_error("auth.login", None, &e, MSG_INTERNAL))?
        .ok_or(ApiError::InvalidCredentials)?;

    let Some(digest) = user.password_hash.as_deref() else {
        return Err(ApiError::InvalidCredentials);
    };

    match verify_password_blocking(password.to_string(), digest.to_string()).await {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::InvalidCredentials),
        Err(PasswordError::InvalidHashFormat) => {
            warn!(user_id = user.id, "Stored password digest is malformed");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => {
            tracing::error!(user_id = user.id, error = %e, "Password verification failed");
            return Err(ApiError::internal(MSG_INTERNAL));
        }
    }

    info!(user_id = user.id, "User logged in");
    Ok(Json(issue_for(&state, &user)?))
}

/// 회원가입.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let (Some(name), Some(email), Some(_)) = (
        non_blank(req.name.as_deref()),
        non_blank(req.email.as_deref()),
        non_blank(req.password.as_deref()),
    ) else {
        return Err(ApiError::validation(MSG_REGISTER_REQUIRED));
    };
    let email = email.to_lowercase();
    validation::email("email", &email)?;
    let password = req.password.as_deref().unwrap_or_default();

    let existing = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|e| internal_store_error("auth.register", None, &e, MSG_INTERNAL))?;
    if existing.is_some() {
        return Err(ApiError::conflict(MSG_EMAIL_REGISTERED));
    }

    let digest = hash_password_blocking(password.to_string()).await.map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::internal(MSG_INTERNAL)
    })?;

    let user = state
        .users
        .create(NewUser {
            name: name.to_string(),
            email,
            password_hash: Some(digest),
            role: Role::User,
            is_active: true,
            phone: None,
            address: None,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation { .. } => ApiError::conflict(MSG_EMAIL_REGISTERED),
            other => internal_store_error("auth.register", None, &other, MSG_INTERNAL),
        })?;

    info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(issue_for(&state, &user)?)))
}

/// 인증 라우터.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}
