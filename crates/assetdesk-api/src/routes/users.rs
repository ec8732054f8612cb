//! 사용자 관리 endpoint.
//!
//! 인증된 모든 역할이 접근할 수 있습니다.
//!
//! # 엔드포인트
//!
//! - `GET /api/users` - 사용자 목록 (검색/필터/페이지네이션)
//! - `POST /api/users` - 사용자 생성
//! - `GET /api/users/{id}` - 사용자 조회
//! - `PUT /api/users/{id}` - 사용자 부분 수정
//! - `DELETE /api/users/{id}` - 사용자 삭제 (삭제된 레코드 반환)

use std::sync::Arc;

use assetdesk_core::{NewUser, Role, User, UserFilter, UserId, UserPatch};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::JsonBody;
use crate::auth::{hash_password_blocking, CurrentUser};
use crate::error::{internal_store_error, ApiError, ApiResult};
use crate::repository::StoreError;
use crate::state::AppState;
use crate::validation::{self, non_blank, required};

const DEFAULT_LIMIT: i64 = 5;

const MSG_NAME_REQUIRED: &str = "Name is required";
const MSG_EMAIL_REQUIRED: &str = "Email is required";
const MSG_INVALID_ID: &str = "Invalid user ID";
const MSG_NOT_FOUND: &str = "User not found";
const MSG_EMAIL_EXISTS: &str = "Email already exists";
const MSG_DELETE_REFERENCED: &str = "Cannot delete user due to existing references";

// ==================== 요청/응답 ====================

/// 목록 쿼리.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<String>,
}

/// 목록 응답.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
}

/// 생성/수정 요청 본문. 수정 시 모든 필드는 선택입니다.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

// ==================== 입력 변환 ====================

fn parse_id(raw: &str) -> ApiResult<UserId> {
    Ok(validation::integer_id("id", raw, MSG_INVALID_ID)?)
}

fn list_filter(query: &UserListQuery) -> ApiResult<UserFilter> {
    let role = non_blank(query.role.as_deref())
        .map(|r| validation::role("role", r))
        .transpose()?;

    Ok(UserFilter {
        search: non_blank(query.search.as_deref()).map(str::to_string),
        role,
        is_active: query.is_active.as_deref().map(|v| v == "true"),
    })
}

fn optional_phone(raw: Option<&str>) -> ApiResult<Option<String>> {
    match non_blank(raw) {
        None => Ok(None),
        Some(phone) => {
            validation::phone("phone", phone)?;
            Ok(Some(phone.to_string()))
        }
    }
}

fn optional_role(raw: Option<&str>) -> ApiResult<Option<Role>> {
    Ok(non_blank(raw)
        .map(|r| validation::role("role", r))
        .transpose()?)
}

async fn optional_digest(raw: Option<&str>, failure: &str) -> ApiResult<Option<String>> {
    let Some(password) = raw.filter(|p| non_blank(Some(p)).is_some()) else {
        return Ok(None);
    };
    let digest = hash_password_blocking(password.to_string()).await.map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        ApiError::internal(failure)
    })?;
    Ok(Some(digest))
}

/// 생성 요청 검증. 규칙 순서: name → email → email 형식 → phone → role.
async fn new_user(payload: UserPayload) -> ApiResult<NewUser> {
    let name = required("name", payload.name.as_deref(), MSG_NAME_REQUIRED)?;
    let email = required("email", payload.email.as_deref(), MSG_EMAIL_REQUIRED)?.to_lowercase();
    validation::email("email", &email)?;
    let phone = optional_phone(payload.phone.as_deref())?;
    let role = optional_role(payload.role.as_deref())?.unwrap_or_default();
    let password_hash = optional_digest(payload.password.as_deref(), "Failed to create user").await?;

    Ok(NewUser {
        name: name.to_string(),
        email,
        password_hash,
        role,
        is_active: payload.is_active.unwrap_or(true),
        phone,
        address: non_blank(payload.address.as_deref()).map(str::to_string),
    })
}

/// 수정 요청 검증. 제공된 필드에만 규칙을 적용합니다.
async fn user_patch(payload: UserPayload) -> ApiResult<UserPatch> {
    let name = match payload.name.as_deref() {
        None => None,
        Some(raw) => Some(required("name", Some(raw), MSG_NAME_REQUIRED)?.to_string()),
    };
    let email = match payload.email.as_deref() {
        None => None,
        Some(raw) => {
            let email = required("email", Some(raw), MSG_EMAIL_REQUIRED)?.to_lowercase();
            validation::email("email", &email)?;
            Some(email)
        }
    };
    let phone = optional_phone(payload.phone.as_deref())?;
    let role = optional_role(payload.role.as_deref())?;
    let password_hash = optional_digest(payload.password.as_deref(), "Failed to update user").await?;

    Ok(UserPatch {
        name,
        email,
        password_hash,
        role,
        is_active: payload.is_active,
        phone,
        address: non_blank(payload.address.as_deref()).map(str::to_string),
    })
}

async fn require_user(state: &AppState, id: UserId) -> ApiResult<User> {
    state
        .users
        .find_by_id(id)
        .await
        .map_err(|e| internal_store_error("users.get", Some(id), &e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::not_found(MSG_NOT_FOUND))
}

// ==================== 핸들러 ====================

/// 사용자 목록.
///
/// GET /api/users?page=1&limit=5&search=kim&role=ADMIN&isActive=true
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<UserListResponse>> {
    let request = validation::page_request(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_LIMIT,
    )?;
    let filter = list_filter(&query)?;

    let page = state
        .users
        .list(&filter, request)
        .await
        .map_err(|e| internal_store_error("users.list", None, &e, "Failed to fetch users"))?;

    let total_pages = page.total_pages();
    Ok(Json(UserListResponse {
        users: page.items,
        total: page.total,
        page: page.page,
        total_pages,
    }))
}

/// 사용자 조회.
///
/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let id = parse_id(&id)?;
    Ok(Json(require_user(&state, id).await?))
}

/// 사용자 생성.
///
/// POST /api/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    JsonBody(payload): JsonBody<UserPayload>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let new_user = new_user(payload).await?;

    let user = state.users.create(new_user).await.map_err(|e| match e {
        StoreError::UniqueViolation { .. } => ApiError::conflict(MSG_EMAIL_EXISTS),
        other => internal_store_error("users.create", None, &other, "Failed to create user"),
    })?;

    info!(user_id = user.id, actor_id = actor.subject_id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// 사용자 부분 수정.
///
/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> ApiResult<Json<User>> {
    let id = parse_id(&id)?;
    let patch = user_patch(payload).await?;
    require_user(&state, id).await?;

    let user = state.users.update(id, patch).await.map_err(|e| match e {
        StoreError::RecordNotFound => ApiError::not_found(MSG_NOT_FOUND),
        StoreError::UniqueViolation { .. } => ApiError::conflict(MSG_EMAIL_EXISTS),
        other => internal_store_error("users.update", Some(id), &other, "Failed to update user"),
    })?;

    info!(user_id = user.id, actor_id = actor.subject_id, "User updated");
    Ok(Json(user))
}

/// 사용자 삭제.
///
/// 존재 여부를 먼저 확인한 뒤 삭제하고, 삭제된 사용자를 반환합니다.
///
/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let id = parse_id(&id)?;
    require_user(&state, id).await?;

    let user = state.users.delete(id).await.map_err(|e| match e {
        StoreError::RecordNotFound => ApiError::not_found(MSG_NOT_FOUND),
        StoreError::ForeignKeyViolation { .. } => {
            ApiError::conflict_bad_request(MSG_DELETE_REFERENCED)
        }
        other => internal_store_error("users.delete", Some(id), &other, "Failed to delete user"),
    })?;

    info!(user_id = user.id, actor_id = actor.subject_id, "User deleted");
    Ok(Json(user))
}

/// 사용자 라우터.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
}
