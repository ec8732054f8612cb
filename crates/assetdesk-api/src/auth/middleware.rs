//! Axum용 인증 게이트 미들웨어.
//!
//! 라우터 전체에 `from_fn_with_state`로 적용되며 요청마다 다음 순서로 처리합니다:
//!
//! 1. 경로 분류 (공개/보호 안 함 → 통과)
//! 2. `Authorization: Bearer <token>` 추출
//! 3. 토큰 검증
//! 4. 역할 검사 (자산 변경 요청은 ADMIN)
//! 5. 검증된 신원을 request extensions와 `x-user-*` 헤더에 주입
//!
//! 실패는 모두 해당 요청에서 종료되며 재시도하지 않습니다.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::jwt::IdentityClaim;
use super::policy::{self, Decision, Requirement};
use crate::error::ApiError;
use crate::metrics::record_auth_decision;
use crate::state::AppState;

/// 검증된 사용자 ID 헤더.
pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
/// 검증된 사용자 역할 헤더.
pub const X_USER_ROLE: HeaderName = HeaderName::from_static("x-user-role");
/// 검증된 사용자 이메일 헤더.
pub const X_USER_EMAIL: HeaderName = HeaderName::from_static("x-user-email");

/// `Authorization` 헤더에서 Bearer 토큰 추출.
///
/// 헤더가 없거나, 스킴이 다르거나, 토큰이 비어 있으면 `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 요청자가 보낸 `x-user-*` 헤더를 제거하고 검증된 값으로 다시 설정합니다.
fn inject_identity_headers(headers: &mut HeaderMap, claim: &IdentityClaim) {
    headers.remove(&X_USER_ID);
    headers.remove(&X_USER_ROLE);
    headers.remove(&X_USER_EMAIL);

    headers.insert(X_USER_ID, HeaderValue::from(claim.subject_id));
    headers.insert(X_USER_ROLE, HeaderValue::from_static(claim.role.as_str()));
    match HeaderValue::from_str(&claim.email) {
        Ok(value) => {
            headers.insert(X_USER_EMAIL, value);
        }
        Err(_) => debug!(user_id = claim.subject_id, "email not representable as header"),
    }
}

fn reject(error: ApiError, reason: &str) -> Response {
    let decision = match error {
        ApiError::Authorization => Decision::Forbidden,
        _ => Decision::RequireAuthentication,
    };
    record_auth_decision(decision.as_str(), reason);
    error.into_response()
}

/// 인증 게이트 미들웨어.
///
/// # 사용 예시
///
/// ```rust,ignore
/// let app = create_api_router()
///     .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
///     .with_state(state);
/// ```
pub async fn auth_gate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if matches!(
        policy::requirement(&path, &method),
        Requirement::Public | Requirement::Unprotected
    ) {
        return next.run(request).await;
    }

    let verified = match bearer_token(request.headers()) {
        None => {
            debug!(%method, %path, "missing bearer token");
            return reject(ApiError::Authentication, "missing_token");
        }
        Some(token) => state.tokens.verify(token),
    };

    let claim = match verified {
        Ok(claim) => claim,
        Err(rejection) => {
            debug!(%method, %path, reason = rejection.reason.as_str(), "token rejected");
            return reject(ApiError::Authentication, rejection.reason.as_str());
        }
    };

    if policy::decide(&path, &method, Some(claim.role)) == Decision::Forbidden {
        debug!(%method, %path, user_id = claim.subject_id, role = %claim.role, "admin role required");
        return reject(ApiError::Authorization, "insufficient_role");
    }

    record_auth_decision(Decision::Allow.as_str(), "none");
    inject_identity_headers(request.headers_mut(), &claim);
    request.extensions_mut().insert(claim);

    next.run(request).await
}

/// 인증된 사용자 추출기.
///
/// 인증 게이트가 주입한 신원을 읽습니다. 신원이 없으면 401을 반환합니다.
///
/// ```rust,ignore
/// async fn handler(CurrentUser(claim): CurrentUser) -> impl IntoResponse {
///     format!("user {}", claim.subject_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub IdentityClaim);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityClaim>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Authentication)
    }
}
