//! API 에러 응답 타입.
//!
//! 모든 엔드포인트는 실패 시 동일한 본문 형식을 사용합니다:
//!
//! ```json
//! { "error": "User not found" }
//! ```
//!
//! 내부 에러의 상세 내용은 응답에 포함하지 않고 `tracing::error!`로만 기록합니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::repository::StoreError;

/// 인증 실패 메시지.
pub const MSG_AUTHENTICATION_REQUIRED: &str = "Authentication required";
/// 로그인 실패 메시지.
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid credentials";
/// 권한 부족 메시지.
pub const MSG_ADMIN_REQUIRED: &str = "Admin access required";

/// 에러 응답 본문.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 요청 검증 실패 (400)
    #[error("{0}")]
    Validation(String),

    /// 신원 없음 또는 토큰 거부 (401)
    #[error("Authentication required")]
    Authentication,

    /// 로그인 자격 증명 불일치 (401)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// 역할 부족 (403)
    #[error("Admin access required")]
    Authorization,

    /// 대상 없음 (404)
    #[error("{0}")]
    NotFound(String),

    /// 제약 조건 충돌 (기본 409, 일부 자원은 400)
    #[error("{message}")]
    Conflict { message: String, status: StatusCode },

    /// 내부 오류 (500). 메시지는 고정 문구만 사용합니다.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// 409 충돌.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
            status: StatusCode::CONFLICT,
        }
    }

    /// 400으로 응답하는 충돌 (자산 고유/참조 제약).
    pub fn conflict_bad_request(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Authorization => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 응답 본문.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

/// 매핑되지 않은 저장소 에러를 기록하고 500으로 변환합니다.
///
/// 메서드/경로와 타임스탬프는 `TraceLayer` 스팬과 subscriber가 붙입니다.
pub fn internal_store_error(
    operation: &'static str,
    resource_id: Option<i64>,
    err: &StoreError,
    message: &str,
) -> ApiError {
    let chain = error_chain(err);
    tracing::error!(
        operation,
        resource_id,
        code = err.code().unwrap_or("none"),
        error = %err,
        chain = %chain,
        "Store operation failed"
    );
    ApiError::internal(message)
}

/// `source()` 체인을 ` <- `로 연결한 문자열.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(" <- ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::validation("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Authentication.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Authorization.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::conflict_bad_request("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::internal("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(ApiError::Authentication.body().error, MSG_AUTHENTICATION_REQUIRED);
        assert_eq!(ApiError::InvalidCredentials.body().error, MSG_INVALID_CREDENTIALS);
        assert_eq!(ApiError::Authorization.body().error, MSG_ADMIN_REQUIRED);
    }

    #[test]
    fn test_json_body_shape() {
        let json = serde_json::to_string(&ApiError::not_found("User not found").body()).unwrap();
        assert_eq!(json, r#"{"error":"User not found"}"#);
    }

    #[test]
    fn test_internal_hides_store_details() {
        let err = StoreError::Unavailable("pool timed out".to_string());
        let api = internal_store_error("users.list", None, &err, "Failed to fetch users");
        assert_eq!(api.body().error, "Failed to fetch users");
        assert!(!api.to_string().contains("pool"));
    }
}
