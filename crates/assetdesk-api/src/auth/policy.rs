//! 경로 접근 정책.
//!
//! 요청 경로와 메서드, (있다면) 역할로 접근 결정을 내리는 순수 함수입니다.
//!
//! | 경로 | 메서드 | 결정 |
//! |------|--------|------|
//! | `/api/auth/...` | 전체 | 공개 |
//! | `/api/` 외부 (`/health`, `/metrics`) | 전체 | 보호 안 함 |
//! | `/api/assets/...` | POST, PUT, PATCH, DELETE | ADMIN 필요 |
//! | 그 외 `/api/...` | 전체 | 인증 필요 |

use assetdesk_core::Role;
use axum::http::Method;

/// 인증 없이 접근 가능한 접두사.
pub const PUBLIC_AUTH_PREFIX: &str = "/api/auth";
/// 변경 요청에 관리자 권한이 필요한 접두사.
pub const ADMIN_GUARDED_PREFIX: &str = "/api/assets";
/// 보호 대상 API 접두사.
pub const API_PREFIX: &str = "/api";

/// 경로 분류 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// 공개 인증 경로
    Public,
    /// API 외부 경로
    Unprotected,
    /// 인증된 사용자 (역할 무관)
    Authenticated,
    /// 관리자만
    Admin,
}

impl Requirement {
    /// 메트릭 라벨 값.
    pub fn as_str(&self) -> &'static str {
        match self {
            Requirement::Public => "public",
            Requirement::Unprotected => "unprotected",
            Requirement::Authenticated => "authenticated",
            Requirement::Admin => "admin",
        }
    }
}

/// 접근 결정.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// 통과
    Allow,
    /// 신원 없음 → 401
    RequireAuthentication,
    /// 권한 부족 → 403
    Forbidden,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::RequireAuthentication => "unauthenticated",
            Decision::Forbidden => "forbidden",
        }
    }
}

/// 세그먼트 단위 접두사 일치 (`/api/assets`는 `/api/assetsfoo`와 일치하지 않음).
fn has_segment_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// 변경 메서드 여부.
pub fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// 경로와 메서드에 필요한 조건.
pub fn requirement(path: &str, method: &Method) -> Requirement {
    if has_segment_prefix(path, PUBLIC_AUTH_PREFIX) {
        Requirement::Public
    } else if !has_segment_prefix(path, API_PREFIX) {
        Requirement::Unprotected
    } else if has_segment_prefix(path, ADMIN_GUARDED_PREFIX) && is_mutating(method) {
        Requirement::Admin
    } else {
        Requirement::Authenticated
    }
}

/// 접근 결정.
///
/// `role`은 검증된 토큰의 역할이며 토큰이 없으면 `None`입니다.
pub fn decide(path: &str, method: &Method, role: Option<Role>) -> Decision {
    match (requirement(path, method), role) {
        (Requirement::Public | Requirement::Unprotected, _) => Decision::Allow,
        (_, None) => Decision::RequireAuthentication,
        (Requirement::Admin, Some(role)) if !role.is_admin() => Decision::Forbidden,
        _ => Decision::Allow,
    }
}
