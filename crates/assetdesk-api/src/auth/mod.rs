//! 인증 및 권한 부여.
//!
//! JWT 기반 인증과 두 역할(USER, ADMIN) 기반 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`hash_password`] / [`verify_password`]: Argon2id 비밀번호 저장
//! - [`TokenService`]: 신원 클레임 토큰 발급/검증
//! - [`policy`]: 경로별 접근 정책
//! - [`auth_gate`]: 라우터 전체에 적용되는 인증 미들웨어
//! - [`CurrentUser`]: 핸들러에서 검증된 신원을 꺼내는 추출기
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     CurrentUser(claim): CurrentUser,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", claim.email)
//! }
//! ```

mod jwt;
mod middleware;
mod password;
pub mod policy;

pub use jwt::{IdentityClaim, RejectReason, Rejection, TokenError, TokenService};
pub use middleware::{auth_gate, bearer_token, CurrentUser, X_USER_EMAIL, X_USER_ID, X_USER_ROLE};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking, PasswordError,
};
pub use policy::{Decision, Requirement};
