//! 자산/사용자 관리 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - JWT 인증과 역할 기반 접근 제어
//! - PostgreSQL 저장소와 메모리 저장소
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 비밀번호 저장, 토큰, 접근 정책, 인증 게이트
//! - [`repository`]: 사용자/자산 저장소
//! - [`validation`]: 요청 입력 검증
//! - [`upload`]: 자산 이미지 업로드 협력자
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod state;
pub mod upload;
pub mod validation;

pub use auth::{hash_password, verify_password, IdentityClaim, TokenService};
pub use error::{ApiError, ApiResult, ErrorBody};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use repository::{AssetRepository, MemoryStore, StoreError, UserRepository};
pub use routes::{create_api_router, create_app};
pub use state::AppState;
pub use upload::{ImageUploader, NoopImageUploader};

#[cfg(any(test, feature = "test-utils"))]
pub use state::{create_test_state, TEST_JWT_SECRET};
