//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.
//! 시작 이후 변경되는 필드는 없습니다.

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenService;
use crate::repository::{
    AssetRepository, MemoryStore, PgAssetRepository, PgUserRepository, UserRepository,
};
use crate::upload::{ImageUploader, NoopImageUploader};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 사용자 저장소
    pub users: Arc<dyn UserRepository>,

    /// 자산 저장소
    pub assets: Arc<dyn AssetRepository>,

    /// 토큰 발급/검증 서비스
    pub tokens: TokenService,

    /// 이미지 업로드 협력자
    pub uploader: Arc<dyn ImageUploader>,

    /// 버전 정보
    pub version: String,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// 데이터베이스 연결 풀 (메모리 저장소 사용 시 None)
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// 저장소와 토큰 서비스로 상태를 생성합니다.
    pub fn new(
        users: Arc<dyn UserRepository>,
        assets: Arc<dyn AssetRepository>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            assets,
            tokens,
            uploader: Arc::new(NoopImageUploader),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
            db_pool: None,
        }
    }

    /// PostgreSQL 저장소로 상태를 생성합니다.
    pub fn with_postgres(pool: PgPool, tokens: TokenService) -> Self {
        let mut state = Self::new(
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgAssetRepository::new(pool.clone())),
            tokens,
        );
        state.db_pool = Some(pool);
        state
    }

    /// 메모리 저장소로 상태를 생성합니다.
    ///
    /// 같은 `MemoryStore`가 두 저장소 역할을 모두 맡으므로 외래 키 검사가 동작합니다.
    pub fn with_memory_store(store: Arc<MemoryStore>, tokens: TokenService) -> Self {
        Self::new(store.clone(), store, tokens)
    }

    /// 업로드 협력자 교체.
    pub fn with_uploader(mut self, uploader: Arc<dyn ImageUploader>) -> Self {
        self.uploader = uploader;
        self
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// 데이터베이스 연결 여부.
    pub fn has_db(&self) -> bool {
        self.db_pool.is_some()
    }
}

/// 테스트용 서명 키.
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

/// 테스트용 AppState 생성 헬퍼.
///
/// 메모리 저장소와 고정 서명 키를 사용합니다. 저장소 핸들도 함께 반환하여
/// 호출 횟수를 검사할 수 있게 합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> (AppState, Arc<MemoryStore>) {
    use chrono::Duration;
    use secrecy::SecretString;

    let store = Arc::new(MemoryStore::new());
    let tokens = TokenService::new(
        &SecretString::from(TEST_JWT_SECRET.to_string()),
        Duration::hours(TokenService::DEFAULT_VALIDITY_HOURS),
    );
    (AppState::with_memory_store(store.clone(), tokens), store)
}
