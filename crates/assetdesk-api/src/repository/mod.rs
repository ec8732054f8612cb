//! 저장소 레이어.
//!
//! 핸들러는 `Arc<dyn UserRepository>` / `Arc<dyn AssetRepository>`만 알고,
//! 구현은 PostgreSQL(`Pg*Repository`) 또는 메모리(`MemoryStore`) 중 하나입니다.
//!
//! 모든 구현은 `sqlx::Error`를 포함한 내부 에러를 [`StoreError`]로 변환합니다.

pub mod assets;
pub mod memory;
pub mod users;

use assetdesk_core::{
    Asset, AssetFilter, AssetId, AssetPatch, AssetSort, NewAsset, NewUser, Page, PageRequest,
    User, UserFilter, UserId, UserPatch,
};
use async_trait::async_trait;
use thiserror::Error;

pub use assets::PgAssetRepository;
pub use memory::{MemoryStore, StoreCalls};
pub use users::PgUserRepository;

/// PostgreSQL SQLSTATE: unique_violation
pub const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL SQLSTATE: foreign_key_violation
pub const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 고유 제약 조건 위반
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// 외래 키 제약 조건 위반
    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// 대상 레코드 없음
    #[error("Record not found")]
    RecordNotFound,

    /// 연결 풀 타임아웃 또는 종료
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// 그 외 데이터베이스 에러
    #[error("Database error: {source}")]
    Other {
        code: Option<String>,
        #[source]
        source: sqlx::Error,
    },
}

impl StoreError {
    /// SQLSTATE 코드 (있는 경우).
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::UniqueViolation { .. } => Some(SQLSTATE_UNIQUE_VIOLATION),
            StoreError::ForeignKeyViolation { .. } => Some(SQLSTATE_FOREIGN_KEY_VIOLATION),
            StoreError::Other { code, .. } => code.as_deref(),
            StoreError::RecordNotFound | StoreError::Unavailable(_) => None,
        }
    }

    pub fn unique(constraint: impl Into<String>) -> Self {
        StoreError::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    pub fn foreign_key(constraint: impl Into<String>) -> Self {
        StoreError::ForeignKeyViolation {
            constraint: constraint.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::RecordNotFound,
            sqlx::Error::PoolTimedOut => StoreError::Unavailable("pool timed out".to_string()),
            sqlx::Error::PoolClosed => StoreError::Unavailable("pool closed".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned());
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                if db_err.is_unique_violation() {
                    StoreError::UniqueViolation { constraint }
                } else if db_err.is_foreign_key_violation() {
                    StoreError::ForeignKeyViolation { constraint }
                } else {
                    StoreError::Other {
                        code,
                        source: sqlx::Error::Database(db_err),
                    }
                }
            }
            other => StoreError::Other {
                code: None,
                source: other,
            },
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// 사용자 저장소.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>>;

    /// 이메일로 조회. 호출자가 소문자로 정규화한 값을 전달합니다.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// 필터 조건의 한 페이지 (id 오름차순).
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Page<User>>;

    async fn create(&self, new_user: NewUser) -> StoreResult<User>;

    /// 부분 수정. 대상이 없으면 `RecordNotFound`.
    async fn update(&self, id: UserId, patch: UserPatch) -> StoreResult<User>;

    /// 삭제 후 삭제된 레코드 반환. 대상이 없으면 `RecordNotFound`.
    async fn delete(&self, id: UserId) -> StoreResult<User>;
}

/// 자산 저장소.
///
/// 조회 결과에는 담당 사용자 요약(`assigned_to`)이 포함됩니다.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn find_by_id(&self, id: AssetId) -> StoreResult<Option<Asset>>;

    async fn list(
        &self,
        filter: &AssetFilter,
        sort: AssetSort,
        page: PageRequest,
    ) -> StoreResult<Page<Asset>>;

    async fn create(&self, new_asset: NewAsset) -> StoreResult<Asset>;

    async fn update(&self, id: AssetId, patch: AssetPatch) -> StoreResult<Asset>;

    async fn delete(&self, id: AssetId) -> StoreResult<()>;
}

/// `ILIKE` 패턴용 이스케이프 (`%`, `_`, `\`).
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("lap"), "%lap%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_store_error_codes() {
        assert_eq!(StoreError::unique("users_email_key").code(), Some("23505"));
        assert_eq!(StoreError::foreign_key("assets_assigned_user_id_fkey").code(), Some("23503"));
        assert_eq!(StoreError::RecordNotFound.code(), None);
    }

    #[test]
    fn test_from_sqlx_error() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::RecordNotFound
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::Protocol("bad".to_string())),
            StoreError::Other { code: None, .. }
        ));
    }
}
