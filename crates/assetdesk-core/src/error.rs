//! 핵심 에러 타입.
//!
//! 도메인 타입 파싱과 설정 로드에서 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러 (필수 값 누락, 잘못된 형식 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 알 수 없는 역할 문자열
    #[error("알 수 없는 역할: {0}")]
    UnknownRole(String),

    /// 알 수 없는 자산 상태 문자열
    #[error("알 수 없는 자산 상태: {0}")]
    UnknownAssetStatus(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}
