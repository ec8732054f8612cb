//! 설정 관리.
//!
//! 설정은 다음 순서로 병합됩니다 (뒤가 우선):
//!
//! 1. 내장 기본값
//! 2. `config/default.toml` (선택)
//! 3. `ASSETDESK_<SECTION>__<KEY>` 환경 변수 (예: `ASSETDESK_SERVER__PORT=8080`)
//! 4. 레거시 환경 변수 `JWT_SECRET`, `DATABASE_URL`, `API_HOST`, `API_PORT`

use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// 개발 환경에서만 사용되는 서명 키.
pub const DEV_FALLBACK_JWT_SECRET: &str = "assetdesk-dev-secret-change-in-production";

/// 실행 환경.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Production,
}

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 실행 환경
    pub environment: RuntimeEnvironment,
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용 CORS origin (쉼표 구분, 비어 있으면 모두 허용)
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 30,
            cors_origins: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL. 없으면 메모리 저장소를 사용합니다.
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
    /// 시작 시 마이그레이션 실행 여부
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 10,
            run_migrations: true,
        }
    }
}

/// 인증 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 토큰 서명 키 (HS256)
    pub jwt_secret: Option<String>,
    /// 토큰 유효 시간 (시간)
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24,
        }
    }
}

impl AuthConfig {
    /// 서명 키 결정.
    ///
    /// 운영 환경에서 키가 없으면 에러를 반환합니다.
    /// 개발 환경에서는 내장 기본값을 경고와 함께 사용합니다.
    pub fn signing_secret(&self, env: RuntimeEnvironment) -> CoreResult<SecretString> {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(SecretString::from(secret.to_string())),
            _ if env == RuntimeEnvironment::Production => Err(CoreError::Config(
                "JWT 서명 키가 설정되지 않았습니다 (JWT_SECRET 또는 ASSETDESK_AUTH__JWT_SECRET)"
                    .to_string(),
            )),
            _ => {
                tracing::warn!(
                    "JWT_SECRET not set, using built-in development key (INSECURE, development only)"
                );
                Ok(SecretString::from(DEV_FALLBACK_JWT_SECRET.to_string()))
            }
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "assetdesk_api=info,assetdesk_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일은 없어도 됩니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let legacy_port = std::env::var("API_PORT")
            .ok()
            .map(|p| {
                p.parse::<u16>()
                    .map_err(|_| CoreError::Config(format!("API_PORT가 유효하지 않습니다: {p}")))
            })
            .transpose()?;

        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("ASSETDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("server.host", std::env::var("API_HOST").ok())?
            .set_override_option("server.port", legacy_port.map(i64::from))?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/default.toml")
    }

    fn validate(&self) -> CoreResult<()> {
        if self.auth.token_ttl_hours <= 0 {
            return Err(CoreError::Config(format!(
                "auth.token_ttl_hours는 양수여야 합니다: {}",
                self.auth.token_ttl_hours
            )));
        }
        if self.database.max_connections == 0 {
            return Err(CoreError::Config(
                "database.max_connections는 1 이상이어야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.environment, RuntimeEnvironment::Development);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_signing_secret_required_in_production() {
        let auth = AuthConfig::default();
        assert!(matches!(
            auth.signing_secret(RuntimeEnvironment::Production),
            Err(CoreError::Config(_))
        ));

        let blank = AuthConfig {
            jwt_secret: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.signing_secret(RuntimeEnvironment::Production).is_err());
    }

    #[test]
    fn test_signing_secret_development_fallback() {
        let secret = AuthConfig::default()
            .signing_secret(RuntimeEnvironment::Development)
            .unwrap();
        assert_eq!(secret.expose_secret(), DEV_FALLBACK_JWT_SECRET);
    }

    #[test]
    fn test_signing_secret_configured() {
        let auth = AuthConfig {
            jwt_secret: Some("configured-secret".to_string()),
            ..Default::default()
        };
        let secret = auth.signing_secret(RuntimeEnvironment::Production).unwrap();
        assert_eq!(secret.expose_secret(), "configured-secret");
    }

    #[test]
    fn test_validate_rejects_non_positive_ttl() {
        let mut config = AppConfig::default();
        config.auth.token_ttl_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_deserialization() {
        let env: RuntimeEnvironment = serde_json::from_str("\"production\"").unwrap();
        assert_eq!(env, RuntimeEnvironment::Production);
    }
}
