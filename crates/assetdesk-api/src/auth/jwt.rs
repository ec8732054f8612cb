//! JWT 토큰 처리.
//!
//! 신원 클레임을 HS256으로 서명한 토큰으로 발급하고 검증합니다.
//! 서명 키는 시작 시 한 번 로드되며 이후 읽기 전용입니다.
//!
//! 폐기(revocation) 목록은 없습니다. 발급된 토큰은 만료 시각까지 유효합니다.

use std::collections::HashSet;

use assetdesk_core::{Role, UserId};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// 검증된 신원 클레임.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    /// 사용자 ID
    pub subject_id: UserId,
    /// 이메일
    pub email: String,
    /// 역할
    pub role: Role,
}

impl IdentityClaim {
    pub fn new(subject_id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            subject_id,
            email: email.into(),
            role,
        }
    }
}

/// 발급 시 토큰 페이로드.
#[derive(Debug, Serialize)]
struct TokenPayload<'a> {
    #[serde(rename = "userId")]
    user_id: UserId,
    email: &'a str,
    role: Role,
    iat: i64,
    exp: i64,
}

/// 검증 시 토큰 페이로드.
///
/// 필드 누락과 타입 불일치를 서명 검증 이후에 판정하기 위해 모두 느슨하게 받습니다.
#[derive(Debug, Deserialize)]
struct RawPayload {
    #[serde(rename = "userId", default)]
    user_id: Option<serde_json::Value>,
    #[serde(default)]
    email: Option<serde_json::Value>,
    #[serde(default)]
    role: Option<serde_json::Value>,
    #[serde(default)]
    exp: Option<serde_json::Value>,
}

/// 토큰 거부 사유.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// 구조 또는 인코딩 오류
    Malformed,
    /// 서명 불일치
    BadSignature,
    /// 필수 클레임 누락 또는 잘못된 값
    IncompleteClaim,
    /// 만료됨
    Expired,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Malformed => "malformed",
            RejectReason::BadSignature => "bad_signature",
            RejectReason::IncompleteClaim => "incomplete_claim",
            RejectReason::Expired => "expired",
        }
    }
}

/// 토큰 검증 실패.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("토큰 거부: {}", reason.as_str())]
pub struct Rejection {
    pub reason: RejectReason,
}

impl From<RejectReason> for Rejection {
    fn from(reason: RejectReason) -> Self {
        Self { reason }
    }
}

/// 토큰 발급 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),
    #[error("잘못된 클레임: {0}")]
    InvalidClaim(&'static str),
}

/// 토큰 발급/검증 서비스.
///
/// 변경 가능한 상태가 없으므로 `Clone`하여 여러 태스크에서 공유합니다.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// 기본 유효 시간 (24시간).
    pub const DEFAULT_VALIDITY_HOURS: i64 = 24;

    /// 새 토큰 서비스 생성.
    ///
    /// # Arguments
    ///
    /// * `secret` - HS256 서명 키
    /// * `validity` - 발급 토큰의 유효 시간
    pub fn new(secret: &SecretString, validity: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validity,
        }
    }

    /// 유효 시간.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// 현재 시각 기준으로 토큰 발급.
    pub fn issue(&self, claim: &IdentityClaim) -> Result<String, TokenError> {
        self.issue_at(claim, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰 발급. `exp = now + validity`.
    pub fn issue_at(&self, claim: &IdentityClaim, now: DateTime<Utc>) -> Result<String, TokenError> {
        if claim.subject_id <= 0 {
            return Err(TokenError::InvalidClaim("userId"));
        }
        if claim.email.trim().is_empty() {
            return Err(TokenError::InvalidClaim("email"));
        }

        let payload = TokenPayload {
            user_id: claim.subject_id,
            email: &claim.email,
            role: claim.role,
            iat: now.timestamp(),
            exp: (now + self.validity).timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &self.encoding_key,
        )?)
    }

    /// 현재 시각 기준으로 토큰 검증.
    pub fn verify(&self, token: &str) -> Result<IdentityClaim, Rejection> {
        self.verify_at(token, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰 검증.
    ///
    /// 검사 순서: 구조/인코딩 → 서명 → 클레임 완전성 → 만료.
    /// `exp` 시각부터는 만료로 처리합니다 (유예 없음).
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityClaim, Rejection> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<RawPayload>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => RejectReason::BadSignature,
                _ => RejectReason::Malformed,
            }
        })?;
        let raw = data.claims;

        let subject_id = raw
            .user_id
            .as_ref()
            .and_then(parse_user_id)
            .ok_or(RejectReason::IncompleteClaim)?;
        let email = raw
            .email
            .as_ref()
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or(RejectReason::IncompleteClaim)?
            .to_string();
        let role = raw
            .role
            .as_ref()
            .and_then(|v| v.as_str())
            .and_then(Role::parse)
            .ok_or(RejectReason::IncompleteClaim)?;
        let exp = raw
            .exp
            .as_ref()
            .and_then(|v| v.as_i64())
            .ok_or(RejectReason::IncompleteClaim)?;

        if now.timestamp() >= exp {
            return Err(RejectReason::Expired.into());
        }

        Ok(IdentityClaim {
            subject_id,
            email,
            role,
        })
    }
}

/// 정수 또는 숫자 문자열 형태의 `userId`. 0 이하는 거부합니다.
fn parse_user_id(value: &serde_json::Value) -> Option<UserId> {
    let id = match value {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}
