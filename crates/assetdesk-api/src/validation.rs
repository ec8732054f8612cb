//! 요청 입력 검증.
//!
//! 규칙은 순서대로 평가되며 첫 번째 위반에서 중단합니다 (필수 여부 → 형식).
//! 모든 검증은 저장소 호출 이전에 끝납니다.

use assetdesk_core::{AssetStatus, PageRequest, Role};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ApiError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[\d\s-]{8,}$").expect("phone regex")
});

pub const MSG_INVALID_PAGINATION: &str = "Invalid pagination parameters";
pub const MSG_INVALID_EMAIL: &str = "Invalid email format";
pub const MSG_INVALID_PHONE: &str = "Invalid phone number format";
pub const MSG_INVALID_ROLE: &str = "Invalid role specified";
pub const MSG_INVALID_STATUS: &str = "Invalid asset status";
pub const MSG_INVALID_COST: &str = "Invalid purchase cost";
pub const MSG_INVALID_ASSIGNED_USER: &str = "Invalid assigned user ID";

/// 위반된 규칙 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    Phone,
    Role,
    AssetStatus,
    Integer,
    Decimal,
    Date,
    Pagination,
}

/// 검증 위반.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Violation {
    pub field: &'static str,
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    pub fn new(field: &'static str, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            field,
            rule,
            message: message.into(),
        }
    }
}

impl From<Violation> for ApiError {
    fn from(v: Violation) -> Self {
        ApiError::Validation(v.message)
    }
}

pub type Checked<T> = Result<T, Violation>;

/// 공백 제거 후 비어 있지 않은 값.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// 필수 텍스트. 공백을 제거한 값을 반환합니다.
pub fn required<'a>(field: &'static str, value: Option<&'a str>, message: &str) -> Checked<&'a str> {
    non_blank(value).ok_or_else(|| Violation::new(field, Rule::Required, message))
}

/// 이메일 형식.
pub fn email(field: &'static str, value: &str) -> Checked<()> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(Violation::new(field, Rule::Email, MSG_INVALID_EMAIL))
    }
}

/// 전화번호 형식 (`+`로 시작 가능, 숫자/공백/하이픈 8자 이상).
pub fn phone(field: &'static str, value: &str) -> Checked<()> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(Violation::new(field, Rule::Phone, MSG_INVALID_PHONE))
    }
}

/// 역할 (`USER` | `ADMIN`).
pub fn role(field: &'static str, value: &str) -> Checked<Role> {
    Role::parse(value).ok_or_else(|| Violation::new(field, Rule::Role, MSG_INVALID_ROLE))
}

/// 자산 상태 (`AVAILABLE` | `IN_USE` | `MAINTENANCE` | `RETIRED`).
pub fn asset_status(field: &'static str, value: &str) -> Checked<AssetStatus> {
    AssetStatus::parse(value)
        .ok_or_else(|| Violation::new(field, Rule::AssetStatus, MSG_INVALID_STATUS))
}

/// 정수 식별자.
pub fn integer_id(field: &'static str, value: &str, message: &str) -> Checked<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| Violation::new(field, Rule::Integer, message))
}

/// 10진수 금액.
pub fn decimal(field: &'static str, value: &str, message: &str) -> Checked<Decimal> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| Violation::new(field, Rule::Decimal, message))
}

/// 날짜 (RFC 3339 또는 `YYYY-MM-DD`, 후자는 UTC 자정).
pub fn date(field: &'static str, value: &str) -> Checked<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Violation::new(field, Rule::Date, format!("Invalid date for {field}")))
}

/// 페이지네이션 쿼리 파라미터.
///
/// 없는 값은 기본값을 사용하고, 숫자가 아니거나 1 미만이면 위반입니다.
pub fn page_request(
    page: Option<&str>,
    limit: Option<&str>,
    default_limit: i64,
) -> Checked<PageRequest> {
    fn parse(raw: Option<&str>, default: i64) -> Option<i64> {
        match raw {
            None => Some(default),
            Some(s) => s.trim().parse::<i64>().ok(),
        }
    }

    let invalid = || Violation::new("page", Rule::Pagination, MSG_INVALID_PAGINATION);
    let page = parse(page, 1).ok_or_else(invalid)?;
    let limit = parse(limit, default_limit).ok_or_else(invalid)?;
    PageRequest::new(page, limit).map_err(|_| invalid())
}
