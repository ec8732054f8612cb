//! 자산 레코드.
//!
//! 식별 정보(이름, 유형, 시리얼, 바코드), 수명 주기 정보(상태, 위치, 점검 일정),
//! 재무 정보(구매일, 구매 비용, 공급업체, 보증 만료)와 담당 사용자(선택)를 가집니다.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{UserId, UserSummary};
use crate::error::CoreError;

pub type AssetId = i64;

/// 자산 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(
    feature = "sqlx-support",
    derive(sqlx::Type),
    sqlx(type_name = "asset_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum AssetStatus {
    #[default]
    Available,
    InUse,
    Maintenance,
    Retired,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "AVAILABLE",
            AssetStatus::InUse => "IN_USE",
            AssetStatus::Maintenance => "MAINTENANCE",
            AssetStatus::Retired => "RETIRED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(AssetStatus::Available),
            "IN_USE" => Some(AssetStatus::InUse),
            "MAINTENANCE" => Some(AssetStatus::Maintenance),
            "RETIRED" => Some(AssetStatus::Retired),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetStatus::parse(s).ok_or_else(|| CoreError::UnknownAssetStatus(s.to_string()))
    }
}

/// 저장된 자산.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub description: Option<String>,
    pub status: AssetStatus,
    pub location: Option<String>,
    pub department: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_cost: Option<Decimal>,
    pub vendor: Option<String>,
    pub warranty_expiration: Option<DateTime<Utc>>,
    pub serial_number: Option<String>,
    pub barcode: Option<String>,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub next_maintenance: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub assigned_user_id: Option<UserId>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 담당 사용자 요약 (조회 시 조인)
    pub assigned_to: Option<UserSummary>,
}

/// 새 자산 입력.
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    pub name: String,
    pub asset_type: String,
    pub description: Option<String>,
    pub status: AssetStatus,
    pub location: Option<String>,
    pub department: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_cost: Option<Decimal>,
    pub vendor: Option<String>,
    pub warranty_expiration: Option<DateTime<Utc>>,
    pub serial_number: Option<String>,
    pub barcode: Option<String>,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub next_maintenance: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub assigned_user_id: Option<UserId>,
    pub notes: Option<String>,
}

/// 자산 부분 수정 입력. `None` 필드는 변경하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub status: Option<AssetStatus>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub purchase_cost: Option<Decimal>,
    pub vendor: Option<String>,
    pub warranty_expiration: Option<DateTime<Utc>>,
    pub serial_number: Option<String>,
    pub barcode: Option<String>,
    pub last_maintenance: Option<DateTime<Utc>>,
    pub next_maintenance: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub assigned_user_id: Option<UserId>,
    pub notes: Option<String>,
}

impl AssetPatch {
    pub fn apply_to(self, asset: &mut Asset) {
        macro_rules! set {
            ($field:ident) => {
                if let Some(v) = self.$field {
                    asset.$field = v;
                }
            };
            (opt $field:ident) => {
                if let Some(v) = self.$field {
                    asset.$field = Some(v);
                }
            };
        }

        set!(name);
        set!(asset_type);
        set!(status);
        set!(opt description);
        set!(opt location);
        set!(opt department);
        set!(opt purchase_date);
        set!(opt purchase_cost);
        set!(opt vendor);
        set!(opt warranty_expiration);
        set!(opt serial_number);
        set!(opt barcode);
        set!(opt last_maintenance);
        set!(opt next_maintenance);
        set!(opt image_url);
        set!(opt assigned_user_id);
        set!(opt notes);
    }
}

/// 자산 목록 필터.
///
/// `search`는 name/serial_number/barcode 대소문자 무시 부분 일치(OR),
/// status/type/department는 정확히 일치(AND)합니다.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub search: Option<String>,
    pub status: Option<AssetStatus>,
    pub asset_type: Option<String>,
    pub department: Option<String>,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [
                Some(asset.name.as_str()),
                asset.serial_number.as_deref(),
                asset.barcode.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != asset.status) {
            return false;
        }
        if self
            .asset_type
            .as_deref()
            .is_some_and(|t| t != asset.asset_type)
        {
            return false;
        }
        if self
            .department
            .as_deref()
            .is_some_and(|d| Some(d) != asset.department.as_deref())
        {
            return false;
        }
        true
    }
}

/// 정렬 기준 열.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetSortField {
    #[default]
    Name,
    PurchaseDate,
    Cost,
}

/// 정렬 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// 자산 정렬.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetSort {
    pub field: AssetSortField,
    pub order: SortOrder,
}

impl AssetSort {
    /// `sortBy` / `sortOrder` 쿼리 값에서 정렬 생성.
    ///
    /// 알 수 없는 `sortBy`는 이름 오름차순으로 대체됩니다.
    pub fn from_query(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        let order = match sort_order {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        };
        match sort_by.unwrap_or("name") {
            "name" => Self {
                field: AssetSortField::Name,
                order,
            },
            "purchaseDate" => Self {
                field: AssetSortField::PurchaseDate,
                order,
            },
            "cost" => Self {
                field: AssetSortField::Cost,
                order,
            },
            _ => Self::default(),
        }
    }

    /// SQL `ORDER BY` 절 (NULL 위치는 PostgreSQL 기본값을 따름).
    pub fn order_by_sql(&self) -> String {
        let column = match self.field {
            AssetSortField::Name => "a.name",
            AssetSortField::PurchaseDate => "a.purchase_date",
            AssetSortField::Cost => "a.purchase_cost",
        };
        format!("{} {}, a.id ASC", column, self.order.as_sql())
    }

    /// 메모리 정렬용 비교 함수.
    ///
    /// PostgreSQL과 동일하게 NULL은 가장 큰 값으로 취급합니다.
    pub fn compare(&self, a: &Asset, b: &Asset) -> Ordering {
        fn nulls_last<T: Ord>(x: &Option<T>, y: &Option<T>) -> Ordering {
            match (x, y) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }

        let primary = match self.field {
            AssetSortField::Name => a.name.cmp(&b.name),
            AssetSortField::PurchaseDate => nulls_last(&a.purchase_date, &b.purchase_date),
            AssetSortField::Cost => nulls_last(&a.purchase_cost, &b.purchase_cost),
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
