//! 자산 Repository (PostgreSQL).
//!
//! 모든 조회/변경 결과는 `users`와 LEFT JOIN하여 담당자 요약을 함께 반환합니다.

use assetdesk_core::{
    Asset, AssetFilter, AssetId, AssetPatch, AssetSort, AssetStatus, NewAsset, Page, PageRequest,
    UserSummary,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{like_pattern, AssetRepository, StoreError, StoreResult};

const ASSET_SELECT: &str = r#"
    SELECT
        a.id, a.name, a.asset_type, a.description, a.status, a.location, a.department,
        a.purchase_date, a.purchase_cost, a.vendor, a.warranty_expiration,
        a.serial_number, a.barcode, a.last_maintenance, a.next_maintenance,
        a.image_url, a.assigned_user_id, a.notes, a.created_at, a.updated_at,
        u.name AS assigned_user_name,
        u.email AS assigned_user_email
"#;

/// assets + users 조인 레코드.
#[derive(Debug, Clone, FromRow)]
struct AssetRow {
    id: i64,
    name: String,
    asset_type: String,
    description: Option<String>,
    status: AssetStatus,
    location: Option<String>,
    department: Option<String>,
    purchase_date: Option<DateTime<Utc>>,
    purchase_cost: Option<Decimal>,
    vendor: Option<String>,
    warranty_expiration: Option<DateTime<Utc>>,
    serial_number: Option<String>,
    barcode: Option<String>,
    last_maintenance: Option<DateTime<Utc>>,
    next_maintenance: Option<DateTime<Utc>>,
    image_url: Option<String>,
    assigned_user_id: Option<i64>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assigned_user_name: Option<String>,
    assigned_user_email: Option<String>,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        let assigned_to = match (row.assigned_user_id, row.assigned_user_name, row.assigned_user_email)
        {
            (Some(id), Some(name), Some(email)) => Some(UserSummary { id, name, email }),
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name,
            asset_type: row.asset_type,
            description: row.description,
            status: row.status,
            location: row.location,
            department: row.department,
            purchase_date: row.purchase_date,
            purchase_cost: row.purchase_cost,
            vendor: row.vendor,
            warranty_expiration: row.warranty_expiration,
            serial_number: row.serial_number,
            barcode: row.barcode,
            last_maintenance: row.last_maintenance,
            next_maintenance: row.next_maintenance,
            image_url: row.image_url,
            assigned_user_id: row.assigned_user_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            assigned_to,
        }
    }
}

/// PostgreSQL 자산 저장소.
#[derive(Debug, Clone)]
pub struct PgAssetRepository {
    pool: PgPool,
}

impl PgAssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 동적 WHERE 조건 추가
    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &AssetFilter) {
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            builder.push(" AND (a.name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR a.serial_number ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR a.barcode ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        if let Some(status) = filter.status {
            builder.push(" AND a.status = ");
            builder.push_bind(status);
        }
        if let Some(asset_type) = filter.asset_type.as_deref().filter(|s| !s.is_empty()) {
            builder.push(" AND a.asset_type = ");
            builder.push_bind(asset_type.to_string());
        }
        if let Some(department) = filter.department.as_deref().filter(|s| !s.is_empty()) {
            builder.push(" AND a.department = ");
            builder.push_bind(department.to_string());
        }
    }
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    async fn find_by_id(&self, id: AssetId) -> StoreResult<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "{ASSET_SELECT} FROM assets a LEFT JOIN users u ON u.id = a.assigned_user_id WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Asset::from))
    }

    async fn list(
        &self,
        filter: &AssetFilter,
        sort: AssetSort,
        page: PageRequest,
    ) -> StoreResult<Page<Asset>> {
        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM assets a WHERE 1 = 1");
        Self::push_filter(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "{ASSET_SELECT} FROM assets a LEFT JOIN users u ON u.id = a.assigned_user_id WHERE 1 = 1"
        ));
        Self::push_filter(&mut builder, filter);
        builder.push(" ORDER BY ");
        builder.push(sort.order_by_sql());
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(page.limit()));
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder.build_query_as::<AssetRow>().fetch_all(&self.pool).await?;

        Ok(Page::new(
            rows.into_iter().map(Asset::from).collect(),
            total.max(0) as u64,
            page,
        ))
    }

    async fn create(&self, new_asset: NewAsset) -> StoreResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            r#"
            WITH a AS (
                INSERT INTO assets (
                    name, asset_type, description, status, location, department,
                    purchase_date, purchase_cost, vendor, warranty_expiration,
                    serial_number, barcode, last_maintenance, next_maintenance,
                    image_url, assigned_user_id, notes
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                RETURNING *
            )
            {ASSET_SELECT} FROM a LEFT JOIN users u ON u.id = a.assigned_user_id
            "#
        ))
        .bind(&new_asset.name)
        .bind(&new_asset.asset_type)
        .bind(&new_asset.description)
        .bind(new_asset.status)
        .bind(&new_asset.location)
        .bind(&new_asset.department)
        .bind(new_asset.purchase_date)
        .bind(new_asset.purchase_cost)
        .bind(&new_asset.vendor)
        .bind(new_asset.warranty_expiration)
        .bind(&new_asset.serial_number)
        .bind(&new_asset.barcode)
        .bind(new_asset.last_maintenance)
        .bind(new_asset.next_maintenance)
        .bind(&new_asset.image_url)
        .bind(new_asset.assigned_user_id)
        .bind(&new_asset.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(&self, id: AssetId, patch: AssetPatch) -> StoreResult<Asset> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("WITH a AS (UPDATE assets SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(v) = patch.name {
                set.push("name = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.asset_type {
                set.push("asset_type = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.description {
                set.push("description = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.status {
                set.push("status = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.location {
                set.push("location = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.department {
                set.push("department = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.purchase_date {
                set.push("purchase_date = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.purchase_cost {
                set.push("purchase_cost = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.vendor {
                set.push("vendor = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.warranty_expiration {
                set.push("warranty_expiration = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.serial_number {
                set.push("serial_number = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.barcode {
                set.push("barcode = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.last_maintenance {
                set.push("last_maintenance = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.next_maintenance {
                set.push("next_maintenance = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.image_url {
                set.push("image_url = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.assigned_user_id {
                set.push("assigned_user_id = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.notes {
                set.push("notes = ").push_bind_unseparated(v);
            }
            set.push("updated_at = NOW()");
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(
            " RETURNING *) {ASSET_SELECT} FROM a LEFT JOIN users u ON u.id = a.assigned_user_id"
        ));

        let row = builder.build_query_as::<AssetRow>().fetch_optional(&self.pool).await?;
        row.map(Asset::from).ok_or(StoreError::RecordNotFound)
    }

    async fn delete(&self, id: AssetId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RecordNotFound);
        }
        Ok(())
    }
}
