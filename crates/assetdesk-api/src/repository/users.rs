//! 사용자 Repository (PostgreSQL).

use assetdesk_core::{NewUser, Page, PageRequest, Role, User, UserFilter, UserId, UserPatch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{like_pattern, StoreError, StoreResult, UserRepository};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, is_active, phone, address, created_at, updated_at";

/// users 테이블 레코드.
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: Option<String>,
    role: Role,
    is_active: bool,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role,
            is_active: row.is_active,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL 사용자 저장소.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 동적 WHERE 조건 추가
    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = like_pattern(search);
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR email ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR phone ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR address ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        if let Some(role) = filter.role {
            builder.push(" AND role = ");
            builder.push_bind(role);
        }
        if let Some(active) = filter.is_active {
            builder.push(" AND is_active = ");
            builder.push_bind(active);
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Page<User>> {
        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        Self::push_filter(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));
        Self::push_filter(&mut builder, filter);
        builder.push(" ORDER BY id ASC LIMIT ");
        builder.push_bind(i64::from(page.limit()));
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        let rows = builder.build_query_as::<UserRow>().fetch_all(&self.pool).await?;

        Ok(Page::new(
            rows.into_iter().map(User::from).collect(),
            total.max(0) as u64,
            page,
        ))
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, is_active, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.is_active)
        .bind(&new_user.phone)
        .bind(&new_user.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> StoreResult<User> {
        if patch.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or(StoreError::RecordNotFound);
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut set = builder.separated(", ");
            if let Some(name) = patch.name {
                set.push("name = ").push_bind_unseparated(name);
            }
            if let Some(email) = patch.email {
                set.push("email = ").push_bind_unseparated(email);
            }
            if let Some(hash) = patch.password_hash {
                set.push("password_hash = ").push_bind_unseparated(hash);
            }
            if let Some(role) = patch.role {
                set.push("role = ").push_bind_unseparated(role);
            }
            if let Some(active) = patch.is_active {
                set.push("is_active = ").push_bind_unseparated(active);
            }
            if let Some(phone) = patch.phone {
                set.push("phone = ").push_bind_unseparated(phone);
            }
            if let Some(address) = patch.address {
                set.push("address = ").push_bind_unseparated(address);
            }
            set.push("updated_at = NOW()");
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        let row = builder.build_query_as::<UserRow>().fetch_optional(&self.pool).await?;
        row.map(User::from).ok_or(StoreError::RecordNotFound)
    }

    async fn delete(&self, id: UserId) -> StoreResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from).ok_or(StoreError::RecordNotFound)
    }
}
