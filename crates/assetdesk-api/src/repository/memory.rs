//! 메모리 저장소.
//!
//! 데이터베이스 URL이 없을 때와 테스트에서 사용합니다. PostgreSQL 스키마와 같은 제약을 따릅니다:
//!
//! - `users.email` 고유
//! - `assets.serial_number`, `assets.barcode` 고유 (NULL 제외)
//! - `assets.assigned_user_id` → `users.id` 외래 키 (사용자 삭제 제한)
//!
//! 호출 횟수를 기록하므로 검증 단계에서 거부된 요청이 저장소에 도달하지 않았는지 확인할 수 있습니다.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use assetdesk_core::{
    Asset, AssetFilter, AssetId, AssetPatch, AssetSort, NewAsset, NewUser, Page, PageRequest,
    User, UserFilter, UserId, UserPatch,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AssetRepository, StoreError, StoreResult, UserRepository};

const USERS_EMAIL_KEY: &str = "users_email_key";
const ASSETS_SERIAL_KEY: &str = "assets_serial_number_key";
const ASSETS_BARCODE_KEY: &str = "assets_barcode_key";
const ASSETS_USER_FKEY: &str = "assets_assigned_user_id_fkey";

/// 저장소 호출 횟수 스냅샷.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub users: u64,
    pub assets: u64,
}

impl StoreCalls {
    pub fn total(&self) -> u64 {
        self.users + self.assets
    }
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    assets: BTreeMap<AssetId, Asset>,
    next_user_id: UserId,
    next_asset_id: AssetId,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn check_asset_constraints(
        &self,
        serial_number: Option<&str>,
        barcode: Option<&str>,
        assigned_user_id: Option<UserId>,
        except: Option<AssetId>,
    ) -> StoreResult<()> {
        let others = || self.assets.values().filter(move |a| Some(a.id) != except);

        if let Some(serial) = serial_number {
            if others().any(|a| a.serial_number.as_deref() == Some(serial)) {
                return Err(StoreError::unique(ASSETS_SERIAL_KEY));
            }
        }
        if let Some(barcode) = barcode {
            if others().any(|a| a.barcode.as_deref() == Some(barcode)) {
                return Err(StoreError::unique(ASSETS_BARCODE_KEY));
            }
        }
        if let Some(user_id) = assigned_user_id {
            if !self.users.contains_key(&user_id) {
                return Err(StoreError::foreign_key(ASSETS_USER_FKEY));
            }
        }
        Ok(())
    }

    /// 담당자 요약을 채운 자산 사본.
    fn hydrate(&self, asset: &Asset) -> Asset {
        let mut asset = asset.clone();
        asset.assigned_to = asset
            .assigned_user_id
            .and_then(|id| self.users.get(&id))
            .map(User::summary);
        asset
    }
}

/// 프로세스 내 메모리 저장소.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    user_calls: AtomicU64,
    asset_calls: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지의 호출 횟수.
    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            users: self.user_calls.load(Ordering::SeqCst),
            assets: self.asset_calls.load(Ordering::SeqCst),
        }
    }

    /// 모든 호출을 `StoreError::Unavailable`로 실패시킵니다.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn enter_users(&self) -> StoreResult<()> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()
    }

    fn enter_assets(&self) -> StoreResult<()> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let rows = items
        .into_iter()
        .skip(offset)
        .take(page.limit() as usize)
        .collect();
    Page::new(rows, total, page)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        self.enter_users()?;
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.enter_users()?;
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Page<User>> {
        self.enter_users()?;
        let tables = self.tables.read().await;
        let matched: Vec<User> = tables
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        Ok(paginate(matched, page))
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        self.enter_users()?;
        let mut tables = self.tables.write().await;
        if tables.email_taken(&new_user.email, None) {
            return Err(StoreError::unique(USERS_EMAIL_KEY));
        }

        tables.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: tables.next_user_id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            is_active: new_user.is_active,
            phone: new_user.phone,
            address: new_user.address,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: UserId, patch: UserPatch) -> StoreResult<User> {
        self.enter_users()?;
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(StoreError::RecordNotFound);
        }
        if let Some(email) = patch.email.as_deref() {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::unique(USERS_EMAIL_KEY));
            }
        }

        let user = tables.users.get_mut(&id).ok_or(StoreError::RecordNotFound)?;
        patch.apply_to(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> StoreResult<User> {
        self.enter_users()?;
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&id) {
            return Err(StoreError::RecordNotFound);
        }
        if tables
            .assets
            .values()
            .any(|a| a.assigned_user_id == Some(id))
        {
            return Err(StoreError::foreign_key(ASSETS_USER_FKEY));
        }
        tables.users.remove(&id).ok_or(StoreError::RecordNotFound)
    }
}

#[async_trait]
impl AssetRepository for MemoryStore {
    async fn find_by_id(&self, id: AssetId) -> StoreResult<Option<Asset>> {
        self.enter_assets()?;
        let tables = self.tables.read().await;
        Ok(tables.assets.get(&id).map(|a| tables.hydrate(a)))
    }

    async fn list(
        &self,
        filter: &AssetFilter,
        sort: AssetSort,
        page: PageRequest,
    ) -> StoreResult<Page<Asset>> {
        self.enter_assets()?;
        let tables = self.tables.read().await;
        let mut matched: Vec<Asset> = tables
            .assets
            .values()
            .filter(|a| filter.matches(a))
            .map(|a| tables.hydrate(a))
            .collect();
        matched.sort_by(|a, b| sort.compare(a, b));
        Ok(paginate(matched, page))
    }

    async fn create(&self, new_asset: NewAsset) -> StoreResult<Asset> {
        self.enter_assets()?;
        let mut tables = self.tables.write().await;
        tables.check_asset_constraints(
            new_asset.serial_number.as_deref(),
            new_asset.barcode.as_deref(),
            new_asset.assigned_user_id,
            None,
        )?;

        tables.next_asset_id += 1;
        let now = Utc::now();
        let asset = Asset {
            id: tables.next_asset_id,
            name: new_asset.name,
            asset_type: new_asset.asset_type,
            description: new_asset.description,
            status: new_asset.status,
            location: new_asset.location,
            department: new_asset.department,
            purchase_date: new_asset.purchase_date,
            purchase_cost: new_asset.purchase_cost,
            vendor: new_asset.vendor,
            warranty_expiration: new_asset.warranty_expiration,
            serial_number: new_asset.serial_number,
            barcode: new_asset.barcode,
            last_maintenance: new_asset.last_maintenance,
            next_maintenance: new_asset.next_maintenance,
            image_url: new_asset.image_url,
            assigned_user_id: new_asset.assigned_user_id,
            notes: new_asset.notes,
            created_at: now,
            updated_at: now,
            assigned_to: None,
        };
        let hydrated = tables.hydrate(&asset);
        tables.assets.insert(asset.id, asset);
        Ok(hydrated)
    }

    async fn update(&self, id: AssetId, patch: AssetPatch) -> StoreResult<Asset> {
        self.enter_assets()?;
        let mut tables = self.tables.write().await;
        let mut updated = tables
            .assets
            .get(&id)
            .cloned()
            .ok_or(StoreError::RecordNotFound)?;
        patch.apply_to(&mut updated);
        tables.check_asset_constraints(
            updated.serial_number.as_deref(),
            updated.barcode.as_deref(),
            updated.assigned_user_id,
            Some(id),
        )?;

        updated.updated_at = Utc::now();
        let hydrated = tables.hydrate(&updated);
        tables.assets.insert(id, updated);
        Ok(hydrated)
    }

    async fn delete(&self, id: AssetId) -> StoreResult<()> {
        self.enter_assets()?;
        let mut tables = self.tables.write().await;
        tables
            .assets
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::RecordNotFound)
    }
}
