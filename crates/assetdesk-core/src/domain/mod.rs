//! 도메인 모델.

mod asset;
mod pagination;
mod role;
mod user;

pub use asset::{
    Asset, AssetFilter, AssetId, AssetPatch, AssetSort, AssetSortField, AssetStatus, NewAsset,
    SortOrder,
};
pub use pagination::{total_pages, Page, PageRequest};
pub use role::Role;
pub use user::{NewUser, User, UserFilter, UserId, UserPatch, UserSummary};
