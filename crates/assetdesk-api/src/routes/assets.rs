//! 자산 관리 endpoint.
//!
//! 조회는 인증된 모든 역할, 변경(POST/PUT/DELETE)은 ADMIN만 가능합니다.
//! 역할 검사는 인증 게이트에서 끝나므로 핸들러는 검증과 저장소 호출만 담당합니다.
//!
//! # 엔드포인트
//!
//! - `GET /api/assets` - 자산 목록 (검색/필터/정렬/페이지네이션)
//! - `POST /api/assets` - 자산 생성 (multipart form)
//! - `PUT /api/assets?id=N` - 자산 부분 수정 (multipart form)
//! - `DELETE /api/assets?id=N` - 자산 삭제

use std::collections::HashMap;
use std::sync::Arc;

use assetdesk_core::{
    Asset, AssetFilter, AssetId, AssetPatch, AssetSort, AssetStatus, NewAsset, UserId,
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::CurrentUser;
use crate::error::{internal_store_error, ApiError, ApiResult};
use crate::repository::StoreError;
use crate::state::AppState;
use crate::upload::ImageFile;
use crate::validation::{self, non_blank, required, MSG_INVALID_ASSIGNED_USER, MSG_INVALID_COST};

const DEFAULT_LIMIT: i64 = 10;

const MSG_NAME_REQUIRED: &str = "Asset name is required";
const MSG_TYPE_REQUIRED: &str = "Asset type is required";
const MSG_ID_REQUIRED: &str = "Asset ID is required";
const MSG_INVALID_ID: &str = "Invalid asset ID";
const MSG_NOT_FOUND: &str = "Asset not found";
const MSG_INVALID_FORM: &str = "Invalid form data";
const MSG_DUPLICATE: &str = "Asset with this serial number or barcode already exists";
const MSG_INVALID_REFERENCE: &str = "Invalid reference to related record";
const MSG_REFERENCE_MISSING: &str = "Referenced record not found";
const MSG_DELETE_REFERENCED: &str = "Cannot delete asset due to existing references";
const MSG_FETCH_FAILED: &str = "Error fetching assets";
const MSG_STORE_FAILED: &str = "Database operation failed";

const IMAGE_FIELD: &str = "image";

// ==================== 요청/응답 ====================

/// 목록 쿼리.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    pub department: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// `?id=N` 쿼리.
#[derive(Debug, Default, Deserialize)]
pub struct AssetIdQuery {
    pub id: Option<String>,
}

/// 목록 응답.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetListResponse {
    pub data: Vec<Asset>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

/// 삭제 응답.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ==================== multipart form ====================

/// 수신한 multipart form. 텍스트 필드와 선택적 이미지 파일.
#[derive(Debug, Default)]
struct AssetForm {
    fields: HashMap<String, String>,
    image: Option<ImageFile>,
}

impl AssetForm {
    async fn read(form: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = form.map_err(|e| {
            debug!(error = %e, "multipart rejected");
            ApiError::validation(MSG_INVALID_FORM)
        })?;
        let invalid = |e: axum::extract::multipart::MultipartError| {
            debug!(error = %e, "multipart field unreadable");
            ApiError::validation(MSG_INVALID_FORM)
        };

        let mut parsed = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let file = ImageFile {
                    file_name,
                    content_type,
                    bytes: field.bytes().await.map_err(invalid)?,
                };
                // 빈 파일 필드는 이미지 없음
                if !file.is_empty() {
                    parsed.image = Some(file);
                }
            } else {
                let value = field.text().await.map_err(invalid)?;
                parsed.fields.insert(name, value);
            }
        }
        Ok(parsed)
    }

    /// 원본 값 (필수 검사용).
    fn raw(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// 공백이 아닌 값. 빈 문자열은 값 없음으로 취급합니다.
    fn text(&self, key: &str) -> Option<&str> {
        non_blank(self.raw(key))
    }

    fn owned(&self, key: &str) -> Option<String> {
        self.text(key).map(str::to_string)
    }

    fn date(&self, key: &'static str) -> ApiResult<Option<DateTime<Utc>>> {
        Ok(self
            .text(key)
            .map(|v| validation::date(key, v))
            .transpose()?)
    }
}

/// 생성/수정에 공통인 선택 필드.
struct OptionalFields {
    description: Option<String>,
    status: Option<AssetStatus>,
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
    assigned_user_id: Option<UserId>,
    notes: Option<String>,
}

impl OptionalFields {
    /// 형식 규칙: status → purchaseCost → 날짜 필드 → assignedUserId.
    fn parse(form: &AssetForm) -> ApiResult<Self> {
        let status = form
            .text("status")
            .map(|v| validation::asset_status("status", v))
            .transpose()?;
        let purchase_cost = form
            .text("purchaseCost")
            .map(|v| validation::decimal("purchaseCost", v, MSG_INVALID_COST))
            .transpose()?;
        let purchase_date = form.date("purchaseDate")?;
        let warranty_expiration = form.date("warrantyExpiration")?;
        let last_maintenance = form.date("lastMaintenance")?;
        let next_maintenance = form.date("nextMaintenance")?;
        let assigned_user_id = form
            .text("assignedUserId")
            .map(|v| validation::integer_id("assignedUserId", v, MSG_INVALID_ASSIGNED_USER))
            .transpose()?;

        Ok(Self {
            description: form.owned("description"),
            status,
            location: form.owned("location"),
            department: form.owned("department"),
            purchase_date,
            purchase_cost,
            vendor: form.owned("vendor"),
            warranty_expiration,
            serial_number: form.owned("serialNumber"),
            barcode: form.owned("barcode"),
            last_maintenance,
            next_maintenance,
            assigned_user_id,
            notes: form.owned("notes"),
        })
    }
}

fn new_asset(form: &AssetForm) -> ApiResult<NewAsset> {
    let name = required("name", form.raw("name"), MSG_NAME_REQUIRED)?.to_string();
    let asset_type = required("type", form.raw("type"), MSG_TYPE_REQUIRED)?.to_string();
    let f = OptionalFields::parse(form)?;

    Ok(NewAsset {
        name,
        asset_type,
        description: f.description,
        status: f.status.unwrap_or_default(),
        location: f.location,
        department: f.department,
        purchase_date: f.purchase_date,
        purchase_cost: f.purchase_cost,
        vendor: f.vendor,
        warranty_expiration: f.warranty_expiration,
        serial_number: f.serial_number,
        barcode: f.barcode,
        last_maintenance: f.last_maintenance,
        next_maintenance: f.next_maintenance,
        image_url: None,
        assigned_user_id: f.assigned_user_id,
        notes: f.notes,
    })
}

fn asset_patch(form: &AssetForm) -> ApiResult<AssetPatch> {
    let f = OptionalFields::parse(form)?;

    Ok(AssetPatch {
        name: form.owned("name"),
        asset_type: form.owned("type"),
        description: f.description,
        status: f.status,
        location: f.location,
        department: f.department,
        purchase_date: f.purchase_date,
        purchase_cost: f.purchase_cost,
        vendor: f.vendor,
        warranty_expiration: f.warranty_expiration,
        serial_number: f.serial_number,
        barcode: f.barcode,
        last_maintenance: f.last_maintenance,
        next_maintenance: f.next_maintenance,
        image_url: None,
        assigned_user_id: f.assigned_user_id,
        notes: f.notes,
    })
}

fn parse_id(query: &AssetIdQuery) -> ApiResult<AssetId> {
    let raw = non_blank(query.id.as_deref()).ok_or_else(|| ApiError::validation(MSG_ID_REQUIRED))?;
    Ok(validation::integer_id("id", raw, MSG_INVALID_ID)?)
}

fn mutation_error(operation: &'static str, id: Option<AssetId>, err: StoreError) -> ApiError {
    match err {
        StoreError::UniqueViolation { .. } => ApiError::conflict_bad_request(MSG_DUPLICATE),
        StoreError::ForeignKeyViolation { .. } => {
            ApiError::conflict_bad_request(MSG_INVALID_REFERENCE)
        }
        StoreError::RecordNotFound => ApiError::not_found(MSG_REFERENCE_MISSING),
        other => internal_store_error(operation, id, &other, MSG_STORE_FAILED),
    }
}

/// 수정 중 대상이 사라진 경우는 참조 누락이 아니라 자산 없음으로 응답합니다.
fn update_error(id: AssetId, err: StoreError) -> ApiError {
    match err {
        StoreError::RecordNotFound => ApiError::not_found(MSG_NOT_FOUND),
        other => mutation_error("assets.update", Some(id), other),
    }
}

async fn require_asset(state: &AppState, operation: &'static str, id: AssetId) -> ApiResult<Asset> {
    state
        .assets
        .find_by_id(id)
        .await
        .map_err(|e| internal_store_error(operation, Some(id), &e, MSG_STORE_FAILED))?
        .ok_or_else(|| ApiError::not_found(MSG_NOT_FOUND))
}

/// 이미지를 업로드 협력자에 넘깁니다. 실패하면 경고만 남기고 URL 없이 진행합니다.
async fn upload_image(state: &AppState, image: Option<ImageFile>) -> Option<String> {
    let file = image?;
    let size = file.len();
    match state.uploader.upload_image(file).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(error = %e, size, "Image upload skipped");
            None
        }
    }
}

// ==================== 핸들러 ====================

/// 자산 목록.
///
/// GET /api/assets?page=1&limit=10&search=mac&status=IN_USE&type=Laptop&sortBy=cost&sortOrder=desc
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AssetListQuery>,
) -> ApiResult<Json<AssetListResponse>> {
    let request = validation::page_request(
        query.page.as_deref(),
        query.limit.as_deref(),
        DEFAULT_LIMIT,
    )?;
    let status = non_blank(query.status.as_deref())
        .map(|s| validation::asset_status("status", s))
        .transpose()?;

    let filter = AssetFilter {
        search: non_blank(query.search.as_deref()).map(str::to_string),
        status,
        asset_type: non_blank(query.asset_type.as_deref()).map(str::to_string),
        department: non_blank(query.department.as_deref()).map(str::to_string),
    };
    let sort = AssetSort::from_query(query.sort_by.as_deref(), query.sort_order.as_deref());

    let page = state
        .assets
        .list(&filter, sort, request)
        .await
        .map_err(|e| internal_store_error("assets.list", None, &e, MSG_FETCH_FAILED))?;

    let total_pages = page.total_pages();
    Ok(Json(AssetListResponse {
        data: page.items,
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages,
    }))
}

/// 자산 생성.
///
/// POST /api/assets
pub async fn create_asset(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    form: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<Asset>)> {
    let mut form = AssetForm::read(form).await?;
    let mut new_asset = new_asset(&form)?;
    new_asset.image_url = upload_image(&state, form.image.take()).await;

    let asset = state
        .assets
        .create(new_asset)
        .await
        .map_err(|e| mutation_error("assets.create", None, e))?;

    info!(asset_id = asset.id, actor_id = actor.subject_id, "Asset created");
    Ok((StatusCode::CREATED, Json(asset)))
}

/// 자산 부분 수정.
///
/// PUT /api/assets?id=N
pub async fn update_asset(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<AssetIdQuery>,
    form: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Asset>> {
    let id = parse_id(&query)?;
    let mut form = AssetForm::read(form).await?;
    let mut patch = asset_patch(&form)?;

    require_asset(&state, "assets.update", id).await?;
    patch.image_url = upload_image(&state, form.image.take()).await;

    let asset = state
        .assets
        .update(id, patch)
        .await
        .map_err(|e| update_error(id, e))?;

    info!(asset_id = asset.id, actor_id = actor.subject_id, "Asset updated");
    Ok(Json(asset))
}

/// 자산 삭제.
///
/// DELETE /api/assets?id=N
pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<AssetIdQuery>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&query)?;
    require_asset(&state, "assets.delete", id).await?;

    state.assets.delete(id).await.map_err(|e| match e {
        StoreError::ForeignKeyViolation { .. } => {
            ApiError::conflict_bad_request(MSG_DELETE_REFERENCED)
        }
        StoreError::RecordNotFound => ApiError::not_found(MSG_NOT_FOUND),
        other => internal_store_error("assets.delete", Some(id), &other, MSG_STORE_FAILED),
    })?;

    info!(asset_id = id, actor_id = actor.subject_id, "Asset deleted");
    Ok(Json(MessageResponse {
        message: "Asset deleted successfully".to_string(),
    }))
}

/// 자산 라우터.
pub fn assets_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/",
        get(list_assets)
            .post(create_asset)
            .put(update_asset)
            .delete(delete_asset),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::IdentityClaim;
    use crate::repository::{AssetRepository, MemoryStore, UserRepository};
    use crate::state::create_test_state;
    use crate::upload::{ImageUploader, UploadError};
    use assetdesk_core::{NewUser, Role};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
        response::Response,
    };
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    const BOUNDARY: &str = "assetdesk-test-boundary";

    struct FixedUrlUploader;

    #[async_trait]
    impl ImageUploader for FixedUrlUploader {
        async fn upload_image(&self, file: ImageFile) -> Result<String, UploadError> {
            Ok(format!(
                "https://cdn.example.com/{}",
                file.file_name.unwrap_or_default()
            ))
        }
    }

    fn app_with(state: AppState) -> (Router, Arc<AppState>) {
        let state = Arc::new(state);
        (super::super::create_app(state.clone(), None), state)
    }

    fn app() -> (Router, Arc<AppState>, Arc<MemoryStore>) {
        let (state, store) = create_test_state();
        let (router, state) = app_with(state);
        (router, state, store)
    }

    fn bearer(state: &AppState) -> String {
        let token = state
            .tokens
            .issue(&IdentityClaim::new(1, "admin@example.com", Role::Admin))
            .unwrap();
        format!("Bearer {token}")
    }

    fn form_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Body {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn form_request(
        state: &AppState,
        method: Method,
        uri: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
    ) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer(state))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(form_body(fields, image))
            .unwrap()
    }

    fn get_request(state: &AppState, method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, bearer(state))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed(store: &MemoryStore, name: &str, serial: &str, cost: Decimal) -> Asset {
        AssetRepository::create(
            store,
            NewAsset {
                name: name.to_string(),
                asset_type: "Laptop".to_string(),
                serial_number: Some(serial.to_string()),
                purchase_cost: Some(cost),
                department: Some("Engineering".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_asset_requires_name_then_type() {
        let (app, state, store) = app();

        let response = app
            .clone()
            .oneshot(form_request(&state, Method::POST, "/api/assets", &[("type", "Laptop")], None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Asset name is required");

        let response = app
            .oneshot(form_request(&state, Method::POST, "/api/assets", &[("name", "MacBook")], None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Asset type is required");

        assert_eq!(store.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_create_asset_format_rules() {
        let (app, state, store) = app();
        let base = [("name", "MacBook"), ("type", "Laptop")];
        let cases: [(&[(&str, &str)], &str); 4] = [
            (&[("status", "LOST")], "Invalid asset status"),
            (&[("purchaseCost", "cheap")], "Invalid purchase cost"),
            (&[("purchaseDate", "yesterday")], "Invalid date for purchaseDate"),
            (&[("assignedUserId", "kim")], "Invalid assigned user ID"),
        ];

        for (extra, message) in cases {
            let fields: Vec<(&str, &str)> = base.iter().chain(extra.iter()).copied().collect();
            let response = app
                .clone()
                .oneshot(form_request(&state, Method::POST, "/api/assets", &fields, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{message}");
            assert_eq!(body_json(response).await["error"], message);
        }
        assert_eq!(store.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_create_asset_defaults_and_assignment() {
        let (app, state, store) = app();
        let user = UserRepository::create(
            store.as_ref(),
            NewUser {
                name: "Kim".to_string(),
                email: "kim@example.com".to_string(),
                password_hash: None,
                role: Role::User,
                is_active: true,
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap();
        let assignee = user.id.to_string();

        let response = app
            .oneshot(form_request(
                &state,
                Method::POST,
                "/api/assets",
                &[
                    ("name", "MacBook Pro"),
                    ("type", "Laptop"),
                    ("purchaseCost", "2499.00"),
                    ("purchaseDate", "2024-03-01"),
                    ("serialNumber", "C02XYZ"),
                    ("assignedUserId", assignee.as_str()),
                    ("notes", ""),
                ],
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["status"], "AVAILABLE");
        assert_eq!(json["type"], "Laptop");
        assert_eq!(json["assignedTo"]["email"], "kim@example.com");
        assert!(json["notes"].is_null());
        assert!(json["imageUrl"].is_null());
    }

    #[tokio::test]
    async fn test_create_asset_constraint_errors() {
        let (app, state, store) = app();
        seed(&store, "ThinkPad", "SN-1", dec!(1000)).await;

        let response = app
            .clone()
            .oneshot(form_request(
                &state,
                Method::POST,
                "/api/assets",
                &[("name", "Dup"), ("type", "Laptop"), ("serialNumber", "SN-1")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Asset with this serial number or barcode already exists"
        );

        let response = app
            .oneshot(form_request(
                &state,
                Method::POST,
                "/api/assets",
                &[("name", "Orphan"), ("type", "Laptop"), ("assignedUserId", "999")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Invalid reference to related record"
        );
    }

    #[tokio::test]
    async fn test_image_upload_failure_does_not_block() {
        let (app, state, _) = app();
        let response = app
            .oneshot(form_request(
                &state,
                Method::POST,
                "/api/assets",
                &[("name", "Monitor"), ("type", "Display")],
                Some(("monitor.png", b"\x89PNG\r\n".as_slice())),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(body_json(response).await["imageUrl"].is_null());
    }

    #[tokio::test]
    async fn test_image_upload_sets_url() {
        let (state, _) = create_test_state();
        let (app, state) = app_with(state.with_uploader(Arc::new(FixedUrlUploader)));
        let response = app
            .oneshot(form_request(
                &state,
                Method::POST,
                "/api/assets",
                &[("name", "Monitor"), ("type", "Display")],
                Some(("monitor.png", b"\x89PNG\r\n".as_slice())),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            body_json(response).await["imageUrl"],
            "https://cdn.example.com/monitor.png"
        );
    }

    #[tokio::test]
    async fn test_list_assets_sort_and_filter() {
        let (app, state, store) = app();
        seed(&store, "Bravo", "SN-B", dec!(300)).await;
        seed(&store, "Alpha", "SN-A", dec!(900)).await;
        seed(&store, "Charlie", "SN-C", dec!(100)).await;

        let response = app
            .clone()
            .oneshot(get_request(&state, Method::GET, "/api/assets"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["limit"], 10);
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["data"][0]["name"], "Alpha");

        let response = app
            .clone()
            .oneshot(get_request(
                &state,
                Method::GET,
                "/api/assets?sortBy=cost&sortOrder=desc&limit=2",
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["data"][0]["name"], "Alpha");
        assert_eq!(json["data"][1]["name"], "Bravo");
        assert_eq!(json["totalPages"], 2);

        let response = app
            .clone()
            .oneshot(get_request(&state, Method::GET, "/api/assets?search=sn-c"))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["total"], 1);
        assert_eq!(json["data"][0]["name"], "Charlie");

        let response = app
            .oneshot(get_request(&state, Method::GET, "/api/assets?status=BROKEN"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid asset status");
    }

    #[tokio::test]
    async fn test_update_asset_id_rules() {
        let (app, state, store) = app();
        let fields = [("name", "Renamed")];

        let response = app
            .clone()
            .oneshot(form_request(&state, Method::PUT, "/api/assets", &fields, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Asset ID is required");

        let response = app
            .clone()
            .oneshot(form_request(&state, Method::PUT, "/api/assets?id=abc", &fields, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid asset ID");
        assert_eq!(store.calls().total(), 0);

        let response = app
            .oneshot(form_request(&state, Method::PUT, "/api/assets?id=42", &fields, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Asset not found");
    }

    #[tokio::test]
    async fn test_update_asset_partial() {
        let (app, state, store) = app();
        let asset = seed(&store, "ThinkPad", "SN-1", dec!(1000)).await;

        let response = app
            .oneshot(form_request(
                &state,
                Method::PUT,
                &format!("/api/assets?id={}", asset.id),
                &[("status", "MAINTENANCE"), ("location", "HQ 3F")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["name"], "ThinkPad");
        assert_eq!(json["status"], "MAINTENANCE");
        assert_eq!(json["location"], "HQ 3F");
        assert_eq!(json["serialNumber"], "SN-1");
    }

    #[test]
    fn test_update_error_mapping() {
        assert_eq!(
            update_error(7, StoreError::RecordNotFound),
            ApiError::not_found("Asset not found")
        );
        assert_eq!(
            update_error(7, StoreError::foreign_key("assets_assigned_user_id_fkey")),
            ApiError::conflict_bad_request("Invalid reference to related record")
        );
        assert_eq!(
            mutation_error("assets.create", None, StoreError::RecordNotFound),
            ApiError::not_found("Referenced record not found")
        );
    }

    #[tokio::test]
    async fn test_delete_asset() {
        let (app, state, store) = app();
        let asset = seed(&store, "ThinkPad", "SN-1", dec!(1000)).await;
        let uri = format!("/api/assets?id={}", asset.id);

        let response = app
            .clone()
            .oneshot(get_request(&state, Method::DELETE, &uri))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"message": "Asset deleted successfully"})
        );

        let response = app
            .oneshot(get_request(&state, Method::DELETE, &uri))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Asset not found");
    }

    #[tokio::test]
    async fn test_store_unavailable_is_generic_500() {
        let (app, state, store) = app();
        store.set_unavailable(true);

        let response = app
            .oneshot(get_request(&state, Method::GET, "/api/assets"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Error fetching assets"})
        );
    }
}
