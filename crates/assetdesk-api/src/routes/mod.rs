//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/auth` - 로그인/회원가입 (공개)
//! - `/api/users` - 사용자 관리 (인증 필요)
//! - `/api/assets` - 자산 관리 (조회: 인증, 변경: ADMIN)
//! - `/metrics` - Prometheus 메트릭

pub mod assets;
pub mod auth;
pub mod health;
pub mod users;

pub use assets::{assets_router, AssetListResponse, MessageResponse};
pub use auth::{auth_router, AuthResponse, AuthUser};
pub use health::{health_router, HealthResponse, ReadinessResponse};
pub use users::{users_router, UserListResponse};

use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    middleware,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;

use crate::auth::auth_gate;
use crate::error::ApiError;
use crate::middleware::metrics_layer;
use crate::state::AppState;

const MSG_INVALID_JSON: &str = "Invalid JSON payload";

/// JSON 본문 추출기.
///
/// 파싱 실패를 `{"error": "..."}` 형식의 400으로 돌려줍니다.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "JSON body rejected");
                Err(ApiError::validation(MSG_INVALID_JSON))
            }
        }
    }
}

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // 공개 인증 엔드포인트
        .nest("/api/auth", auth_router())
        // 보호 리소스
        .nest("/api/users", users_router())
        .nest("/api/assets", assets_router())
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 인증 게이트와 메트릭 미들웨어까지 적용된 애플리케이션 라우터.
///
/// 인증 게이트는 API 라우터 전체에 적용되고, 경로 정책에 따라 공개/보호 여부를 판단합니다.
/// `metrics`가 주어지면 `/metrics`를 함께 노출합니다.
pub fn create_app(state: Arc<AppState>, metrics: Option<PrometheusHandle>) -> Router {
    let api_router = create_api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .with_state(state);

    let router = match metrics {
        Some(handle) => Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(handle)
            .merge(api_router),
        None => api_router,
    };

    router.layer(middleware::from_fn(metrics_layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::detached_metrics_handle;
    use crate::state::create_test_state;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_invalid_json_is_400() {
        let (state, store) = create_test_state();
        let app = create_app(Arc::new(state), None);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Invalid JSON payload");
        assert_eq!(store.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_metrics_route_is_unprotected() {
        let (state, _) = create_test_state();
        let app = create_app(Arc::new(state), Some(detached_metrics_handle().unwrap()));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
