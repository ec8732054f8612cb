//! AssetDesk API 서버.
//!
//! 설정을 로드하고 저장소를 연결한 뒤 Axum 서버를 시작합니다.
//! 데이터베이스 URL이 없으면 메모리 저장소로 동작합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{http::StatusCode, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use assetdesk_api::metrics::setup_metrics_recorder;
use assetdesk_api::repository::MemoryStore;
use assetdesk_api::routes::create_app;
use assetdesk_api::state::AppState;
use assetdesk_api::TokenService;
use assetdesk_core::{init_logging, AppConfig, DatabaseConfig, LogConfig, ServerConfig};

/// CORS 레이어 생성.
///
/// `server.cors_origins`(쉼표 구분)가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let configured = config
        .cors_origins
        .as_deref()
        .filter(|origins| !origins.trim().is_empty());

    let allow_origin = match configured {
        Some(origins) => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS origins are set but none are valid, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        None => {
            warn!("CORS origins not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        // 자격 증명 포함 허용 (origin 목록 설정 시에만)
        .allow_credentials(configured.is_some())
        // preflight 요청 캐시 시간
        .max_age(Duration::from_secs(3600))
}

/// 저장소 연결 후 AppState 생성.
async fn create_app_state(config: &DatabaseConfig, tokens: TokenService) -> anyhow::Result<AppState> {
    let Some(url) = config.url.as_deref().filter(|u| !u.trim().is_empty()) else {
        warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
        return Ok(AppState::with_memory_store(Arc::new(MemoryStore::new()), tokens));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(url)
        .await
        .context("failed to connect to PostgreSQL")?;
    info!(max_connections = config.max_connections, "Database connected");

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;
        info!("Database migrations applied");
    }

    Ok(AppState::with_postgres(pool, tokens))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle, server: &ServerConfig) -> Router {
    create_app(state, Some(metrics_handle))
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(cors_layer(server))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from_settings(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!(environment = ?config.environment, "Starting AssetDesk API server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = setup_metrics_recorder().context("failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let secret = config.auth.signing_secret(config.environment)?;
    let tokens = TokenService::new(&secret, chrono::Duration::hours(config.auth.token_ttl_hours));
    info!(validity_hours = tokens.validity().num_hours(), "Token service initialized");

    let state = Arc::new(create_app_state(&config.database, tokens).await?);
    info!(version = %state.version, has_db = state.has_db(), "Application state initialized");

    let app = create_router(state, metrics_handle, &config.server);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
