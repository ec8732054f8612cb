//! HTTP 요청 metrics middleware.
//!
//! 응답 메트릭에는 접근 정책 분류(`access`) 라벨이 붙어, 관리자 전용 변경 요청과
//! 일반 조회의 401/403 비율을 따로 볼 수 있습니다.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::auth::policy::requirement;
use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// - `http_requests_total`: 총 요청 수 (method, path, access 라벨)
/// - `http_responses_total`: 총 응답 수 (method, path, access, status 라벨)
/// - `http_request_duration_seconds`: 요청 처리 시간 히스토그램
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let access = requirement(request.uri().path(), &method).as_str();
    let path = normalize_path(request.uri().path());
    let method = method.as_str().to_string();

    record_http_request(&method, &path, access);

    let response = next.run(request).await;

    record_http_response(&method, &path, access, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}
