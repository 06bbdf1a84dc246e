// 🌐 REST API - checksum validation over HTTP
// Router lives in the library so handlers can be exercised without a socket

use crate::checksum::{check_digits, explain, ChecksumBreakdown};
use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::debug;

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub ibans: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub total: usize,
    pub valid_count: usize,
    pub results: Vec<ChecksumBreakdown>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckDigitsRequest {
    pub country: String,
    pub bban: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckDigitsResponse {
    pub check_digits: String,

    /// Compact IBAN: country + check digits + BBAN
    pub iban: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/validate/:iban - Validate a single IBAN
async fn validate_one(Path(iban): Path<String>) -> impl IntoResponse {
    let breakdown = explain(&iban);
    debug!(iban = %breakdown.normalized, valid = breakdown.valid, "validated");

    Json(ApiResponse::ok(breakdown))
}

/// POST /api/validate - Validate a list of IBANs
async fn validate_many(Json(request): Json<ValidateRequest>) -> impl IntoResponse {
    let results: Vec<ChecksumBreakdown> = request.ibans.iter().map(|iban| explain(iban)).collect();
    let valid_count = results.iter().filter(|b| b.valid).count();
    debug!(total = results.len(), valid_count, "validated batch");

    Json(ApiResponse::ok(ValidateResponse {
        total: results.len(),
        valid_count,
        results,
    }))
}

/// POST /api/check-digits - Compute check digits for country + BBAN
async fn compute_check_digits(Json(request): Json<CheckDigitsRequest>) -> impl IntoResponse {
    match check_digits(&request.country, &request.bban) {
        Ok(digits) => {
            let iban = format!(
                "{}{}{}",
                crate::normalize(&request.country),
                digits,
                crate::normalize(&request.bban)
            );

            (
                StatusCode::OK,
                Json(ApiResponse::ok(CheckDigitsResponse {
                    check_digits: digits,
                    iban,
                })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<CheckDigitsResponse>::err(e.to_string())),
        )
            .into_response(),
    }
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router (API nested under `/api`)
pub fn router() -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/validate", post(validate_many))
        .route("/validate/:iban", get(validate_one))
        .route("/check-digits", post(compute_check_digits));

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_uri(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(get_uri("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": "OK"}));
    }

    #[tokio::test]
    async fn test_validate_one_valid() {
        let (status, body) = send(get_uri("/api/validate/GB29NWBK60161331926819")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["valid"], true);
        assert_eq!(body["data"]["remainder"], 1);
    }

    #[tokio::test]
    async fn test_validate_one_percent_encoded_spaces() {
        let (_, body) = send(get_uri("/api/validate/ES95%200217%200100%2017")).await;
        assert_eq!(body["data"]["input"], "ES95 0217 0100 17");
        assert_eq!(body["data"]["normalized"], "ES950217010017");
        assert_eq!(body["data"]["valid"], false);
    }

    #[tokio::test]
    async fn test_validate_many() {
        let request = post_json(
            "/api/validate",
            json!({"ibans": ["BE68 5390 0754 7034", "LU36 0029 1534 6005 0000", ""]}),
        );

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 3);
        assert_eq!(body["data"]["valid_count"], 1);
        assert_eq!(body["data"]["results"][2]["remainder"], Value::Null);
    }

    #[tokio::test]
    async fn test_check_digits_ok() {
        let request = post_json(
            "/api/check-digits",
            json!({"country": "gb", "bban": "NWBK 6016 1331 9268 19"}),
        );

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["check_digits"], "29");
        assert_eq!(body["data"]["iban"], "GB29NWBK60161331926819");
    }

    #[tokio::test]
    async fn test_check_digits_bad_country() {
        let request = post_json("/api/check-digits", json!({"country": "G", "bban": "1234"}));

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("country code"));
    }
}
