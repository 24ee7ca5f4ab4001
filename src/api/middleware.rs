//! API Middleware
//!
//! Bearer authentication, ownership checks and request logging shared by
//! both services.

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Extension, Path, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::{extract_bearer_token, TokenService, UserClaims};
use crate::error::{AppError, AppResult};

// =========================================================================
// Bearer Authentication Middleware
// =========================================================================

/// Verify the bearer token and attach its claims to the request.
///
/// Missing header, malformed header or a bad signature end the request
/// before any handler runs.
pub async fn claims_middleware(
    State(tokens): State<TokenService>,
    mut request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let claims = verify_request(&tokens, request.headers())?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Decode the claims carried by the request's `Authorization` header
pub fn verify_request(tokens: &TokenService, headers: &HeaderMap) -> AppResult<UserClaims> {
    let token = extract_bearer_token(headers)?.ok_or(AppError::MissingAuthorization)?;
    Ok(tokens.verify(token)?)
}

// =========================================================================
// Ownership Middleware
// =========================================================================

/// Only let the request through when the caller is the `:owner_id` of the path.
///
/// Must run inside [`claims_middleware`]; expects `/:owner_id/:resource_id` routes.
pub async fn owner_middleware(
    Extension(claims): Extension<UserClaims>,
    path: Result<Path<(String, String)>, PathRejection>,
    request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let Path((owner_id, _)) = path.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    check_owner(&claims, &owner_id)?;

    Ok(next.run(request).await)
}

/// Caller id must string-equal the owner id
pub fn check_owner(claims: &UserClaims, owner_id: &str) -> AppResult<()> {
    if owner_id.is_empty() {
        return Err(AppError::InvalidRequest(
            "no owner id found in the request path".to_string(),
        ));
    }
    if claims.user_id != owner_id {
        return Err(AppError::NotOwner);
    }
    Ok(())
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    // Mask sensitive headers
    let headers = mask_headers_for_logging(request.headers());

    // Set by SetRequestIdLayer further out
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        request_id = ?request_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = ?request_id,
        "Request completed"
    );

    response
}
