//! Authorization middleware gating protected routes

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header::COOKIE},
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::{AppState, rbac};

/// State for a permission-gated route group
#[derive(Clone)]
pub struct PermissionGate {
    pub state: AppState,
    /// Permissions a request must hold; all of them, not any
    pub required: &'static [&'static str],
}

/// Validate the session cookie and enforce the gate's permission set
///
/// Rejections are a bare 401 regardless of cause — missing cookie, expired
/// session, or insufficient permissions all look the same from outside. On
/// success the authenticated user is inserted into the request extensions
/// and the request is forwarded.
pub async fn require_permissions(
    State(gate): State<PermissionGate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token_from_headers(req.headers(), &gate.state.config.cookie_name)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let authenticated = gate
        .state
        .auth_service
        .validate_session_token(&token)
        .await
        .map_err(|e| {
            error!("Failed to validate session: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let granted = gate
        .state
        .role_service
        .effective_permissions(authenticated.user.id)
        .await
        .map_err(|e| {
            error!("Failed to resolve permissions: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if !rbac::has_all(&granted, gate.required) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(authenticated);

    Ok(next.run(req).await)
}

/// Extract the session token from the request's cookie header
pub fn session_token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == cookie_name {
            return Some(val.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extracts_session_cookie() {
        let headers = headers_with_cookie("konnekt-session=abc123");
        assert_eq!(
            session_token_from_headers(&headers, "konnekt-session"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_extracts_among_multiple_cookies() {
        let headers = headers_with_cookie("theme=dark; konnekt-session=abc123; lang=en");
        assert_eq!(
            session_token_from_headers(&headers, "konnekt-session"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_missing_cookie_header() {
        let headers = HeaderMap::new();
        assert_eq!(session_token_from_headers(&headers, "konnekt-session"), None);
    }

    #[test]
    fn test_other_cookies_only() {
        let headers = headers_with_cookie("theme=dark; lang=en");
        assert_eq!(session_token_from_headers(&headers, "konnekt-session"), None);
    }
}
