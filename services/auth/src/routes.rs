//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, post, put},
};
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    AppState,
    config::AuthConfig,
    error::AuthError,
    middleware::{PermissionGate, require_permissions, session_token_from_headers},
    models::{Session, User},
    service::{AuthenticatedUser, LoginData, RegisterData},
    token,
};

/// Public projection of a user, safe to return to clients
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<String>,
}

/// Request body for replacing a user's roles
#[derive(Debug, Deserialize)]
pub struct ReplaceRolesRequest {
    pub roles: Vec<String>,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/roles", get(list_roles))
        .route("/admin/users/:id/roles", put(replace_user_roles))
        .route_layer(axum::middleware::from_fn_with_state(
            PermissionGate {
                state: state.clone(),
                required: &["user-management"],
            },
            require_permissions,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/session", get(session))
        .route("/auth/logout", post(logout))
        .merge(admin_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterData>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Registration attempt for: {}", payload.email);

    let issued = state.auth_service.register(&payload).await?;

    let user = user_response(&state, issued.user).await?;
    let headers = cookie_headers(&state.config, &issued.token, &issued.session)?;

    Ok((StatusCode::CREATED, headers, Json(user)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    request_headers: HeaderMap,
    Json(payload): Json<LoginData>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Login attempt for: {}", payload.email);

    let issued = state.auth_service.login(&payload).await.map_err(|e| {
        // Unknown user and wrong password produce the same response
        match e {
            AuthError::NotFound => AuthError::InvalidCredentials,
            other => other,
        }
    })?;

    // One active session per login: a session presented alongside the
    // credentials is superseded by the newly issued one. A failed login
    // leaves the presented session untouched.
    if state.config.single_session_per_login {
        if let Some(prior) =
            session_token_from_headers(&request_headers, &state.config.cookie_name)
        {
            state
                .auth_service
                .invalidate_session(&token::session_id_from_token(&prior))
                .await?;
        }
    }

    let user = user_response(&state, issued.user).await?;
    let headers = cookie_headers(&state.config, &issued.token, &issued.session)?;

    Ok((StatusCode::OK, headers, Json(user)))
}

/// Session introspection endpoint
pub async fn session(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    let token = session_token_from_headers(&request_headers, &state.config.cookie_name)
        .ok_or(AuthError::Unauthorized)?;

    let AuthenticatedUser { session, user } = state
        .auth_service
        .validate_session_token(&token)
        .await?
        .ok_or(AuthError::Unauthorized)?;

    let user = user_response(&state, user).await?;
    // Re-set the cookie so its lifetime tracks any renewal that validation
    // just persisted
    let headers = cookie_headers(&state.config, &token, &session)?;

    Ok((StatusCode::OK, headers, Json(user)))
}

/// Logout endpoint
///
/// Always succeeds: with no cookie, a stale cookie, or a valid one, the
/// response is 200 and the cookie is cleared.
pub async fn logout(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(token) = session_token_from_headers(&request_headers, &state.config.cookie_name) {
        if let Err(e) = state
            .auth_service
            .invalidate_session(&token::session_id_from_token(&token))
            .await
        {
            error!("Failed to invalidate session on logout: {}", e);
        }
    }

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear_session_cookie(&state.config)?);

    Ok((
        StatusCode::OK,
        headers,
        Json(json!({"message": "Logged out successfully"})),
    ))
}

/// List all defined roles
pub async fn list_roles(State(state): State<AppState>) -> Result<impl IntoResponse, AuthError> {
    let roles = state.role_service.list_roles().await?;
    Ok(Json(roles))
}

/// Replace a user's role set
pub async fn replace_user_roles(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(actor): Extension<AuthenticatedUser>,
    Json(payload): Json<ReplaceRolesRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .user_store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    info!(
        "User {} replacing roles of user {}: {:?}",
        actor.user.id, user.id, payload.roles
    );

    state
        .role_service
        .replace_user_roles(user.id, &payload.roles)
        .await?;

    let user = user_response(&state, user).await?;
    Ok((StatusCode::OK, Json(user)))
}

async fn user_response(state: &AppState, user: User) -> Result<UserResponse, AuthError> {
    let roles = state.role_service.get_user_role_names(user.id).await?;
    Ok(UserResponse {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        roles,
    })
}

fn cookie_headers(config: &AuthConfig, token: &str, session: &Session) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session_cookie(config, token, session)?);
    Ok(headers)
}

/// Build the `Set-Cookie` header for an issued session
///
/// The cookie expires together with the session it carries.
fn session_cookie(config: &AuthConfig, token: &str, session: &Session) -> Result<HeaderValue> {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, token, max_age
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue> {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session_expiring_in_days(days: i64) -> Session {
        Session {
            id: "0".repeat(64),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::days(days),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = AuthConfig::default();
        let session = session_expiring_in_days(30);

        let value = session_cookie(&config, "sometoken", &session).unwrap();
        let value = value.to_str().unwrap();

        assert!(value.starts_with("konnekt-session=sometoken;"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Max-Age="));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn test_session_cookie_max_age_tracks_expiry() {
        let config = AuthConfig::default();
        let session = session_expiring_in_days(30);

        let value = session_cookie(&config, "sometoken", &session).unwrap();
        let value = value.to_str().unwrap();

        let max_age: i64 = value
            .split("Max-Age=")
            .nth(1)
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        // Within a minute of the full 30 days
        assert!(max_age > 30 * 24 * 3600 - 60);
        assert!(max_age <= 30 * 24 * 3600);
    }

    #[test]
    fn test_secure_flag_is_appended_when_configured() {
        let config = AuthConfig {
            cookie_secure: true,
            ..AuthConfig::default()
        };
        let session = session_expiring_in_days(30);

        let value = session_cookie(&config, "sometoken", &session).unwrap();
        assert!(value.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let config = AuthConfig::default();

        let value = clear_session_cookie(&config).unwrap();
        let value = value.to_str().unwrap();

        assert!(value.starts_with("konnekt-session=;"));
        assert!(value.contains("Max-Age=0"));
    }
}
