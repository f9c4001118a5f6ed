//! Authentication service orchestrating registration, login, and session
//! validation

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult, FieldError};
use crate::models::{NewSession, NewUser, Session, User};
use crate::password::PasswordService;
use crate::repositories::{SessionStore, UserStore};
use crate::token;
use crate::validation;

/// Role names assigned to every newly registered user
pub const DEFAULT_ROLES: &[&str] = &["user"];

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterData {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
}

/// Login payload
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

/// Result of a successful registration or login
///
/// `token` is the raw cookie value; it exists only in this return value and
/// is never persisted.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub token: String,
    pub user: User,
}

/// A session that passed validation, together with its owner
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    pub session: Session,
    pub user: User,
}

/// Authentication service
///
/// Stores are injected explicitly so tests can swap in the in-memory
/// implementations.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    password: PasswordService,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        password: PasswordService,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            sessions,
            password,
            config,
        }
    }

    /// Register a new user and issue their first session
    ///
    /// Fails with `AuthError::Validation` when the payload is malformed and
    /// with `AuthError::AlreadyExists` when the email is taken.
    pub async fn register(&self, data: &RegisterData) -> AuthResult<IssuedSession> {
        let mut fields = Vec::new();
        if let Err(message) = validation::validate_email(&data.email) {
            fields.push(FieldError {
                field: "email",
                message,
            });
        }
        if let Err(message) = validation::validate_password(
            &data.password,
            self.config.min_password_length,
            self.config.max_password_length,
        ) {
            fields.push(FieldError {
                field: "password",
                message,
            });
        }
        if data.password != data.password_confirm {
            fields.push(FieldError {
                field: "password_confirm",
                message: "Passwords do not match".to_string(),
            });
        }
        if !fields.is_empty() {
            return Err(AuthError::Validation(fields));
        }

        if self.users.find_by_email(&data.email).await?.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = self.password.hash(&data.password)?;
        let user = self
            .users
            .create(&NewUser {
                email: data.email.clone(),
                first_name: data.first_name.clone(),
                last_name: data.last_name.clone(),
                password_hash,
                roles: DEFAULT_ROLES.iter().map(|r| r.to_string()).collect(),
            })
            .await?;

        let (session, raw_token) = self.issue_session(user.id).await?;

        info!("Registered user: {}", user.id);

        Ok(IssuedSession {
            session,
            token: raw_token,
            user,
        })
    }

    /// Authenticate credentials and issue a fresh session
    ///
    /// Unknown email and missing stored hash surface as `NotFound`, a wrong
    /// password as `InvalidCredentials`. The transport layer collapses both
    /// into one generic response.
    pub async fn login(&self, data: &LoginData) -> AuthResult<IssuedSession> {
        let user = self
            .users
            .find_by_email(&data.email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let stored_hash = self
            .users
            .password_hash(user.id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !self.password.verify(&stored_hash, &data.password) {
            return Err(AuthError::InvalidCredentials);
        }

        let (session, raw_token) = self.issue_session(user.id).await?;

        info!("Logged in user: {}", user.id);

        Ok(IssuedSession {
            session,
            token: raw_token,
            user,
        })
    }

    /// Resolve a presented token to its session and owning user
    ///
    /// Returns `None` for unknown ids, orphaned sessions, and expired
    /// sessions; expired sessions are deleted on detection. A session
    /// validated inside the trailing renewal window has its expiry pushed
    /// out to a full lifetime from now, and the renewed snapshot is
    /// returned.
    pub async fn validate_session_token(
        &self,
        raw_token: &str,
    ) -> AuthResult<Option<AuthenticatedUser>> {
        let id = token::session_id_from_token(raw_token);

        let Some(session) = self.sessions.find_by_id(&id).await? else {
            return Ok(None);
        };

        let Some(user) = self.users.find_by_id(session.user_id).await? else {
            // Orphaned session: the owning user is gone. Left in place for
            // lazy expiry.
            return Ok(None);
        };

        let now = Utc::now();

        if now > session.expires_at {
            self.sessions.delete(&session.id).await?;
            return Ok(None);
        }

        let renew_after = session.expires_at - Duration::days(self.config.session_refresh_days);
        if now > renew_after {
            let renewed = Session {
                expires_at: now + Duration::days(self.config.session_lifetime_days),
                ..session
            };
            self.sessions
                .set_expiry(&renewed.id, renewed.expires_at)
                .await?;
            return Ok(Some(AuthenticatedUser {
                session: renewed,
                user,
            }));
        }

        Ok(Some(AuthenticatedUser { session, user }))
    }

    /// Delete a session; deleting an already-absent id succeeds
    pub async fn invalidate_session(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.delete(session_id).await?;
        Ok(())
    }

    async fn issue_session(&self, user_id: Uuid) -> AuthResult<(Session, String)> {
        let raw_token = token::generate_session_token();
        let session = self
            .sessions
            .insert(&NewSession {
                id: token::session_id_from_token(&raw_token),
                user_id,
                expires_at: Utc::now() + Duration::days(self.config.session_lifetime_days),
            })
            .await?;

        Ok((session, raw_token))
    }
}
