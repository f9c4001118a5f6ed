//! Repositories for database operations
//!
//! Persistence is abstracted behind store traits so the service layer can
//! run against PostgreSQL in production and against the in-memory stores in
//! tests. All mutation of shared state goes through these narrow
//! interfaces.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{NewSession, NewUser, Permission, Role, Session, User};

pub mod memory;
pub mod role;
pub mod session;
pub mod user;

// Re-export for convenience
pub use memory::InMemoryStore;
pub use role::RoleRepository;
pub use session::SessionRepository;
pub use user::UserRepository;

/// Persistence interface for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Fetch the stored password hash for a user
    ///
    /// This is the only path that exposes a hash; `find_by_email` and
    /// `find_by_id` never return one.
    async fn password_hash(&self, user_id: Uuid) -> Result<Option<String>>;

    /// Create a new user and assign its initial roles
    async fn create(&self, new_user: &NewUser) -> Result<User>;
}

/// Persistence interface for session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session
    async fn insert(&self, new_session: &NewSession) -> Result<Session>;

    /// Find a session by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session; deleting an absent id is not an error
    async fn delete(&self, id: &str) -> Result<()>;

    /// Update a session's expiry timestamp
    async fn set_expiry(&self, id: &str, expires_at: DateTime<Utc>) -> Result<()>;
}

/// Persistence interface for roles and permissions
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Roles assigned to a user
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>>;

    /// Permissions granted by a role
    async fn permissions_for_role(&self, role_id: Uuid) -> Result<Vec<Permission>>;

    /// All defined roles
    async fn list_roles(&self) -> Result<Vec<Role>>;

    /// Replace a user's role set with the named roles
    async fn replace_user_roles(&self, user_id: Uuid, roles: &[String]) -> Result<()>;
}
