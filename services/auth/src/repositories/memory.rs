//! In-memory store implementations
//!
//! Backs the service tests and local runs that have no PostgreSQL
//! instance. Behaves like the SQL-backed repositories, including the
//! unique-email constraint.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{NewSession, NewUser, Permission, Role, Session, User};

use super::{RoleStore, SessionStore, UserStore};

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    password_hashes: HashMap<Uuid, String>,
    sessions: HashMap<String, Session>,
    roles: Vec<Role>,
    permissions: Vec<Permission>,
    user_roles: HashMap<Uuid, HashSet<Uuid>>,
    role_permissions: HashMap<Uuid, HashSet<Uuid>>,
}

/// In-memory implementation of all three stores
///
/// One shared state mirrors the fact that the SQL repositories all talk to
/// the same database.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a role granting the named permissions
    ///
    /// Permissions are created on first use and shared between roles that
    /// name them.
    pub async fn add_role(&self, name: &str, permissions: &[&str]) -> Role {
        let mut state = self.state.lock().await;

        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
        };
        state.roles.push(role.clone());

        let mut granted = HashSet::new();
        for permission_name in permissions {
            let existing = state
                .permissions
                .iter()
                .find(|p| p.name == *permission_name)
                .cloned();
            let permission = match existing {
                Some(permission) => permission,
                None => {
                    let permission = Permission {
                        id: Uuid::new_v4(),
                        name: permission_name.to_string(),
                        description: None,
                    };
                    state.permissions.push(permission.clone());
                    permission
                }
            };
            granted.insert(permission.id);
        }
        state.role_permissions.insert(role.id, granted);

        role
    }

    /// Overwrite a session's expiry without going through the service
    ///
    /// Test hook for constructing sessions at arbitrary points in their
    /// lifecycle.
    pub async fn force_session_expiry(&self, id: &str, expires_at: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        if let Some(session) = state.sessions.get_mut(id) {
            session.expires_at = expires_at;
        }
    }

    /// Remove a user record, leaving its sessions behind
    pub async fn remove_user(&self, id: Uuid) {
        let mut state = self.state.lock().await;
        state.users.remove(&id);
        state.password_hashes.remove(&id);
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn password_hash(&self, user_id: Uuid) -> Result<Option<String>> {
        let state = self.state.lock().await;
        Ok(state.password_hashes.get(&user_id).cloned())
    }

    async fn create(&self, new_user: &NewUser) -> Result<User> {
        let mut state = self.state.lock().await;

        if state.users.values().any(|u| u.email == new_user.email) {
            anyhow::bail!("duplicate key value violates unique constraint \"users_email_key\"");
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            created_at: now,
            updated_at: now,
        };

        let assigned: HashSet<Uuid> = state
            .roles
            .iter()
            .filter(|r| new_user.roles.contains(&r.name))
            .map(|r| r.id)
            .collect();

        state.users.insert(user.id, user.clone());
        state
            .password_hashes
            .insert(user.id, new_user.password_hash.clone());
        state.user_roles.insert(user.id, assigned);

        Ok(user)
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn insert(&self, new_session: &NewSession) -> Result<Session> {
        let mut state = self.state.lock().await;

        let session = Session {
            id: new_session.id.clone(),
            user_id: new_session.user_id,
            expires_at: new_session.expires_at,
            created_at: Utc::now(),
        };
        state.sessions.insert(session.id.clone(), session.clone());

        Ok(session)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.sessions.remove(id);
        Ok(())
    }

    async fn set_expiry(&self, id: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(session) = state.sessions.get_mut(id) {
            session.expires_at = expires_at;
        }
        Ok(())
    }
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>> {
        let state = self.state.lock().await;
        let assigned = state.user_roles.get(&user_id).cloned().unwrap_or_default();
        let mut roles: Vec<Role> = state
            .roles
            .iter()
            .filter(|r| assigned.contains(&r.id))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn permissions_for_role(&self, role_id: Uuid) -> Result<Vec<Permission>> {
        let state = self.state.lock().await;
        let granted = state
            .role_permissions
            .get(&role_id)
            .cloned()
            .unwrap_or_default();
        let mut permissions: Vec<Permission> = state
            .permissions
            .iter()
            .filter(|p| granted.contains(&p.id))
            .cloned()
            .collect();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let state = self.state.lock().await;
        let mut roles = state.roles.clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn replace_user_roles(&self, user_id: Uuid, roles: &[String]) -> Result<()> {
        let mut state = self.state.lock().await;
        let assigned: HashSet<Uuid> = state
            .roles
            .iter()
            .filter(|r| roles.contains(&r.name))
            .map(|r| r.id)
            .collect();
        state.user_roles.insert(user_id, assigned);
        Ok(())
    }
}
