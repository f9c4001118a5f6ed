//! Role and permission resolution
//!
//! Permission checks always go through the role indirection: user → roles →
//! permissions. There is no direct user-to-permission assignment.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::AuthResult;
use crate::models::{Permission, Role};
use crate::repositories::RoleStore;

/// Role and permission service
#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleStore>,
}

impl RoleService {
    /// Create a new role service
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }

    /// Roles assigned to a user
    pub async fn get_user_roles(&self, user_id: Uuid) -> AuthResult<Vec<Role>> {
        Ok(self.roles.roles_for_user(user_id).await?)
    }

    /// Permissions granted by a role
    pub async fn get_role_permissions(&self, role_id: Uuid) -> AuthResult<Vec<Permission>> {
        Ok(self.roles.permissions_for_role(role_id).await?)
    }

    /// Names of the roles assigned to a user
    pub async fn get_user_role_names(&self, user_id: Uuid) -> AuthResult<Vec<String>> {
        Ok(self
            .get_user_roles(user_id)
            .await?
            .into_iter()
            .map(|role| role.name)
            .collect())
    }

    /// Resolve the full permission set a user holds through their roles
    ///
    /// Runs on every authorization check. A natural caching point if role
    /// lookups ever become hot, but nothing is cached today: the store is
    /// the single source of truth.
    pub async fn effective_permissions(&self, user_id: Uuid) -> AuthResult<HashSet<String>> {
        let mut permissions = HashSet::new();
        for role in self.get_user_roles(user_id).await? {
            for permission in self.get_role_permissions(role.id).await? {
                permissions.insert(permission.name);
            }
        }
        Ok(permissions)
    }

    /// All defined roles
    pub async fn list_roles(&self) -> AuthResult<Vec<Role>> {
        Ok(self.roles.list_roles().await?)
    }

    /// Replace a user's role set with the named roles
    pub async fn replace_user_roles(&self, user_id: Uuid, roles: &[String]) -> AuthResult<()> {
        Ok(self.roles.replace_user_roles(user_id, roles).await?)
    }
}

/// Check that every required permission is granted
///
/// AND semantics: all required permissions must hold, not just one.
pub fn has_all(granted: &HashSet<String>, required: &[&str]) -> bool {
    required.iter().all(|p| granted.contains(*p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::repositories::{InMemoryStore, UserStore};

    async fn store_with_user(roles: &[&str]) -> (RoleService, Uuid) {
        let store = InMemoryStore::new();
        store
            .add_role("event-management", &["event-create", "event-delete"])
            .await;
        store.add_role("admin", &["user-management"]).await;
        store.add_role("user", &[]).await;

        let user = store
            .create(&NewUser {
                email: "alice@example.com".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Martin".to_string(),
                password_hash: "$argon2id$placeholder".to_string(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            })
            .await
            .unwrap();

        (RoleService::new(Arc::new(store)), user.id)
    }

    #[tokio::test]
    async fn test_permissions_resolve_through_roles() {
        let (service, user_id) = store_with_user(&["event-management"]).await;

        let permissions = service.effective_permissions(user_id).await.unwrap();
        assert!(permissions.contains("event-create"));
        assert!(permissions.contains("event-delete"));
        assert!(!permissions.contains("user-management"));
    }

    #[tokio::test]
    async fn test_permissions_accumulate_across_roles() {
        let (service, user_id) = store_with_user(&["event-management", "admin"]).await;

        let permissions = service.effective_permissions(user_id).await.unwrap();
        assert!(permissions.contains("event-create"));
        assert!(permissions.contains("user-management"));
    }

    #[tokio::test]
    async fn test_user_without_roles_has_no_permissions() {
        let (service, user_id) = store_with_user(&[]).await;

        let permissions = service.effective_permissions(user_id).await.unwrap();
        assert!(permissions.is_empty());
    }

    #[tokio::test]
    async fn test_has_all_requires_every_permission() {
        let (service, user_id) = store_with_user(&["event-management"]).await;
        let granted = service.effective_permissions(user_id).await.unwrap();

        assert!(has_all(&granted, &["event-create"]));
        assert!(has_all(&granted, &["event-create", "event-delete"]));
        assert!(!has_all(&granted, &["event-create", "user-management"]));
        assert!(has_all(&granted, &[]));
    }

    #[tokio::test]
    async fn test_replace_user_roles() {
        let (service, user_id) = store_with_user(&["user"]).await;

        service
            .replace_user_roles(user_id, &["admin".to_string()])
            .await
            .unwrap();

        let names = service.get_user_role_names(user_id).await.unwrap();
        assert_eq!(names, vec!["admin"]);

        let permissions = service.effective_permissions(user_id).await.unwrap();
        assert!(permissions.contains("user-management"));
    }
}
