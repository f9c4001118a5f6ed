//! Role repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{Permission, Role};

use super::RoleStore;

/// Role repository backed by PostgreSQL
#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn role_from_row(row: &sqlx::postgres::PgRow) -> Role {
    Role {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
    }
}

#[async_trait]
impl RoleStore for RoleRepository {
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.description
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(role_from_row).collect())
    }

    async fn permissions_for_role(&self, role_id: Uuid) -> Result<Vec<Permission>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.description
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Permission {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
            })
            .collect())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description
            FROM roles
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(role_from_row).collect())
    }

    async fn replace_user_roles(&self, user_id: Uuid, roles: &[String]) -> Result<()> {
        info!("Replacing roles for user: {}", user_id);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, id FROM roles WHERE name = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(roles)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
