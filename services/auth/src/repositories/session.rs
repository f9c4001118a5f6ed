//! Session repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::models::{NewSession, Session};

use super::SessionStore;

/// Session repository backed by PostgreSQL
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn insert(&self, new_session: &NewSession) -> Result<Session> {
        let row = sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, expires_at, created_at
            "#,
        )
        .bind(&new_session.id)
        .bind(new_session.user_id)
        .bind(new_session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Session {
            id: row.get("id"),
            user_id: row.get("user_id"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, expires_at, created_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Session {
            id: row.get("id"),
            user_id: row.get("user_id"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
        }))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_expiry(&self, id: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sessions
            SET expires_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
