//! Role and permission models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Role entity
///
/// A named permission group, e.g. "admin" or "event-management".
/// Many-to-many with users.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Permission entity
///
/// A named capability, e.g. "event-create". Many-to-many with roles; users
/// only ever hold permissions through their roles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}
