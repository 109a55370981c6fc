use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role. Stored as TEXT in the `users` table.
///
/// Admins bypass the ownership check on every task operation; the role is
/// fixed at registration (there is no role-change endpoint).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// Full user row, including the bcrypt password hash. Internal only; the
/// hash must never cross the API boundary.
#[derive(Debug, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// The user view returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
