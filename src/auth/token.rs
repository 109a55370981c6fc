use crate::error::AppError;
use crate::models::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime in days when `JWT_EXPIRE_DAYS` is unset.
const DEFAULT_EXPIRE_DAYS: i64 = 7;

/// The identity claim carried in every token.
///
/// The claim is authoritative for authorization decisions for its whole
/// validity window; the role is never re-checked against the live user row,
/// so a role change only takes effect once outstanding tokens expire.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub username: String,
    pub role: Role,
    /// Issued-at, seconds since epoch.
    pub iat: usize,
    /// Expiry, seconds since epoch.
    pub exp: usize,
}

fn expire_days() -> i64 {
    std::env::var("JWT_EXPIRE_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_EXPIRE_DAYS)
}

/// Issues a signed token embedding `{id, username, role}`.
///
/// Requires the `JWT_SECRET` environment variable; the lifetime is
/// `JWT_EXPIRE_DAYS` days from now (default 7).
pub fn generate_token(user_id: i64, username: &str, role: Role) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expiration = now
        .checked_add_signed(chrono::Duration::days(expire_days()))
        .ok_or_else(|| AppError::Internal("Token expiry overflow".into()))?;

    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal("JWT_SECRET not set".into()))?;

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

/// Verifies a token's signature and expiry and decodes its claims.
///
/// Fails closed: any malformed, tampered, mis-signed or expired token maps to
/// `AppError::Unauthorized`.
pub fn verify_token(token: &str) -> Result<Claims, AppError> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal("JWT_SECRET not set".into()))?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
