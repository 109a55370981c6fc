pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{PublicUser, Role};

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

/// Payload for `POST /api/auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// 3-30 characters, strictly alphanumeric.
    #[validate(
        length(min = 3, max = 30, message = "username must be between 3 and 30 characters"),
        regex(
            path = "crate::validation::USERNAME_REGEX",
            message = "username must contain only letters and digits"
        )
    )]
    pub username: String,

    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,

    /// Optional; defaults to `user`. An unknown value is rejected at
    /// deserialization.
    pub role: Option<Role>,
}

/// Payload for `POST /api/auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Response for successful registration and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    /// Signed identity claim presented as a bearer token on later requests.
    pub token: String,
    pub user: PublicUser,
}
