use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::models::Role;

/// The resolved identity of the caller, extracted from request extensions.
///
/// Intended for routes behind `AuthMiddleware`, which verifies the bearer
/// token and stores the decoded claims. If the claims are missing (the
/// middleware did not run), extraction fails with 401 rather than guessing.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn id(&self) -> i64 {
        self.0.sub
    }

    pub fn is_admin(&self) -> bool {
        self.0.role == Role::Admin
    }

    /// The uniform authorization rule for task access: admins bypass the
    /// ownership check, everyone else must own the task.
    pub fn can_access(&self, owner_id: i64) -> bool {
        self.is_admin() || self.id() == owner_id
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>().cloned() {
            Some(claims) => ready(Ok(AuthenticatedUser(claims))),
            None => {
                let err =
                    AppError::Unauthorized("Not authorized to access this route".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
