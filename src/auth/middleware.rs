use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::verify_token;
use crate::error::AppError;

/// Bearer-token middleware for the `/api` scope.
///
/// Verifies the `Authorization: Bearer <token>` header on every request
/// except registration and login, and inserts the decoded [`Claims`] into
/// request extensions for the [`AuthenticatedUser`] extractor. Failures are
/// answered directly with the 401 envelope; the wrapped service is never
/// called.
///
/// [`Claims`]: crate::auth::token::Claims
/// [`AuthenticatedUser`]: crate::auth::extractors::AuthenticatedUser
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S> AuthMiddlewareService<S> {
    fn reject<B>(req: ServiceRequest, error: AppError) -> ServiceResponse<EitherBody<B>> {
        let response = error.error_response().map_into_right_body();
        req.into_response(response)
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Registration and login are the only unauthenticated endpoints
        // under this scope. `/api/auth/me` stays protected.
        let path = req.path();
        if path == "/api/auth/register" || path == "/api/auth/login" {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        let bearer = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match bearer {
            Some(token) => match verify_token(token) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    let fut = self.service.call(req);
                    Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
                }
                Err(app_err) => {
                    let res = Self::reject(req, app_err);
                    Box::pin(async move { Ok(res) })
                }
            },
            None => {
                let res = Self::reject(
                    req,
                    AppError::Unauthorized("Not authorized to access this route".into()),
                );
                Box::pin(async move { Ok(res) })
            }
        }
    }
}
