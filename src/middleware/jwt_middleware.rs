/// Access Token Middleware
///
/// Authenticates the bearer access token on protected routes and injects
/// the caller's identity into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use uuid::Uuid;

use crate::auth::authenticate;
use crate::configuration::AuthSettings;
use crate::error::AppError;

/// Identity of the caller, available to handlers as `web::ReqData<AuthenticatedUser>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

/// Middleware for protecting routes
///
/// Every rejection (missing header, wrong scheme, bad signature, expiry)
/// becomes the same 401 response.
pub struct JwtMiddleware {
    settings: AuthSettings,
}

impl JwtMiddleware {
    pub fn new(settings: AuthSettings) -> Self {
        Self { settings }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            secret: Rc::from(self.settings.jwt_secret.as_str()),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    secret: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(req.headers(), &self.secret) {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUser(user_id));
                tracing::debug!(user_id = %user_id, "Access token accepted");

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let err: Error = AppError::Auth(e).into();
                Box::pin(async move { Err(err) })
            }
        }
    }
}
