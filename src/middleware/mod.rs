/// Session authentication middleware and response headers.
///
/// `SessionAuthMiddleware` resolves the current user once per request from
/// the signed session cookie and stashes the id in request extensions; an
/// absent or invalid session is rejected with 401 before the handler runs.
/// `UserId` is the handler-side extractor for that identity.
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorUnauthorized, ResponseError},
    http::header::{HeaderValue, CACHE_CONTROL},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;
use crate::security::{session::SESSION_COOKIE, SessionKey};

/// Identity of the logged-in user, resolved from the session cookie.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

/// Resolve the session cookie without requiring one. Used by the public
/// routes (homepage, signup, login) that render differently when a user
/// is logged in.
pub fn maybe_user_id(req: &HttpRequest, key: &SessionKey) -> Option<Uuid> {
    let cookie = req.cookie(SESSION_COOKIE)?;
    key.verify(cookie.value())
}

pub struct SessionAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for SessionAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(SessionAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionAuthMiddlewareService<S> {
    service: Rc<S>,
}

// Rejections are built as responses rather than service errors, so outer
// middleware (response headers, logging) still runs on the 401 path.
impl<S, B> Service<ServiceRequest> for SessionAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let key = match req.app_data::<web::Data<SessionKey>>() {
                Some(key) => key.clone(),
                None => {
                    let response =
                        AppError::Internal("Session key not configured".to_string())
                            .error_response();
                    return Ok(req.into_response(response));
                }
            };

            let user_id = req
                .cookie(SESSION_COOKIE)
                .and_then(|cookie| key.verify(cookie.value()));

            let user_id = match user_id {
                Some(id) => id,
                None => {
                    tracing::debug!("Rejected request without a valid session");
                    let response =
                        AppError::Authentication("Login required".to_string()).error_response();
                    return Ok(req.into_response(response));
                }
            };

            req.extensions_mut().insert(UserId(user_id));

            let res = service.call(req).await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<UserId>().copied() {
            Some(user_id) => ready(Ok(user_id)),
            None => ready(Err(ErrorUnauthorized("Login required"))),
        }
    }
}

/// Adds `Cache-Control: no-store` to every response.
pub struct NoStoreCacheControl;

impl<S, B> Transform<S, ServiceRequest> for NoStoreCacheControl
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = NoStoreCacheControlService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(NoStoreCacheControlService {
            service: Rc::new(service),
        }))
    }
}

pub struct NoStoreCacheControlService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for NoStoreCacheControlService<S>
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
        let service = self.service.clone();

        Box::pin(async move {
            let mut res = service.call(req).await?;
            res.headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            Ok(res)
        })
    }
}
