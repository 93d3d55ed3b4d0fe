//! Operator key middleware.
//!
//! Checks the `X-Operator-Key` header against the configured operator secret before any `/admin` handler runs. A
//! successful check leaves an [`OperatorGrant`] in the request extensions for the
//! [`OperatorAccess`](crate::auth::OperatorAccess) extractor. A failed check is answered immediately, so nothing
//! behind this middleware can change state without the key.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::trace;
use upi_payment_engine::{OperatorGrant, SharedSecret};

use crate::{errors::ServerError, helpers::operator_key};

pub struct OperatorKeyMiddlewareFactory {
    secret: SharedSecret,
}

impl OperatorKeyMiddlewareFactory {
    pub fn new(secret: SharedSecret) -> Self {
        OperatorKeyMiddlewareFactory { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for OperatorKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = OperatorKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(OperatorKeyMiddlewareService { secret: self.secret.clone(), service: Rc::new(service) }))
    }
}

pub struct OperatorKeyMiddlewareService<S> {
    secret: SharedSecret,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for OperatorKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let result = self.secret.authorize(operator_key(req.headers()));
        Box::pin(async move {
            match result {
                Ok(grant) => {
                    trace!("🔐️ Operator key accepted for {}", req.path());
                    req.extensions_mut().insert::<OperatorGrant>(grant);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                Err(e) => Ok(req.error_response(ServerError::from(e)).map_into_right_body()),
            }
        })
    }
}
