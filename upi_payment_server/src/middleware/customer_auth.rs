//! Bearer token middleware.
//!
//! Place it on any scope whose routes belong to a customer. It resolves the `Authorization: Bearer` token through the
//! [`AuthApi`] registered as app data and stores the resulting [`User`] in the request extensions, where the
//! [`AuthenticatedUser`](crate::auth::AuthenticatedUser) extractor picks it up. Requests without a valid token are
//! answered with 401 before they reach a handler.
use std::{
    future::{ready, Ready},
    marker::PhantomData,
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{debug, error, trace};
use upi_payment_engine::{db_types::User, traits::AuthManagement, AuthApi};

use crate::{
    errors::{AuthError, ServerError},
    helpers::bearer_token,
};

pub struct CustomerAuthMiddlewareFactory<A> {
    _backend: PhantomData<fn() -> A>,
}

impl<A> CustomerAuthMiddlewareFactory<A> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<S, B, A> Transform<S, ServiceRequest> for CustomerAuthMiddlewareFactory<A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: AuthManagement + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = CustomerAuthMiddlewareService<S, A>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CustomerAuthMiddlewareService { service: Rc::new(service), _backend: PhantomData }))
    }
}

pub struct CustomerAuthMiddlewareService<S, A> {
    service: Rc<S>,
    _backend: PhantomData<fn() -> A>,
}

impl<S, B, A> Service<ServiceRequest> for CustomerAuthMiddlewareService<S, A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: AuthManagement + 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            match authenticate::<A>(&req).await {
                Ok(user) => {
                    trace!("🔐️ Request authenticated for user #{}", user.id);
                    req.extensions_mut().insert(user);
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                Err(e) => Ok(req.error_response(e).map_into_right_body()),
            }
        })
    }
}

async fn authenticate<A: AuthManagement + 'static>(req: &ServiceRequest) -> Result<User, ServerError> {
    let token = bearer_token(req.headers()).ok_or(ServerError::AuthenticationError(AuthError::MissingCredentials))?;
    let api = req.app_data::<web::Data<AuthApi<A>>>().cloned().ok_or_else(|| {
        error!("🔐️ AuthApi is not registered as app data. Cannot authenticate requests.");
        ServerError::ConfigurationError("Authentication is not available.".to_string())
    })?;
    api.current_user(&token).await.map_err(|e| {
        debug!("🔐️ Bearer token rejected. {e}");
        ServerError::from(e)
    })
}
