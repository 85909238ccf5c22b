use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Response;

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the caller, used as the ownership key for directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl Principal {
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// Attaches a [`Principal`] to every request that carries a non-blank
/// `x-user-id` header. Requests without one pass through untouched; routes
/// that need an identity reject them through the extractor.
#[derive(Clone, Default)]
pub struct IdentityLayer;

impl IdentityLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> tower::Layer<S> for IdentityLayer {
    type Service = IdentityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityService { inner }
    }
}

#[derive(Clone)]
pub struct IdentityService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for IdentityService<S>
where
    S: tower::Service<axum::http::Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        // Swap so the instance that was driven ready handles this request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let principal = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| Principal(v.to_string()));

        if let Some(principal) = principal {
            req.extensions_mut().insert(principal);
        }

        Box::pin(async move { inner.call(req).await })
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
