use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::services::auth::VerifiedIdentity;

/// Identity attached by `middleware::auth::access`, if the route is gated.
///
/// Routes without the gate always see `None`; that is not an error.
pub struct MaybeIdentity(pub Option<VerifiedIdentity>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<VerifiedIdentity>().cloned()))
    }
}
