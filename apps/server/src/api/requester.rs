//! Requester identity handed over by the authentication layer.

use crate::models::GeoPoint;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use uuid::Uuid;

/// Set as a request extension by whatever authenticates the caller upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedRequester {
    pub id: Uuid,
    /// Location stored on the requester's profile, if any.
    pub location: Option<GeoPoint>,
}

/// The caller of a listing request. Anonymous when no [`AuthenticatedRequester`] is attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requester(pub Option<AuthenticatedRequester>);

impl Requester {
    pub fn stored_location(&self) -> Option<GeoPoint> {
        self.0.as_ref().and_then(|r| r.location)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<AuthenticatedRequester>().cloned()))
    }
}
