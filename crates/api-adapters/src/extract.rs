use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domains::AuthedUser;

use crate::cookies;
use crate::error::WebError;
use crate::flash::{self, Flash};
use crate::ApiContext;

/// The signed-in viewer, if the request carries a valid session cookie.
/// Anonymous requests extract as `CurrentUser(None)`.
pub struct CurrentUser(pub Option<AuthedUser>);

impl FromRequestParts<ApiContext> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ApiContext,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = cookies::get(&parts.headers, cookies::SESSION_COOKIE) else {
            return Ok(Self(None));
        };
        let Some(user_id) = ctx.sessions.verify(&token) else {
            return Ok(Self(None));
        };
        Ok(Self(ctx.accounts.authed_by_id(user_id).await?))
    }
}

/// Like [`CurrentUser`] but bounces anonymous requests to the login page,
/// remembering where they were headed.
pub struct RequireUser(pub AuthedUser);

impl FromRequestParts<ApiContext> for RequireUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ApiContext,
    ) -> Result<Self, Self::Rejection> {
        let next = parts.uri.path().to_string();
        match CurrentUser::from_request_parts(parts, ctx).await? {
            CurrentUser(Some(user)) => Ok(Self(user)),
            CurrentUser(None) => Err(WebError::LoginRequired { next }),
        }
    }
}

/// Notices left by a previous request. Extraction never fails; a missing or
/// mangled cookie is simply an empty list.
pub struct IncomingFlashes(pub Vec<Flash>);

impl<S: Send + Sync> FromRequestParts<S> for IncomingFlashes {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let flashes = cookies::get(&parts.headers, cookies::FLASH_COOKIE)
            .map(|value| flash::decode(&value))
            .unwrap_or_default();
        Ok(Self(flashes))
    }
}
