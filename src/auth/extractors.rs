use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

use super::session::{Session, SessionKeys};

pub const LOGIN_REQUIRED: &str = "You must be logged in to view this page.";

/// Id of the logged-in user. Without one the request is sent back to
/// `/login` with a notice queued in the session.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let mut session = match Session::from_request_parts(parts, state).await {
            Ok(s) => s,
            Err(never) => match never {},
        };

        match session.current_user_id() {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                warn!(uri = %parts.uri, "unauthenticated request");
                session.flash(LOGIN_REQUIRED);
                Err((session, Redirect::to("/login")).into_response())
            }
        }
    }
}
