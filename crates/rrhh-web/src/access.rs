use crate::login::BackEnd;
use axum::{
    extract::{FromRequestParts, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_login::AuthSession;
use axum_messages::Messages;

/// Route layer for every administrative page. Runs after `login_required!`,
/// so a missing user only happens if the layers are misordered.
///
/// Extracting `Messages` loads the pending notices out of the session, so it
/// happens here only when access is denied. Otherwise the handler's own
/// extraction would find the queue already drained.
pub async fn require_admin(
    auth_session: AuthSession<BackEnd>,
    request: Request,
    next: Next,
) -> Response {
    let Some(user) = &auth_session.user else {
        return Redirect::to("/login/").into_response();
    };
    let Err(denied) = rrhh_core::access::require_admin(user.is_staff, user.rol.as_deref()) else {
        return next.run(request).await;
    };
    tracing::warn!(
        user = %user.username,
        path = %request.uri().path(),
        "administrative page denied"
    );
    let (mut parts, _body) = request.into_parts();
    match Messages::from_request_parts(&mut parts, &()).await {
        Ok(messages) => {
            crate::application::redirect_with_error(messages, denied.to_string(), "/home/")
        }
        Err(rejection) => rejection.into_response(),
    }
}
