use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::login::BackEnd;

/// Failures a handler cannot turn into a form error or a flash notice.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("database: {0}")]
    Db(#[from] rrhh_db::Error),
    #[error("password: {0}")]
    Password(#[from] rrhh_core::password::Error),
    #[error("template rendering: {0}")]
    Template(#[from] askama::Error),
    #[error("session: {0}")]
    Session(#[from] axum_login::Error<BackEnd>),
    #[error("no user signed in")]
    NotSignedIn,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::NotSignedIn => Redirect::to("/login/").into_response(),
            err => {
                tracing::error!("request failed: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
