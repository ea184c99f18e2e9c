use crate::{error::Error, login::BackEnd};
use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_login::AuthSession;
use axum_messages::Messages;

/// A flash message ready for display.
pub struct Notice {
    pub level: String,
    pub text: String,
}

pub fn notices(messages: Messages) -> Vec<Notice> {
    messages
        .into_iter()
        .map(|message| Notice {
            level: format!("{:?}", message.level).to_lowercase(),
            text: message.message,
        })
        .collect()
}

pub fn render(template: impl Template) -> Result<Response, Error> {
    Ok(Html(template.render()?).into_response())
}

/// Flashes `text` as an error and sends the browser to `to`.
pub fn redirect_with_error(messages: Messages, text: impl Into<String>, to: &str) -> Response {
    messages.error(text);
    Redirect::to(to).into_response()
}

pub mod home {
    use super::*;

    #[derive(Template)]
    #[template(path = "home.html")]
    pub struct HomeTemplate {
        notices: Vec<Notice>,
        display_name: String,
        position: String,
        is_admin: bool,
    }

    pub async fn get(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
    ) -> Result<Response, Error> {
        let user = crate::login::signed_in(&auth_session)?;
        let worker = app_state.store.load_worker_by_user(user.id).await?;
        let (display_name, position) = match worker {
            Some(worker) => (worker.name, worker.position),
            None => (user.username.clone(), String::new()),
        };
        render(HomeTemplate {
            notices: notices(messages),
            display_name,
            position,
            is_admin: user.is_admin(),
        })
    }
}

pub async fn root() -> Redirect {
    Redirect::to("/login/")
}

pub async fn fallback(_uri: axum::http::Uri) -> impl IntoResponse {
    (axum::http::StatusCode::NOT_FOUND, "not found")
}
