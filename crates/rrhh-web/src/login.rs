use crate::{
    application::{notices, render, Notice},
    error::Error,
    forms::{FieldErrors, LoginForm, RegistrationForm},
};
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_login::{AuthSession, AuthUser, AuthnBackend, UserId};
use axum_messages::Messages;
use rs_sha512::HasherContext;
use std::hash::Hasher;

#[derive(Clone, Debug)]
pub struct BackEnd {
    db: rrhh_db::Store,
}

pub(crate) fn create_backend(database: rrhh_db::Store) -> BackEnd {
    BackEnd { db: database }
}

/// The signed-in account as kept in the session. Reloaded on every request,
/// so staff flag and role changes apply immediately.
#[derive(Clone, Debug)]
pub struct User {
    pub(crate) id: i32,
    pub(crate) username: String,
    pub(crate) is_staff: bool,
    pub(crate) rol: Option<String>,
    session_auth_hash: [u8; 64],
}

impl User {
    pub fn is_admin(&self) -> bool {
        rrhh_core::access::is_admin(self.is_staff, self.rol.as_deref())
    }
}

impl AuthUser for User {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        &self.session_auth_hash
    }
}

impl From<(rrhh_db::models::User, Option<String>)> for User {
    fn from(
        (
            rrhh_db::models::User {
                id,
                username,
                password,
                is_staff,
                ..
            },
            rol,
        ): (rrhh_db::models::User, Option<String>),
    ) -> Self {
        // A password change alters the stored hash and with it every older session.
        let mut hasher = rs_sha512::Sha512Hasher::default();
        hasher.write(password.as_bytes());
        let _ = hasher.finish();
        let final_result = HasherContext::finish(&mut hasher);
        Self {
            id,
            username,
            is_staff,
            rol,
            session_auth_hash: final_result.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BackEndError {
    #[error("User database error: {0}")]
    UserDb(#[from] rrhh_db::Error),
    #[error("Password error: {0}")]
    Password(#[from] rrhh_core::password::Error),
}

#[derive(Clone, serde::Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl AuthnBackend for BackEnd {
    type User = User;
    type Credentials = Credentials;
    type Error = BackEndError;

    async fn authenticate(
        &self,
        credentials: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let Some(user) = self.db.load_user_by_username(&credentials.username).await? else {
            return Ok(None);
        };
        if !rrhh_core::password::verify_password(&credentials.password, &user.password)? {
            return Ok(None);
        }
        let rol = self
            .db
            .load_user_details(user.id)
            .await?
            .map(|details| details.rol);
        Ok(Some((user, rol).into()))
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        self.db
            .load_session_user(*user_id)
            .await
            .map_err(Into::into)
            .map(|v| v.map(Into::into))
    }
}

/// The signed-in user. Every route behind `login_required!` has one.
pub fn signed_in(auth_session: &AuthSession<BackEnd>) -> Result<&User, Error> {
    auth_session.user.as_ref().ok_or(Error::NotSignedIn)
}

/// Only same-site absolute paths are followed after logging in.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/home/",
    }
}

pub mod register_new_user {
    use super::*;
    use rrhh_core::choices::EMPLOYEE_ROLE;

    #[derive(Template)]
    #[template(path = "register.html")]
    pub struct RegisterTemplate {
        notices: Vec<Notice>,
        form: RegistrationForm,
        errors: FieldErrors,
    }

    pub async fn get(messages: Messages) -> Result<Response, Error> {
        render(RegisterTemplate {
            notices: notices(messages),
            form: RegistrationForm::default(),
            errors: FieldErrors::default(),
        })
    }

    pub async fn post(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Form(form): Form<RegistrationForm>,
    ) -> Result<Response, Error> {
        let registration = match form.validate() {
            Ok(registration) => registration,
            Err(errors) => return rerender(messages, form, errors),
        };
        if app_state.store.username_exists(&registration.username).await? {
            return rerender(messages, form, username_taken());
        }
        let account = rrhh_db::models::AccountFields {
            password_hash: rrhh_core::password::hash_password(&registration.password)?,
            username: registration.username,
            first_name: registration.first_name,
            last_name: registration.last_name,
            email: registration.email,
            is_staff: false,
            rol: EMPLOYEE_ROLE.to_owned(),
        };
        match app_state.store.register_user(account).await {
            Ok((user, _)) => tracing::info!(user_id = user.id, "registered new user"),
            Err(rrhh_db::Error::Duplicate(_)) => {
                return rerender(messages, form, username_taken())
            }
            Err(err) => return Err(err.into()),
        }
        messages.success("El usuario se ha registrado exitosamente.");
        Ok(Redirect::to("/login/").into_response())
    }

    fn username_taken() -> FieldErrors {
        let mut errors = FieldErrors::default();
        errors.add("username", "Ya existe un usuario con este nombre.");
        errors
    }

    fn rerender(
        messages: Messages,
        form: RegistrationForm,
        errors: FieldErrors,
    ) -> Result<Response, Error> {
        render(RegisterTemplate {
            notices: notices(messages),
            form: form.without_passwords(),
            errors,
        })
    }
}

pub mod login {
    use super::*;

    #[derive(Template)]
    #[template(path = "login.html")]
    pub struct LoginTemplate {
        notices: Vec<Notice>,
        form: LoginForm,
        errors: FieldErrors,
        credentials_rejected: bool,
    }

    #[derive(Debug, serde::Deserialize)]
    pub struct NextUrl {
        next: Option<String>,
    }

    pub async fn get(
        messages: Messages,
        Query(NextUrl { next }): Query<NextUrl>,
    ) -> Result<Response, Error> {
        render(LoginTemplate {
            notices: notices(messages),
            form: LoginForm {
                next,
                ..Default::default()
            },
            errors: FieldErrors::default(),
            credentials_rejected: false,
        })
    }

    pub async fn post(
        mut auth_session: AuthSession<BackEnd>,
        messages: Messages,
        Form(form): Form<LoginForm>,
    ) -> Result<Response, Error> {
        let credentials = match form.validate() {
            Ok(credentials) => credentials,
            Err(errors) => {
                return render(LoginTemplate {
                    notices: notices(messages),
                    form: form.without_password(),
                    errors,
                    credentials_rejected: false,
                })
            }
        };
        let Some(user) = auth_session.authenticate(credentials).await? else {
            tracing::info!(username = %form.username, "rejected log in");
            return render(LoginTemplate {
                notices: notices(messages),
                form: form.without_password(),
                errors: FieldErrors::default(),
                credentials_rejected: true,
            });
        };
        auth_session.login(&user).await?;
        Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
    }
}

pub mod logout {
    use super::*;

    pub async fn get(auth_session: AuthSession<BackEnd>) -> Result<Response, Error> {
        end_session(auth_session).await
    }

    pub async fn post(auth_session: AuthSession<BackEnd>) -> Result<Response, Error> {
        end_session(auth_session).await
    }

    async fn end_session(mut auth_session: AuthSession<BackEnd>) -> Result<Response, Error> {
        auth_session.logout().await?;
        Ok(Redirect::to("/login/").into_response())
    }
}
