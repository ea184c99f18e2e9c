use crate::{
    application::{notices, redirect_with_error, render, Notice},
    error::Error,
    forms::{FieldErrors, ProfileForm, UserDetailsForm},
    login::{signed_in, BackEnd},
};
use askama::Template;
use axum::{
    extract::{FromRequest, Path, Request, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_login::AuthSession;
use axum_messages::Messages;
use rrhh_core::choices::{label_of, ROLES};

const USER_LIST: &str = "/user/list/";

fn missing_user(messages: Messages) -> Response {
    redirect_with_error(messages, "El usuario no existe.", USER_LIST)
}

pub mod list {
    use super::*;

    pub struct UserRow {
        pub id: i32,
        pub username: String,
        pub full_name: String,
        pub email: String,
        pub role: String,
        pub is_staff: bool,
    }

    #[derive(Template)]
    #[template(path = "user_list.html")]
    pub struct UserListTemplate {
        notices: Vec<Notice>,
        users: Vec<UserRow>,
        current_user_id: i32,
    }

    pub async fn get(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
    ) -> Result<Response, Error> {
        let current_user_id = signed_in(&auth_session)?.id;
        let users = app_state
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|(user, rol)| UserRow {
                id: user.id,
                full_name: format!("{} {}", user.first_name, user.last_name)
                    .trim()
                    .to_owned(),
                username: user.username,
                email: user.email,
                role: rol.map(|rol| label_of(ROLES, &rol)).unwrap_or_default(),
                is_staff: user.is_staff,
            })
            .collect();
        render(UserListTemplate {
            notices: notices(messages),
            users,
            current_user_id,
        })
    }
}

pub mod delete {
    use super::*;

    #[derive(Template)]
    #[template(path = "user_delete.html")]
    pub struct UserDeleteTemplate {
        notices: Vec<Notice>,
        username: String,
    }

    pub async fn get(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(user_id): Path<i32>,
    ) -> Result<Response, Error> {
        let current_user_id = signed_in(&auth_session)?.id;
        if let Err(denied) = rrhh_core::access::ensure_not_own_account(current_user_id, Some(user_id)) {
            return Ok(redirect_with_error(messages, denied.to_string(), USER_LIST));
        }
        let Some(user) = app_state.store.load_user_by_id(user_id).await? else {
            return Ok(missing_user(messages));
        };
        render(UserDeleteTemplate {
            notices: notices(messages),
            username: user.username,
        })
    }

    pub async fn post(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(user_id): Path<i32>,
    ) -> Result<Response, Error> {
        let current_user_id = signed_in(&auth_session)?.id;
        if let Err(denied) = rrhh_core::access::ensure_not_own_account(current_user_id, Some(user_id)) {
            return Ok(redirect_with_error(messages, denied.to_string(), USER_LIST));
        }
        match app_state.store.delete_user(user_id).await {
            Ok(()) => {
                tracing::info!(user_id, deleted_by = current_user_id, "deleted user");
                messages.success("El usuario ha sido eliminado.");
                Ok(Redirect::to(USER_LIST).into_response())
            }
            Err(rrhh_db::Error::NotFound) => Ok(missing_user(messages)),
            Err(err) => Err(err.into()),
        }
    }
}

/// A worker editing their own record, emergency contact, dependent and password.
pub mod profile {
    use super::*;

    #[derive(Template)]
    #[template(path = "user_edit.html")]
    pub struct ProfileTemplate {
        notices: Vec<Notice>,
        worker_name: String,
        rut: String,
        form: ProfileForm,
        errors: FieldErrors,
        sexes: &'static [rrhh_core::choices::Choice],
    }

    fn no_worker(messages: Messages) -> Response {
        redirect_with_error(
            messages,
            "Tu cuenta no está asociada a un trabajador.",
            "/home/",
        )
    }

    pub async fn get(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
    ) -> Result<Response, Error> {
        let user_id = signed_in(&auth_session)?.id;
        let Some(worker) = app_state.store.load_worker_by_user(user_id).await? else {
            return Ok(no_worker(messages));
        };
        let contact = app_state.store.load_emergency_contact(worker.id).await?;
        let dependent = app_state.store.load_dependent(worker.id).await?;
        render(ProfileTemplate {
            notices: notices(messages),
            form: ProfileForm::from_records(&worker, contact.as_ref(), dependent.as_ref()),
            worker_name: worker.name,
            rut: worker.rut,
            errors: FieldErrors::default(),
            sexes: rrhh_core::choices::SEX,
        })
    }

    pub async fn post(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Form(form): Form<ProfileForm>,
    ) -> Result<Response, Error> {
        save(auth_session, messages, &app_state.store, form).await
    }

    pub(super) async fn save(
        mut auth_session: AuthSession<BackEnd>,
        messages: Messages,
        store: &rrhh_db::Store,
        form: ProfileForm,
    ) -> Result<Response, Error> {
        let user_id = signed_in(&auth_session)?.id;
        let Some(worker) = store.load_worker_by_user(user_id).await? else {
            return Ok(no_worker(messages));
        };
        let rerender = |messages: Messages, form: &ProfileForm, errors: FieldErrors| {
            render(ProfileTemplate {
                notices: notices(messages),
                worker_name: worker.name.clone(),
                rut: worker.rut.clone(),
                form: form.without_passwords(),
                errors,
                sexes: rrhh_core::choices::SEX,
            })
        };
        let profile = match form.validate() {
            Ok(profile) => profile,
            Err(errors) => return rerender(messages, &form, errors),
        };
        let new_password_hash = match &profile.password_change {
            None => None,
            Some(change) => {
                let Some(user) = store.load_user_by_id(user_id).await? else {
                    return Err(Error::NotSignedIn);
                };
                if !rrhh_core::password::verify_password(&change.old_password, &user.password)? {
                    let mut errors = FieldErrors::default();
                    errors.add(
                        "old_password",
                        "Su contraseña antigua es incorrecta. Por favor, inténtelo de nuevo.",
                    );
                    return rerender(messages, &form, errors);
                }
                Some(rrhh_core::password::hash_password(&change.new_password)?)
            }
        };
        let password_changed = new_password_hash.is_some();
        store
            .update_profile(
                user_id,
                worker.id,
                rrhh_db::models::ProfileUpdate {
                    address: profile.address,
                    phone: profile.phone,
                    contact: profile.contact,
                    dependent: profile.dependent,
                    new_password_hash,
                },
            )
            .await?;
        if password_changed {
            // The session hash is derived from the stored password; log in again
            // with the fresh record so this session survives the change.
            if let Some(session_user) = store.load_session_user(user_id).await? {
                auth_session.login(&session_user.into()).await?;
            }
            tracing::info!(user_id, "password changed");
        }
        messages.success("Perfil actualizado exitosamente.");
        Ok(Redirect::to("/home/").into_response())
    }
}

/// `/user/{id}/edit/`: the own profile when `id` is the signed-in account,
/// otherwise an administrative edit of that account's user details.
pub mod edit {
    use super::*;

    #[derive(Template)]
    #[template(path = "user_details_edit.html")]
    pub struct UserDetailsTemplate {
        notices: Vec<Notice>,
        username: String,
        form: UserDetailsForm,
        errors: FieldErrors,
        roles: &'static [rrhh_core::choices::Choice],
    }

    /// The signed-in account and whether it may edit other accounts.
    fn current(
        auth_session: &AuthSession<BackEnd>,
    ) -> Result<(i32, Result<(), rrhh_core::access::Denied>), Error> {
        let user = signed_in(auth_session)?;
        Ok((
            user.id,
            rrhh_core::access::require_admin(user.is_staff, user.rol.as_deref()),
        ))
    }

    pub async fn get(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(user_id): Path<i32>,
    ) -> Result<Response, Error> {
        let (current_user_id, admin) = current(&auth_session)?;
        if current_user_id == user_id {
            return profile::get(auth_session, messages, State(app_state)).await;
        }
        if let Err(denied) = admin {
            return Ok(redirect_with_error(messages, denied.to_string(), "/home/"));
        }
        let Some(target) = app_state.store.load_user_by_id(user_id).await? else {
            return Ok(missing_user(messages));
        };
        let details = app_state.store.load_user_details(user_id).await?;
        render(UserDetailsTemplate {
            notices: notices(messages),
            username: target.username,
            form: UserDetailsForm::from_details(details.as_ref()),
            errors: FieldErrors::default(),
            roles: ROLES,
        })
    }

    pub async fn post(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(user_id): Path<i32>,
        request: Request,
    ) -> Result<Response, Error> {
        let (current_user_id, admin) = current(&auth_session)?;
        if current_user_id == user_id {
            let form = match Form::<ProfileForm>::from_request(request, &app_state).await {
                Ok(Form(form)) => form,
                Err(rejection) => return Ok(rejection.into_response()),
            };
            return profile::save(auth_session, messages, &app_state.store, form).await;
        }
        if let Err(denied) = admin {
            return Ok(redirect_with_error(messages, denied.to_string(), "/home/"));
        }
        let form = match Form::<UserDetailsForm>::from_request(request, &app_state).await {
            Ok(Form(form)) => form,
            Err(rejection) => return Ok(rejection.into_response()),
        };
        let Some(target) = app_state.store.load_user_by_id(user_id).await? else {
            return Ok(missing_user(messages));
        };
        let fields = match form.validate() {
            Ok(fields) => fields,
            Err(errors) => {
                return render(UserDetailsTemplate {
                    notices: notices(messages),
                    username: target.username,
                    form,
                    errors,
                    roles: ROLES,
                })
            }
        };
        app_state.store.save_user_details(user_id, fields).await?;
        tracing::info!(user_id, edited_by = current_user_id, "updated user details");
        messages.success("Los datos del usuario han sido actualizados.");
        Ok(Redirect::to(USER_LIST).into_response())
    }
}
