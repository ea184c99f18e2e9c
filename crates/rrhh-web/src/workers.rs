use crate::{
    application::{notices, redirect_with_error, render, Notice},
    error::Error,
    forms::{DependentForm, EmergencyContactForm, FieldErrors, FilterQuery, WorkerForm},
    login::{signed_in, BackEnd},
};
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_login::AuthSession;
use axum_messages::Messages;
use rrhh_core::choices::{label_of, Choice, SEX};

const WORKER_LIST: &str = "/empleados/";

fn missing_worker(messages: Messages) -> Response {
    redirect_with_error(messages, "El trabajador no existe.", WORKER_LIST)
}

pub mod list {
    use super::*;

    pub struct WorkerRow {
        pub id: i32,
        pub rut: String,
        pub name: String,
        pub sex: String,
        pub position: String,
        pub area: String,
        pub department: String,
        pub hire_date: String,
    }

    #[derive(Template)]
    #[template(path = "worker_list.html")]
    pub struct WorkerListTemplate {
        notices: Vec<Notice>,
        workers: Vec<WorkerRow>,
        filter: FilterQuery,
        sexes: &'static [Choice],
        positions: Vec<String>,
        areas: Vec<String>,
    }

    /// Serves both `/empleados/` and `/empleados/filtrar/`.
    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Query(filter): Query<FilterQuery>,
    ) -> Result<Response, Error> {
        let workers = app_state
            .store
            .list_workers(&filter.to_filter())
            .await?
            .into_iter()
            .map(|worker| WorkerRow {
                id: worker.id,
                sex: label_of(SEX, &worker.sex),
                hire_date: worker.hired_on().to_string(),
                rut: worker.rut,
                name: worker.name,
                position: worker.position,
                area: worker.area,
                department: worker.department,
            })
            .collect();
        let (positions, areas) = app_state.store.worker_filter_options().await?;
        render(WorkerListTemplate {
            notices: notices(messages),
            workers,
            filter,
            sexes: SEX,
            positions,
            areas,
        })
    }
}

#[derive(Template)]
#[template(path = "worker_form.html")]
pub struct WorkerFormTemplate {
    notices: Vec<Notice>,
    title: &'static str,
    is_new: bool,
    form: WorkerForm,
    errors: FieldErrors,
    sexes: &'static [Choice],
}

impl WorkerFormTemplate {
    fn adding(notices: Vec<Notice>, form: WorkerForm, errors: FieldErrors) -> Self {
        Self {
            notices,
            title: "Agregar trabajador",
            is_new: true,
            form: form.without_password(),
            errors,
            sexes: SEX,
        }
    }

    fn editing(notices: Vec<Notice>, form: WorkerForm, errors: FieldErrors) -> Self {
        Self {
            notices,
            title: "Editar trabajador",
            is_new: false,
            form,
            errors,
            sexes: SEX,
        }
    }
}

pub mod add {
    use super::*;
    use rrhh_db::models::AccountFields;

    pub async fn get(messages: Messages) -> Result<Response, Error> {
        render(WorkerFormTemplate::adding(
            notices(messages),
            WorkerForm::default(),
            FieldErrors::default(),
        ))
    }

    /// Creates the worker together with its account. The RUT doubles as the
    /// username.
    pub async fn post(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Form(form): Form<WorkerForm>,
    ) -> Result<Response, Error> {
        let new_worker = match form.validate_new() {
            Ok(new_worker) => new_worker,
            Err(errors) => {
                return render(WorkerFormTemplate::adding(notices(messages), form, errors))
            }
        };
        let account = AccountFields {
            username: new_worker.worker.rut.clone(),
            password_hash: rrhh_core::password::hash_password(&new_worker.password)?,
            first_name: new_worker.worker.name.clone(),
            last_name: String::new(),
            email: String::new(),
            is_staff: new_worker.is_admin,
            rol: new_worker.role().to_owned(),
        };
        match app_state.store.add_worker(account, new_worker.worker).await {
            Ok(worker) => {
                tracing::info!(worker_id = worker.id, "added worker");
                messages.success("Trabajador agregado exitosamente.");
                Ok(Redirect::to(WORKER_LIST).into_response())
            }
            Err(rrhh_db::Error::Duplicate(constraint)) => {
                tracing::debug!(%constraint, "worker rejected as duplicate");
                let mut errors = FieldErrors::default();
                errors.add("rut", "Ya existe una cuenta con este RUT.");
                render(WorkerFormTemplate::adding(notices(messages), form, errors))
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub mod edit {
    use super::*;

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(worker_id): Path<i32>,
    ) -> Result<Response, Error> {
        let Some(worker) = app_state.store.load_worker(worker_id).await? else {
            return Ok(missing_worker(messages));
        };
        render(WorkerFormTemplate::editing(
            notices(messages),
            WorkerForm::from_worker(&worker),
            FieldErrors::default(),
        ))
    }

    pub async fn post(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(worker_id): Path<i32>,
        Form(form): Form<WorkerForm>,
    ) -> Result<Response, Error> {
        let fields = match form.validate() {
            Ok(fields) => fields,
            Err(errors) => {
                return render(WorkerFormTemplate::editing(notices(messages), form, errors))
            }
        };
        match app_state.store.update_worker(worker_id, fields).await {
            Ok(worker) => {
                tracing::info!(worker_id = worker.id, "updated worker");
                messages.success("Trabajador actualizado exitosamente.");
                Ok(Redirect::to(WORKER_LIST).into_response())
            }
            Err(rrhh_db::Error::NotFound) => Ok(missing_worker(messages)),
            Err(rrhh_db::Error::Duplicate(_)) => {
                let mut errors = FieldErrors::default();
                errors.add("rut", "Ya existe un trabajador con este RUT.");
                render(WorkerFormTemplate::editing(notices(messages), form, errors))
            }
            Err(err) => Err(err.into()),
        }
    }
}

pub mod delete {
    use super::*;

    #[derive(Template)]
    #[template(path = "worker_delete.html")]
    pub struct WorkerDeleteTemplate {
        notices: Vec<Notice>,
        name: String,
        rut: String,
    }

    pub async fn get(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(worker_id): Path<i32>,
    ) -> Result<Response, Error> {
        let current_user_id = signed_in(&auth_session)?.id;
        let Some(worker) = app_state.store.load_worker(worker_id).await? else {
            return Ok(missing_worker(messages));
        };
        if let Err(denied) = rrhh_core::access::ensure_not_own_account(current_user_id, worker.user_id) {
            return Ok(redirect_with_error(messages, denied.to_string(), WORKER_LIST));
        }
        render(WorkerDeleteTemplate {
            notices: notices(messages),
            name: worker.name,
            rut: worker.rut,
        })
    }

    pub async fn post(
        auth_session: AuthSession<BackEnd>,
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(worker_id): Path<i32>,
    ) -> Result<Response, Error> {
        let current_user_id = signed_in(&auth_session)?.id;
        let Some(worker) = app_state.store.load_worker(worker_id).await? else {
            return Ok(missing_worker(messages));
        };
        if let Err(denied) = rrhh_core::access::ensure_not_own_account(current_user_id, worker.user_id) {
            return Ok(redirect_with_error(messages, denied.to_string(), WORKER_LIST));
        }
        match app_state.store.delete_worker(worker_id).await {
            Ok(()) => {
                tracing::info!(worker_id, deleted_by = current_user_id, "deleted worker");
                messages.success("Trabajador eliminado exitosamente.");
                Ok(Redirect::to(WORKER_LIST).into_response())
            }
            Err(rrhh_db::Error::NotFound) => Ok(missing_worker(messages)),
            Err(err) => Err(err.into()),
        }
    }
}

/// Get-or-create of the worker's single emergency contact.
pub mod emergency_contact {
    use super::*;

    #[derive(Template)]
    #[template(path = "emergency_contact_edit.html")]
    pub struct EmergencyContactTemplate {
        notices: Vec<Notice>,
        worker_name: String,
        form: EmergencyContactForm,
        errors: FieldErrors,
    }

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(worker_id): Path<i32>,
    ) -> Result<Response, Error> {
        let Some(worker) = app_state.store.load_worker(worker_id).await? else {
            return Ok(missing_worker(messages));
        };
        let contact = app_state.store.load_emergency_contact(worker_id).await?;
        render(EmergencyContactTemplate {
            notices: notices(messages),
            worker_name: worker.name,
            form: EmergencyContactForm::from_contact(contact.as_ref()),
            errors: FieldErrors::default(),
        })
    }

    pub async fn post(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(worker_id): Path<i32>,
        Form(form): Form<EmergencyContactForm>,
    ) -> Result<Response, Error> {
        let Some(worker) = app_state.store.load_worker(worker_id).await? else {
            return Ok(missing_worker(messages));
        };
        let fields = match form.validate() {
            Ok(fields) => fields,
            Err(errors) => {
                return render(EmergencyContactTemplate {
                    notices: notices(messages),
                    worker_name: worker.name,
                    form,
                    errors,
                })
            }
        };
        app_state
            .store
            .save_emergency_contact(worker_id, fields)
            .await?;
        messages.success("Contacto de emergencia actualizado exitosamente.");
        Ok(Redirect::to(WORKER_LIST).into_response())
    }
}

/// Get-or-create of the worker's single dependent (carga familiar).
pub mod dependent {
    use super::*;

    #[derive(Template)]
    #[template(path = "dependent_edit.html")]
    pub struct DependentTemplate {
        notices: Vec<Notice>,
        worker_name: String,
        form: DependentForm,
        errors: FieldErrors,
        sexes: &'static [Choice],
    }

    pub async fn get(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(worker_id): Path<i32>,
    ) -> Result<Response, Error> {
        let Some(worker) = app_state.store.load_worker(worker_id).await? else {
            return Ok(missing_worker(messages));
        };
        let dependent = app_state.store.load_dependent(worker_id).await?;
        render(DependentTemplate {
            notices: notices(messages),
            worker_name: worker.name,
            form: DependentForm::from_dependent(dependent.as_ref()),
            errors: FieldErrors::default(),
            sexes: SEX,
        })
    }

    pub async fn post(
        messages: Messages,
        State(app_state): State<crate::AppState>,
        Path(worker_id): Path<i32>,
        Form(form): Form<DependentForm>,
    ) -> Result<Response, Error> {
        let Some(worker) = app_state.store.load_worker(worker_id).await? else {
            return Ok(missing_worker(messages));
        };
        let fields = match form.validate() {
            Ok(fields) => fields,
            Err(errors) => {
                return render(DependentTemplate {
                    notices: notices(messages),
                    worker_name: worker.name,
                    form,
                    errors,
                    sexes: SEX,
                })
            }
        };
        app_state.store.save_dependent(worker_id, fields).await?;
        messages.success("Carga familiar actualizada exitosamente.");
        Ok(Redirect::to(WORKER_LIST).into_response())
    }
}
