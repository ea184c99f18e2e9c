use crate::{
    access,
    application::{fallback, home, root},
    config::SessionConfig,
    login::{create_backend, login, logout, register_new_user, BackEnd},
    users, workers,
};
use axum::{middleware, routing::get};
use axum_login::{
    login_required,
    tower_sessions::{MemoryStore, SessionManagerLayer},
    AuthManagerLayerBuilder,
};
use axum_messages::MessagesManagerLayer;

pub(super) fn setup(app_state: super::AppState, session: &SessionConfig) -> axum::routing::Router {
    let session_layer =
        SessionManagerLayer::new(MemoryStore::default()).with_secure(session.secure_cookie);
    let login_backend = create_backend(app_state.store.clone());
    let auth_layer = AuthManagerLayerBuilder::new(login_backend, session_layer).build();

    let admin = axum::Router::new()
        .route("/user/list/", get(users::list::get))
        .route(
            "/user/{id}/delete/",
            get(users::delete::get).post(users::delete::post),
        )
        .route("/empleados/", get(workers::list::get))
        .route("/empleados/filtrar/", get(workers::list::get))
        .route(
            "/empleados/agregar/",
            get(workers::add::get).post(workers::add::post),
        )
        .route(
            "/empleados/editar/{id}/",
            get(workers::edit::get).post(workers::edit::post),
        )
        .route(
            "/empleados/eliminar/{id}/",
            get(workers::delete::get).post(workers::delete::post),
        )
        .route(
            "/empleados/contacto_emergencia/editar/{id}/",
            get(workers::emergency_contact::get).post(workers::emergency_contact::post),
        )
        .route(
            "/contactos_emergencia/editar/{id}/",
            get(workers::emergency_contact::get).post(workers::emergency_contact::post),
        )
        .route(
            "/empleados/carga_familiar/editar/{id}/",
            get(workers::dependent::get).post(workers::dependent::post),
        )
        .route(
            "/cargas_familiares/editar/{id}/",
            get(workers::dependent::get).post(workers::dependent::post),
        )
        .route_layer(middleware::from_fn(access::require_admin));

    axum::Router::new()
        .route("/home/", get(home::get))
        .route(
            "/user/edit/",
            get(users::profile::get).post(users::profile::post),
        )
        .route(
            "/perfil/editar/",
            get(users::profile::get).post(users::profile::post),
        )
        .route(
            "/user/{id}/edit/",
            get(users::edit::get).post(users::edit::post),
        )
        .merge(admin)
        .route_layer(login_required!(BackEnd, login_url = "/login/"))
        .route("/", get(root))
        .route("/login/", get(login::get).post(login::post))
        .route("/logout/", get(logout::get).post(logout::post))
        .route(
            "/register/",
            get(register_new_user::get).post(register_new_user::post),
        )
        .layer(MessagesManagerLayer)
        .layer(auth_layer)
        .fallback(fallback)
        .with_state(app_state)
}
