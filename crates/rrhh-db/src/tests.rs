//! These tests run against a real PostgreSQL database with the migrations
//! applied. Point `DATABASE_URL` (or `.env`) at it and run with `--ignored`.

use crate::{models, Config, Error, Store};
use dotenvy::dotenv;
use std::{
    env,
    sync::atomic::{AtomicU64, Ordering},
};

pub fn establish_store() -> Store {
    dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    crate::create(&Config::with_url(database_url))
}

fn unique_rut() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seed = jiff::Timestamp::now().as_millisecond().unsigned_abs();
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", 10_000_000 + (seed + n * 7_919) % 89_999_999, n % 10)
}

fn account(username: &str, is_staff: bool) -> models::AccountFields {
    models::AccountFields {
        username: username.to_owned(),
        password_hash: rrhh_core::password::hash_password("clave-de-prueba")
            .expect("hashing should succeed"),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        is_staff,
        rol: rrhh_core::choices::EMPLOYEE_ROLE.to_owned(),
    }
}

fn worker_fields(rut: &str, sex: &str, position: &str, area: &str) -> models::WorkerFields {
    models::WorkerFields {
        rut: rut.to_owned(),
        name: format!("Trabajador {rut}"),
        sex: sex.to_owned(),
        address: "Av. Siempre Viva 742".to_owned(),
        phone: "+56912345678".to_owned(),
        position: position.to_owned(),
        hire_date: jiff::civil::date(2020, 3, 1),
        area: area.to_owned(),
        department: "Operaciones".to_owned(),
    }
}

async fn add_worker(store: &Store, sex: &str, position: &str, area: &str) -> models::Worker {
    let rut = unique_rut();
    store
        .add_worker(account(&rut, false), worker_fields(&rut, sex, position, area))
        .await
        .expect("should add worker")
}

mod worker {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database in DATABASE_URL"]
    async fn it_creates_the_linked_account_and_user_details() {
        let store = establish_store();
        let worker = add_worker(&store, "F", "Analista", "Finanzas").await;
        let user_id = worker.user_id.expect("worker should be linked to an account");
        let (user, rol) = store
            .load_session_user(user_id)
            .await
            .expect("should load")
            .expect("account should exist");
        assert_eq!(user.username, worker.rut, "username should be the worker's RUT");
        assert_eq!(rol.as_deref(), Some(rrhh_core::choices::EMPLOYEE_ROLE));
        assert!(!user.is_staff);
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database in DATABASE_URL"]
    async fn it_rejects_a_second_account_for_the_same_rut() {
        let store = establish_store();
        let worker = add_worker(&store, "M", "Bodeguero", "Logística").await;
        let result = store
            .add_worker(
                account(&worker.rut, false),
                worker_fields(&worker.rut, "M", "Bodeguero", "Logística"),
            )
            .await;
        assert!(matches!(result, Err(Error::Duplicate(_))), "should be a duplicate");
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database in DATABASE_URL"]
    async fn it_and_combines_filters() {
        let store = establish_store();
        let area = format!("Area {}", unique_rut());
        let wanted = add_worker(&store, "F", "Contadora", &area).await;
        add_worker(&store, "M", "Contadora", &area).await;
        add_worker(&store, "F", "Gerente", &area).await;
        let filter = models::WorkerFilter {
            sex: Some("F".to_owned()),
            position: Some("Contadora".to_owned()),
            area: Some(area.clone()),
        };
        let found = store.list_workers(&filter).await.expect("should list");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, wanted.id);
        let only_area = models::WorkerFilter {
            area: Some(area),
            ..Default::default()
        };
        assert_eq!(store.list_workers(&only_area).await.expect("should list").len(), 3);
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database in DATABASE_URL"]
    async fn deleting_it_removes_contact_and_dependent() {
        let store = establish_store();
        let worker = add_worker(&store, "O", "Chofer", "Transporte").await;
        store
            .save_emergency_contact(
                worker.id,
                models::ContactFields {
                    name: "Rosa".to_owned(),
                    relationship: "Madre".to_owned(),
                    phone: "+56987654321".to_owned(),
                },
            )
            .await
            .expect("should save contact");
        store.delete_worker(worker.id).await.expect("should delete");
        assert!(store.load_worker(worker.id).await.expect("should load").is_none());
        assert!(store
            .load_emergency_contact(worker.id)
            .await
            .expect("should load")
            .is_none());
        assert!(matches!(store.delete_worker(worker.id).await, Err(Error::NotFound)));
    }
}

mod emergency_contact {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database in DATABASE_URL"]
    async fn saving_twice_keeps_a_single_row() {
        let store = establish_store();
        let worker = add_worker(&store, "F", "Secretaria", "Administración").await;
        assert!(store
            .load_emergency_contact(worker.id)
            .await
            .expect("should load")
            .is_none());
        let first = store
            .save_emergency_contact(
                worker.id,
                models::ContactFields {
                    name: "Juan".to_owned(),
                    relationship: "Hermano".to_owned(),
                    phone: "+56911111111".to_owned(),
                },
            )
            .await
            .expect("should create contact");
        let second = store
            .save_emergency_contact(
                worker.id,
                models::ContactFields {
                    name: "Pedro".to_owned(),
                    relationship: "Padre".to_owned(),
                    phone: "+56922222222".to_owned(),
                },
            )
            .await
            .expect("should update contact");
        assert_eq!(first.id, second.id, "the existing row should be reused");
        assert_eq!(second.name, "Pedro");
        assert_eq!(second.phone, "+56922222222");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database in DATABASE_URL"]
    async fn it_updates_every_part_together() {
        let store = establish_store();
        let worker = add_worker(&store, "M", "Técnico", "Mantención").await;
        let user_id = worker.user_id.expect("worker should be linked");
        let new_hash = rrhh_core::password::hash_password("otra-clave-segura")
            .expect("hashing should succeed");
        store
            .update_profile(
                user_id,
                worker.id,
                models::ProfileUpdate {
                    address: "Calle Nueva 123".to_owned(),
                    phone: "+56933333333".to_owned(),
                    contact: models::ContactFields {
                        name: "Ana".to_owned(),
                        relationship: "Esposa".to_owned(),
                        phone: "+56944444444".to_owned(),
                    },
                    dependent: models::DependentFields {
                        name: "Tomás".to_owned(),
                        relationship: "Hijo".to_owned(),
                        sex: "M".to_owned(),
                        rut: "23456789-0".to_owned(),
                    },
                    new_password_hash: Some(new_hash.clone()),
                },
            )
            .await
            .expect("should update profile");
        let reloaded = store
            .load_worker(worker.id)
            .await
            .expect("should load")
            .expect("worker should exist");
        assert_eq!(reloaded.address, "Calle Nueva 123");
        assert_eq!(reloaded.phone, "+56933333333");
        assert_eq!(
            store
                .load_dependent(worker.id)
                .await
                .expect("should load")
                .expect("dependent should exist")
                .name,
            "Tomás"
        );
        let user = store
            .load_user_by_id(user_id)
            .await
            .expect("should load")
            .expect("user should exist");
        assert_eq!(user.password, new_hash);
    }
}

mod user {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database in DATABASE_URL"]
    async fn deleting_it_unlinks_the_worker() {
        let store = establish_store();
        let worker = add_worker(&store, "F", "Cajera", "Ventas").await;
        let user_id = worker.user_id.expect("worker should be linked");
        store.delete_user(user_id).await.expect("should delete user");
        let reloaded = store
            .load_worker(worker.id)
            .await
            .expect("should load")
            .expect("worker should remain");
        assert_eq!(reloaded.user_id, None);
        assert!(store.load_user_details(user_id).await.expect("should load").is_none());
    }

    #[tokio::test]
    #[ignore = "requires a migrated PostgreSQL database in DATABASE_URL"]
    async fn registering_creates_user_details_with_the_given_role() {
        let store = establish_store();
        let username = format!("registro-{}", unique_rut());
        let (user, details) = store
            .register_user(account(&username, false))
            .await
            .expect("should register");
        assert_eq!(details.user_id, user.id);
        assert!(store.username_exists(&username).await.expect("should check"));
        assert!(matches!(
            store.register_user(account(&username, false)).await,
            Err(Error::Duplicate(_))
        ));
    }
}
