use diesel::{prelude::*, result::DatabaseErrorKind, upsert::excluded};
use diesel_async::{
    pooled_connection::{
        mobc::{Builder, Pool},
        AsyncDieselConnectionManager,
    },
    scoped_futures::ScopedFutureExt,
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use std::time::Duration;

pub mod models;
mod schema;
#[cfg(test)]
mod tests;

type Connection = mobc::Connection<AsyncDieselConnectionManager<AsyncPgConnection>>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("getting connection from pool: {0}")]
    GetConnectionPool(#[from] mobc::Error<diesel_async::pooled_connection::PoolError>),
    #[error("result failure: {0}")]
    Result(diesel::result::Error),
    #[error("duplicate value violates unique constraint {0}")]
    Duplicate(String),
    #[error("Not Found")]
    NotFound,
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Duplicate(info.constraint_name().unwrap_or_default().to_owned())
            }
            err => Self::Result(err),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Store {
    pool: Pool<AsyncPgConnection>,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    db_url: String,
    max_open: u64,
    max_idle: u64,
    #[serde(with = "humantime_serde", default)]
    max_lifetime: Option<Duration>,
    #[serde(with = "humantime_serde", default)]
    max_idle_lifetime: Option<Duration>,
    #[serde(with = "humantime_serde")]
    timeout_for_get: Duration,
}

impl Config {
    /// Pool settings suitable for tools and tests that only know the database URL.
    pub fn with_url(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            max_open: 4,
            max_idle: 1,
            max_lifetime: None,
            max_idle_lifetime: None,
            timeout_for_get: Duration::from_secs(5),
        }
    }

    pub fn set_db_url(&mut self, db_url: impl Into<String>) {
        self.db_url = db_url.into();
    }
}

/// Builds the pool. Connections are opened lazily on first use.
pub fn create(config: &Config) -> Store {
    Store {
        pool: create_pool(config),
    }
}

fn create_pool(config: &Config) -> Pool<AsyncPgConnection> {
    let builder = Builder::new()
        .max_open(config.max_open)
        .max_idle(config.max_idle)
        .max_lifetime(
            config
                .max_lifetime
                .map(|v| v.max(Duration::from_secs(3600))),
        )
        .max_idle_lifetime(
            config
                .max_idle_lifetime
                .map(|v| v.max(Duration::from_secs(900))),
        )
        .get_timeout(Some(config.timeout_for_get.max(Duration::from_secs(5))));
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.db_url);
    builder.build(manager)
}

impl Store {
    async fn connection(&self) -> Result<Connection, Error> {
        self.pool.get().await.map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_user_by_username(&self, name: &str) -> Result<Option<models::User>, Error> {
        use schema::rrhh::user::dsl::*;
        let mut conn = self.connection().await?;
        user.filter(username.eq(name))
            .select(models::User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_user_by_id(&self, user_id: i32) -> Result<Option<models::User>, Error> {
        use schema::rrhh::user::dsl::*;
        let mut conn = self.connection().await?;
        user.filter(id.eq(user_id))
            .select(models::User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    /// The account together with its role, as needed on every authenticated request.
    #[tracing::instrument(skip(self))]
    pub async fn load_session_user(
        &self,
        user_id: i32,
    ) -> Result<Option<(models::User, Option<String>)>, Error> {
        use schema::rrhh::{user, user_details};
        let mut conn = self.connection().await?;
        user::table
            .left_join(user_details::table)
            .filter(user::id.eq(user_id))
            .select((models::User::as_select(), user_details::rol.nullable()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn username_exists(&self, name: &str) -> Result<bool, Error> {
        use schema::rrhh::user;
        let mut conn = self.connection().await?;
        diesel::select(diesel::dsl::exists(
            user::table.filter(user::username.eq(name)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<(models::User, Option<String>)>, Error> {
        use schema::rrhh::{user, user_details};
        let mut conn = self.connection().await?;
        user::table
            .left_join(user_details::table)
            .order(user::username.asc())
            .select((models::User::as_select(), user_details::rol.nullable()))
            .load(&mut conn)
            .await
            .map_err(Into::into)
    }

    /// Creates an account and its user details in one transaction.
    #[tracing::instrument(skip(self, account), fields(username = %account.username))]
    pub async fn register_user(
        &self,
        account: models::AccountFields,
    ) -> Result<(models::User, models::UserDetails), Error> {
        let now: jiff_diesel::Timestamp = jiff::Timestamp::now().into();
        let (new_user, rol) = new_user(account, now);
        self.connection()
            .await?
            .transaction(|conn| {
                use schema::rrhh::{user, user_details};
                async move {
                    let new_user = diesel::insert_into(user::table)
                        .values(new_user)
                        .returning(models::User::as_returning())
                        .get_result(conn)
                        .await?;
                    let new_user_details = diesel::insert_into(user_details::table)
                        .values(new_user_details(new_user.id, rol, now))
                        .returning(models::UserDetails::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok::<_, Error>((new_user, new_user_details))
                }
                .scope_boxed()
            })
            .await
    }

    /// Deleting an account unlinks its worker record rather than removing it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, user_id: i32) -> Result<(), Error> {
        use schema::rrhh::user;
        let mut conn = self.connection().await?;
        match diesel::delete(user::table.find(user_id))
            .execute(&mut conn)
            .await?
        {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_user_details(
        &self,
        user_id: i32,
    ) -> Result<Option<models::UserDetails>, Error> {
        use schema::rrhh::user_details;
        let mut conn = self.connection().await?;
        user_details::table
            .filter(user_details::user_id.eq(user_id))
            .select(models::UserDetails::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    /// Accounts created before user details existed get their row on first save.
    #[tracing::instrument(skip(self))]
    pub async fn save_user_details(
        &self,
        user_id: i32,
        fields: models::UserDetailsFields,
    ) -> Result<models::UserDetails, Error> {
        use schema::rrhh::user_details::dsl as details;
        let now: jiff_diesel::Timestamp = jiff::Timestamp::now().into();
        let new_details = models::NewUserDetails {
            user_id,
            rol: fields.rol,
            birth_date: fields.birth_date.map(Into::into),
            phone: fields.phone,
            document_number: fields.document_number,
            check_digit: fields.check_digit,
            passport: fields.passport,
            created: now,
            updated: now,
        };
        let mut conn = self.connection().await?;
        diesel::insert_into(details::user_details)
            .values(new_details)
            .on_conflict(details::user_id)
            .do_update()
            .set((
                details::rol.eq(excluded(details::rol)),
                details::birth_date.eq(excluded(details::birth_date)),
                details::phone.eq(excluded(details::phone)),
                details::document_number.eq(excluded(details::document_number)),
                details::check_digit.eq(excluded(details::check_digit)),
                details::passport.eq(excluded(details::passport)),
                details::updated.eq(excluded(details::updated)),
            ))
            .returning(models::UserDetails::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_worker(&self, worker_id: i32) -> Result<Option<models::Worker>, Error> {
        use schema::rrhh::worker::dsl::*;
        let mut conn = self.connection().await?;
        worker
            .find(worker_id)
            .select(models::Worker::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_worker_by_user(
        &self,
        linked_user_id: i32,
    ) -> Result<Option<models::Worker>, Error> {
        use schema::rrhh::worker::dsl::*;
        let mut conn = self.connection().await?;
        worker
            .filter(user_id.eq(linked_user_id))
            .select(models::Worker::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    /// Workers ordered by name, narrowed by every filter column that is set.
    #[tracing::instrument(skip(self))]
    pub async fn list_workers(
        &self,
        filter: &models::WorkerFilter,
    ) -> Result<Vec<models::Worker>, Error> {
        use schema::rrhh::worker;
        let mut query: worker::BoxedQuery<'_, diesel::pg::Pg> = worker::table.into_boxed();
        if let Some(sex) = &filter.sex {
            query = query.filter(worker::sex.eq(sex));
        }
        if let Some(position) = &filter.position {
            query = query.filter(worker::position.eq(position));
        }
        if let Some(area) = &filter.area {
            query = query.filter(worker::area.eq(area));
        }
        let mut conn = self.connection().await?;
        query
            .order((worker::name.asc(), worker::id.asc()))
            .select(models::Worker::as_select())
            .load(&mut conn)
            .await
            .map_err(Into::into)
    }

    /// Distinct positions and areas currently in use, for the filter form.
    #[tracing::instrument(skip(self))]
    pub async fn worker_filter_options(&self) -> Result<(Vec<String>, Vec<String>), Error> {
        use schema::rrhh::worker;
        let mut conn = self.connection().await?;
        let positions = worker::table
            .select(worker::position)
            .distinct()
            .order(worker::position.asc())
            .load(&mut conn)
            .await?;
        let areas = worker::table
            .select(worker::area)
            .distinct()
            .order(worker::area.asc())
            .load(&mut conn)
            .await?;
        Ok((positions, areas))
    }

    /// Creates the account, its user details and the linked worker in one transaction.
    #[tracing::instrument(skip(self, account, worker_fields), fields(rut = %worker_fields.rut))]
    pub async fn add_worker(
        &self,
        account: models::AccountFields,
        worker_fields: models::WorkerFields,
    ) -> Result<models::Worker, Error> {
        let now: jiff_diesel::Timestamp = jiff::Timestamp::now().into();
        let (new_user, rol) = new_user(account, now);
        self.connection()
            .await?
            .transaction(|conn| {
                use schema::rrhh::{user, user_details, worker};
                async move {
                    let new_user = diesel::insert_into(user::table)
                        .values(new_user)
                        .returning(models::User::as_returning())
                        .get_result(conn)
                        .await?;
                    diesel::insert_into(user_details::table)
                        .values(new_user_details(new_user.id, rol, now))
                        .execute(conn)
                        .await?;
                    let new_worker = models::NewWorker {
                        user_id: Some(new_user.id),
                        rut: worker_fields.rut,
                        name: worker_fields.name,
                        sex: worker_fields.sex,
                        address: worker_fields.address,
                        phone: worker_fields.phone,
                        position: worker_fields.position,
                        hire_date: worker_fields.hire_date.into(),
                        area: worker_fields.area,
                        department: worker_fields.department,
                        created: now,
                        updated: now,
                    };
                    let new_worker = diesel::insert_into(worker::table)
                        .values(new_worker)
                        .returning(models::Worker::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok::<_, Error>(new_worker)
                }
                .scope_boxed()
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_worker(
        &self,
        worker_id: i32,
        fields: models::WorkerFields,
    ) -> Result<models::Worker, Error> {
        use schema::rrhh::worker;
        let changes = models::WorkerChanges {
            rut: fields.rut,
            name: fields.name,
            sex: fields.sex,
            address: fields.address,
            phone: fields.phone,
            position: fields.position,
            hire_date: fields.hire_date.into(),
            area: fields.area,
            department: fields.department,
            updated: jiff::Timestamp::now().into(),
        };
        let mut conn = self.connection().await?;
        diesel::update(worker::table.find(worker_id))
            .set(changes)
            .returning(models::Worker::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(Into::into)
    }

    /// Removes the worker together with its emergency contact and dependent.
    #[tracing::instrument(skip(self))]
    pub async fn delete_worker(&self, worker_id: i32) -> Result<(), Error> {
        use schema::rrhh::worker;
        let mut conn = self.connection().await?;
        match diesel::delete(worker::table.find(worker_id))
            .execute(&mut conn)
            .await?
        {
            0 => Err(Error::NotFound),
            _ => Ok(()),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_emergency_contact(
        &self,
        of_worker: i32,
    ) -> Result<Option<models::EmergencyContact>, Error> {
        use schema::rrhh::emergency_contact::dsl::*;
        let mut conn = self.connection().await?;
        emergency_contact
            .filter(worker_id.eq(of_worker))
            .select(models::EmergencyContact::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    /// Creates the worker's emergency contact or replaces the existing one.
    #[tracing::instrument(skip(self))]
    pub async fn save_emergency_contact(
        &self,
        worker_id: i32,
        fields: models::ContactFields,
    ) -> Result<models::EmergencyContact, Error> {
        let now: jiff_diesel::Timestamp = jiff::Timestamp::now().into();
        let mut conn = self.connection().await?;
        upsert_emergency_contact(&mut conn, new_emergency_contact(worker_id, fields, now))
            .await
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_dependent(
        &self,
        of_worker: i32,
    ) -> Result<Option<models::Dependent>, Error> {
        use schema::rrhh::dependent::dsl::*;
        let mut conn = self.connection().await?;
        dependent
            .filter(worker_id.eq(of_worker))
            .select(models::Dependent::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(Into::into)
    }

    /// Creates the worker's dependent or replaces the existing one.
    #[tracing::instrument(skip(self))]
    pub async fn save_dependent(
        &self,
        worker_id: i32,
        fields: models::DependentFields,
    ) -> Result<models::Dependent, Error> {
        let now: jiff_diesel::Timestamp = jiff::Timestamp::now().into();
        let mut conn = self.connection().await?;
        upsert_dependent(&mut conn, new_dependent(worker_id, fields, now))
            .await
            .map_err(Into::into)
    }

    /// Applies a worker's own profile edit. Either every part is stored or none is.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: i32,
        worker_id: i32,
        update: models::ProfileUpdate,
    ) -> Result<(), Error> {
        let now: jiff_diesel::Timestamp = jiff::Timestamp::now().into();
        let models::ProfileUpdate {
            address,
            phone,
            contact,
            dependent,
            new_password_hash,
        } = update;
        self.connection()
            .await?
            .transaction(|conn| {
                use schema::rrhh::{user, worker};
                async move {
                    let updated_workers = diesel::update(worker::table.find(worker_id))
                        .set((
                            worker::address.eq(address),
                            worker::phone.eq(phone),
                            worker::updated.eq(now),
                        ))
                        .execute(conn)
                        .await?;
                    if updated_workers == 0 {
                        return Err(Error::NotFound);
                    }
                    upsert_emergency_contact(conn, new_emergency_contact(worker_id, contact, now))
                        .await?;
                    upsert_dependent(conn, new_dependent(worker_id, dependent, now)).await?;
                    if let Some(new_password_hash) = new_password_hash {
                        diesel::update(user::table.find(user_id))
                            .set((user::password.eq(new_password_hash), user::updated.eq(now)))
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, Error>(())
                }
                .scope_boxed()
            })
            .await
    }
}

fn new_user(
    models::AccountFields {
        username,
        password_hash,
        first_name,
        last_name,
        email,
        is_staff,
        rol,
    }: models::AccountFields,
    now: jiff_diesel::Timestamp,
) -> (models::NewUser, String) {
    let new_user = models::NewUser {
        username,
        password: password_hash,
        first_name,
        last_name,
        email,
        is_staff,
        created: now,
        updated: now,
    };
    (new_user, rol)
}

fn new_user_details(
    user_id: i32,
    rol: String,
    now: jiff_diesel::Timestamp,
) -> models::NewUserDetails {
    models::NewUserDetails {
        user_id,
        rol,
        birth_date: None,
        phone: None,
        document_number: None,
        check_digit: None,
        passport: None,
        created: now,
        updated: now,
    }
}

fn new_emergency_contact(
    worker_id: i32,
    models::ContactFields {
        name,
        relationship,
        phone,
    }: models::ContactFields,
    now: jiff_diesel::Timestamp,
) -> models::NewEmergencyContact {
    models::NewEmergencyContact {
        worker_id,
        name,
        relationship,
        phone,
        created: now,
        updated: now,
    }
}

fn new_dependent(
    worker_id: i32,
    models::DependentFields {
        name,
        relationship,
        sex,
        rut,
    }: models::DependentFields,
    now: jiff_diesel::Timestamp,
) -> models::NewDependent {
    models::NewDependent {
        worker_id,
        name,
        relationship,
        sex,
        rut,
        created: now,
        updated: now,
    }
}

async fn upsert_emergency_contact(
    conn: &mut Connection,
    new_contact: models::NewEmergencyContact,
) -> Result<models::EmergencyContact, diesel::result::Error> {
    use schema::rrhh::emergency_contact::dsl::*;
    diesel::insert_into(emergency_contact)
        .values(new_contact)
        .on_conflict(worker_id)
        .do_update()
        .set((
            name.eq(excluded(name)),
            relationship.eq(excluded(relationship)),
            phone.eq(excluded(phone)),
            updated.eq(excluded(updated)),
        ))
        .returning(models::EmergencyContact::as_returning())
        .get_result(conn)
        .await
}

async fn upsert_dependent(
    conn: &mut Connection,
    new_dependent: models::NewDependent,
) -> Result<models::Dependent, diesel::result::Error> {
    use schema::rrhh::dependent::dsl::*;
    diesel::insert_into(dependent)
        .values(new_dependent)
        .on_conflict(worker_id)
        .do_update()
        .set((
            name.eq(excluded(name)),
            relationship.eq(excluded(relationship)),
            sex.eq(excluded(sex)),
            rut.eq(excluded(rut)),
            updated.eq(excluded(updated)),
        ))
        .returning(models::Dependent::as_returning())
        .get_result(conn)
        .await
}
