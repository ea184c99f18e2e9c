use diesel::prelude::*;

#[derive(Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::rrhh::user)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::rrhh::user)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

#[derive(Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::rrhh::user_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(belongs_to(User))]
pub struct UserDetails {
    pub id: i32,
    pub user_id: i32,
    pub rol: String,
    pub birth_date: Option<jiff_diesel::Date>,
    pub phone: Option<String>,
    pub document_number: Option<String>,
    pub check_digit: Option<String>,
    pub passport: Option<String>,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

impl UserDetails {
    pub fn born_on(&self) -> Option<jiff::civil::Date> {
        self.birth_date.as_ref().map(|date| date.to_jiff())
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::rrhh::user_details)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUserDetails {
    pub user_id: i32,
    pub rol: String,
    pub birth_date: Option<jiff_diesel::Date>,
    pub phone: Option<String>,
    pub document_number: Option<String>,
    pub check_digit: Option<String>,
    pub passport: Option<String>,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

#[derive(Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::rrhh::worker)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(belongs_to(User))]
pub struct Worker {
    pub id: i32,
    pub user_id: Option<i32>,
    pub rut: String,
    pub name: String,
    pub sex: String,
    pub address: String,
    pub phone: String,
    pub position: String,
    pub hire_date: jiff_diesel::Date,
    pub area: String,
    pub department: String,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

impl Worker {
    pub fn hired_on(&self) -> jiff::civil::Date {
        self.hire_date.to_jiff()
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::rrhh::worker)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewWorker {
    pub user_id: Option<i32>,
    pub rut: String,
    pub name: String,
    pub sex: String,
    pub address: String,
    pub phone: String,
    pub position: String,
    pub hire_date: jiff_diesel::Date,
    pub area: String,
    pub department: String,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

/// Every column an administrator may change on a worker.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::rrhh::worker)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkerChanges {
    pub rut: String,
    pub name: String,
    pub sex: String,
    pub address: String,
    pub phone: String,
    pub position: String,
    pub hire_date: jiff_diesel::Date,
    pub area: String,
    pub department: String,
    pub updated: jiff_diesel::Timestamp,
}

#[derive(Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::rrhh::emergency_contact)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(belongs_to(Worker))]
pub struct EmergencyContact {
    pub id: i32,
    pub worker_id: i32,
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::rrhh::emergency_contact)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewEmergencyContact {
    pub worker_id: i32,
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

#[derive(Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::rrhh::dependent)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(belongs_to(Worker))]
pub struct Dependent {
    pub id: i32,
    pub worker_id: i32,
    pub name: String,
    pub relationship: String,
    pub sex: String,
    pub rut: String,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::rrhh::dependent)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDependent {
    pub worker_id: i32,
    pub name: String,
    pub relationship: String,
    pub sex: String,
    pub rut: String,
    pub created: jiff_diesel::Timestamp,
    pub updated: jiff_diesel::Timestamp,
}

// Validated input handed to the store by the web layer. Timestamps and
// foreign keys are filled in by the store itself.

#[derive(Clone, Debug)]
pub struct AccountFields {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub rol: String,
}

#[derive(Clone, Debug)]
pub struct UserDetailsFields {
    pub rol: String,
    pub birth_date: Option<jiff::civil::Date>,
    pub phone: Option<String>,
    pub document_number: Option<String>,
    pub check_digit: Option<String>,
    pub passport: Option<String>,
}

#[derive(Clone, Debug)]
pub struct WorkerFields {
    pub rut: String,
    pub name: String,
    pub sex: String,
    pub address: String,
    pub phone: String,
    pub position: String,
    pub hire_date: jiff::civil::Date,
    pub area: String,
    pub department: String,
}

#[derive(Clone, Debug)]
pub struct ContactFields {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Clone, Debug)]
pub struct DependentFields {
    pub name: String,
    pub relationship: String,
    pub sex: String,
    pub rut: String,
}

/// Everything a worker may change about themself in a single save.
#[derive(Clone, Debug)]
pub struct ProfileUpdate {
    pub address: String,
    pub phone: String,
    pub contact: ContactFields,
    pub dependent: DependentFields,
    pub new_password_hash: Option<String>,
}

/// Exact-match narrowing of the worker list. `None` leaves a column unfiltered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerFilter {
    pub sex: Option<String>,
    pub position: Option<String>,
    pub area: Option<String>,
}
