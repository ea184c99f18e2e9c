//! Request-scoped form values.
//!
//! Every form is deserialized as submitted, validated as a whole and, when
//! invalid, handed back to its template together with the [`FieldErrors`]
//! so the user's input is preserved. Text inputs are trimmed; passwords are
//! taken verbatim.

use rrhh_core::{
    choices::{ADMIN_ROLE, EMPLOYEE_ROLE, ROLES, SEX},
    validation::{self, Error as Invalid},
};
use rrhh_db::models;
use std::collections::BTreeMap;

/// Validation messages keyed by form field name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Records the error of a failed rule. Returns whether the rule passed.
    pub fn check(&mut self, field: &str, result: Result<(), Invalid>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                self.add(field, err.to_string());
                false
            }
        }
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Moves the errors of a nested form in, renaming `field` to `{prefix}_{field}`.
    pub fn absorb(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0
                .entry(format!("{prefix}_{field}"))
                .or_default()
                .extend(messages);
        }
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }

    /// Trimmed, non-empty text of at most `max` characters.
    fn text(&mut self, field: &str, value: &str, max: usize) -> String {
        let value = value.trim();
        if self.check(field, validation::validate_required(value)) {
            self.check(field, validation::validate_max_length(value, max));
        }
        value.to_owned()
    }

    /// Trimmed text that may be left blank.
    fn optional_text(&mut self, field: &str, value: &str, max: usize) -> Option<String> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        self.check(field, validation::validate_max_length(value, max));
        Some(value.to_owned())
    }

    fn phone(&mut self, field: &str, value: &str) -> String {
        let value = value.trim();
        if self.check(field, validation::validate_required(value)) {
            self.check(field, validation::validate_phone(value));
        }
        value.to_owned()
    }

    fn national_id(&mut self, field: &str, value: &str) -> String {
        let value = value.trim();
        if self.check(field, validation::validate_required(value)) {
            self.check(field, validation::validate_national_id(value));
        }
        value.to_owned()
    }

    fn choice(&mut self, field: &str, value: &str, choices: &[rrhh_core::choices::Choice]) -> String {
        let value = value.trim();
        if self.check(field, validation::validate_required(value)) {
            self.check(field, validation::validate_choice(value, choices));
        }
        value.to_owned()
    }

    /// New password typed twice. Only the first field collects errors about
    /// length, the second one about the mismatch.
    fn new_password(&mut self, first_field: &str, first: &str, second_field: &str, second: &str) {
        if self.check(first_field, validation::validate_required(first)) {
            self.check(first_field, validation::validate_password_length(first));
        }
        if self.check(second_field, validation::validate_required(second)) {
            self.check(
                second_field,
                validation::validate_password_confirmation(first, second),
            );
        }
    }
}

#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<crate::login::Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = errors.text("username", &self.username, 150);
        errors.check("password", validation::validate_required(&self.password));
        errors.into_result(|| crate::login::Credentials {
            username,
            password: self.password.clone(),
        })
    }

    pub fn without_password(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }

    pub fn next_url(&self) -> &str {
        self.next.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Debug)]
pub struct Registration {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = errors.text("username", &self.username, 150);
        if !errors.has("username") {
            errors.check("username", validation::validate_username(&username));
        }
        let first_name = errors.optional_text("first_name", &self.first_name, 150);
        let last_name = errors.optional_text("last_name", &self.last_name, 150);
        let email = errors.optional_text("email", &self.email, 254);
        if let Some(email) = &email {
            errors.check("email", validation::validate_email(email));
        }
        errors.new_password("password1", &self.password1, "password2", &self.password2);
        errors.into_result(|| Registration {
            username,
            first_name: first_name.unwrap_or_default(),
            last_name: last_name.unwrap_or_default(),
            email: email.unwrap_or_default(),
            password: self.password1.clone(),
        })
    }

    pub fn without_passwords(&self) -> Self {
        Self {
            password1: String::new(),
            password2: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct WorkerForm {
    pub rut: String,
    pub name: String,
    pub sex: String,
    pub address: String,
    pub phone: String,
    pub position: String,
    pub hire_date: String,
    pub area: String,
    pub department: String,
    pub password: String,
    pub is_admin: Option<String>,
}

/// A worker to be created together with its log in account.
#[derive(Debug)]
pub struct NewWorker {
    pub worker: models::WorkerFields,
    pub password: String,
    pub is_admin: bool,
}

impl NewWorker {
    pub fn role(&self) -> &'static str {
        if self.is_admin {
            ADMIN_ROLE
        } else {
            EMPLOYEE_ROLE
        }
    }
}

impl WorkerForm {
    pub fn from_worker(worker: &models::Worker) -> Self {
        Self {
            rut: worker.rut.clone(),
            name: worker.name.clone(),
            sex: worker.sex.clone(),
            address: worker.address.clone(),
            phone: worker.phone.clone(),
            position: worker.position.clone(),
            hire_date: worker.hired_on().to_string(),
            area: worker.area.clone(),
            department: worker.department.clone(),
            password: String::new(),
            is_admin: None,
        }
    }

    pub fn validate(&self) -> Result<models::WorkerFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        let fields = self.worker_fields(&mut errors);
        errors.into_result(|| fields)
    }

    pub fn validate_new(&self) -> Result<NewWorker, FieldErrors> {
        let mut errors = FieldErrors::default();
        let worker = self.worker_fields(&mut errors);
        if errors.check("password", validation::validate_required(&self.password)) {
            errors.check("password", validation::validate_password_length(&self.password));
        }
        errors.into_result(|| NewWorker {
            worker,
            password: self.password.clone(),
            is_admin: self.is_admin.is_some(),
        })
    }

    pub fn wants_admin(&self) -> bool {
        self.is_admin.is_some()
    }

    pub fn without_password(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }

    fn worker_fields(&self, errors: &mut FieldErrors) -> models::WorkerFields {
        let rut = errors.national_id("rut", &self.rut);
        let name = errors.text("name", &self.name, 150);
        let sex = errors.choice("sex", &self.sex, SEX);
        let address = errors.text("address", &self.address, 255);
        let phone = errors.phone("phone", &self.phone);
        let position = errors.text("position", &self.position, 100);
        let hire_date = hire_date(errors, &self.hire_date);
        let area = errors.text("area", &self.area, 100);
        let department = errors.text("department", &self.department, 100);
        models::WorkerFields {
            rut,
            name,
            sex,
            address,
            phone,
            position,
            hire_date,
            area,
            department,
        }
    }
}

/// Parsed hire date. On error the returned date is only a placeholder.
fn hire_date(errors: &mut FieldErrors, value: &str) -> jiff::civil::Date {
    if !errors.check("hire_date", validation::validate_required(value)) {
        return jiff::civil::Date::MIN;
    }
    match validation::parse_date(value) {
        Ok(date) => {
            errors.check("hire_date", validation::validate_hire_date(date));
            date
        }
        Err(err) => {
            errors.add("hire_date", err.to_string());
            jiff::civil::Date::MIN
        }
    }
}

#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct EmergencyContactForm {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

impl EmergencyContactForm {
    pub fn from_contact(contact: Option<&models::EmergencyContact>) -> Self {
        contact
            .map(|contact| Self {
                name: contact.name.clone(),
                relationship: contact.relationship.clone(),
                phone: contact.phone.clone(),
            })
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<models::ContactFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = errors.text("name", &self.name, 150);
        let relationship = errors.text("relationship", &self.relationship, 50);
        let phone = errors.phone("phone", &self.phone);
        errors.into_result(|| models::ContactFields {
            name,
            relationship,
            phone,
        })
    }
}

#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct DependentForm {
    pub name: String,
    pub relationship: String,
    pub sex: String,
    pub rut: String,
}

impl DependentForm {
    pub fn from_dependent(dependent: Option<&models::Dependent>) -> Self {
        dependent
            .map(|dependent| Self {
                name: dependent.name.clone(),
                relationship: dependent.relationship.clone(),
                sex: dependent.sex.clone(),
                rut: dependent.rut.clone(),
            })
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<models::DependentFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = errors.text("name", &self.name, 150);
        let relationship = errors.text("relationship", &self.relationship, 50);
        let sex = errors.choice("sex", &self.sex, SEX);
        let rut = errors.national_id("rut", &self.rut);
        errors.into_result(|| models::DependentFields {
            name,
            relationship,
            sex,
            rut,
        })
    }
}

/// The single page on which a worker maintains their own record, emergency
/// contact and dependent, and optionally changes their password.
#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub address: String,
    pub phone: String,
    pub contact_name: String,
    pub contact_relationship: String,
    pub contact_phone: String,
    pub dependent_name: String,
    pub dependent_relationship: String,
    pub dependent_sex: String,
    pub dependent_rut: String,
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Debug)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug)]
pub struct Profile {
    pub address: String,
    pub phone: String,
    pub contact: models::ContactFields,
    pub dependent: models::DependentFields,
    pub password_change: Option<PasswordChange>,
}

impl ProfileForm {
    pub fn from_records(
        worker: &models::Worker,
        contact: Option<&models::EmergencyContact>,
        dependent: Option<&models::Dependent>,
    ) -> Self {
        let contact = EmergencyContactForm::from_contact(contact);
        let dependent = DependentForm::from_dependent(dependent);
        Self {
            address: worker.address.clone(),
            phone: worker.phone.clone(),
            contact_name: contact.name,
            contact_relationship: contact.relationship,
            contact_phone: contact.phone,
            dependent_name: dependent.name,
            dependent_relationship: dependent.relationship,
            dependent_sex: dependent.sex,
            dependent_rut: dependent.rut,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<Profile, FieldErrors> {
        let mut errors = FieldErrors::default();
        let address = errors.text("address", &self.address, 255);
        let phone = errors.phone("phone", &self.phone);
        let contact = EmergencyContactForm {
            name: self.contact_name.clone(),
            relationship: self.contact_relationship.clone(),
            phone: self.contact_phone.clone(),
        }
        .validate()
        .map_err(|nested| errors.absorb("contact", nested))
        .ok();
        let dependent = DependentForm {
            name: self.dependent_name.clone(),
            relationship: self.dependent_relationship.clone(),
            sex: self.dependent_sex.clone(),
            rut: self.dependent_rut.clone(),
        }
        .validate()
        .map_err(|nested| errors.absorb("dependent", nested))
        .ok();
        let password_change = self.password_change(&mut errors);
        match (contact, dependent) {
            (Some(contact), Some(dependent)) if errors.is_empty() => Ok(Profile {
                address,
                phone,
                contact,
                dependent,
                password_change,
            }),
            _ => Err(errors),
        }
    }

    /// All three password fields left blank means the password stays as is.
    fn password_change(&self, errors: &mut FieldErrors) -> Option<PasswordChange> {
        if self.old_password.is_empty()
            && self.new_password1.is_empty()
            && self.new_password2.is_empty()
        {
            return None;
        }
        errors.check("old_password", validation::validate_required(&self.old_password));
        errors.new_password(
            "new_password1",
            &self.new_password1,
            "new_password2",
            &self.new_password2,
        );
        Some(PasswordChange {
            old_password: self.old_password.clone(),
            new_password: self.new_password1.clone(),
        })
    }

    pub fn without_passwords(&self) -> Self {
        Self {
            old_password: String::new(),
            new_password1: String::new(),
            new_password2: String::new(),
            ..self.clone()
        }
    }
}

/// Administrative edit of the role and personal data attached to an account.
#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct UserDetailsForm {
    pub rol: String,
    pub birth_date: String,
    pub phone: String,
    pub document_number: String,
    pub check_digit: String,
    pub passport: String,
}

impl UserDetailsForm {
    pub fn from_details(details: Option<&models::UserDetails>) -> Self {
        match details {
            Some(details) => Self {
                rol: details.rol.clone(),
                birth_date: details
                    .born_on()
                    .map(|date| date.to_string())
                    .unwrap_or_default(),
                phone: details.phone.clone().unwrap_or_default(),
                document_number: details.document_number.clone().unwrap_or_default(),
                check_digit: details.check_digit.clone().unwrap_or_default(),
                passport: details.passport.clone().unwrap_or_default(),
            },
            None => Self {
                rol: EMPLOYEE_ROLE.to_owned(),
                ..Default::default()
            },
        }
    }

    pub fn validate(&self) -> Result<models::UserDetailsFields, FieldErrors> {
        let mut errors = FieldErrors::default();
        let rol = errors.choice("rol", &self.rol, ROLES);
        let birth_date = match self.birth_date.trim() {
            "" => None,
            value => match validation::parse_date(value) {
                Ok(date) => {
                    errors.check("birth_date", validation::validate_birth_date(date));
                    Some(date)
                }
                Err(err) => {
                    errors.add("birth_date", err.to_string());
                    None
                }
            },
        };
        let phone = errors.optional_text("phone", &self.phone, 12);
        if let Some(phone) = &phone {
            errors.check("phone", validation::validate_phone(phone));
        }
        let document_number = errors.optional_text("document_number", &self.document_number, 9);
        if let Some(document_number) = &document_number {
            errors.check("document_number", validation::validate_digits(document_number));
        }
        let check_digit = errors.optional_text("check_digit", &self.check_digit, 1);
        if let Some(check_digit) = &check_digit {
            errors.check("check_digit", validation::validate_check_digit(check_digit));
        }
        let passport = errors.optional_text("passport", &self.passport, 20);
        errors.into_result(|| models::UserDetailsFields {
            rol,
            birth_date,
            phone,
            document_number,
            check_digit,
            passport,
        })
    }
}

/// Query string of the worker list. Blank parameters leave the list unfiltered.
#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct FilterQuery {
    pub sexo: String,
    pub cargo: String,
    pub area: String,
}

impl FilterQuery {
    pub fn to_filter(&self) -> models::WorkerFilter {
        fn narrowing(value: &str) -> Option<String> {
            Some(value.trim()).filter(|v| !v.is_empty()).map(str::to_owned)
        }
        models::WorkerFilter {
            sex: narrowing(&self.sexo),
            position: narrowing(&self.cargo),
            area: narrowing(&self.area),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_worker_form() -> WorkerForm {
        WorkerForm {
            rut: "12345678-9".to_owned(),
            name: " María Pérez ".to_owned(),
            sex: "F".to_owned(),
            address: "Los Aromos 55".to_owned(),
            phone: "+56912345678".to_owned(),
            position: "Analista".to_owned(),
            hire_date: "2021-05-10".to_owned(),
            area: "Finanzas".to_owned(),
            department: "Contabilidad".to_owned(),
            password: "secreto123".to_owned(),
            is_admin: None,
        }
    }

    fn valid_profile_form() -> ProfileForm {
        ProfileForm {
            address: "Calle 1".to_owned(),
            phone: "+56912345678".to_owned(),
            contact_name: "Rosa".to_owned(),
            contact_relationship: "Madre".to_owned(),
            contact_phone: "+56987654321".to_owned(),
            dependent_name: "Tomás".to_owned(),
            dependent_relationship: "Hijo".to_owned(),
            dependent_sex: "M".to_owned(),
            dependent_rut: "23456789-K".to_owned(),
            ..Default::default()
        }
    }

    mod field_errors {
        use super::*;

        #[test]
        fn absorb_prefixes_nested_fields() {
            let mut nested = FieldErrors::default();
            nested.add("phone", "malo");
            let mut errors = FieldErrors::default();
            errors.absorb("contact", nested);
            assert_eq!(errors.field("contact_phone"), ["malo".to_owned()]);
            assert!(errors.field("phone").is_empty());
        }
    }

    mod worker {
        use super::*;

        #[test]
        fn a_complete_form_validates_and_trims() {
            let fields = valid_worker_form().validate().expect("form should be valid");
            assert_eq!(fields.name, "María Pérez");
            assert_eq!(fields.hire_date, jiff::civil::date(2021, 5, 10));
        }

        #[test]
        fn it_reports_every_invalid_field() {
            let form = WorkerForm {
                rut: "12.345.678-9".to_owned(),
                phone: "912345678".to_owned(),
                sex: "X".to_owned(),
                name: String::new(),
                hire_date: "ayer".to_owned(),
                ..valid_worker_form()
            };
            let errors = form.validate().expect_err("form should be invalid");
            for field in ["rut", "phone", "sex", "name", "hire_date"] {
                assert!(errors.has(field), "{field} should have an error");
            }
            assert!(!errors.has("address"));
        }

        #[test]
        fn a_future_hire_date_is_rejected() {
            let tomorrow = validation::today()
                .tomorrow()
                .expect("tomorrow should exist");
            let form = WorkerForm {
                hire_date: tomorrow.to_string(),
                ..valid_worker_form()
            };
            let errors = form.validate().expect_err("form should be invalid");
            assert_eq!(
                errors.field("hire_date"),
                [Invalid::FutureHireDate.to_string()]
            );
        }

        #[test]
        fn a_new_worker_needs_a_password_and_may_be_admin() {
            let form = WorkerForm {
                password: String::new(),
                ..valid_worker_form()
            };
            assert!(form.validate().is_ok(), "editing needs no password");
            let errors = form.validate_new().expect_err("adding needs a password");
            assert!(errors.has("password"));

            let form = WorkerForm {
                is_admin: Some("on".to_owned()),
                ..valid_worker_form()
            };
            let new_worker = form.validate_new().expect("form should be valid");
            assert!(new_worker.is_admin);
            assert_eq!(new_worker.role(), ADMIN_ROLE);
        }
    }

    mod registration {
        use super::*;

        #[test]
        fn mismatched_passwords_are_reported_on_the_confirmation() {
            let form = RegistrationForm {
                username: "mperez".to_owned(),
                password1: "secreto123".to_owned(),
                password2: "secreto124".to_owned(),
                ..Default::default()
            };
            let errors = form.validate().expect_err("form should be invalid");
            assert_eq!(
                errors.field("password2"),
                [Invalid::PasswordMismatch.to_string()]
            );
            assert!(!errors.has("password1"));
        }

        #[test]
        fn email_is_optional_but_must_be_valid() {
            let form = RegistrationForm {
                username: "mperez".to_owned(),
                password1: "secreto123".to_owned(),
                password2: "secreto123".to_owned(),
                ..Default::default()
            };
            assert!(form.validate().is_ok());
            let form = RegistrationForm {
                email: "no-es-correo".to_owned(),
                ..form
            };
            assert!(form.validate().expect_err("should be invalid").has("email"));
        }
    }

    mod profile {
        use super::*;

        #[test]
        fn blank_password_fields_mean_no_change() {
            let profile = valid_profile_form()
                .validate()
                .expect("form should be valid");
            assert!(profile.password_change.is_none());
            assert_eq!(profile.dependent.rut, "23456789-K");
        }

        #[test]
        fn nested_errors_keep_their_prefix() {
            let form = ProfileForm {
                contact_phone: "+5691234".to_owned(),
                dependent_rut: "23456789".to_owned(),
                ..valid_profile_form()
            };
            let errors = form.validate().expect_err("form should be invalid");
            assert!(errors.has("contact_phone"));
            assert!(errors.has("dependent_rut"));
            assert!(!errors.has("phone"));
        }

        #[test]
        fn a_password_change_needs_the_old_password_and_a_match() {
            let form = ProfileForm {
                new_password1: "nuevaclave1".to_owned(),
                new_password2: "nuevaclave2".to_owned(),
                ..valid_profile_form()
            };
            let errors = form.validate().expect_err("form should be invalid");
            assert!(errors.has("old_password"));
            assert!(errors.has("new_password2"));

            let form = ProfileForm {
                old_password: "viejaclave".to_owned(),
                new_password1: "nuevaclave1".to_owned(),
                new_password2: "nuevaclave1".to_owned(),
                ..valid_profile_form()
            };
            let change = form
                .validate()
                .expect("form should be valid")
                .password_change
                .expect("should change password");
            assert_eq!(change.new_password, "nuevaclave1");
        }
    }

    mod user_details {
        use super::*;

        #[test]
        fn only_the_role_is_required() {
            let form = UserDetailsForm {
                rol: ADMIN_ROLE.to_owned(),
                ..Default::default()
            };
            let fields = form.validate().expect("form should be valid");
            assert_eq!(fields.birth_date, None);
            assert_eq!(fields.phone, None);
        }

        #[test]
        fn filled_fields_are_checked() {
            let form = UserDetailsForm {
                rol: "jefe".to_owned(),
                phone: "12345".to_owned(),
                document_number: "12a45".to_owned(),
                check_digit: "X".to_owned(),
                birth_date: "3000-01-01".to_owned(),
                ..Default::default()
            };
            let errors = form.validate().expect_err("form should be invalid");
            for field in ["rol", "phone", "document_number", "check_digit", "birth_date"] {
                assert!(errors.has(field), "{field} should have an error");
            }
        }
    }

    #[test]
    fn blank_filter_parameters_do_not_narrow() {
        let query = FilterQuery {
            sexo: "F".to_owned(),
            cargo: "  ".to_owned(),
            area: "Finanzas".to_owned(),
        };
        assert_eq!(
            query.to_filter(),
            models::WorkerFilter {
                sex: Some("F".to_owned()),
                position: None,
                area: Some("Finanzas".to_owned()),
            }
        );
        assert_eq!(FilterQuery::default().to_filter(), models::WorkerFilter::default());
    }
}
