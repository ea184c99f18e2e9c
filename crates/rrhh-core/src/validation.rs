use jiff::civil::Date;
use regex::Regex;
use std::sync::LazyLock;

use crate::choices::Choice;

/// Minimum number of characters accepted for a new password.
pub const PASSWORD_MIN_LENGTH: usize = 8;

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+56[0-9]{9}$").expect("phone pattern is valid"));

static NATIONAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{7,9}-[0-9Kk]$").expect("national id pattern is valid"));

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Este campo es obligatorio.")]
    Required,
    #[error("Asegúrese de que este valor tenga como máximo {0} caracteres.")]
    TooLong(usize),
    #[error("Escoja una opción válida.")]
    InvalidChoice,
    #[error(
        "El formato del teléfono es inválido. Debe ser \"+56XXXXXXXXX\" y contener solo números (Ejemplo: +56912345678)."
    )]
    PhoneFormat,
    #[error(
        "El RUT debe tener el formato \"12345678-K\" con 7, 8 o 9 dígitos seguidos de un guion."
    )]
    NationalIdFormat,
    #[error("El dígito verificador debe ser un número o la letra K.")]
    CheckDigitFormat,
    #[error("Este campo solo puede contener números.")]
    DigitsFormat,
    #[error("Introduzca una dirección de correo electrónico válida.")]
    EmailFormat,
    #[error("El nombre de usuario solo puede contener letras, números y los caracteres @/./+/-/_.")]
    UsernameFormat,
    #[error("Introduzca una fecha válida.")]
    DateFormat,
    #[error("La fecha de ingreso no puede ser una fecha futura.")]
    FutureHireDate,
    #[error("La fecha de nacimiento no puede ser una fecha futura.")]
    FutureBirthDate,
    #[error("La contraseña debe tener al menos 8 caracteres.")]
    PasswordTooShort,
    #[error("Las contraseñas no coinciden.")]
    PasswordMismatch,
}

/// Chilean phone number: `+56` followed by exactly nine digits.
pub fn validate_phone(value: &str) -> Result<(), Error> {
    if PHONE.is_match(value) {
        Ok(())
    } else {
        Err(Error::PhoneFormat)
    }
}

/// RUT: seven to nine digits, a hyphen and a check character (`0`-`9`, `K` or `k`).
pub fn validate_national_id(value: &str) -> Result<(), Error> {
    if NATIONAL_ID.is_match(value) {
        Ok(())
    } else {
        Err(Error::NationalIdFormat)
    }
}

pub fn validate_hire_date(value: Date) -> Result<(), Error> {
    validate_hire_date_on(value, today())
}

/// Rejects hire dates strictly after `today`. The current day itself is accepted.
pub fn validate_hire_date_on(value: Date, today: Date) -> Result<(), Error> {
    if value > today {
        Err(Error::FutureHireDate)
    } else {
        Ok(())
    }
}

pub fn validate_birth_date(value: Date) -> Result<(), Error> {
    validate_birth_date_on(value, today())
}

pub fn validate_birth_date_on(value: Date, today: Date) -> Result<(), Error> {
    if value > today {
        Err(Error::FutureBirthDate)
    } else {
        Ok(())
    }
}

pub fn validate_password_confirmation(first: &str, second: &str) -> Result<(), Error> {
    if first == second {
        Ok(())
    } else {
        Err(Error::PasswordMismatch)
    }
}

pub fn validate_password_length(value: &str) -> Result<(), Error> {
    if value.chars().count() < PASSWORD_MIN_LENGTH {
        Err(Error::PasswordTooShort)
    } else {
        Ok(())
    }
}

pub fn validate_required(value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        Err(Error::Required)
    } else {
        Ok(())
    }
}

pub fn validate_max_length(value: &str, max: usize) -> Result<(), Error> {
    if value.chars().count() > max {
        Err(Error::TooLong(max))
    } else {
        Ok(())
    }
}

pub fn validate_choice(value: &str, choices: &[Choice]) -> Result<(), Error> {
    if choices.iter().any(|choice| choice.value == value) {
        Ok(())
    } else {
        Err(Error::InvalidChoice)
    }
}

pub fn validate_email(value: &str) -> Result<(), Error> {
    if email_address::EmailAddress::is_valid(value) {
        Ok(())
    } else {
        Err(Error::EmailFormat)
    }
}

pub fn validate_username(value: &str) -> Result<(), Error> {
    if USERNAME.is_match(value) {
        Ok(())
    } else {
        Err(Error::UsernameFormat)
    }
}

pub fn validate_check_digit(value: &str) -> Result<(), Error> {
    match value.as_bytes() {
        [c] if c.is_ascii_digit() || *c == b'K' || *c == b'k' => Ok(()),
        _ => Err(Error::CheckDigitFormat),
    }
}

pub fn validate_digits(value: &str) -> Result<(), Error> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::DigitsFormat)
    }
}

/// Parses an ISO `YYYY-MM-DD` date as sent by an HTML date input.
pub fn parse_date(value: &str) -> Result<Date, Error> {
    value.trim().parse::<Date>().map_err(|_| Error::DateFormat)
}

/// The local calendar date used as the reference for "not in the future" rules.
pub fn today() -> Date {
    jiff::Zoned::now().date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    mod phone {
        use super::*;

        #[test]
        fn it_accepts_plus_56_followed_by_nine_digits() {
            assert_eq!(validate_phone("+56912345678"), Ok(()));
            assert_eq!(validate_phone("+56000000000"), Ok(()));
        }

        #[test]
        fn it_rejects_a_number_without_the_plus_sign() {
            assert_eq!(validate_phone("56912345678"), Err(Error::PhoneFormat));
        }

        #[test]
        fn it_rejects_wrong_digit_counts_and_other_characters() {
            for value in [
                "",
                "+5691234567",
                "+569123456789",
                "+57912345678",
                "+56 912345678",
                "+5691234567a",
                "+56912345678\n",
                " +56912345678",
                "+56９12345678",
            ] {
                assert_eq!(validate_phone(value), Err(Error::PhoneFormat), "{value:?}");
            }
        }
    }

    mod national_id {
        use super::*;

        #[test]
        fn it_accepts_seven_to_nine_digits_with_a_check_character() {
            for value in ["1234567-8", "12345678-K", "12345678-k", "123456789-0"] {
                assert_eq!(validate_national_id(value), Ok(()), "{value:?}");
            }
        }

        #[test]
        fn it_rejects_a_value_without_check_digit() {
            assert_eq!(
                validate_national_id("12345678"),
                Err(Error::NationalIdFormat)
            );
        }

        #[test]
        fn it_rejects_malformed_values() {
            for value in [
                "",
                "123456-7",
                "1234567890-1",
                "12345678-X",
                "12345678-12",
                "12.345.678-9",
                "12345678 -K",
                "-K",
            ] {
                assert_eq!(
                    validate_national_id(value),
                    Err(Error::NationalIdFormat),
                    "{value:?}"
                );
            }
        }
    }

    mod hire_date {
        use super::*;

        #[test]
        fn it_accepts_today_and_the_past() {
            let today = date(2024, 5, 10);
            assert_eq!(validate_hire_date_on(today, today), Ok(()));
            assert_eq!(validate_hire_date_on(date(2001, 1, 1), today), Ok(()));
        }

        #[test]
        fn it_rejects_tomorrow() {
            let today = date(2024, 12, 31);
            assert_eq!(
                validate_hire_date_on(date(2025, 1, 1), today),
                Err(Error::FutureHireDate)
            );
        }

        #[test]
        fn it_uses_the_current_date_by_default() {
            assert_eq!(validate_hire_date(today()), Ok(()));
            let tomorrow = today().tomorrow().expect("tomorrow is representable");
            assert_eq!(validate_hire_date(tomorrow), Err(Error::FutureHireDate));
        }
    }

    mod password {
        use super::*;

        #[test]
        fn it_accepts_identical_values() {
            for value in ["", "secreto123", "ñandú con espacios"] {
                assert_eq!(validate_password_confirmation(value, value), Ok(()));
            }
        }

        #[test]
        fn it_rejects_different_values() {
            assert_eq!(
                validate_password_confirmation("secreto123", "secreto124"),
                Err(Error::PasswordMismatch)
            );
            assert_eq!(
                validate_password_confirmation("abc", "ABC"),
                Err(Error::PasswordMismatch)
            );
        }

        #[test]
        fn it_requires_a_minimum_length() {
            assert_eq!(validate_password_length("1234567"), Err(Error::PasswordTooShort));
            assert_eq!(validate_password_length("12345678"), Ok(()));
        }
    }

    #[test]
    fn check_digit_accepts_a_single_digit_or_k() {
        assert_eq!(validate_check_digit("7"), Ok(()));
        assert_eq!(validate_check_digit("k"), Ok(()));
        assert_eq!(validate_check_digit("K"), Ok(()));
        assert_eq!(validate_check_digit("KK"), Err(Error::CheckDigitFormat));
        assert_eq!(validate_check_digit("x"), Err(Error::CheckDigitFormat));
    }

    #[test]
    fn required_treats_whitespace_as_empty() {
        assert_eq!(validate_required("   "), Err(Error::Required));
        assert_eq!(validate_required("a"), Ok(()));
    }

    #[test]
    fn max_length_counts_characters() {
        assert_eq!(validate_max_length("ñññ", 3), Ok(()));
        assert_eq!(validate_max_length("ññññ", 3), Err(Error::TooLong(3)));
    }

    #[test]
    fn choice_must_be_listed() {
        use crate::choices::SEX;
        assert_eq!(validate_choice("F", SEX), Ok(()));
        assert_eq!(validate_choice("X", SEX), Err(Error::InvalidChoice));
    }

    #[test]
    fn username_allows_django_style_characters() {
        assert_eq!(validate_username("12345678-K"), Ok(()));
        assert_eq!(validate_username("ana.perez@empresa"), Ok(()));
        assert_eq!(validate_username("ana perez"), Err(Error::UsernameFormat));
    }

    #[test]
    fn dates_parse_from_iso_format() {
        assert_eq!(parse_date("2023-02-28"), Ok(date(2023, 2, 28)));
        assert_eq!(parse_date("2023-02-30"), Err(Error::DateFormat));
        assert_eq!(parse_date("28/02/2023"), Err(Error::DateFormat));
    }

    #[test]
    fn email_must_be_well_formed() {
        assert_eq!(validate_email("ana@empresa.cl"), Ok(()));
        assert_eq!(validate_email("ana.empresa.cl"), Err(Error::EmailFormat));
    }
}
