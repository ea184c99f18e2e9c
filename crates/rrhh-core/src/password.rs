use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Stored password could not be parsed: {0}")]
    StoredPasswordUnableToParse(argon2::password_hash::Error),
    #[error("Password could not be verified: {0}")]
    PasswordUnableToVerify(argon2::password_hash::Error),
    #[error("Password hash failed: {0}")]
    PasswordHash(argon2::password_hash::Error),
}

/// Hashes a password into a salted argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(Error::PasswordHash)
}

/// `Ok(false)` means the password is wrong; `Err` means the stored hash is unusable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(stored_hash).map_err(Error::StoredPasswordUnableToParse)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(Error::PasswordUnableToVerify(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_verifies_the_password_it_hashed() {
        let hash = hash_password("clave-segura-1").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("clave-segura-1", &hash).expect("hash should parse"));
        assert!(!verify_password("clave-segura-2", &hash).expect("hash should parse"));
    }

    #[test]
    fn it_salts_every_hash() {
        let first = hash_password("repetida").expect("hashing should succeed");
        let second = hash_password("repetida").expect("hashing should succeed");
        assert_ne!(first, second);
    }

    #[test]
    fn it_reports_an_unparseable_stored_hash() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(Error::StoredPasswordUnableToParse(_))
        ));
    }
}
