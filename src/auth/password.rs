use argon2::{
    Argon2,
    password_hash::{
        Error, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use once_cell::sync::Lazy;

/// Hash of a random secret; unknown logins are verified against it so they cost the
/// same argon2 work as a wrong password.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let secret = SaltString::generate(&mut OsRng);
    hash_password(secret.as_str()).ok()
});

pub fn hash_password(password: &str) -> Result<String, Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

pub fn verify_password(password: &str, hashed: &str) -> Result<(), Error> {
    let argon2 = Argon2::default();
    let parsed = PasswordHash::new(hashed)?;

    argon2.verify_password(password.as_bytes(), &parsed)
}

/// Runs a full verification that always fails
pub fn verify_unknown_user(password: &str) {
    if let Some(hashed) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hashed);
    }
}
