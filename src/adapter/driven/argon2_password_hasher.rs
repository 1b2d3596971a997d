use crate::domain::model::PasswordCredential;
use crate::domain::port::{PasswordHashError, PasswordHasher};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Argon2,
};

/// Argon2によるパスワードハッシュ化
/// PHC文字列形式（`$argon2id$...`）で保存する
#[derive(Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordCredential, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| PasswordCredential::new(hash.to_string()))
            .map_err(|err| PasswordHashError(err.to_string()))
    }

    fn verify(&self, password: &str, credential: &PasswordCredential) -> bool {
        match PasswordHash::new(credential.as_str()) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
