use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A throwaway password for accounts created on a contact's behalf.
pub fn generate_password() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// `<salt hex>$<sha256(salt || password) hex>`
pub fn digest_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = hex::encode(salt);
    format!("{}${}", salt, hash_with_salt(&salt, password))
}

fn hash_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digests_are_salted_sha256_of_the_password() {
        let password = generate_password();
        let a = digest_password(&password);
        let b = digest_password(&password);
        assert_ne!(a, b);

        for digest in [&a, &b] {
            let (salt, hash) = digest.split_once('$').unwrap();
            assert_eq!(salt.len(), 32);
            assert_eq!(hash, hash_with_salt(salt, &password));
            assert_ne!(hash, hash_with_salt(salt, "wrong"));
        }
    }

    #[test]
    fn generated_passwords_differ() {
        assert_ne!(generate_password(), generate_password());
    }
}
