//! Secret key generation.

use rand::Rng;

/// Characters Django uses for `get_random_secret_key`.
pub const SECRET_KEY_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*(-_=+)";

pub const DEFAULT_SECRET_KEY_LENGTH: usize = 50;

/// Generate a secret key of `length` characters with the thread-local CSPRNG.
pub fn generate_secret_key(length: usize) -> String {
    generate_secret_key_with(&mut rand::thread_rng(), length)
}

pub fn generate_secret_key_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| SECRET_KEY_CHARSET[rng.gen_range(0..SECRET_KEY_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn key_has_requested_length_and_charset() {
        let key = generate_secret_key(DEFAULT_SECRET_KEY_LENGTH);
        assert_eq!(key.len(), DEFAULT_SECRET_KEY_LENGTH);
        assert!(key.bytes().all(|b| SECRET_KEY_CHARSET.contains(&b)));
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = generate_secret_key_with(&mut StdRng::seed_from_u64(7), 32);
        let b = generate_secret_key_with(&mut StdRng::seed_from_u64(7), 32);
        assert_eq!(a, b);
    }

    #[test]
    fn consecutive_keys_differ() {
        assert_ne!(generate_secret_key(50), generate_secret_key(50));
    }
}
