use rand::RngCore;
use sha2::{Digest, Sha512};

pub const SALT_LEN: usize = 32;
const DIGEST_LEN: usize = 64;

fn digest(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(password.as_bytes());
    hasher.update(salt);
    hasher.finalize().to_vec()
}

/// Derive a fresh session token from a verified password.
///
/// The token is `base64(salt ++ SHA-512(password ++ salt))` with a new
/// random salt per call, so it can be re-derived by [`verify_token`].
pub fn derive_token(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut raw = Vec::with_capacity(SALT_LEN + DIGEST_LEN);
    raw.extend_from_slice(&salt);
    raw.extend_from_slice(&digest(password, &salt));

    base64_simd::STANDARD.encode_to_string(&raw)
}

/// Check that `token` was derived from `password`.
pub fn verify_token(password: &str, token: &str) -> bool {
    let raw = match base64_simd::STANDARD.decode_to_vec(token) {
        Ok(raw) => raw,
        Err(_) => return false,
    };
    if raw.len() != SALT_LEN + DIGEST_LEN {
        return false;
    }

    let (salt, expected) = raw.split_at(SALT_LEN);
    constant_time_eq::constant_time_eq(&digest(password, salt), expected)
}
