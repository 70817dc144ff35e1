pub mod ip;

pub use ip::{extract_client_ip, is_private_or_local};

use xxhash_rust::xxh64::xxh64;

/// Content hash used as the teaser dedup key (xxh64, 16 hex chars)
pub fn content_hash(s: &str) -> String {
    format!("{:016x}", xxh64(s.as_bytes(), 0))
}

/// Generate a cryptographically random token string
pub fn generate_secure_token(length: usize) -> String {
    use std::iter;

    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}
