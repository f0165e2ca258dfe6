//! Hash de búsqueda de 3PID: SHA-256 de `"<address> <medium> <pepper>"`
//! codificado en base64 URL-safe sin padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

pub fn lookup_hash(medium: &str, address: &str, pepper: &str) -> String {
    let mut h = Sha256::new();
    h.update(format!("{address} {medium} {pepper}").as_bytes());
    URL_SAFE_NO_PAD.encode(h.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // Vector de ejemplo publicado para la API de lookup v2 de Matrix.
        let h = lookup_hash("email", "alice@example.com", "matrixrocks");
        assert_eq!(h, "4kenr7N9drpCJ4AfalmlGQVsOn3o2RHjkADUpXJWZUc");
    }

    #[test]
    fn pepper_changes_hash() {
        assert_ne!(lookup_hash("email", "a@b.c", "p1"), lookup_hash("email", "a@b.c", "p2"));
    }

    #[test]
    fn no_padding_and_url_safe() {
        let h = lookup_hash("msisdn", "15551234567", "pepper");
        assert_eq!(h.len(), 43);
        assert!(!h.contains('=') && !h.contains('+') && !h.contains('/'));
    }
}
