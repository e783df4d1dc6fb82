//! Player id generation.

use rand::Rng;
use tilehall_protocol::PlayerId;

/// Generates a fresh player id: 16 random bytes as 32 lowercase hex chars.
///
/// The id doubles as the credential a client presents when it opens its
/// room connection, so it comes from the thread-local CSPRNG rather than
/// a counter. Collisions are not checked; at 128 bits they don't happen.
pub fn generate_player_id() -> PlayerId {
    let bytes: [u8; 16] = rand::rng().random();
    PlayerId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_player_id_is_32_hex_chars() {
        let id = generate_player_id();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_generate_player_id_unique() {
        let ids: HashSet<PlayerId> = (0..1000).map(|_| generate_player_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
