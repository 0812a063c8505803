//! Keccak-256 hashing and signature-derived selectors.
//!
//! Uses the NIST SHA-3 draft padding (`0x01`), not the final FIPS-202
//! variant — this is the hash Ethereum actually uses under the name
//! "keccak256", despite the `sha3` crate's `Keccak256` type name suggesting
//! otherwise.

use sha3::{Digest, Keccak256};

/// Keccak-256 digest of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// 4-byte function/error selector: the first 4 bytes of the Keccak-256
/// digest of the canonical signature string `name(type1,type2,...)`.
pub fn selector(canonical_signature: &str) -> [u8; 4] {
    let digest = keccak256(canonical_signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// Full 32-byte digest of a canonical signature, used as an event topic.
pub fn event_topic(canonical_signature: &str) -> [u8; 32] {
    keccak256(canonical_signature.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_input() {
        let digest = keccak256(b"");
        assert_eq!(
            hex::encode(digest),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn transfer_selector_matches_reference() {
        assert_eq!(
            selector("transfer(address,uint256)"),
            [0xa9, 0x05, 0x9c, 0xbb]
        );
    }

    #[test]
    fn bar_selector_matches_reference() {
        assert_eq!(selector("bar(uint256)"), [0x04, 0x23, 0xa1, 0x32]);
    }

    #[test]
    fn event_topic_is_full_digest() {
        let topic = event_topic("Transfer(address,address,uint256)");
        assert_eq!(topic.len(), 32);
        assert_eq!(&topic[..4], &selector("Transfer(address,address,uint256)"));
    }
}
