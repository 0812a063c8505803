/// Rounds `n` up to the next multiple of 32, the ABI word size.
pub(crate) fn ceil32(n: usize) -> usize {
    n.div_ceil(32) * 32
}

/// Hex-encodes bytes with a leading `0x`, matching how every end-to-end
/// scenario in this toolkit's test vectors is written.
pub fn to_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decodes a `0x`-prefixed or bare hex string into bytes.
pub fn from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil32_rounds_up() {
        assert_eq!(ceil32(0), 0);
        assert_eq!(ceil32(1), 32);
        assert_eq!(ceil32(32), 32);
        assert_eq!(ceil32(33), 64);
    }

    #[test]
    fn hex_round_trips() {
        let bytes = vec![0xde, 0xad, 0xbe, 0xef];
        assert_eq!(to_hex(&bytes), "0xdeadbeef");
        assert_eq!(from_hex("0xdeadbeef").unwrap(), bytes);
        assert_eq!(from_hex("deadbeef").unwrap(), bytes);
    }
}
