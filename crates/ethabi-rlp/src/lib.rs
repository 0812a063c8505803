//! Recursive Length Prefix encoding and strict canonical decoding.
//!
//! RLP has exactly one valid encoding per value; this decoder enforces
//! that rather than accepting any prefix that merely parses, since
//! consensus-critical transaction bytes depend on canonical form.

use alloy_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RlpError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("non-minimal length encoding")]
    NonMinimalLength,
    #[error("{0} trailing bytes after a complete item")]
    TrailingBytes(usize),
    #[error("declared length does not fit")]
    LengthOverflow,
    #[error("expected a {0}")]
    UnexpectedShape(&'static str),
}

/// An RLP value tree: either a byte string or a list of items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    String(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        RlpItem::String(bytes.into())
    }

    pub fn list(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }

    pub fn address(addr: &Address) -> Self {
        RlpItem::String(addr.as_slice().to_vec())
    }

    pub fn u64(value: u64) -> Self {
        if value == 0 {
            return RlpItem::String(Vec::new());
        }
        let bytes = value.to_be_bytes();
        let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap();
        RlpItem::String(bytes[first_nonzero..].to_vec())
    }

    pub fn u256(value: U256) -> Self {
        if value.is_zero() {
            return RlpItem::String(Vec::new());
        }
        let bytes = value.to_be_bytes::<32>();
        let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap();
        RlpItem::String(bytes[first_nonzero..].to_vec())
    }

    pub fn u128(value: u128) -> Self {
        if value == 0 {
            return RlpItem::String(Vec::new());
        }
        let bytes = value.to_be_bytes();
        let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap();
        RlpItem::String(bytes[first_nonzero..].to_vec())
    }

    pub fn as_string(&self) -> Result<&[u8], RlpError> {
        match self {
            RlpItem::String(s) => Ok(s),
            RlpItem::List(_) => Err(RlpError::UnexpectedShape("string")),
        }
    }

    pub fn as_list(&self) -> Result<&[RlpItem], RlpError> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::String(_) => Err(RlpError::UnexpectedShape("list")),
        }
    }

    pub fn to_u64(&self) -> Result<u64, RlpError> {
        let bytes = self.as_string()?;
        decode_minimal_uint(bytes, 8)?;
        let mut buf = [0u8; 8];
        buf[8 - bytes.len()..].copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn to_u256(&self) -> Result<U256, RlpError> {
        let bytes = self.as_string()?;
        decode_minimal_uint(bytes, 32)?;
        let mut buf = [0u8; 32];
        buf[32 - bytes.len()..].copy_from_slice(bytes);
        Ok(U256::from_be_bytes(buf))
    }

    pub fn to_u128(&self) -> Result<u128, RlpError> {
        let bytes = self.as_string()?;
        decode_minimal_uint(bytes, 16)?;
        let mut buf = [0u8; 16];
        buf[16 - bytes.len()..].copy_from_slice(bytes);
        Ok(u128::from_be_bytes(buf))
    }

    pub fn to_address(&self) -> Result<Address, RlpError> {
        let bytes = self.as_string()?;
        if bytes.len() != 20 {
            return Err(RlpError::UnexpectedShape("20-byte address"));
        }
        Ok(Address::from_slice(bytes))
    }
}

fn decode_minimal_uint(bytes: &[u8], max_len: usize) -> Result<(), RlpError> {
    if bytes.len() > max_len {
        return Err(RlpError::LengthOverflow);
    }
    if bytes.first() == Some(&0) {
        return Err(RlpError::NonMinimalLength);
    }
    Ok(())
}

/// Encodes an RLP item tree into bytes.
pub fn encode(item: &RlpItem) -> Vec<u8> {
    match item {
        RlpItem::String(s) => encode_string(s),
        RlpItem::List(items) => {
            let body: Vec<u8> = items.iter().flat_map(encode).collect();
            let mut out = encode_list_header(body.len());
            out.extend_from_slice(&body);
            out
        }
    }
}

fn encode_string(s: &[u8]) -> Vec<u8> {
    if s.len() == 1 && s[0] < 0x80 {
        vec![s[0]]
    } else if s.len() <= 55 {
        let mut out = Vec::with_capacity(1 + s.len());
        out.push(0x80 + s.len() as u8);
        out.extend_from_slice(s);
        out
    } else {
        let len_be = minimal_be(s.len());
        let mut out = Vec::with_capacity(1 + len_be.len() + s.len());
        out.push(0xb7 + len_be.len() as u8);
        out.extend_from_slice(&len_be);
        out.extend_from_slice(s);
        out
    }
}

fn encode_list_header(body_len: usize) -> Vec<u8> {
    if body_len <= 55 {
        vec![0xc0 + body_len as u8]
    } else {
        let len_be = minimal_be(body_len);
        let mut out = Vec::with_capacity(1 + len_be.len());
        out.push(0xf7 + len_be.len() as u8);
        out.extend_from_slice(&len_be);
        out
    }
}

fn minimal_be(n: usize) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[first_nonzero..].to_vec()
}

/// Decodes a complete RLP item from `data`. Rejects non-minimal length
/// encodings and reports `TrailingBytes` if `data` contains more than one
/// top-level item.
pub fn decode(data: &[u8]) -> Result<RlpItem, RlpError> {
    let (item, rest) = decode_item(data)?;
    if !rest.is_empty() {
        return Err(RlpError::TrailingBytes(rest.len()));
    }
    Ok(item)
}

fn decode_item(data: &[u8]) -> Result<(RlpItem, &[u8]), RlpError> {
    let first = *data.first().ok_or(RlpError::UnexpectedEnd)?;
    match first {
        0x00..=0x7f => Ok((RlpItem::String(vec![first]), &data[1..])),
        0x80..=0xb7 => {
            let len = (first - 0x80) as usize;
            let body = data.get(1..1 + len).ok_or(RlpError::UnexpectedEnd)?;
            if len == 1 && body[0] < 0x80 {
                return Err(RlpError::NonMinimalLength);
            }
            Ok((RlpItem::String(body.to_vec()), &data[1 + len..]))
        }
        0xb8..=0xbf => {
            let (len, header_len) = decode_long_length(data, first - 0xb7)?;
            let start = 1 + header_len;
            let body = data.get(start..start + len).ok_or(RlpError::UnexpectedEnd)?;
            Ok((RlpItem::String(body.to_vec()), &data[start + len..]))
        }
        0xc0..=0xf7 => {
            let len = (first - 0xc0) as usize;
            let body = data.get(1..1 + len).ok_or(RlpError::UnexpectedEnd)?;
            Ok((RlpItem::List(decode_list_body(body)?), &data[1 + len..]))
        }
        0xf8..=0xff => {
            let (len, header_len) = decode_long_length(data, first - 0xf7)?;
            let start = 1 + header_len;
            let body = data.get(start..start + len).ok_or(RlpError::UnexpectedEnd)?;
            Ok((RlpItem::List(decode_list_body(body)?), &data[start + len..]))
        }
    }
}

fn decode_long_length(data: &[u8], len_of_len: u8) -> Result<(usize, usize), RlpError> {
    let len_of_len = len_of_len as usize;
    let len_bytes = data.get(1..1 + len_of_len).ok_or(RlpError::UnexpectedEnd)?;
    if len_bytes[0] == 0 {
        return Err(RlpError::NonMinimalLength);
    }
    if len_bytes.len() > usize::BITS as usize / 8 {
        return Err(RlpError::LengthOverflow);
    }
    let mut buf = [0u8; 8];
    buf[8 - len_bytes.len()..].copy_from_slice(len_bytes);
    let len = u64::from_be_bytes(buf) as usize;
    if len <= 55 {
        return Err(RlpError::NonMinimalLength);
    }
    Ok((len, len_of_len))
}

fn decode_list_body(mut body: &[u8]) -> Result<Vec<RlpItem>, RlpError> {
    let mut items = Vec::new();
    while !body.is_empty() {
        let (item, rest) = decode_item(body)?;
        items.push(item);
        body = rest;
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_and_list() {
        assert_eq!(encode(&RlpItem::string(Vec::new())), vec![0x80]);
        assert_eq!(encode(&RlpItem::list(Vec::new())), vec![0xc0]);
    }

    #[test]
    fn single_zero_byte_is_itself() {
        assert_eq!(encode(&RlpItem::string(vec![0x00])), vec![0x00]);
    }

    #[test]
    fn short_and_long_strings() {
        let short = RlpItem::string(b"dog".to_vec());
        assert_eq!(hex::encode(encode(&short)), "83646f67");

        let long = RlpItem::string(vec![b'a'; 56]);
        let encoded = encode(&long);
        assert_eq!(encoded[0], 0xb8);
        assert_eq!(encoded[1], 56);
    }

    #[test]
    fn nested_list_round_trips() {
        let item = RlpItem::list(vec![
            RlpItem::string(b"cat".to_vec()),
            RlpItem::list(vec![RlpItem::string(b"dog".to_vec())]),
        ]);
        let bytes = encode(&item);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, item);
    }

    #[test]
    fn rejects_non_minimal_single_byte_string() {
        // 0x8100 encodes the one-byte string 0x00, which should have been
        // encoded as the bare byte 0x00 instead.
        let err = decode(&[0x81, 0x00]).unwrap_err();
        assert_eq!(err, RlpError::NonMinimalLength);
    }

    #[test]
    fn reports_unexpected_end_on_truncation() {
        let err = decode(&[0x83, b'd', b'o']).unwrap_err();
        assert_eq!(err, RlpError::UnexpectedEnd);
    }

    #[test]
    fn integer_helpers_round_trip() {
        for n in [0u64, 1, 255, 256, u64::MAX] {
            let item = RlpItem::u64(n);
            assert_eq!(item.to_u64().unwrap(), n);
        }
        let u = U256::from(123456789u64);
        assert_eq!(RlpItem::u256(u).to_u256().unwrap(), u);
    }
}
