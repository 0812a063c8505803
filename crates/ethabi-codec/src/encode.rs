use alloy_primitives::{I256, U256};
use ethabi_types::ParamType;

use crate::error::EncodeError;
use crate::value::Value;

/// Standard ABI encoding of an ordered parameter list: head/tail layout
/// over 32-byte words. `encode(T, V)` is a pure function of its inputs —
/// identical (types, values) produce byte-identical output on every call.
pub fn encode_parameters(types: &[ParamType], values: &[Value]) -> Result<Vec<u8>, EncodeError> {
    if types.len() != values.len() {
        return Err(EncodeError::InvalidParamType(format!(
            "expected {} values, got {}",
            types.len(),
            values.len()
        )));
    }
    let items: Vec<(ParamType, Value)> = types
        .iter()
        .cloned()
        .zip(values.iter().cloned())
        .collect();
    encode_list(&items)
}

/// Encodes a parameter list as a head/tail region. Used both for the
/// outermost call and recursively for tuple and array bodies, where the
/// offsets written into the head are relative to this region's own start.
pub(crate) fn encode_list(items: &[(ParamType, Value)]) -> Result<Vec<u8>, EncodeError> {
    let mut heads: Vec<Option<Vec<u8>>> = Vec::with_capacity(items.len());
    let mut tails: Vec<Vec<u8>> = Vec::with_capacity(items.len());
    for (ty, val) in items {
        let body = encode_value_body(ty, val)?;
        if ty.is_dynamic() {
            heads.push(None);
            tails.push(body);
        } else {
            heads.push(Some(body));
            tails.push(Vec::new());
        }
    }

    let head_size: usize = heads
        .iter()
        .map(|h| h.as_ref().map_or(32, Vec::len))
        .sum();
    let mut out = Vec::with_capacity(head_size + tails.iter().map(Vec::len).sum::<usize>());
    let mut tail_offset = head_size;
    let mut tail_concat = Vec::new();
    for (head, tail) in heads.iter().zip(tails.iter()) {
        match head {
            Some(body) => out.extend_from_slice(body),
            None => {
                out.extend_from_slice(&encode_uint_word(U256::from(tail_offset)));
                tail_offset += tail.len();
                tail_concat.extend_from_slice(tail);
            }
        }
    }
    out.extend_from_slice(&tail_concat);
    Ok(out)
}

/// Encodes a single (type, value) pair's body: the 32-byte word for a
/// scalar, or the concatenated list encoding for a tuple/array. Whether
/// that body lands in the head directly or behind an offset in the tail
/// is decided by the enclosing [`encode_list`] call, not here.
pub fn encode_value_body(ty: &ParamType, val: &Value) -> Result<Vec<u8>, EncodeError> {
    match (ty, val) {
        (ParamType::Bool, Value::Bool(b)) => Ok(encode_bool(*b)),
        (ParamType::Uint(bits), Value::Uint(u)) => encode_uint(*bits, *u),
        (ParamType::Int(bits), Value::Int(i)) => encode_int(*bits, *i),
        (ParamType::Address, Value::Address(a)) => Ok(encode_address(a)),
        (ParamType::FixedBytes(n), Value::FixedBytes(b)) => encode_fixed_bytes(*n, b),
        (ParamType::String, Value::String(s)) => Ok(encode_dynamic_bytes(s.as_bytes())),
        (ParamType::Bytes, Value::Bytes(b)) => Ok(encode_dynamic_bytes(b)),
        (ParamType::DynamicArray(elem), Value::Array(items)) => {
            let mut out = encode_uint_word(U256::from(items.len()));
            let list_items: Vec<(ParamType, Value)> = items
                .iter()
                .cloned()
                .map(|v| ((**elem).clone(), v))
                .collect();
            out.extend(encode_list(&list_items)?);
            Ok(out)
        }
        (ParamType::FixedArray(elem, n), Value::Array(items)) => {
            if items.len() != *n {
                return Err(EncodeError::InvalidLength(format!(
                    "expected {n} elements, got {}",
                    items.len()
                )));
            }
            let list_items: Vec<(ParamType, Value)> = items
                .iter()
                .cloned()
                .map(|v| ((**elem).clone(), v))
                .collect();
            encode_list(&list_items)
        }
        (ParamType::Tuple(types), Value::Tuple(items)) => {
            if items.len() != types.len() {
                return Err(EncodeError::InvalidParamType(format!(
                    "tuple expects {} fields, got {}",
                    types.len(),
                    items.len()
                )));
            }
            let list_items: Vec<(ParamType, Value)> =
                types.iter().cloned().zip(items.iter().cloned()).collect();
            encode_list(&list_items)
        }
        _ => Err(EncodeError::InvalidParamType(format!(
            "{ty} does not match supplied value"
        ))),
    }
}

fn encode_bool(b: bool) -> Vec<u8> {
    let mut word = [0u8; 32];
    word[31] = b as u8;
    word.to_vec()
}

fn encode_uint_word(value: U256) -> Vec<u8> {
    value.to_be_bytes::<32>().to_vec()
}

fn encode_uint(bits: u16, value: U256) -> Result<Vec<u8>, EncodeError> {
    if bits < 256 {
        let max = (U256::from(1u8) << (bits as u32)) - U256::from(1u8);
        if value > max {
            return Err(EncodeError::ValueOutOfRange(format!("uint{bits}")));
        }
    }
    Ok(encode_uint_word(value))
}

fn encode_int(bits: u16, value: I256) -> Result<Vec<u8>, EncodeError> {
    let bytes = value.to_be_bytes::<32>();
    if bits < 256 {
        let raw = U256::from_be_bytes(bytes);
        let shift = bits as u32;
        let mask = (U256::from(1u8) << shift) - U256::from(1u8);
        let low = raw & mask;
        let sign_bit = (low >> (shift - 1)) & U256::from(1u8);
        let sign_extended = if sign_bit == U256::from(1u8) {
            low | !mask
        } else {
            low
        };
        if sign_extended != raw {
            return Err(EncodeError::ValueOutOfRange(format!("int{bits}")));
        }
    }
    Ok(bytes.to_vec())
}

fn encode_address(address: &alloy_primitives::Address) -> Vec<u8> {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word.to_vec()
}

fn encode_fixed_bytes(n: u8, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
    if data.len() != n as usize {
        return Err(EncodeError::InvalidLength(format!(
            "bytes{n}: got {} bytes",
            data.len()
        )));
    }
    let mut word = [0u8; 32];
    word[..data.len()].copy_from_slice(data);
    Ok(word.to_vec())
}

fn encode_dynamic_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = encode_uint_word(U256::from(data.len()));
    out.extend_from_slice(data);
    let padded = crate::util::ceil32(data.len());
    out.resize(32 + padded, 0);
    out
}
