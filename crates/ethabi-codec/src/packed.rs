use alloy_primitives::{I256, U256};
use ethabi_types::ParamType;

use crate::encode::encode_value_body;
use crate::error::EncodeError;
use crate::value::Value;

/// Non-standard "packed" encoding: concatenation without padding, length
/// prefixes, or offset tables. Used only for off-chain hashing; the output
/// is not decodable in general since boundaries between variable-length
/// fields are lost.
///
/// Matches Solidity's `abi.encodePacked` semantics exactly, including its
/// one irregularity: array and tuple *elements* still use the padded
/// 32-byte word form (array/tuple membership is not itself packable),
/// while top-level scalar arguments are emitted at their minimum width.
pub fn encode_packed(items: &[(ParamType, Value)]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    for (ty, val) in items {
        encode_packed_top(ty, val, &mut out)?;
    }
    Ok(out)
}

fn encode_packed_top(ty: &ParamType, val: &Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    match (ty, val) {
        (ParamType::Bool, Value::Bool(b)) => {
            out.push(*b as u8);
            Ok(())
        }
        (ParamType::Address, Value::Address(a)) => {
            out.extend_from_slice(a.as_slice());
            Ok(())
        }
        (ParamType::Uint(bits), Value::Uint(u)) => {
            push_min_width_uint(*bits, *u, out);
            Ok(())
        }
        (ParamType::Int(bits), Value::Int(i)) => {
            push_min_width_int(*bits, *i, out);
            Ok(())
        }
        (ParamType::FixedBytes(n), Value::FixedBytes(b)) => {
            if b.len() != *n as usize {
                return Err(EncodeError::InvalidLength(format!("bytes{n}")));
            }
            out.extend_from_slice(b);
            Ok(())
        }
        (ParamType::String, Value::String(s)) => {
            out.extend_from_slice(s.as_bytes());
            Ok(())
        }
        (ParamType::Bytes, Value::Bytes(b)) => {
            out.extend_from_slice(b);
            Ok(())
        }
        (ParamType::DynamicArray(elem), Value::Array(items)) => {
            for item in items {
                out.extend_from_slice(&encode_value_body(elem, item)?);
            }
            Ok(())
        }
        (ParamType::FixedArray(elem, n), Value::Array(items)) => {
            if items.len() != *n {
                return Err(EncodeError::InvalidLength(format!(
                    "expected {n} elements, got {}",
                    items.len()
                )));
            }
            for item in items {
                out.extend_from_slice(&encode_value_body(elem, item)?);
            }
            Ok(())
        }
        (ParamType::Tuple(types), Value::Tuple(items)) => {
            if items.len() != types.len() {
                return Err(EncodeError::InvalidParamType(format!("{ty}")));
            }
            for (t, v) in types.iter().zip(items.iter()) {
                out.extend_from_slice(&encode_value_body(t, v)?);
            }
            Ok(())
        }
        _ => Err(EncodeError::InvalidParamType(format!(
            "{ty} does not match supplied value"
        ))),
    }
}

fn push_min_width_uint(bits: u16, value: U256, out: &mut Vec<u8>) {
    let bytes = value.to_be_bytes::<32>();
    let n = (bits as usize) / 8;
    out.extend_from_slice(&bytes[32 - n..]);
}

fn push_min_width_int(bits: u16, value: I256, out: &mut Vec<u8>) {
    let bytes = value.to_be_bytes::<32>();
    let n = (bits as usize) / 8;
    out.extend_from_slice(&bytes[32 - n..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_uint32_minimally() {
        let out =
            encode_packed(&[(ParamType::uint(32).unwrap(), Value::Uint(U256::from(0x00010f2cu32)))])
                .unwrap();
        assert_eq!(hex::encode(out), "00010f2c");
    }

    #[test]
    fn packs_strings_by_concatenation() {
        let out = encode_packed(&[
            (ParamType::String, Value::String("foo".into())),
            (ParamType::String, Value::String("bar".into())),
        ])
        .unwrap();
        assert_eq!(hex::encode(out), "666f6f626172");
    }

    #[test]
    fn packs_fixed_array_elements_as_padded_words() {
        let ty = ParamType::fixed_array(ParamType::uint(24).unwrap(), 2);
        let val = Value::Array(vec![
            Value::Uint(U256::from(69420u64)),
            Value::Uint(U256::from(69420u64)),
        ]);
        let out = encode_packed(&[(ty, val)]).unwrap();
        assert_eq!(out.len(), 64);
        assert_eq!(hex::encode(&out[0..32]), format!("{:064x}", 69420));
        assert_eq!(hex::encode(&out[32..64]), format!("{:064x}", 69420));
    }
}
