use ethabi_types::ParamType;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::decode::{decode_parameters, DecodeOptions};
use crate::error::{CodecError, DecodeError};
use crate::value::Value;

/// A function/error/constructor fragment from a standard Ethereum ABI JSON
/// file, e.g. `{"type":"function","name":"transfer","inputs":[...]}`.
/// Parsing this is not itself an ABI codec operation; it exists so callers
/// can drive `decode_function`/`decode_error` from a real ABI JSON file
/// instead of having to assemble a `ParamType` list by hand.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AbiItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiItemParam>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AbiItemParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_str: String,
    #[serde(default)]
    pub components: Option<Vec<AbiItemParam>>,
}

/// Selector and decoded argument values produced by `decode_function`/
/// `decode_error`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCall {
    pub selector_hex: String,
    pub values: Vec<Value>,
}

impl AbiItem {
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        serde_json::from_str(json)
            .map_err(|e| CodecError::Decode(DecodeError::InvalidLength(e.to_string())))
    }

    fn input_types(&self) -> Result<Vec<ParamType>, CodecError> {
        self.inputs
            .iter()
            .map(abi_item_param_to_type)
            .collect::<Result<Vec<_>, _>>()
    }

    fn canonical_signature(&self) -> Result<(String, Vec<ParamType>), CodecError> {
        let types = self.input_types()?;
        let sig = format!(
            "{}({})",
            self.name,
            types.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        );
        Ok((sig, types))
    }
}

/// Decodes a function-call payload, verifying its leading 4-byte selector
/// against the one derived from `item`'s canonical signature.
pub fn decode_function(
    item: &AbiItem,
    data: &[u8],
    opts: DecodeOptions,
) -> Result<DecodedCall, CodecError> {
    decode_with_selector(item, data, opts)
}

/// Decodes a custom-error payload. Identical wire shape to a function
/// call; kept as a distinct entry point because callers branch on intent
/// (revert reason vs. call arguments), not on any difference in bytes.
pub fn decode_error(
    item: &AbiItem,
    data: &[u8],
    opts: DecodeOptions,
) -> Result<DecodedCall, CodecError> {
    decode_with_selector(item, data, opts)
}

/// Decodes constructor arguments. Constructor calldata has no selector —
/// the encoded arguments are appended directly to init bytecode — so this
/// skips the selector check that `decode_function`/`decode_error` perform.
pub fn decode_constructor(
    item: &AbiItem,
    data: &[u8],
    opts: DecodeOptions,
) -> Result<Vec<Value>, CodecError> {
    let types = item.input_types()?;
    Ok(decode_parameters(&types, data, opts)?)
}

fn decode_with_selector(
    item: &AbiItem,
    data: &[u8],
    opts: DecodeOptions,
) -> Result<DecodedCall, CodecError> {
    if data.len() < 4 {
        return Err(DecodeError::InvalidDecodeDataSize(data.len()).into());
    }
    let (selector_bytes, body) = data.split_at(4);
    let (signature, types) = item.canonical_signature()?;
    let expected = ethabi_keccak::selector(&signature);
    trace!(signature, "decode_with_selector");
    if selector_bytes != expected {
        return Err(DecodeError::InvalidAbiSignature {
            expected: hex::encode(expected),
            actual: hex::encode(selector_bytes),
        }
        .into());
    }
    let values = decode_parameters(&types, body, opts)?;
    Ok(DecodedCall {
        selector_hex: hex::encode(expected),
        values,
    })
}

fn abi_item_param_to_type(param: &AbiItemParam) -> Result<ParamType, CodecError> {
    let (base, array_sizes) = strip_array_suffixes(&param.type_str);
    let mut ty = if base == "tuple" {
        let components = param.components.as_ref().ok_or(DecodeError::InvalidLength(
            "tuple type requires components".into(),
        ))?;
        let inner = components
            .iter()
            .map(abi_item_param_to_type)
            .collect::<Result<Vec<_>, _>>()?;
        ParamType::Tuple(inner)
    } else {
        ParamType::parse(base)?
    };
    for size in array_sizes {
        ty = match size {
            Some(n) => ParamType::fixed_array(ty, n),
            None => ParamType::dynamic_array(ty),
        };
    }
    Ok(ty)
}

/// Splits `"tuple[2][]"` into (`"tuple"`, `[Some(2), None]`), innermost
/// suffix first, mirroring Solidity's left-to-right array nesting order.
fn strip_array_suffixes(type_str: &str) -> (&str, Vec<Option<usize>>) {
    let bracket = match type_str.find('[') {
        Some(pos) => pos,
        None => return (type_str, Vec::new()),
    };
    let base = &type_str[..bracket];
    let mut suffix = &type_str[bracket..];
    let mut sizes = Vec::new();
    while !suffix.is_empty() {
        let close = match suffix.find(']') {
            Some(pos) => pos,
            None => break,
        };
        let size_str = &suffix[1..close];
        sizes.push(if size_str.is_empty() {
            None
        } else {
            size_str.parse::<usize>().ok()
        });
        suffix = &suffix[close + 1..];
    }
    (base, sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFER_ABI: &str = r#"{
        "type": "function",
        "name": "transfer",
        "inputs": [
            {"name": "to", "type": "address"},
            {"name": "amount", "type": "uint256"}
        ]
    }"#;

    #[test]
    fn decodes_function_call_with_selector_check() {
        let item = AbiItem::from_json(TRANSFER_ABI).unwrap();
        let addr: alloy_primitives::Address =
            "0x4648451b5F87FF8F0F7D622bD40574bb97E25980".parse().unwrap();
        let types = item.input_types().unwrap();
        let values = vec![
            Value::Address(addr),
            Value::Uint(alloy_primitives::U256::from(1_000_000u64)),
        ];
        let encoded = crate::encode::encode_parameters(&types, &values).unwrap();
        let mut calldata = ethabi_keccak::selector("transfer(address,uint256)").to_vec();
        calldata.extend_from_slice(&encoded);

        let decoded = decode_function(&item, &calldata, DecodeOptions::default()).unwrap();
        assert_eq!(decoded.selector_hex, "a9059cbb");
        assert_eq!(decoded.values, values);
    }

    #[test]
    fn rejects_mismatched_selector() {
        let item = AbiItem::from_json(TRANSFER_ABI).unwrap();
        let bad = vec![0u8; 68];
        let err = decode_function(&item, &bad, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, CodecError::Decode(DecodeError::InvalidAbiSignature { .. })));
    }

    #[test]
    fn parses_tuple_array_components() {
        let json = r#"{
            "type": "function",
            "name": "batch",
            "inputs": [
                {
                    "name": "items",
                    "type": "tuple[]",
                    "components": [
                        {"name": "owner", "type": "address"},
                        {"name": "amount", "type": "uint256"}
                    ]
                }
            ]
        }"#;
        let item = AbiItem::from_json(json).unwrap();
        let types = item.input_types().unwrap();
        assert_eq!(
            types[0],
            ParamType::dynamic_array(ParamType::Tuple(vec![
                ParamType::Address,
                ParamType::uint(256).unwrap()
            ]))
        );
    }
}
