//! EIP-712 typed structured-data hashing.
//!
//! Implements `hashStruct`/`encodeType`/`encodeData` and the final
//! `hashTypedData` digest directly over a dynamic type registry, since
//! this workspace has no compile-time code generation step to derive a
//! struct's EIP-712 shape from a Rust type. Atomic field values are
//! encoded through `ethabi-codec`'s word encoder, the same 32-byte
//! padding rules the standard ABI encoder uses.

use std::collections::{BTreeSet, HashMap};

use alloy_primitives::{Address, I256, U256};
use ethabi_keccak::keccak256;
use ethabi_types::ParamType;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Eip712Error {
    #[error("unknown type {0:?}")]
    UnknownType(String),
    #[error("struct {1:?} is missing field {0:?}")]
    MissingField(String, String),
    #[error("value does not match field type {0:?}: {1}")]
    TypeMismatch(String, String),
}

/// One field of a registered struct type: `{ name: "wallet", type_str: "address" }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeField {
    pub name: String,
    pub type_str: String,
}

impl TypeField {
    pub fn new(name: impl Into<String>, type_str: impl Into<String>) -> Self {
        TypeField {
            name: name.into(),
            type_str: type_str.into(),
        }
    }
}

/// The full set of struct types a message can reference, keyed by type
/// name, mirroring the `types` map of an `eth_signTypedData_v4` payload.
pub type Eip712Types = HashMap<String, Vec<TypeField>>;

/// A value conforming to some type in an [`Eip712Types`] registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Eip712Value {
    Bool(bool),
    Uint(U256),
    Int(I256),
    Address(Address),
    /// Backs both `bytesN` (raw, length-checked against `N`) and dynamic
    /// `bytes`/`string`-adjacent binary fields; `String` is used for the
    /// `string` type specifically so UTF-8 payloads round-trip cleanly.
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Eip712Value>),
    Struct(HashMap<String, Eip712Value>),
}

/// `{name, version, chainId, verifyingContract, salt}` with absent fields
/// omitted from the synthesized `EIP712Domain` type string, per EIP-712.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eip712Domain {
    pub name: Option<String>,
    pub version: Option<String>,
    pub chain_id: Option<U256>,
    pub verifying_contract: Option<Address>,
    pub salt: Option<[u8; 32]>,
}

/// `encodeType(T)`: `T`'s own field list rendered as `Name(type name,...)`,
/// followed by every struct type it references (transitively), ordered
/// alphabetically, each rendered the same way.
pub fn encode_type(primary_type: &str, types: &Eip712Types) -> Result<String, Eip712Error> {
    let fields = types
        .get(primary_type)
        .ok_or_else(|| Eip712Error::UnknownType(primary_type.to_string()))?;

    let mut deps = BTreeSet::new();
    collect_dependencies(primary_type, types, &mut deps);
    deps.remove(primary_type);

    let mut out = render_struct(primary_type, fields);
    for dep in deps {
        let dep_fields = types
            .get(&dep)
            .ok_or_else(|| Eip712Error::UnknownType(dep.clone()))?;
        out.push_str(&render_struct(&dep, dep_fields));
    }
    Ok(out)
}

fn collect_dependencies(type_name: &str, types: &Eip712Types, seen: &mut BTreeSet<String>) {
    let Some(fields) = types.get(type_name) else {
        return;
    };
    for field in fields {
        let base = array_base(&field.type_str).unwrap_or(&field.type_str);
        if types.contains_key(base) && seen.insert(base.to_string()) {
            collect_dependencies(base, types, seen);
        }
    }
}

fn render_struct(name: &str, fields: &[TypeField]) -> String {
    let body = fields
        .iter()
        .map(|f| format!("{} {}", f.type_str, f.name))
        .collect::<Vec<_>>()
        .join(",");
    format!("{name}({body})")
}

/// `typeHash(T) = keccak(encodeType(T))`.
pub fn type_hash(primary_type: &str, types: &Eip712Types) -> Result<[u8; 32], Eip712Error> {
    Ok(keccak256(encode_type(primary_type, types)?.as_bytes()))
}

/// `encodeData(primaryType, data)`: the field values of `data` concatenated
/// in declaration order, each reduced to a 32-byte word — atomic values
/// directly, `bytes`/`string` via their Keccak digest, arrays via the
/// Keccak of their concatenated element encodings, nested structs via
/// their own `hashStruct`.
pub fn encode_data(
    primary_type: &str,
    value: &Eip712Value,
    types: &Eip712Types,
) -> Result<Vec<u8>, Eip712Error> {
    let fields = types
        .get(primary_type)
        .ok_or_else(|| Eip712Error::UnknownType(primary_type.to_string()))?;
    let data = as_struct(value, primary_type)?;

    let mut out = Vec::with_capacity(fields.len() * 32);
    for field in fields {
        let field_value = data.get(&field.name).ok_or_else(|| {
            Eip712Error::MissingField(field.name.clone(), primary_type.to_string())
        })?;
        out.extend_from_slice(&encode_field(&field.type_str, field_value, types)?);
    }
    Ok(out)
}

fn encode_field(
    type_str: &str,
    value: &Eip712Value,
    types: &Eip712Types,
) -> Result<[u8; 32], Eip712Error> {
    if let Some(base) = array_base(type_str) {
        let items = as_array(value, type_str)?;
        let mut concat = Vec::new();
        for item in items {
            concat.extend_from_slice(&encode_field(base, item, types)?);
        }
        return Ok(keccak256(&concat));
    }
    if types.contains_key(type_str) {
        return hash_struct(type_str, value, types);
    }
    match type_str {
        "string" => Ok(keccak256(as_string(value, type_str)?.as_bytes())),
        "bytes" => Ok(keccak256(as_bytes(value, type_str)?)),
        _ => encode_atomic(type_str, value),
    }
}

fn encode_atomic(type_str: &str, value: &Eip712Value) -> Result<[u8; 32], Eip712Error> {
    let ty = ParamType::parse(type_str)
        .map_err(|e| Eip712Error::TypeMismatch(type_str.to_string(), e.to_string()))?;
    let codec_value = match (&ty, value) {
        (ParamType::Bool, Eip712Value::Bool(b)) => ethabi_codec::Value::Bool(*b),
        (ParamType::Uint(_), Eip712Value::Uint(u)) => ethabi_codec::Value::Uint(*u),
        (ParamType::Int(_), Eip712Value::Int(i)) => ethabi_codec::Value::Int(*i),
        (ParamType::Address, Eip712Value::Address(a)) => ethabi_codec::Value::Address(*a),
        (ParamType::FixedBytes(n), Eip712Value::Bytes(b)) => {
            if b.len() != *n as usize {
                return Err(Eip712Error::TypeMismatch(
                    type_str.to_string(),
                    format!("expected {n} bytes, got {}", b.len()),
                ));
            }
            ethabi_codec::Value::FixedBytes(b.clone())
        }
        _ => {
            return Err(Eip712Error::TypeMismatch(
                type_str.to_string(),
                "value shape does not match field type".into(),
            ))
        }
    };
    let bytes = ethabi_codec::encode_value_body(&ty, &codec_value)
        .map_err(|e| Eip712Error::TypeMismatch(type_str.to_string(), e.to_string()))?;
    let mut word = [0u8; 32];
    word.copy_from_slice(&bytes[..32]);
    Ok(word)
}

/// `hashStruct(primaryType, data) = keccak(typeHash(primaryType) ++ encodeData(primaryType, data))`.
pub fn hash_struct(
    primary_type: &str,
    value: &Eip712Value,
    types: &Eip712Types,
) -> Result<[u8; 32], Eip712Error> {
    let hash = type_hash(primary_type, types)?;
    let data = encode_data(primary_type, value, types)?;
    let mut preimage = Vec::with_capacity(32 + data.len());
    preimage.extend_from_slice(&hash);
    preimage.extend_from_slice(&data);
    Ok(keccak256(&preimage))
}

/// Builds the synthetic `EIP712Domain` type from whichever fields of
/// `domain` are present, in the conventional `name, version, chainId,
/// verifyingContract, salt` order, and hashes it.
pub fn domain_separator(domain: &Eip712Domain) -> [u8; 32] {
    let mut fields = Vec::new();
    let mut values = HashMap::new();

    if let Some(name) = &domain.name {
        fields.push(TypeField::new("name", "string"));
        values.insert("name".to_string(), Eip712Value::String(name.clone()));
    }
    if let Some(version) = &domain.version {
        fields.push(TypeField::new("version", "string"));
        values.insert("version".to_string(), Eip712Value::String(version.clone()));
    }
    if let Some(chain_id) = domain.chain_id {
        fields.push(TypeField::new("chainId", "uint256"));
        values.insert("chainId".to_string(), Eip712Value::Uint(chain_id));
    }
    if let Some(verifying_contract) = domain.verifying_contract {
        fields.push(TypeField::new("verifyingContract", "address"));
        values.insert(
            "verifyingContract".to_string(),
            Eip712Value::Address(verifying_contract),
        );
    }
    if let Some(salt) = domain.salt {
        fields.push(TypeField::new("salt", "bytes32"));
        values.insert("salt".to_string(), Eip712Value::Bytes(salt.to_vec()));
    }

    let mut types = Eip712Types::new();
    types.insert("EIP712Domain".to_string(), fields);
    hash_struct("EIP712Domain", &Eip712Value::Struct(values), &types)
        .expect("synthesized EIP712Domain struct is always well-formed")
}

/// Final signing digest: `keccak(0x19 ‖ 0x01 ‖ domainSeparator ‖ hashStruct(primaryType, message))`.
pub fn hash_typed_data(
    domain: &Eip712Domain,
    primary_type: &str,
    types: &Eip712Types,
    message: &Eip712Value,
) -> Result<[u8; 32], Eip712Error> {
    let domain_sep = domain_separator(domain);
    let struct_hash = hash_struct(primary_type, message, types)?;
    trace!(primary_type, "hash_typed_data");
    let mut preimage = Vec::with_capacity(2 + 32 + 32);
    preimage.push(0x19);
    preimage.push(0x01);
    preimage.extend_from_slice(&domain_sep);
    preimage.extend_from_slice(&struct_hash);
    Ok(keccak256(&preimage))
}

fn array_base(type_str: &str) -> Option<&str> {
    if !type_str.ends_with(']') {
        return None;
    }
    type_str.rfind('[').map(|pos| &type_str[..pos])
}

fn as_struct<'a>(
    value: &'a Eip712Value,
    type_str: &str,
) -> Result<&'a HashMap<String, Eip712Value>, Eip712Error> {
    match value {
        Eip712Value::Struct(map) => Ok(map),
        _ => Err(Eip712Error::TypeMismatch(type_str.to_string(), "expected a struct".into())),
    }
}

fn as_array<'a>(value: &'a Eip712Value, type_str: &str) -> Result<&'a [Eip712Value], Eip712Error> {
    match value {
        Eip712Value::Array(items) => Ok(items),
        _ => Err(Eip712Error::TypeMismatch(type_str.to_string(), "expected an array".into())),
    }
}

fn as_string<'a>(value: &'a Eip712Value, type_str: &str) -> Result<&'a str, Eip712Error> {
    match value {
        Eip712Value::String(s) => Ok(s),
        _ => Err(Eip712Error::TypeMismatch(type_str.to_string(), "expected a string".into())),
    }
}

fn as_bytes<'a>(value: &'a Eip712Value, type_str: &str) -> Result<&'a [u8], Eip712Error> {
    match value {
        Eip712Value::Bytes(b) => Ok(b),
        _ => Err(Eip712Error::TypeMismatch(type_str.to_string(), "expected bytes".into())),
    }
}
