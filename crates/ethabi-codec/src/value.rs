use alloy_primitives::{Address, I256, U256};

/// A value conforming to a [`ethabi_types::ParamType`] tree.
///
/// Scalars for elementary types, sequences for arrays, field-ordered
/// vectors for tuples. `FixedBytes` carries exactly the declared length;
/// padding to 32 bytes happens at encode time, not in the value itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Address(Address),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    FixedBytes(Vec<u8>),
    Int(I256),
    Uint(U256),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    pub fn uint(value: impl Into<U256>) -> Self {
        Value::Uint(value.into())
    }
}
