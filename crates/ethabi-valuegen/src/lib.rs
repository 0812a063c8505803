//! Deterministic, seeded value generation over a [`ParamType`] tree.
//!
//! Used to produce mock RPC replies and property-test fixtures without
//! pulling a full fuzzing harness into the toolkit: the same seed always
//! produces the same values, which is what a mock server needs to be
//! replayable.

use alloy_primitives::{Address, I256, U256};
use ethabi_codec::Value;
use ethabi_types::ParamType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_DYNAMIC_LEN: u32 = 5;
const MAX_BYTES_LEN: u32 = 64;
const MAX_STRING_LEN: u32 = 16;

/// Generates one value per declared type from a seed, so a caller can
/// reproduce the exact same fixture across runs by reusing the seed.
pub fn generate_values_seeded(types: &[ParamType], seed: u64) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(seed);
    types.iter().map(|ty| generate_value(ty, &mut rng)).collect()
}

/// Generates a single value conforming to `ty`, drawing from `rng`.
pub fn generate_value(ty: &ParamType, rng: &mut impl Rng) -> Value {
    match ty {
        ParamType::Address => Value::Address(Address::from(rng.random::<[u8; 20]>())),
        ParamType::Bool => Value::Bool(rng.random_bool(0.5)),
        ParamType::String => Value::String(generate_string(rng)),
        ParamType::Bytes => {
            let len = rng.random_range(0..MAX_BYTES_LEN) as usize;
            Value::Bytes(generate_bytes(rng, len))
        }
        ParamType::FixedBytes(n) => Value::FixedBytes(generate_bytes(rng, *n as usize)),
        ParamType::Int(bits) => Value::Int(generate_int(rng, *bits)),
        ParamType::Uint(bits) => Value::Uint(generate_uint(rng, *bits)),
        ParamType::DynamicArray(elem) => {
            let len = rng.random_range(0..MAX_DYNAMIC_LEN);
            Value::Array((0..len).map(|_| generate_value(elem, rng)).collect())
        }
        ParamType::FixedArray(elem, n) => Value::Array((0..*n).map(|_| generate_value(elem, rng)).collect()),
        ParamType::Tuple(components) => Value::Tuple(components.iter().map(|c| generate_value(c, rng)).collect()),
    }
}

fn generate_bytes(rng: &mut impl Rng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.random::<u8>()).collect()
}

fn generate_string(rng: &mut impl Rng) -> String {
    let len = rng.random_range(0..MAX_STRING_LEN);
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

fn generate_uint(rng: &mut impl Rng, bits: u16) -> U256 {
    let raw = U256::from_be_bytes(rng.random::<[u8; 32]>());
    if bits >= 256 {
        return raw;
    }
    let mask = (U256::from(1u8) << u32::from(bits)) - U256::from(1u8);
    raw & mask
}

fn generate_int(rng: &mut impl Rng, bits: u16) -> I256 {
    let magnitude = generate_uint(rng, bits);
    if bits >= 256 {
        return I256::from_be_bytes(magnitude.to_be_bytes::<32>());
    }
    let sign_bit = U256::from(1u8) << (u32::from(bits) - 1);
    let value = if magnitude & sign_bit != U256::ZERO {
        let extend_mask = !((U256::from(1u8) << u32::from(bits)) - U256::from(1u8));
        magnitude | extend_mask
    } else {
        magnitude
    };
    I256::from_be_bytes(value.to_be_bytes::<32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_identical_values() {
        let types = vec![
            ParamType::Uint(256),
            ParamType::Address,
            ParamType::dynamic_array(ParamType::String),
        ];
        let a = generate_values_seeded(&types, 42);
        let b = generate_values_seeded(&types, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_usually_differ() {
        let types = vec![ParamType::Uint(256)];
        let a = generate_values_seeded(&types, 1);
        let b = generate_values_seeded(&types, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn uint_respects_declared_bit_width() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let value = generate_uint(&mut rng, 8);
            assert!(value <= U256::from(u8::MAX));
        }
    }

    #[test]
    fn int_respects_declared_bit_width() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let value = generate_int(&mut rng, 8);
            assert!(value >= I256::try_from(i8::MIN).unwrap());
            assert!(value <= I256::try_from(i8::MAX).unwrap());
        }
    }

    #[test]
    fn fixed_bytes_has_exact_length() {
        let mut rng = StdRng::seed_from_u64(3);
        match generate_value(&ParamType::fixed_bytes(12).unwrap(), &mut rng) {
            Value::FixedBytes(bytes) => assert_eq!(bytes.len(), 12),
            other => panic!("expected FixedBytes, got {other:?}"),
        }
    }

    #[test]
    fn tuple_generates_one_value_per_component() {
        let tuple = ParamType::Tuple(vec![ParamType::Bool, ParamType::Uint(256)]);
        let mut rng = StdRng::seed_from_u64(9);
        match generate_value(&tuple, &mut rng) {
            Value::Tuple(values) => assert_eq!(values.len(), 2),
            other => panic!("expected Tuple, got {other:?}"),
        }
    }
}
