use alloy_primitives::{Address, I256, U256};
use ethabi_types::ParamType;
use tracing::trace;

use crate::error::DecodeError;
use crate::util::ceil32;
use crate::value::Value;

/// Configuration for [`decode_parameters`] and the `decode_function` /
/// `decode_error` / `decode_constructor` helpers in [`crate::abi_item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// DoS guard: the decoder fails with `BufferOverrun` once the running
    /// count of bytes it has read or reserved for pending reads exceeds
    /// this cap, regardless of how long the input buffer actually is.
    pub max_bytes: u16,
    /// When `false` (the default), bytes beyond the consumed region cause
    /// `JunkData`. When `true`, trailing bytes are silently ignored.
    pub allow_junk_data: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_bytes: 1024,
            allow_junk_data: false,
        }
    }
}

/// Inverse of [`crate::encode::encode_parameters`]. `data` must be a
/// multiple of 32 bytes (the caller strips any 4-byte selector first).
pub fn decode_parameters(
    types: &[ParamType],
    data: &[u8],
    opts: DecodeOptions,
) -> Result<Vec<Value>, DecodeError> {
    trace!(len = data.len(), max_bytes = opts.max_bytes, "decode_parameters");
    if data.len() % 32 != 0 {
        return Err(DecodeError::InvalidDecodeDataSize(data.len()));
    }
    let mut decoder = Decoder::new(data, opts);
    let values = decoder.decode_list(types, 0)?;
    if !opts.allow_junk_data && decoder.max_consumed < data.len() {
        return Err(DecodeError::JunkData(data.len() - decoder.max_consumed));
    }
    Ok(values)
}

struct Decoder<'a> {
    buf: &'a [u8],
    opts: DecodeOptions,
    bytes_read: usize,
    max_consumed: usize,
}

impl<'a> Decoder<'a> {
    fn new(buf: &'a [u8], opts: DecodeOptions) -> Self {
        Decoder {
            buf,
            opts,
            bytes_read: 0,
            max_consumed: 0,
        }
    }

    fn charge(&mut self, n: usize) -> Result<(), DecodeError> {
        self.bytes_read = self.bytes_read.saturating_add(n);
        if self.bytes_read > self.opts.max_bytes as usize {
            return Err(DecodeError::BufferOverrun(self.opts.max_bytes));
        }
        Ok(())
    }

    fn touch(&mut self, end: usize) {
        self.max_consumed = self.max_consumed.max(end);
    }

    fn read_word(&mut self, at: usize) -> Result<[u8; 32], DecodeError> {
        self.charge(32)?;
        let end = at
            .checked_add(32)
            .ok_or(DecodeError::BufferOverrun(self.opts.max_bytes))?;
        self.touch(end);
        let slice = self
            .buf
            .get(at..end)
            .ok_or(DecodeError::InvalidDecodeDataSize(self.buf.len()))?;
        let mut word = [0u8; 32];
        word.copy_from_slice(slice);
        Ok(word)
    }

    /// Decodes a parameter list starting at `region_base`, where dynamic
    /// offsets found in the head are interpreted relative to `region_base`
    /// itself — not the outermost buffer — matching [`crate::encode::encode_list`].
    fn decode_list(
        &mut self,
        types: &[ParamType],
        region_base: usize,
    ) -> Result<Vec<Value>, DecodeError> {
        let mut values = Vec::with_capacity(types.len());
        let mut pos = region_base;
        for ty in types {
            if ty.is_dynamic() {
                let offset_word = self.read_word(pos)?;
                let offset = word_to_usize(&offset_word, self.opts.max_bytes)?;
                let body_pos = region_base
                    .checked_add(offset)
                    .ok_or(DecodeError::BufferOverrun(self.opts.max_bytes))?;
                values.push(self.decode_dynamic_body(ty, body_pos)?);
                pos += 32;
            } else {
                values.push(self.decode_static(ty, pos)?);
                pos += static_size(ty);
            }
        }
        Ok(values)
    }

    fn decode_static(&mut self, ty: &ParamType, pos: usize) -> Result<Value, DecodeError> {
        match ty {
            ParamType::Bool => {
                let word = self.read_word(pos)?;
                Ok(Value::Bool(word[31] != 0))
            }
            ParamType::Uint(_) => {
                let word = self.read_word(pos)?;
                Ok(Value::Uint(U256::from_be_bytes(word)))
            }
            ParamType::Int(_) => {
                let word = self.read_word(pos)?;
                Ok(Value::Int(I256::from_be_bytes(word)))
            }
            ParamType::Address => {
                let word = self.read_word(pos)?;
                Ok(Value::Address(Address::from_slice(&word[12..32])))
            }
            ParamType::FixedBytes(n) => {
                let word = self.read_word(pos)?;
                Ok(Value::FixedBytes(word[..*n as usize].to_vec()))
            }
            ParamType::Tuple(types) => {
                let items = self.decode_list(types, pos)?;
                Ok(Value::Tuple(items))
            }
            ParamType::FixedArray(elem, n) => {
                let types: Vec<ParamType> = std::iter::repeat((**elem).clone()).take(*n).collect();
                let items = self.decode_list(&types, pos)?;
                Ok(Value::Array(items))
            }
            ParamType::String | ParamType::Bytes | ParamType::DynamicArray(_) => {
                unreachable!("dynamic types are routed through decode_dynamic_body")
            }
        }
    }

    fn decode_dynamic_body(&mut self, ty: &ParamType, body_pos: usize) -> Result<Value, DecodeError> {
        match ty {
            ParamType::String | ParamType::Bytes => {
                let len_word = self.read_word(body_pos)?;
                let len = word_to_usize(&len_word, self.opts.max_bytes)?;
                let padded = ceil32(len);
                self.charge(padded)?;
                let data_start = body_pos + 32;
                let end = data_start
                    .checked_add(padded)
                    .ok_or(DecodeError::BufferOverrun(self.opts.max_bytes))?;
                self.touch(end);
                let raw = self
                    .buf
                    .get(data_start..data_start + len)
                    .ok_or(DecodeError::InvalidDecodeDataSize(self.buf.len()))?;
                if matches!(ty, ParamType::String) {
                    let s = String::from_utf8(raw.to_vec())
                        .map_err(|_| DecodeError::InvalidLength("string is not valid utf-8".into()))?;
                    Ok(Value::String(s))
                } else {
                    Ok(Value::Bytes(raw.to_vec()))
                }
            }
            ParamType::DynamicArray(elem) => {
                let len_word = self.read_word(body_pos)?;
                let len = word_to_usize(&len_word, self.opts.max_bytes)?;
                let reserved = len
                    .checked_mul(32)
                    .ok_or(DecodeError::BufferOverrun(self.opts.max_bytes))?;
                self.charge(reserved)?;
                let types: Vec<ParamType> = std::iter::repeat((**elem).clone()).take(len).collect();
                let items = self.decode_list(&types, body_pos + 32)?;
                Ok(Value::Array(items))
            }
            ParamType::Tuple(types) => {
                let items = self.decode_list(types, body_pos)?;
                Ok(Value::Tuple(items))
            }
            ParamType::FixedArray(elem, n) => {
                let types: Vec<ParamType> = std::iter::repeat((**elem).clone()).take(*n).collect();
                let items = self.decode_list(&types, body_pos)?;
                Ok(Value::Array(items))
            }
            _ => self.decode_static(ty, body_pos),
        }
    }
}

fn word_to_usize(word: &[u8; 32], max_bytes: u16) -> Result<usize, DecodeError> {
    let value = U256::from_be_bytes(*word);
    usize::try_from(value).map_err(|_| DecodeError::BufferOverrun(max_bytes))
}

fn static_size(ty: &ParamType) -> usize {
    match ty {
        ParamType::Tuple(types) => types.iter().map(static_size).sum(),
        ParamType::FixedArray(elem, n) => static_size(elem) * n,
        _ => 32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_parameters;

    #[test]
    fn round_trips_uint256() {
        let types = vec![ParamType::uint(256).unwrap()];
        let values = vec![Value::Uint(U256::from(69420u64))];
        let bytes = encode_parameters(&types, &values).unwrap();
        let decoded = decode_parameters(&types, &bytes, DecodeOptions::default()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn round_trips_nested_dynamic_array_of_strings() {
        let types = vec![ParamType::dynamic_array(ParamType::String)];
        let values = vec![Value::Array(vec![
            Value::String("foo".into()),
            Value::String("barbaz".into()),
        ])];
        let bytes = encode_parameters(&types, &values).unwrap();
        let decoded = decode_parameters(&types, &bytes, DecodeOptions::default()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn round_trips_tuple_with_dynamic_field() {
        let types = vec![ParamType::Tuple(vec![ParamType::Bool, ParamType::String])];
        let values = vec![Value::Tuple(vec![
            Value::Bool(true),
            Value::String("hello".into()),
        ])];
        let bytes = encode_parameters(&types, &values).unwrap();
        let decoded = decode_parameters(&types, &bytes, DecodeOptions::default()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn rejects_buffer_not_multiple_of_32() {
        let err = decode_parameters(&[ParamType::Bool], &[0u8; 10], DecodeOptions::default())
            .unwrap_err();
        assert_eq!(err, DecodeError::InvalidDecodeDataSize(10));
    }

    #[test]
    fn rejects_junk_data_by_default() {
        let types = vec![ParamType::Bool];
        let mut bytes = encode_parameters(&types, &[Value::Bool(true)]).unwrap();
        bytes.extend_from_slice(&[0u8; 32]);
        let err = decode_parameters(&types, &bytes, DecodeOptions::default()).unwrap_err();
        assert_eq!(err, DecodeError::JunkData(32));

        let opts = DecodeOptions {
            allow_junk_data: true,
            ..Default::default()
        };
        let decoded = decode_parameters(&types, &bytes, opts).unwrap();
        assert_eq!(decoded, vec![Value::Bool(true)]);
    }

    #[test]
    fn dos_guard_rejects_huge_declared_array_length() {
        // A single dynamic-array parameter whose head claims an offset of
        // 0x20 and whose length word claims an absurd element count, with
        // no real backing data. Must fail with BufferOverrun, not attempt
        // to allocate a few-hundred-million-element Vec.
        let mut bytes = vec![0u8; 64];
        bytes[31] = 0x20; // offset = 32
        let huge_len = U256::from(u64::MAX);
        bytes[32..64].copy_from_slice(&huge_len.to_be_bytes::<32>());

        let types = vec![ParamType::dynamic_array(ParamType::uint(256).unwrap())];
        let err = decode_parameters(&types, &bytes, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::BufferOverrun(_)));
    }

    #[test]
    fn offsets_are_within_bounds() {
        let types = vec![ParamType::dynamic_array(ParamType::int(256).unwrap())];
        let values = vec![Value::Array(vec![
            Value::Int(I256::try_from(4).unwrap()),
            Value::Int(I256::try_from(2).unwrap()),
            Value::Int(I256::try_from(0).unwrap()),
        ])];
        let bytes = encode_parameters(&types, &values).unwrap();
        // offset word at position 0 must point within the buffer.
        let offset = word_to_usize(&bytes[0..32].try_into().unwrap(), 4096).unwrap();
        assert!(offset < bytes.len());
        let decoded = decode_parameters(&types, &bytes, DecodeOptions::default()).unwrap();
        assert_eq!(decoded, values);
    }
}
