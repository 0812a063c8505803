//! Standard and packed ABI encoding, and DoS-resistant ABI decoding.
//!
//! This crate is the encode/decode half of the toolkit: [`encode_parameters`]
//! and [`decode_parameters`] implement the Solidity ABI head/tail layout,
//! [`encode_packed`] implements `abi.encodePacked`, and [`abi_item`] adds a
//! thin JSON-fragment layer so callers can decode against a real ABI file.

mod abi_item;
mod decode;
mod encode;
mod error;
mod packed;
mod util;
mod value;

pub use abi_item::{decode_constructor, decode_error, decode_function, AbiItem, AbiItemParam, DecodedCall};
pub use decode::{decode_parameters, DecodeOptions};
pub use encode::{encode_parameters, encode_value_body};
pub use error::{CodecError, DecodeError, EncodeError};
pub use packed::encode_packed;
pub use util::{from_hex, to_hex};
pub use value::Value;
