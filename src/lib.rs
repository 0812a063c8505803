//! Client-side Ethereum toolkit core.
//!
//! This crate has no logic of its own: it re-exports the workspace's
//! component crates under one namespace for downstream consumers that want
//! the whole toolkit behind a single dependency.

pub use ethabi_codec as codec;
pub use ethabi_eip712 as eip712;
pub use ethabi_evm as evm;
pub use ethabi_keccak as keccak;
pub use ethabi_rlp as rlp;
pub use ethabi_tx as tx;
pub use ethabi_types as types;
pub use ethabi_valuegen as valuegen;
