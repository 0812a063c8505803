use crate::TxError;
use alloy_primitives::{Address, B256};

/// A raw ECDSA signature in the shape external signers hand back: `v` is the
/// recovery id (0 or 1), not the chain-id-offset legacy `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

/// Capability the core consumes to turn a pre-image hash into a signature,
/// and to recover a sender address from one. Key generation and the
/// secp256k1 math live entirely on the implementor's side.
pub trait Signer {
    fn sign(&self, hash: B256) -> Result<RawSignature, TxError>;
    fn recover_address(&self, signature: &RawSignature, hash: B256) -> Result<Address, TxError>;
}

/// Capability the core consumes for EIP-4844 blob commitment/proof
/// generation. `loaded` reports whether the trusted setup has been
/// initialized; callers should check it before committing to a blob
/// transaction flow.
pub trait Kzg {
    fn blob_to_commitment(&self, blob: &[u8]) -> Result<[u8; 48], TxError>;
    fn compute_blob_proof(&self, blob: &[u8], commitment: &[u8; 48]) -> Result<[u8; 48], TxError>;
    fn loaded(&self) -> bool;
}
