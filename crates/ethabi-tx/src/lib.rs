//! Typed transaction envelopes, RLP field lists, and blob sidecar assembly.
//!
//! The serializer is a pure function of the envelope: signing is performed
//! by handing the pre-image hash to an external [`Signer`], never by
//! holding key material in this crate.

mod access_list;
mod error;
mod sidecar;
mod signer;

pub use access_list::{AccessList, AccessListItem};
pub use error::TxError;
pub use sidecar::{build_blob_sidecar, serialize_with_sidecar, BlobSidecar};
pub use signer::{Kzg, RawSignature, Signer};

use alloy_primitives::{Address, B256, U256};
use ethabi_keccak::keccak256;
use ethabi_rlp::{decode as rlp_decode, encode as rlp_encode, RlpError, RlpItem};

/// Maximum number of blobs a single Cancun transaction may carry.
pub const MAX_BLOB_NUMBER_PER_BLOCK: usize = 6;
/// The only versioned-hash scheme currently defined (KZG commitments).
pub const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTx {
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BerlinTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: AccessList,
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LondonTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: AccessList,
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancunTx {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    /// `None` would mean contract creation, which EIP-4844 forbids for blob transactions.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: AccessList,
    pub max_fee_per_blob_gas: u128,
    pub blob_versioned_hashes: Vec<B256>,
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEnvelope {
    Legacy(LegacyTx),
    Berlin(BerlinTx),
    London(LondonTx),
    Cancun(CancunTx),
}

impl TxEnvelope {
    pub fn tx_type(&self) -> u8 {
        match self {
            TxEnvelope::Legacy(_) => 0x00,
            TxEnvelope::Berlin(_) => 0x01,
            TxEnvelope::London(_) => 0x02,
            TxEnvelope::Cancun(_) => 0x03,
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            TxEnvelope::Legacy(tx) => tx.chain_id,
            TxEnvelope::Berlin(tx) => Some(tx.chain_id),
            TxEnvelope::London(tx) => Some(tx.chain_id),
            TxEnvelope::Cancun(tx) => Some(tx.chain_id),
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            TxEnvelope::Legacy(tx) => tx.signature.as_ref(),
            TxEnvelope::Berlin(tx) => tx.signature.as_ref(),
            TxEnvelope::London(tx) => tx.signature.as_ref(),
            TxEnvelope::Cancun(tx) => tx.signature.as_ref(),
        }
    }

    fn with_signature(&self, signature: Option<Signature>) -> TxEnvelope {
        match self.clone() {
            TxEnvelope::Legacy(mut tx) => {
                tx.signature = signature;
                TxEnvelope::Legacy(tx)
            }
            TxEnvelope::Berlin(mut tx) => {
                tx.signature = signature;
                TxEnvelope::Berlin(tx)
            }
            TxEnvelope::London(mut tx) => {
                tx.signature = signature;
                TxEnvelope::London(tx)
            }
            TxEnvelope::Cancun(mut tx) => {
                tx.signature = signature;
                TxEnvelope::Cancun(tx)
            }
        }
    }
}

fn to_item(to: Option<Address>) -> RlpItem {
    match to {
        Some(addr) => RlpItem::address(&addr),
        None => RlpItem::string(Vec::new()),
    }
}

fn legacy_fields(tx: &LegacyTx) -> Vec<RlpItem> {
    let mut fields = vec![
        RlpItem::u64(tx.nonce),
        RlpItem::u128(tx.gas_price),
        RlpItem::u64(tx.gas_limit),
        to_item(tx.to),
        RlpItem::u256(tx.value),
        RlpItem::string(tx.data.clone()),
    ];
    match &tx.signature {
        Some(sig) => {
            fields.push(RlpItem::u64(sig.v));
            fields.push(RlpItem::u256(sig.r));
            fields.push(RlpItem::u256(sig.s));
        }
        None => {
            if let Some(chain_id) = tx.chain_id {
                fields.push(RlpItem::u64(chain_id));
                fields.push(RlpItem::u64(0));
                fields.push(RlpItem::u64(0));
            }
        }
    }
    fields
}

fn typed_fields(
    chain_id: u64,
    nonce: u64,
    price_fields: Vec<RlpItem>,
    gas_limit: u64,
    to: Option<Address>,
    value: U256,
    data: &[u8],
    access_list: &AccessList,
    tail_fields: Vec<RlpItem>,
    signature: &Option<Signature>,
) -> Vec<RlpItem> {
    let mut fields = vec![RlpItem::u64(chain_id), RlpItem::u64(nonce)];
    fields.extend(price_fields);
    fields.push(RlpItem::u64(gas_limit));
    fields.push(to_item(to));
    fields.push(RlpItem::u256(value));
    fields.push(RlpItem::string(data.to_vec()));
    fields.push(access_list::encode_access_list(access_list));
    fields.extend(tail_fields);
    if let Some(sig) = signature {
        fields.push(RlpItem::u64(sig.v));
        fields.push(RlpItem::u256(sig.r));
        fields.push(RlpItem::u256(sig.s));
    }
    fields
}

fn berlin_fields(tx: &BerlinTx) -> Vec<RlpItem> {
    typed_fields(
        tx.chain_id,
        tx.nonce,
        vec![RlpItem::u128(tx.gas_price)],
        tx.gas_limit,
        tx.to,
        tx.value,
        &tx.data,
        &tx.access_list,
        Vec::new(),
        &tx.signature,
    )
}

fn london_fields(tx: &LondonTx) -> Vec<RlpItem> {
    typed_fields(
        tx.chain_id,
        tx.nonce,
        vec![
            RlpItem::u128(tx.max_priority_fee_per_gas),
            RlpItem::u128(tx.max_fee_per_gas),
        ],
        tx.gas_limit,
        tx.to,
        tx.value,
        &tx.data,
        &tx.access_list,
        Vec::new(),
        &tx.signature,
    )
}

pub(crate) fn cancun_fields(tx: &CancunTx) -> Vec<RlpItem> {
    let hashes = RlpItem::list(
        tx.blob_versioned_hashes
            .iter()
            .map(|h| RlpItem::string(h.as_slice().to_vec()))
            .collect(),
    );
    typed_fields(
        tx.chain_id,
        tx.nonce,
        vec![
            RlpItem::u128(tx.max_priority_fee_per_gas),
            RlpItem::u128(tx.max_fee_per_gas),
        ],
        tx.gas_limit,
        tx.to,
        tx.value,
        &tx.data,
        &tx.access_list,
        vec![RlpItem::u128(tx.max_fee_per_blob_gas), hashes],
        &tx.signature,
    )
}

fn envelope_fields(envelope: &TxEnvelope) -> Vec<RlpItem> {
    match envelope {
        TxEnvelope::Legacy(tx) => legacy_fields(tx),
        TxEnvelope::Berlin(tx) => berlin_fields(tx),
        TxEnvelope::London(tx) => london_fields(tx),
        TxEnvelope::Cancun(tx) => cancun_fields(tx),
    }
}

/// Serializes a transaction envelope to its canonical wire bytes, either the
/// bare RLP list (legacy) or the EIP-2718 `type_byte ‖ rlp(list)` form.
pub fn serialize_transaction(envelope: &TxEnvelope) -> Vec<u8> {
    let body = rlp_encode(&RlpItem::list(envelope_fields(envelope)));
    match envelope.tx_type() {
        0x00 => body,
        ty => {
            let mut out = Vec::with_capacity(1 + body.len());
            out.push(ty);
            out.extend_from_slice(&body);
            out
        }
    }
}

/// Parses a transaction envelope from its wire bytes.
///
/// Accepts both the unsigned pre-image form (no trailing `v, r, s`) and the
/// fully signed form; the distinction is recovered from field count.
pub fn deserialize_transaction(data: &[u8]) -> Result<TxEnvelope, TxError> {
    let (ty, body) = match data.first() {
        None => return Err(RlpError::UnexpectedEnd.into()),
        Some(b) if *b <= 0x7f => (*b, &data[1..]),
        _ => (0x00, data),
    };
    let item = rlp_decode(body)?;
    let fields = item.as_list()?;
    match ty {
        0x00 => decode_legacy(fields),
        0x01 => decode_berlin(fields),
        0x02 => decode_london(fields),
        0x03 => decode_cancun(fields),
        other => Err(TxError::UnsupportedTransactionType(other)),
    }
}

fn item_to_address(item: &RlpItem) -> Result<Option<Address>, TxError> {
    let bytes = item.as_string()?;
    if bytes.is_empty() {
        Ok(None)
    } else {
        Ok(Some(item.to_address()?))
    }
}

fn decode_legacy(fields: &[RlpItem]) -> Result<TxEnvelope, TxError> {
    if fields.len() != 6 && fields.len() != 9 {
        return Err(TxError::InvalidFieldCount(fields.len()));
    }
    let nonce = fields[0].to_u64()?;
    let gas_price = fields[1].to_u128()?;
    let gas_limit = fields[2].to_u64()?;
    let to = item_to_address(&fields[3])?;
    let value = fields[4].to_u256()?;
    let data = fields[5].as_string()?.to_vec();

    let (chain_id, signature) = if fields.len() == 9 {
        let v = fields[6].to_u64()?;
        let r = fields[7].to_u256()?;
        let s = fields[8].to_u256()?;
        if r.is_zero() && s.is_zero() {
            (Some(v), None)
        } else if v >= 35 {
            (Some((v - 35) / 2), Some(Signature { v, r, s }))
        } else {
            (None, Some(Signature { v, r, s }))
        }
    } else {
        (None, None)
    };

    Ok(TxEnvelope::Legacy(LegacyTx {
        chain_id,
        nonce,
        gas_price,
        gas_limit,
        to,
        value,
        data,
        signature,
    }))
}

fn decode_access_list(item: &RlpItem) -> Result<AccessList, TxError> {
    access_list::decode_access_list(item)
}

fn decode_typed_tail(fields: &[RlpItem], base_len: usize) -> Result<Option<Signature>, TxError> {
    match fields.len() - base_len {
        0 => Ok(None),
        3 => Ok(Some(Signature {
            v: fields[base_len].to_u64()?,
            r: fields[base_len + 1].to_u256()?,
            s: fields[base_len + 2].to_u256()?,
        })),
        n => Err(TxError::InvalidFieldCount(base_len + n)),
    }
}

fn decode_berlin(fields: &[RlpItem]) -> Result<TxEnvelope, TxError> {
    const BASE: usize = 8;
    if fields.len() != BASE && fields.len() != BASE + 3 {
        return Err(TxError::InvalidFieldCount(fields.len()));
    }
    let signature = decode_typed_tail(fields, BASE)?;
    Ok(TxEnvelope::Berlin(BerlinTx {
        chain_id: fields[0].to_u64()?,
        nonce: fields[1].to_u64()?,
        gas_price: fields[2].to_u128()?,
        gas_limit: fields[3].to_u64()?,
        to: item_to_address(&fields[4])?,
        value: fields[5].to_u256()?,
        data: fields[6].as_string()?.to_vec(),
        access_list: decode_access_list(&fields[7])?,
        signature,
    }))
}

fn decode_london(fields: &[RlpItem]) -> Result<TxEnvelope, TxError> {
    const BASE: usize = 9;
    if fields.len() != BASE && fields.len() != BASE + 3 {
        return Err(TxError::InvalidFieldCount(fields.len()));
    }
    let signature = decode_typed_tail(fields, BASE)?;
    Ok(TxEnvelope::London(LondonTx {
        chain_id: fields[0].to_u64()?,
        nonce: fields[1].to_u64()?,
        max_priority_fee_per_gas: fields[2].to_u128()?,
        max_fee_per_gas: fields[3].to_u128()?,
        gas_limit: fields[4].to_u64()?,
        to: item_to_address(&fields[5])?,
        value: fields[6].to_u256()?,
        data: fields[7].as_string()?.to_vec(),
        access_list: decode_access_list(&fields[8])?,
        signature,
    }))
}

fn decode_cancun(fields: &[RlpItem]) -> Result<TxEnvelope, TxError> {
    const BASE: usize = 11;
    if fields.len() != BASE && fields.len() != BASE + 3 {
        return Err(TxError::InvalidFieldCount(fields.len()));
    }
    let signature = decode_typed_tail(fields, BASE)?;
    let hashes = fields[10]
        .as_list()?
        .iter()
        .map(|h| h.as_string().map(B256::from_slice))
        .collect::<Result<Vec<_>, RlpError>>()?;
    Ok(TxEnvelope::Cancun(CancunTx {
        chain_id: fields[0].to_u64()?,
        nonce: fields[1].to_u64()?,
        max_priority_fee_per_gas: fields[2].to_u128()?,
        max_fee_per_gas: fields[3].to_u128()?,
        gas_limit: fields[4].to_u64()?,
        to: item_to_address(&fields[5])?,
        value: fields[6].to_u256()?,
        data: fields[7].as_string()?.to_vec(),
        access_list: decode_access_list(&fields[8])?,
        max_fee_per_blob_gas: fields[9].to_u128()?,
        blob_versioned_hashes: hashes,
        signature,
    }))
}

/// Runs the pre-signing assertions spec'd for each envelope kind.
///
/// The chain-id check only applies to envelopes that carry one; legacy
/// transactions pre-dating EIP-155 have no chain id to validate.
pub fn assert_before_signing(envelope: &TxEnvelope, configured_chain_id: u64) -> Result<(), TxError> {
    if let Some(chain_id) = envelope.chain_id() {
        if chain_id != configured_chain_id {
            return Err(TxError::InvalidChainId);
        }
    }
    match envelope {
        TxEnvelope::Legacy(_) | TxEnvelope::Berlin(_) => {}
        TxEnvelope::London(tx) => assert_tip(tx.max_priority_fee_per_gas, tx.max_fee_per_gas)?,
        TxEnvelope::Cancun(tx) => {
            assert_tip(tx.max_priority_fee_per_gas, tx.max_fee_per_gas)?;
            assert_blob_preconditions(tx)?;
        }
    }
    Ok(())
}

fn assert_tip(tip: u128, fee: u128) -> Result<(), TxError> {
    if tip > fee {
        return Err(TxError::TransactionTipTooHigh);
    }
    Ok(())
}

fn assert_blob_preconditions(tx: &CancunTx) -> Result<(), TxError> {
    if tx.blob_versioned_hashes.is_empty() {
        return Err(TxError::EmptyBlobs);
    }
    if tx.blob_versioned_hashes.len() > MAX_BLOB_NUMBER_PER_BLOCK {
        return Err(TxError::TooManyBlobs);
    }
    for hash in &tx.blob_versioned_hashes {
        if hash.as_slice()[0] != VERSIONED_HASH_VERSION_KZG {
            return Err(TxError::BlobVersionNotSupported);
        }
    }
    if tx.to.is_none() {
        return Err(TxError::CreateBlobTransaction);
    }
    Ok(())
}

/// Hashes the unsigned serialization, asks `signer` for `(v, r, s)`, and
/// returns a new envelope with the signature filled in. The transaction
/// assertion phase runs first so a rejected envelope never reaches the signer.
#[tracing::instrument(skip_all, fields(tx_type = envelope.tx_type(), chain_id = configured_chain_id))]
pub fn sign_transaction(
    envelope: &TxEnvelope,
    signer: &dyn Signer,
    configured_chain_id: u64,
) -> Result<TxEnvelope, TxError> {
    assert_before_signing(envelope, configured_chain_id)?;
    let unsigned = envelope.with_signature(None);
    let preimage = serialize_transaction(&unsigned);
    let hash = keccak256(&preimage);
    let raw = signer.sign(B256::from(hash))?;

    let v = match envelope {
        TxEnvelope::Legacy(tx) => match tx.chain_id {
            Some(chain_id) => raw.v as u64 + 35 + 2 * chain_id,
            None => raw.v as u64 + 27,
        },
        _ => raw.v as u64,
    };
    let signature = Signature {
        v,
        r: U256::from_be_bytes(raw.r),
        s: U256::from_be_bytes(raw.s),
    };
    Ok(envelope.with_signature(Some(signature)))
}

/// Recovers the sender address of a signed envelope via the external signer's
/// recovery capability.
pub fn recover_sender(envelope: &TxEnvelope, signer: &dyn Signer) -> Result<Address, TxError> {
    let signature = envelope.signature().ok_or(TxError::MissingSignature)?;
    let unsigned = envelope.with_signature(None);
    let preimage = serialize_transaction(&unsigned);
    let hash = keccak256(&preimage);
    let recovery_v = match envelope {
        TxEnvelope::Legacy(tx) => match tx.chain_id {
            Some(chain_id) => ((signature.v as i128 - 35 - 2 * chain_id as i128) as u64) as u8,
            None => (signature.v - 27) as u8,
        },
        _ => signature.v as u8,
    };
    let raw = RawSignature {
        r: signature.r.to_be_bytes::<32>(),
        s: signature.s.to_be_bytes::<32>(),
        v: recovery_v,
    };
    signer.recover_address(&raw, B256::from(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip1559_unsigned_preimage_round_trips() {
        let bytes = hex::decode(
            "02f1827a6980847735940084773594008252099470997970c51812dc3a010c7d01b50e0d17dc79c8880de0b6b3a764000080c0",
        )
        .unwrap();
        let envelope = deserialize_transaction(&bytes).unwrap();
        match &envelope {
            TxEnvelope::London(tx) => {
                assert_eq!(tx.chain_id, 0x7a69);
                assert_eq!(tx.nonce, 0);
                assert!(tx.signature.is_none());
            }
            other => panic!("expected a London envelope, got {other:?}"),
        }
        assert_eq!(serialize_transaction(&envelope), bytes);
    }

    fn sample_cancun(to: Option<Address>, hashes: Vec<B256>) -> CancunTx {
        CancunTx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1,
            max_fee_per_gas: 2,
            gas_limit: 21000,
            to,
            value: U256::ZERO,
            data: Vec::new(),
            access_list: Vec::new(),
            max_fee_per_blob_gas: 1,
            blob_versioned_hashes: hashes,
            signature: None,
        }
    }

    fn versioned_hash(first_byte: u8) -> B256 {
        let mut bytes = [0u8; 32];
        bytes[0] = first_byte;
        B256::from(bytes)
    }

    #[test]
    fn rejects_empty_blobs() {
        let tx = sample_cancun(Some(Address::ZERO), Vec::new());
        let err = assert_before_signing(&TxEnvelope::Cancun(tx), 1).unwrap_err();
        assert_eq!(err, TxError::EmptyBlobs);
    }

    #[test]
    fn rejects_too_many_blobs() {
        let hashes = vec![versioned_hash(0x01); 7];
        let tx = sample_cancun(Some(Address::ZERO), hashes);
        let err = assert_before_signing(&TxEnvelope::Cancun(tx), 1).unwrap_err();
        assert_eq!(err, TxError::TooManyBlobs);
    }

    #[test]
    fn rejects_blob_create_transaction() {
        let tx = sample_cancun(None, vec![versioned_hash(0x01)]);
        let err = assert_before_signing(&TxEnvelope::Cancun(tx), 1).unwrap_err();
        assert_eq!(err, TxError::CreateBlobTransaction);
    }

    #[test]
    fn rejects_unsupported_blob_version() {
        let tx = sample_cancun(Some(Address::ZERO), vec![versioned_hash(0x02)]);
        let err = assert_before_signing(&TxEnvelope::Cancun(tx), 1).unwrap_err();
        assert_eq!(err, TxError::BlobVersionNotSupported);
    }

    #[test]
    fn rejects_tip_above_fee_cap() {
        let mut tx = sample_cancun(Some(Address::ZERO), vec![versioned_hash(0x01)]);
        tx.max_priority_fee_per_gas = 10;
        tx.max_fee_per_gas = 2;
        let err = assert_before_signing(&TxEnvelope::Cancun(tx), 1).unwrap_err();
        assert_eq!(err, TxError::TransactionTipTooHigh);
    }

    #[test]
    fn rejects_wrong_chain_id() {
        let tx = sample_cancun(Some(Address::ZERO), vec![versioned_hash(0x01)]);
        let err = assert_before_signing(&TxEnvelope::Cancun(tx), 42).unwrap_err();
        assert_eq!(err, TxError::InvalidChainId);
    }

    struct FixedSigner;

    impl Signer for FixedSigner {
        fn sign(&self, _hash: B256) -> Result<RawSignature, TxError> {
            Ok(RawSignature { r: [1u8; 32], s: [2u8; 32], v: 1 })
        }

        fn recover_address(&self, _signature: &RawSignature, _hash: B256) -> Result<Address, TxError> {
            Ok(Address::ZERO)
        }
    }

    #[test]
    fn signing_fills_in_signature_and_skips_assertion_failures() {
        let tx = sample_cancun(Some(Address::ZERO), vec![versioned_hash(0x01)]);
        let envelope = TxEnvelope::Cancun(tx);
        let signed = sign_transaction(&envelope, &FixedSigner, 1).unwrap();
        assert!(signed.signature().is_some());

        let bad_tx = sample_cancun(None, vec![versioned_hash(0x01)]);
        let err = sign_transaction(&TxEnvelope::Cancun(bad_tx), &FixedSigner, 1).unwrap_err();
        assert_eq!(err, TxError::CreateBlobTransaction);
    }
}
