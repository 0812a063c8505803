use crate::{cancun_fields, CancunTx, Kzg, TxError, MAX_BLOB_NUMBER_PER_BLOCK};
use ethabi_rlp::{encode, RlpItem};

/// The (blobs, commitments, proofs) triple transported alongside an EIP-4844
/// transaction, kept out of the canonical transaction hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSidecar {
    pub blobs: Vec<Vec<u8>>,
    pub commitments: Vec<[u8; 48]>,
    pub proofs: Vec<[u8; 48]>,
}

/// Computes commitments and proofs for `blobs` via the external KZG
/// capability and assembles the sidecar triple.
pub fn build_blob_sidecar(blobs: Vec<Vec<u8>>, kzg: &dyn Kzg) -> Result<BlobSidecar, TxError> {
    if !kzg.loaded() {
        return Err(TxError::KzgNotLoaded);
    }
    if blobs.is_empty() {
        return Err(TxError::EmptyBlobs);
    }
    if blobs.len() > MAX_BLOB_NUMBER_PER_BLOCK {
        return Err(TxError::TooManyBlobs);
    }
    let mut commitments = Vec::with_capacity(blobs.len());
    let mut proofs = Vec::with_capacity(blobs.len());
    for blob in &blobs {
        let commitment = kzg.blob_to_commitment(blob)?;
        let proof = kzg.compute_blob_proof(blob, &commitment)?;
        commitments.push(commitment);
        proofs.push(proof);
    }
    Ok(BlobSidecar { blobs, commitments, proofs })
}

/// Serializes the EIP-4844 networking form:
/// `0x03 ‖ rlp([tx_payload_body, blobs, commitments, proofs])`, where all
/// four lists share `sidecar.blobs.len()` entries.
pub fn serialize_with_sidecar(tx: &CancunTx, sidecar: &BlobSidecar) -> Result<Vec<u8>, TxError> {
    if sidecar.blobs.len() != sidecar.commitments.len() || sidecar.blobs.len() != sidecar.proofs.len() {
        return Err(TxError::InvalidFieldCount(sidecar.blobs.len()));
    }
    if sidecar.blobs.len() > MAX_BLOB_NUMBER_PER_BLOCK {
        return Err(TxError::TooManyBlobs);
    }
    let payload_body = RlpItem::list(cancun_fields(tx));
    let blobs = RlpItem::list(sidecar.blobs.iter().map(|b| RlpItem::string(b.clone())).collect());
    let commitments = RlpItem::list(
        sidecar
            .commitments
            .iter()
            .map(|c| RlpItem::string(c.to_vec()))
            .collect(),
    );
    let proofs = RlpItem::list(sidecar.proofs.iter().map(|p| RlpItem::string(p.to_vec())).collect());

    let body = encode(&RlpItem::list(vec![payload_body, blobs, commitments, proofs]));
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(0x03);
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    struct StubKzg;

    impl Kzg for StubKzg {
        fn blob_to_commitment(&self, _blob: &[u8]) -> Result<[u8; 48], TxError> {
            Ok([1u8; 48])
        }

        fn compute_blob_proof(&self, _blob: &[u8], _commitment: &[u8; 48]) -> Result<[u8; 48], TxError> {
            Ok([2u8; 48])
        }

        fn loaded(&self) -> bool {
            true
        }
    }

    fn sample_cancun() -> CancunTx {
        CancunTx {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1,
            max_fee_per_gas: 2,
            gas_limit: 21000,
            to: Some(Address::ZERO),
            value: U256::ZERO,
            data: Vec::new(),
            access_list: Vec::new(),
            max_fee_per_blob_gas: 1,
            blob_versioned_hashes: Vec::new(),
            signature: None,
        }
    }

    #[test]
    fn builds_sidecar_with_matching_lengths() {
        let sidecar = build_blob_sidecar(vec![vec![0u8; 32], vec![1u8; 32]], &StubKzg).unwrap();
        assert_eq!(sidecar.commitments.len(), 2);
        assert_eq!(sidecar.proofs.len(), 2);
    }

    #[test]
    fn rejects_too_many_blobs_when_building() {
        let blobs = vec![vec![0u8; 4]; 7];
        let err = build_blob_sidecar(blobs, &StubKzg).unwrap_err();
        assert_eq!(err, TxError::TooManyBlobs);
    }

    #[test]
    fn serializes_sidecar_wrapper_with_type_prefix() {
        let tx = sample_cancun();
        let sidecar = BlobSidecar {
            blobs: vec![vec![9u8; 4]],
            commitments: vec![[1u8; 48]],
            proofs: vec![[2u8; 48]],
        };
        let bytes = serialize_with_sidecar(&tx, &sidecar).unwrap();
        assert_eq!(bytes[0], 0x03);
    }
}
