use ethabi_rlp::RlpError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("chain id does not match the configured network")]
    InvalidChainId,
    #[error("max priority fee per gas exceeds max fee per gas")]
    TransactionTipTooHigh,
    #[error("a blob transaction must carry at least one versioned hash")]
    EmptyBlobs,
    #[error("blob count exceeds the per-block maximum")]
    TooManyBlobs,
    #[error("versioned hash does not start with the KZG version byte")]
    BlobVersionNotSupported,
    #[error("blob transactions cannot be contract creations")]
    CreateBlobTransaction,
    #[error("unsupported transaction type byte {0:#04x}")]
    UnsupportedTransactionType(u8),
    #[error("unexpected field count {0} while decoding a transaction")]
    InvalidFieldCount(usize),
    #[error("the envelope has no signature to recover from")]
    MissingSignature,
    #[error("rlp error: {0}")]
    Rlp(#[from] RlpError),
    #[error("kzg trusted setup is not loaded")]
    KzgNotLoaded,
}
