use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("value does not match declared type: {0}")]
    InvalidParamType(String),
    #[error("fixed-size value length mismatch: {0}")]
    InvalidLength(String),
    #[error("value out of range for {0}")]
    ValueOutOfRange(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("buffer of {0} bytes is not valid for the declared types")]
    InvalidDecodeDataSize(usize),
    #[error("selector mismatch: expected {expected}, got {actual}")]
    InvalidAbiSignature { expected: String, actual: String },
    #[error("decoding exceeded the {0}-byte cap")]
    BufferOverrun(u16),
    #[error("{0} trailing bytes beyond the consumed region")]
    JunkData(usize),
    #[error("invalid length: {0}")]
    InvalidLength(String),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Type(#[from] ethabi_types::TypeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
