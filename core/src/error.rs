use thiserror::Error;

/// Convenience alias used throughout the shroud crates.
pub type Result<T> = core::result::Result<T, CryptoError>;

/// Error taxonomy surfaced at every shroud boundary.
///
/// Cryptographic failures ([`CorruptPadding`](CryptoError::CorruptPadding),
/// [`CiphertextAuthentication`](CryptoError::CiphertextAuthentication))
/// deliberately carry no detail about which byte or offset failed; the
/// caller learns only that the data is corrupt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The named primitive is not in the registry.
    #[error("unsupported primitive: {0}")]
    Unsupported(String),

    /// Key length is not in the primitive's allowable set.
    #[error("invalid key size")]
    InvalidKeySize,

    /// Block size is not in the primitive's allowable set.
    #[error("invalid block size")]
    InvalidBlockSize,

    /// MAC/tag size is not allowable for the configured function.
    #[error("invalid MAC size")]
    InvalidMacSize,

    /// IV/nonce length is not allowable for the configured primitive.
    #[error("invalid IV size")]
    InvalidIvSize,

    /// A configuration DTO failed validation; the payload is a short
    /// symbolic reason, never free-form state.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(&'static str),

    /// An argument outside a configuration DTO was rejected.
    #[error("invalid argument: {0}")]
    ArgumentInvalid(&'static str),

    /// An input or output slice is too short for the requested
    /// operation. State is unchanged.
    #[error("buffer too short")]
    ShortBuffer,

    /// Operation on an object that is not initialized, already
    /// finalized, or driven in the wrong direction.
    #[error("invalid state")]
    InvalidState,

    /// Padding did not validate on decrypt. Always this exact kind,
    /// whatever structural check failed.
    #[error("data corrupt")]
    CorruptPadding,

    /// An AEAD tag or stream MAC did not verify.
    #[error("data corrupt")]
    CiphertextAuthentication,

    /// No candidate key matched the confirmation canary.
    #[error("key confirmation failed")]
    KeyConfirmationFailed,

    /// Ring buffer cannot accept the requested number of bytes.
    #[error("buffer overflow")]
    Overflow,

    /// Ring buffer does not hold the requested number of bytes.
    #[error("buffer underflow")]
    Underflow,
}

impl From<CryptoError> for std::io::Error {
    fn from(e: CryptoError) -> Self {
        let kind = match e {
            CryptoError::ShortBuffer | CryptoError::ArgumentInvalid(_) => {
                std::io::ErrorKind::InvalidInput
            }
            _ => std::io::ErrorKind::InvalidData,
        };
        std::io::Error::new(kind, e)
    }
}
