//! Error types for the verification pipeline.

use thiserror::Error;

/// The error type for every stage of token verification.
///
/// Each variant names the stage that rejected the token, so callers can tell a
/// forged signature apart from an unreachable key endpoint.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The token is not three base64url segments of JSON objects
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The payload has no usable `iss` claim
    #[error("token has no issuer")]
    MissingIssuer,

    /// The header has no `kid`, so no published key can be selected
    #[error("token header has no key id")]
    MissingKeyId,

    /// Fetching or parsing the published key set failed
    #[error("failed to fetch keys: {0}")]
    KeyFetch(String),

    /// No published key carries the requested key id
    #[error("no published key with kid '{kid}' for issuer '{issuer}'")]
    KeyNotFound {
        /// Issuer whose key set was searched
        issuer: String,
        /// Requested key id
        kid: String,
    },

    /// The matched key is not of a supported family or algorithm
    #[error("unsupported key type '{key_type}' (alg: {algorithm:?})")]
    UnsupportedKeyType {
        /// `kty` of the record
        key_type: String,
        /// `alg` of the record, if any
        algorithm: Option<String>,
    },

    /// The matched key's components cannot form a public key
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The token declares an algorithm other than the one pinned by the key
    #[error("algorithm mismatch: key expects {expected}, token declares {found}")]
    AlgorithmMismatch {
        /// Algorithm the key is pinned to
        expected: String,
        /// Algorithm the token header declares
        found: String,
    },

    /// The signature does not verify against the key
    #[error("signature verification failed")]
    SignatureMismatch,

    /// The `exp` claim is in the past
    #[error("token has expired")]
    TokenExpired,

    /// The `nbf` claim is in the future
    #[error("token is not valid yet")]
    TokenNotYetValid,

    /// The verifier could not be constructed from its configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => Error::SignatureMismatch,
            ErrorKind::ExpiredSignature => Error::TokenExpired,
            ErrorKind::ImmatureSignature => Error::TokenNotYetValid,
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Error::InvalidKeyMaterial(e.to_string())
            }
            _ => Error::MalformedToken(e.to_string()),
        }
    }
}

/// Result type alias for verification operations
pub type Result<T> = std::result::Result<T, Error>;
