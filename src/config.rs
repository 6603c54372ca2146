//! Verifier configuration.

use std::time::Duration;

/// Key distribution endpoint for Google service accounts. The escaped issuer
/// is appended as the final path segment.
pub const DEFAULT_JWK_ENDPOINT: &str = "https://www.googleapis.com/service_accounts/v1/jwk/";

/// Default bound on a single key set fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest clock skew allowance a [crate::Verifier] accepts, one day.
pub const MAX_LEEWAY: u64 = 24 * 60 * 60;

/// Settings for a [crate::Verifier].
///
/// ```
/// use sa_token_verify::VerifierConfig;
/// use std::time::Duration;
///
/// let config = VerifierConfig::default()
///     .with_timeout(Duration::from_secs(5))
///     .with_leeway(30);
/// assert_eq!(config.leeway, 30);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VerifierConfig {
    /// Base URL the issuer is appended to when fetching its key set.
    pub jwk_endpoint: String,

    /// Upper bound on a key set fetch.
    pub timeout: Duration,

    /// Allowed clock skew in seconds when checking `exp` and `nbf`, at most [MAX_LEEWAY].
    pub leeway: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            jwk_endpoint: DEFAULT_JWK_ENDPOINT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            leeway: 0,
        }
    }
}

impl VerifierConfig {
    /// Fetch key sets from `endpoint` instead of the Google service account endpoint.
    pub fn with_jwk_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.jwk_endpoint = endpoint.into();
        self
    }

    /// Give up on a key set fetch after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accept `exp` and `nbf` up to `leeway` seconds off.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }
}
