#![warn(missing_docs)]
//!
//! This crate verifies JWTs signed by a service account (such as a Google Cloud service account) without knowing the signer's public key up front. The issuer and key id are read from the unverified token, the issuer's published keys are fetched from its JWK endpoint, and the matching key is rebuilt from its RSA components to verify the token.
//!
//! See Google's [service account keys](https://cloud.google.com/iam/docs/service-account-creds#key-types) for how these keys are published.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! sa-token-verify = "0.1"
//! ```
//!
//! The pipeline is split into steps that can be used on their own: [glimpse()] reads the unverified issuer and key id, [KeyResolver] fetches and selects the published key, [reconstruct()] rebuilds it, and [verify()] checks the signature and validity window. [Verifier] runs all four.
//!
use tracing::debug;

mod config;
mod error;
mod glimpse;
mod reconstruct;
mod resolve;
mod verify;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod test_helper;

pub use config::{VerifierConfig, DEFAULT_JWK_ENDPOINT, DEFAULT_TIMEOUT, MAX_LEEWAY};
pub use error::{Error, Result};
pub use glimpse::{glimpse, Glimpse};
pub use reconstruct::{reconstruct, PublicKey, MIN_MODULUS_BITS};
pub use resolve::{HttpClient, KeyRecord, KeyResolver, KeySet};
pub use verify::{verify, verify_with_leeway, VerifiedClaims};

/// Verifier is the main entry point. Create with [Verifier::new], or [Verifier::with_client] to supply the transport.
#[derive(Debug)]
pub struct Verifier<C = reqwest::Client> {
    resolver: KeyResolver<C>,
    leeway: u64,
}

impl Verifier {
    /// Creates a [Verifier] fetching keys with a `reqwest` client bounded by the configured timeout.
    pub fn new(config: VerifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("http client: {e}")))?;

        Verifier::with_client(client, config)
    }
}

impl<C: HttpClient> Verifier<C> {
    /// Creates a [Verifier] fetching keys through `client`.
    pub fn with_client(client: C, config: VerifierConfig) -> Result<Self> {
        if config.leeway > MAX_LEEWAY {
            return Err(Error::InvalidConfiguration(format!(
                "leeway of {}s exceeds {MAX_LEEWAY}s",
                config.leeway
            )));
        }
        let resolver = KeyResolver::new(client, &config.jwk_endpoint, config.timeout)?;

        Ok(Verifier {
            resolver,
            leeway: config.leeway,
        })
    }

    /// Verify a service account token. When successful, the result holds every claim of the token.
    ///
    /// ```no_run
    /// use sa_token_verify::{Verifier, VerifierConfig};
    ///
    /// # async fn run() -> Result<(), sa_token_verify::Error> {
    /// // A token signed by a service account, e.g. from `gcloud auth print-identity-token`
    /// let token = "...";
    ///
    /// let verifier = Verifier::new(VerifierConfig::default())?;
    ///
    /// match verifier.verify_token(token).await {
    ///     Ok(claims) => println!("Token is valid. sub=<{:?}>", claims.subject()),
    ///     Err(err) => println!("Verification failed: {}", err),
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn verify_token(&self, token: &str) -> Result<VerifiedClaims> {
        let glimpsed = glimpse(token)?;
        debug!(
            issuer = glimpsed.issuer(),
            kid = glimpsed.key_id(),
            "resolving signing key"
        );

        let record = self
            .resolver
            .resolve(glimpsed.issuer(), glimpsed.key_id())
            .await?;
        let key = reconstruct(&record)?;
        let claims = verify_with_leeway(token, &key, self.leeway)?;

        debug!(issuer = glimpsed.issuer(), kid = glimpsed.key_id(), "token verified");
        Ok(claims)
    }
}
