//! Fetching an issuer's published keys and picking the one a token names.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Transport used to fetch key sets.
///
/// A single fetch-by-URL operation returning the response body. Non-2xx
/// responses and connection failures must come back as [Error::KeyFetch];
/// messages follow the pattern `"component: description"`
/// (e.g. `"network: connection refused"`, `"http: status 404"`).
pub trait HttpClient: Send + Sync {
    /// GET `url` and return the body.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;
}

impl HttpClient for reqwest::Client {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .get(url)
                .send()
                .await
                .map_err(|e| Error::KeyFetch(format!("network: {e}")))?;

            if !response.status().is_success() {
                return Err(Error::KeyFetch(format!(
                    "http: status {}",
                    response.status()
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| Error::KeyFetch(format!("network: {e}")))?;

            Ok(bytes.to_vec())
        })
    }
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>> {
        (**self).fetch(url)
    }
}

/// One published public key.
///
/// Components stay base64url encoded; [crate::reconstruct()] decodes them.
/// Missing members deserialize as empty so that one odd record does not make
/// the whole set unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyRecord {
    /// `kid`
    #[serde(rename = "kid", default)]
    pub key_id: String,

    /// `kty`, the key family such as `RSA`
    #[serde(rename = "kty", default)]
    pub key_type: String,

    /// `alg`, the signing algorithm the key is meant for
    #[serde(rename = "alg", default)]
    pub algorithm: Option<String>,

    /// `n`, the RSA modulus
    #[serde(rename = "n", default)]
    pub modulus: String,

    /// `e`, the RSA public exponent
    #[serde(rename = "e", default)]
    pub exponent: String,
}

/// The published keys of one issuer, in response order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeySet {
    /// Key records as published
    pub keys: Vec<KeyRecord>,
}

impl KeySet {
    /// First record whose id equals `key_id`. Later duplicates are ignored.
    pub fn find(&self, key_id: &str) -> Option<&KeyRecord> {
        self.keys.iter().find(|record| record.key_id == key_id)
    }
}

/// Looks up published keys for an issuer through an [HttpClient].
#[derive(Debug, Clone)]
pub struct KeyResolver<C> {
    client: C,
    endpoint: Url,
    timeout: Duration,
}

impl<C: HttpClient> KeyResolver<C> {
    /// Creates a resolver fetching from `endpoint`, with the issuer appended as
    /// the last path segment. Fails when `endpoint` is not an http(s) URL.
    pub fn new(client: C, endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::InvalidConfiguration(format!("jwk endpoint: {e}")))?;

        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(Error::InvalidConfiguration(format!(
                "jwk endpoint must be an http or https URL: {endpoint}"
            )));
        }

        Ok(KeyResolver {
            client,
            endpoint,
            timeout,
        })
    }

    /// The key set URL for `issuer`. The issuer is percent-escaped as a
    /// single path segment, so `/`, `?` and `#` cannot change the request.
    pub fn key_set_url(&self, issuer: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(issuer);
        }
        url
    }

    /// Fetches and parses every key currently published for `issuer`.
    pub async fn fetch_key_set(&self, issuer: &str) -> Result<KeySet> {
        let url = self.key_set_url(issuer);
        debug!(%url, "fetching key set");

        let body = tokio::time::timeout(self.timeout, self.client.fetch(url.as_str()))
            .await
            .map_err(|_| {
                Error::KeyFetch(format!("timeout: no response within {:?}", self.timeout))
            })??;

        serde_json::from_slice(&body).map_err(|e| Error::KeyFetch(format!("json: {e}")))
    }

    /// Returns the first published key of `issuer` whose id is `key_id`.
    ///
    /// An empty `key_id` fails with [Error::MissingKeyId] and an empty issuer
    /// with [Error::MissingIssuer], both before any request is made.
    pub async fn resolve(&self, issuer: &str, key_id: &str) -> Result<KeyRecord> {
        if issuer.is_empty() {
            return Err(Error::MissingIssuer);
        }
        if key_id.is_empty() {
            return Err(Error::MissingKeyId);
        }

        let key_set = self.fetch_key_set(issuer).await?;

        match key_set.find(key_id) {
            Some(record) => Ok(record.clone()),
            None => {
                warn!(
                    issuer,
                    kid = key_id,
                    published = key_set.keys.len(),
                    "no published key matches"
                );
                Err(Error::KeyNotFound {
                    issuer: issuer.to_owned(),
                    kid: key_id.to_owned(),
                })
            }
        }
    }
}
