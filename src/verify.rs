//! Signature and validity window verification.

use std::collections::HashSet;

use jsonwebtoken::{Algorithm, Validation};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::glimpse::{decode_object, split};
use crate::reconstruct::PublicKey;

/// The payload of a token whose signature and validity window checked out.
///
/// Only [verify] and [verify_with_leeway] produce this type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VerifiedClaims(Map<String, Value>);

impl VerifiedClaims {
    /// A claim by name.
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    /// `iss`
    pub fn issuer(&self) -> Option<&str> {
        self.get("iss").and_then(Value::as_str)
    }

    /// `sub`
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    /// `exp`, seconds since the epoch
    pub fn expires_at(&self) -> Option<i64> {
        self.get("exp").and_then(Value::as_i64)
    }

    /// All claims.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes self, returning all claims.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Verifies `token` with `key` and no clock skew allowance.
pub fn verify(token: &str, key: &PublicKey) -> Result<VerifiedClaims> {
    verify_with_leeway(token, key, 0)
}

/// Verifies `token` with `key`, accepting `exp`/`nbf` up to `leeway` seconds off.
///
/// The header `alg` must be exactly the algorithm the key is pinned to; `none`
/// and every other algorithm fail with [Error::AlgorithmMismatch] before the
/// signature is looked at. Then the signature is checked, then `exp` and `nbf`
/// when present. No claim is required, but a present `exp` or `nbf` that is
/// not a non-negative number fails with [Error::MalformedToken].
///
/// A token is expired from the second its `exp` names: `exp` must be strictly
/// after the current time, less `leeway`.
pub fn verify_with_leeway(token: &str, key: &PublicKey, leeway: u64) -> Result<VerifiedClaims> {
    let [header, _, _] = split(token)?;
    let header = decode_object(header, "header")?;

    let expected = key.algorithm();
    let declared = match header.get("alg") {
        Some(Value::String(alg)) => alg.clone(),
        Some(other) => other.to_string(),
        None => "(missing)".to_owned(),
    };
    if declared.parse::<Algorithm>().ok() != Some(expected) {
        warn!(expected = ?expected, declared = %declared, "token algorithm rejected");
        return Err(algorithm_mismatch(expected, declared));
    }

    // jsonwebtoken skips time claims it cannot parse; the window is checked below.
    let mut validation = Validation::new(expected);
    validation.required_spec_claims = HashSet::new();
    validation.validate_exp = false;
    validation.validate_nbf = false;

    let data = jsonwebtoken::decode::<Map<String, Value>>(token, key.decoding_key(), &validation)
        .map_err(|e| {
            if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::InvalidAlgorithm) {
                algorithm_mismatch(expected, declared.clone())
            } else {
                Error::from(e)
            }
        })
        .and_then(|data| {
            check_window(&data.claims, jsonwebtoken::get_current_timestamp(), leeway)?;
            Ok(data)
        })
        .map_err(|e| {
            warn!(error = %e, "token rejected");
            e
        })?;

    Ok(VerifiedClaims(data.claims))
}

fn check_window(claims: &Map<String, Value>, now: u64, leeway: u64) -> Result<()> {
    if let Some(exp) = numeric_date(claims, "exp")? {
        if exp.saturating_add(leeway) <= now {
            return Err(Error::TokenExpired);
        }
    }
    if let Some(nbf) = numeric_date(claims, "nbf")? {
        if nbf > now.saturating_add(leeway) {
            return Err(Error::TokenNotYetValid);
        }
    }
    Ok(())
}

/// Seconds since the epoch held by `claim`, if present.
fn numeric_date(claims: &Map<String, Value>, claim: &str) -> Result<Option<u64>> {
    let value = match claims.get(claim) {
        Some(value) => value,
        None => return Ok(None),
    };

    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|secs| *secs >= 0.0).map(|secs| secs as u64))
        .map(Some)
        .ok_or_else(|| Error::MalformedToken(format!("{claim} is not a NumericDate: {value}")))
}

fn algorithm_mismatch(expected: Algorithm, found: String) -> Error {
    Error::AlgorithmMismatch {
        expected: format!("{expected:?}"),
        found,
    }
}
