//! Reading routing information out of a token before it can be verified.
//!
//! The key that verifies a token is selected by the token itself: the issuer
//! names the key set and the `kid` header names the key. Both have to be read
//! before any signature check is possible. [glimpse] does only that, and its
//! [Glimpse] result carries nothing else from the payload.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Unverified issuer and key id of a token.
///
/// Only good for choosing which key to verify the token with. Nothing here has
/// been authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glimpse {
    issuer: String,
    key_id: String,
}

impl Glimpse {
    /// The unverified `iss` claim.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The unverified `kid` header, empty when the header has none.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }
}

/// Extracts the issuer and key id of `token` without verifying it.
///
/// Fails with [Error::MalformedToken] when the token is not three base64url
/// segments with JSON object header and payload, and with
/// [Error::MissingIssuer] when `iss` is absent, empty or not a string. An
/// absent `kid` gives an empty key id.
pub fn glimpse(token: &str) -> Result<Glimpse> {
    let [header, payload, _] = split(token)?;
    let header = decode_object(header, "header")?;
    let payload = decode_object(payload, "payload")?;

    let key_id = match header.get("kid") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(kid)) => kid.clone(),
        Some(_) => return Err(Error::MalformedToken("kid is not a string".into())),
    };

    let issuer = match payload.get("iss") {
        Some(Value::String(iss)) if !iss.is_empty() => iss.clone(),
        _ => return Err(Error::MissingIssuer),
    };

    Ok(Glimpse { issuer, key_id })
}

/// Splits a compact token into its header, payload and signature segments.
pub(crate) fn split(token: &str) -> Result<[&str; 3]> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok([header, payload, signature]),
        _ => Err(Error::MalformedToken(
            "expected three segments separated by '.'".into(),
        )),
    }
}

/// Decodes one base64url segment holding a JSON object.
pub(crate) fn decode_object(segment: &str, name: &str) -> Result<Map<String, Value>> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| Error::MalformedToken(format!("{name}: {e}")))?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::MalformedToken(format!("{name} is not a JSON object"))),
        Err(e) => Err(Error::MalformedToken(format!("{name}: {e}"))),
    }
}
