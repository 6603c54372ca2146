//! Shared fixtures: a fixed RSA test key, token signing and key set bodies.
//!
//! Mounted both by the integration tests and by the library's unit tests, so it
//! only depends on third-party crates.
#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebkey as jwk;
use jsonwebtoken as jwt;
use serde_json::{json, Map, Value};

// Generated using https://mkjwk.org/
pub const PRIVATE_JWK: &str = include_str!("rsa_private_jwk.json");

/// Modulus of an unrelated 2048 bit RSA key, for wrong-key cases.
pub const OTHER_MODULUS: &str = "w4M936N3ZxNaEblcUoBm-xu0-V9JxNx5S7TmF0M3SBK-2bmDyAeDdeIOTcIVZHG-ZX9N9W0u1yWafgWewHrsz66BkxXq3bscvQUTAw7W3s6TEeYY7o9shPkFfOiU3x_KYgOo06SpiFdymwJflRs9cnbaU88i5fZJmUepUHVllP2tpPWTi-7UA3AdP3cdcCs5bnFfTRKzH2W0xqKsY_jIG95aQJRBDpbiesefjuyxcQnOv88j9tCKWzHpJzRKYjAUM6OPgN4HYnaSWrPJj1v41eEkFM1kORuj-GSH2qMVD02VklcqaerhQHIqM-RjeHsN7G05YtwYzomE5G-fZuwgvQ";

pub const ISSUER: &str = "test@example.com";
pub const KID: &str = "k1";

pub fn now() -> i64 {
    jwt::get_current_timestamp() as i64
}

/// Base64url modulus of the test key.
pub fn modulus() -> String {
    let key: Value = serde_json::from_str(PRIVATE_JWK).expect("fixture is JSON");
    key["n"].as_str().expect("fixture has n").to_owned()
}

/// A service-account style payload expiring `exp_in` seconds from now.
pub fn claims(exp_in: i64) -> Map<String, Value> {
    let now = now();
    let payload = json!({
        "iss": ISSUER,
        "sub": "1234567890",
        "iat": now,
        "exp": now + exp_in,
        "email": ISSUER,
    });
    payload.as_object().cloned().expect("payload is an object")
}

/// Signs `claims` with the test RSA key using RS256.
pub fn sign(claims: &Map<String, Value>, kid: Option<&str>) -> String {
    sign_with(claims, kid, jwt::Algorithm::RS256)
}

pub fn sign_with(claims: &Map<String, Value>, kid: Option<&str>, alg: jwt::Algorithm) -> String {
    let key = PRIVATE_JWK
        .parse::<jwk::JsonWebKey>()
        .expect("fixture is a JWK");

    let mut header = jwt::Header::new(alg);
    header.kid = kid.map(String::from);

    jwt::encode(&header, claims, &key.key.to_encoding_key()).expect("token signs")
}

/// Signs with an HMAC secret, for tokens whose signature must not matter.
pub fn sign_hs256(claims: &Map<String, Value>, kid: Option<&str>, secret: &[u8]) -> String {
    let mut header = jwt::Header::new(jwt::Algorithm::HS256);
    header.kid = kid.map(String::from);

    jwt::encode(&header, claims, &jwt::EncodingKey::from_secret(secret)).expect("token signs")
}

/// Builds a token from raw JSON parts with an empty signature.
pub fn unsigned(header: Value, payload: Value) -> String {
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(payload.to_string())
    )
}

/// A key distribution response with one RS256 record per `(kid, n)` pair.
pub fn jwk_set(records: &[(&str, &str)]) -> String {
    let keys: Vec<Value> = records
        .iter()
        .map(|(kid, n)| {
            json!({
                "kid": kid,
                "kty": "RSA",
                "alg": "RS256",
                "use": "sig",
                "n": n,
                "e": "AQAB",
            })
        })
        .collect();

    json!({ "keys": keys }).to_string()
}
