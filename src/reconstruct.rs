//! Rebuilding a public key from the components of a published key record.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{Algorithm, DecodingKey};

use crate::error::{Error, Result};
use crate::resolve::KeyRecord;

/// Smallest RSA modulus accepted for signature verification.
pub const MIN_MODULUS_BITS: usize = 2048;

/// A verification key pinned to the one algorithm it may verify.
#[derive(Clone)]
pub struct PublicKey {
    key: DecodingKey,
    algorithm: Algorithm,
    modulus_bits: usize,
}

impl PublicKey {
    /// The only algorithm tokens verified with this key may declare.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Size of the RSA modulus.
    pub fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm)
            .field("modulus_bits", &self.modulus_bits)
            .finish_non_exhaustive()
    }
}

/// Builds the public key described by `record`.
///
/// Only `kty: "RSA"` is supported, with RS256/384/512 or PS256/384/512. A
/// record without `alg` is pinned to RS256. Components are base64url; padding
/// and leading zero octets are tolerated.
pub fn reconstruct(record: &KeyRecord) -> Result<PublicKey> {
    if record.key_type != "RSA" {
        return Err(unsupported(record));
    }

    let algorithm = match record.algorithm.as_deref() {
        None => Algorithm::RS256,
        Some("RS256") => Algorithm::RS256,
        Some("RS384") => Algorithm::RS384,
        Some("RS512") => Algorithm::RS512,
        Some("PS256") => Algorithm::PS256,
        Some("PS384") => Algorithm::PS384,
        Some("PS512") => Algorithm::PS512,
        Some(_) => return Err(unsupported(record)),
    };

    let modulus = decode_component(&record.modulus, "modulus")?;
    let exponent = decode_component(&record.exponent, "exponent")?;
    if !is_usable_exponent(&exponent) {
        return Err(Error::InvalidKeyMaterial(format!(
            "exponent {} must be odd and at least 3",
            record.exponent
        )));
    }

    let modulus_bits = modulus.len() * 8 - modulus[0].leading_zeros() as usize;
    if modulus_bits < MIN_MODULUS_BITS {
        return Err(Error::InvalidKeyMaterial(format!(
            "modulus is {modulus_bits} bits, at least {MIN_MODULUS_BITS} required"
        )));
    }

    // Canonical form: unpadded, no leading zero octets.
    let key = DecodingKey::from_rsa_components(
        &URL_SAFE_NO_PAD.encode(&modulus),
        &URL_SAFE_NO_PAD.encode(&exponent),
    )?;

    Ok(PublicKey {
        key,
        algorithm,
        modulus_bits,
    })
}

fn unsupported(record: &KeyRecord) -> Error {
    Error::UnsupportedKeyType {
        key_type: record.key_type.clone(),
        algorithm: record.algorithm.clone(),
    }
}

/// `e` is big-endian without leading zeros.
fn is_usable_exponent(e: &[u8]) -> bool {
    let odd = e.last().map_or(false, |b| b & 1 == 1);
    odd && (e.len() > 1 || e[0] >= 3)
}

/// Decodes a base64url unsigned big-endian integer, without leading zeros.
fn decode_component(value: &str, name: &str) -> Result<Vec<u8>> {
    let mut bytes = URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .map_err(|e| Error::InvalidKeyMaterial(format!("{name}: {e}")))?;

    let significant = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes.drain(..significant);

    if bytes.is_empty() {
        return Err(Error::InvalidKeyMaterial(format!("{name} is empty")));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::*;
    use crate::verify::verify;

    fn record() -> KeyRecord {
        KeyRecord {
            key_id: KID.to_owned(),
            key_type: "RSA".to_owned(),
            algorithm: Some("RS256".to_owned()),
            modulus: modulus(),
            exponent: "AQAB".to_owned(),
        }
    }

    #[test]
    fn reconstruct_rsa_key() {
        let key = reconstruct(&record()).unwrap();

        assert_eq!(key.algorithm(), Algorithm::RS256);
        assert_eq!(key.modulus_bits(), 2048);
    }

    #[test]
    fn reconstruct_is_deterministic() {
        let token = sign(&claims(3600), Some(KID));

        let first = reconstruct(&record()).unwrap();
        let second = reconstruct(&record()).unwrap();

        assert!(verify(&token, &first).is_ok());
        assert_eq!(verify(&token, &first), verify(&token, &second));
    }

    #[test]
    fn missing_alg_pins_rs256() {
        let key = reconstruct(&KeyRecord {
            algorithm: None,
            ..record()
        })
        .unwrap();

        assert_eq!(key.algorithm(), Algorithm::RS256);
    }

    #[test]
    fn rsa_family_algorithms() {
        for (alg, expected) in [("RS384", Algorithm::RS384), ("PS256", Algorithm::PS256)] {
            let key = reconstruct(&KeyRecord {
                algorithm: Some(alg.to_owned()),
                ..record()
            })
            .unwrap();

            assert_eq!(key.algorithm(), expected);
        }
    }

    #[test]
    fn padding_and_leading_zeros_are_tolerated() {
        let mut n = vec![0u8];
        n.extend(URL_SAFE_NO_PAD.decode(modulus()).unwrap());
        let token = sign(&claims(3600), Some(KID));

        for modulus in [format!("{}==", modulus()), URL_SAFE_NO_PAD.encode(&n)] {
            let key = reconstruct(&KeyRecord { modulus, ..record() }).unwrap();

            assert_eq!(key.modulus_bits(), 2048);
            assert!(verify(&token, &key).is_ok());
        }
    }

    #[test]
    fn reject_empty_modulus() {
        let res = reconstruct(&KeyRecord {
            modulus: String::new(),
            ..record()
        });

        match res {
            Err(Error::InvalidKeyMaterial(_)) => assert!(true),
            _ => assert!(false, "empty modulus was not rejected: {:?}", res),
        }
    }

    #[test]
    fn reject_bad_components() {
        let cases = [
            KeyRecord {
                exponent: String::new(),
                ..record()
            },
            KeyRecord {
                modulus: "AAAA".to_owned(),
                ..record()
            },
            KeyRecord {
                modulus: "not*base64".to_owned(),
                ..record()
            },
            KeyRecord {
                exponent: "A Q A B".to_owned(),
                ..record()
            },
        ];

        for case in cases {
            match reconstruct(&case) {
                Err(Error::InvalidKeyMaterial(_)) => assert!(true),
                res => assert!(false, "{:?} was not rejected: {:?}", case, res),
            }
        }
    }

    #[test]
    fn reject_weak_exponent() {
        // 1, 2, 1 with a leading zero octet, 65536
        for exponent in ["AQ", "Ag", "AAE", "AQAA"] {
            let res = reconstruct(&KeyRecord {
                exponent: exponent.to_owned(),
                ..record()
            });

            match res {
                Err(Error::InvalidKeyMaterial(msg)) => assert!(msg.contains("odd"), "{msg}"),
                _ => assert!(false, "exponent {} was not rejected: {:?}", exponent, res),
            }
        }
    }

    #[test]
    fn small_odd_exponent_is_accepted() {
        let key = reconstruct(&KeyRecord {
            exponent: "Aw".to_owned(),
            ..record()
        });

        assert!(key.is_ok(), "{:?}", key);
    }

    #[test]
    fn reject_short_modulus() {
        let res = reconstruct(&KeyRecord {
            modulus: "AQAB".to_owned(),
            ..record()
        });

        match res {
            Err(Error::InvalidKeyMaterial(msg)) => assert!(msg.contains("17 bits"), "{msg}"),
            _ => assert!(false, "short modulus was not rejected: {:?}", res),
        }
    }

    #[test]
    fn reject_other_families() {
        let ec = KeyRecord {
            key_type: "EC".to_owned(),
            algorithm: Some("ES256".to_owned()),
            ..record()
        };
        assert_eq!(
            reconstruct(&ec).unwrap_err(),
            Error::UnsupportedKeyType {
                key_type: "EC".to_owned(),
                algorithm: Some("ES256".to_owned()),
            }
        );

        let hmac = KeyRecord {
            algorithm: Some("HS256".to_owned()),
            ..record()
        };
        match reconstruct(&hmac) {
            Err(Error::UnsupportedKeyType { .. }) => assert!(true),
            res => assert!(false, "HS256 on an RSA key was not rejected: {:?}", res),
        }
    }
}
