//! Session identifier generation.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::TryCryptoRng;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of random bytes behind every generated identifier.
pub const ID_ENTROPY_BYTES: usize = 32;

/// Opaque, URL-safe session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing identifier string without validating it.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the identifier back into its random bytes.
    ///
    /// Returns `None` unless the value is unpadded URL-safe base64 of exactly
    /// [`ID_ENTROPY_BYTES`] bytes.
    pub fn decode_entropy(&self) -> Option<[u8; ID_ENTROPY_BYTES]> {
        let bytes = URL_SAFE_NO_PAD.decode(self.0.as_bytes()).ok()?;
        bytes.try_into().ok()
    }

    /// Whether this value has the shape of a generated identifier.
    pub fn is_well_formed(&self) -> bool {
        self.decode_entropy().is_some()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Generate a new identifier from the operating system's CSPRNG.
///
/// Fails with [`Error::Entropy`] if the OS source cannot be read.
pub fn generate() -> Result<SessionId> {
    generate_from(&mut OsRng)
}

/// Generate a new identifier from the given cryptographic source.
pub fn generate_from<R: TryCryptoRng + ?Sized>(rng: &mut R) -> Result<SessionId> {
    let mut bytes = [0u8; ID_ENTROPY_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Entropy(e.to_string()))?;
    Ok(SessionId(URL_SAFE_NO_PAD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::TryRngCore;
    use std::collections::HashSet;

    struct ExhaustedRng;

    impl TryRngCore for ExhaustedRng {
        type Error = std::io::Error;

        fn try_next_u32(&mut self) -> std::result::Result<u32, Self::Error> {
            Err(std::io::Error::other("entropy exhausted"))
        }

        fn try_next_u64(&mut self) -> std::result::Result<u64, Self::Error> {
            Err(std::io::Error::other("entropy exhausted"))
        }

        fn try_fill_bytes(&mut self, _dst: &mut [u8]) -> std::result::Result<(), Self::Error> {
            Err(std::io::Error::other("entropy exhausted"))
        }
    }

    impl TryCryptoRng for ExhaustedRng {}

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<SessionId> = (0..1000).map(|_| generate().unwrap()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_id_decodes_to_full_entropy() {
        let id = generate().unwrap();
        assert_eq!(id.as_str().len(), 43);
        assert!(id.decode_entropy().is_some());
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_exhausted_source_fails_closed() {
        let err = generate_from(&mut ExhaustedRng).unwrap_err();
        assert!(matches!(err, Error::Entropy(ref msg) if msg.contains("exhausted")));
    }

    #[test]
    fn test_well_formed() {
        assert!(generate().unwrap().is_well_formed());
        assert!(!SessionId::new("").is_well_formed());
        assert!(!SessionId::new("admin").is_well_formed());
        // 32 bytes with padding is not the canonical form
        let padded = format!("{}=", generate().unwrap());
        assert!(!SessionId::new(padded).is_well_formed());
    }
}
