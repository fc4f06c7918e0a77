//! Hash capability used to derive token ids from scanned tag identifiers.

use sha2::{Digest, Sha256};

use crate::error::Result;

/// String to hex-digest hash function.
///
/// Implemented by [`Sha256Hash`] and by any `Fn(&str) -> Result<String>`, so tests and callers can
/// substitute another digest.
pub trait HashFunction: Send + Sync {
    /// Returns the hex digest of `input`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::HashUnavailable`] if the algorithm cannot be used.
    fn hash(&self, input: &str) -> Result<String>;
}

impl<F> HashFunction for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn hash(&self, input: &str) -> Result<String> {
        self(input)
    }
}

/// SHA-256 over the UTF-8 bytes of the input, as lowercase hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hash;

impl HashFunction for Sha256Hash {
    fn hash(&self, input: &str) -> Result<String> {
        let digest = Sha256::digest(input.as_bytes());
        Ok(hex::encode(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_sha256_known_vectors() {
        assert_eq!(
            Sha256Hash.hash("").unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            Sha256Hash.hash("abc").unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_digest_is_lowercase_hex() {
        let digest = Sha256Hash.hash("04a224b2c85380").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_closure_as_hash_function() {
        let unavailable =
            |_: &str| -> Result<String> { Err(Error::HashUnavailable("MD2".to_string())) };
        assert!(matches!(
            unavailable.hash("tag"),
            Err(Error::HashUnavailable(_))
        ));

        let reversed = |input: &str| -> Result<String> { Ok(input.chars().rev().collect()) };
        assert_eq!(reversed.hash("abc").unwrap(), "cba");
    }
}
