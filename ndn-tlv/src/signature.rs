use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::packets::KeyLocator;

/// Signature scheme tags assigned by the NDN protocol
pub mod signature_type {
    /// SHA256 digest only (no asymmetric signature)
    pub const DIGEST_SHA256: u64 = 0;
    /// SHA256 with RSA signature
    pub const SHA256_WITH_RSA: u64 = 1;
    /// SHA256 with ECDSA signature
    pub const SHA256_WITH_ECDSA: u64 = 3;
    /// HMAC with SHA256
    pub const HMAC_WITH_SHA256: u64 = 4;
}

/// A SHA256-with-RSA signature
///
/// The key locator travels in the SignatureInfo block of a Data packet;
/// the raw signature bytes travel in SignatureValue. Signing itself is
/// left to the caller, who runs an external signer over the signed
/// portion of the encoding and stores the result here.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sha256WithRsaSignature {
    key_locator: Option<KeyLocator>,
    signature: Bytes,
}

impl Sha256WithRsaSignature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_locator(&self) -> Option<&KeyLocator> {
        self.key_locator.as_ref()
    }

    pub fn set_key_locator(&mut self, key_locator: Option<KeyLocator>) {
        self.key_locator = key_locator;
    }

    pub fn with_key_locator(mut self, key_locator: KeyLocator) -> Self {
        self.key_locator = Some(key_locator);
        self
    }

    /// Raw signature bytes produced by an external signer
    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    pub fn set_signature(&mut self, signature: impl Into<Bytes>) {
        self.signature = signature.into();
    }
}

/// Signature schemes this codec can put on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signature {
    /// SHA256 with RSA signature
    Sha256WithRsa(Sha256WithRsaSignature),
}

impl Signature {
    /// Raw signature bytes, whatever the scheme
    pub fn signature_bytes(&self) -> &Bytes {
        match self {
            Signature::Sha256WithRsa(signature) => signature.signature(),
        }
    }

    /// Replace the raw signature bytes, keeping the scheme and locator
    pub fn set_signature_bytes(&mut self, bytes: impl Into<Bytes>) {
        match self {
            Signature::Sha256WithRsa(signature) => signature.set_signature(bytes),
        }
    }

    /// Key locator, if the scheme carries one
    pub fn key_locator(&self) -> Option<&KeyLocator> {
        match self {
            Signature::Sha256WithRsa(signature) => signature.key_locator(),
        }
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature::Sha256WithRsa(Sha256WithRsaSignature::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;

    #[test]
    fn test_default_signature_is_blank() {
        let signature = Signature::default();
        assert!(signature.signature_bytes().is_empty());
        assert_eq!(signature.key_locator(), None);
    }

    #[test]
    fn test_signature_bytes_passthrough() {
        let mut signature = Signature::default();
        signature.set_signature_bytes(Bytes::from_static(&[0xAB; 16]));
        assert_eq!(signature.signature_bytes().as_ref(), &[0xAB; 16]);
    }

    #[test]
    fn test_key_locator_passthrough() {
        let locator = KeyLocator::Name(Name::from_uri("/key/name").unwrap());
        let signature = Signature::Sha256WithRsa(
            Sha256WithRsaSignature::new().with_key_locator(locator.clone()),
        );
        assert_eq!(signature.key_locator(), Some(&locator));
    }

    #[test]
    fn test_scheme_tags() {
        assert_eq!(signature_type::DIGEST_SHA256, 0);
        assert_eq!(signature_type::SHA256_WITH_RSA, 1);
        assert_eq!(signature_type::SHA256_WITH_ECDSA, 3);
        assert_eq!(signature_type::HMAC_WITH_SHA256, 4);
    }
}
