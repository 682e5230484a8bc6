//! RSA key material
//!
//! One key pair serves two purposes: RS256 token signatures and
//! RSA-OAEP encryption of the login state. It is loaded once at startup
//! and shared read-only afterwards.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Smallest accepted modulus size
pub const MIN_KEY_BITS: usize = 2048;

/// Errors raised while loading or using key material
#[derive(Debug, Clone, thiserror::Error)]
pub enum KeyError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("RSA key too small: got {bits} bits, need at least {minimum}")]
    KeyTooSmall { bits: usize, minimum: usize },

    #[error("public key does not match private key")]
    Mismatch,

    #[error("key encoding failed: {0}")]
    Encoding(String),

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed")]
    Decrypt,
}

/// An RSA key pair with pre-built JWT keys.
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    /// Load from PEM.
    ///
    /// The private key may be PKCS#8 (`PRIVATE KEY`) or PKCS#1
    /// (`RSA PRIVATE KEY`). A supplied public key may be SPKI or PKCS#1 and
    /// must belong to the private key.
    pub fn from_pem(private_pem: &str, public_pem: Option<&str>) -> Result<Self, KeyError> {
        let private = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_pem))
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;

        let supplied = public_pem
            .map(|pem| {
                RsaPublicKey::from_public_key_pem(pem)
                    .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
                    .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
            })
            .transpose()?;

        Self::from_private(private, supplied)
    }

    /// Generate a fresh key pair
    pub fn generate(bits: usize) -> Result<Self, KeyError> {
        if bits < MIN_KEY_BITS {
            return Err(KeyError::KeyTooSmall {
                bits,
                minimum: MIN_KEY_BITS,
            });
        }
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;
        Self::from_private(private, None)
    }

    fn from_private(private: RsaPrivateKey, supplied: Option<RsaPublicKey>) -> Result<Self, KeyError> {
        let bits = private.size() * 8;
        if bits < MIN_KEY_BITS {
            return Err(KeyError::KeyTooSmall {
                bits,
                minimum: MIN_KEY_BITS,
            });
        }
        private
            .validate()
            .map_err(|e| KeyError::InvalidPrivateKey(e.to_string()))?;

        let public = private.to_public_key();
        if let Some(supplied) = supplied {
            if supplied != public {
                return Err(KeyError::Mismatch);
            }
        }

        let pkcs1 = private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        let encoding = EncodingKey::from_rsa_pem(pkcs1.as_bytes())
            .map_err(|e| KeyError::Encoding(e.to_string()))?;

        let n = URL_SAFE_NO_PAD.encode(public.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(public.e().to_bytes_be());
        let decoding = DecodingKey::from_rsa_components(&n, &e)
            .map_err(|e| KeyError::Encoding(e.to_string()))?;

        Ok(Self {
            private,
            public,
            encoding,
            decoding,
        })
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// Private key as PKCS#8 PEM
    pub fn private_key_pem(&self) -> Result<String, KeyError> {
        self.private
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| KeyError::Encoding(e.to_string()))
    }

    /// Public key as SPKI PEM
    pub fn public_key_pem(&self) -> Result<String, KeyError> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Encoding(e.to_string()))
    }

    /// Encrypt a short message to ourselves with RSA-OAEP (SHA-256)
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.public
            .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| KeyError::Encrypt(e.to_string()))
    }

    /// Decrypt a message produced by [`KeyPair::encrypt`]
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.private
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(|_| KeyError::Decrypt)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Constant-time string comparison.
///
/// Length is not treated as secret.
#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
