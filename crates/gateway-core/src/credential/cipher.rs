//! AES-256-GCM sealing of provider credentials
//!
//! Stored references have the form `base64(nonce || ciphertext)`.

use crate::error::{GatewayError, GatewayResult};
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Size of the AES-GCM nonce in bytes
const NONCE_SIZE: usize = 12;

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Symmetric key used to open stored credentials
///
/// Configured as a base64 string. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialKey([u8; KEY_SIZE]);

impl CredentialKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_base64(encoded: &str) -> GatewayResult<Self> {
        let bytes = STANDARD.decode(encoded.trim()).map_err(|e| {
            GatewayError::config_with_context(
                format!("credential key is not valid base64: {}", e),
                "Decoding credential key",
            )
        })?;
        let key: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            GatewayError::config_with_context(
                format!("credential key must be {} bytes, got {}", KEY_SIZE, bytes.len()),
                "Decoding credential key",
            )
        })?;
        Ok(Self(key))
    }

    /// Fresh random key, for provisioning
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    fn cipher(&self) -> GatewayResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| GatewayError::config(format!("invalid credential key: {}", e)))
    }
}

impl fmt::Debug for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialKey(***)")
    }
}

impl Serialize for CredentialKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***")
    }
}

impl<'de> Deserialize<'de> for CredentialKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::from_base64(&encoded).map_err(serde::de::Error::custom)
    }
}

/// Seal a plaintext credential into a storable reference
pub fn encrypt_credential(key: &CredentialKey, plaintext: &str) -> GatewayResult<String> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = key
        .cipher()?
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| GatewayError::config(format!("credential encryption failed: {}", e)))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(sealed))
}

/// Open a stored credential reference
pub fn decrypt_credential(key: &CredentialKey, sealed: &str) -> GatewayResult<String> {
    let bytes = STANDARD.decode(sealed.trim()).map_err(|e| {
        GatewayError::config_with_context(
            format!("credential reference is not valid base64: {}", e),
            "Decrypting stored credential",
        )
    })?;
    if bytes.len() <= NONCE_SIZE {
        return Err(GatewayError::config_with_context(
            "credential reference is too short",
            "Decrypting stored credential",
        ));
    }

    let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
    let plaintext = key
        .cipher()?
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| {
            GatewayError::config_with_context(
                "credential could not be decrypted with the configured key",
                "Decrypting stored credential",
            )
        })?;

    String::from_utf8(plaintext).map_err(|e| {
        GatewayError::config_with_context(
            format!("decrypted credential is not UTF-8: {}", e),
            "Decrypting stored credential",
        )
    })
}
