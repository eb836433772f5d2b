// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential Vault: AES-256-GCM authenticated encryption for device
//! passwords at rest.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use thiserror::Error;

/// Insecure default used when `ENCRYPTION_KEY` is not set. Starting with this
/// key in production is refused by `VaultMode::Production`.
const DEFAULT_KEY_MATERIAL: &str = "netcfg-insecure-default-key-do-not-use";

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CredentialDecryptError {
    #[error("ciphertext is not valid base64")]
    InvalidEncoding,
    #[error("ciphertext is too short to contain a nonce")]
    Truncated,
    #[error("authentication failed: wrong key or tampered ciphertext")]
    AuthenticationFailed,
    #[error("decrypted plaintext is not valid UTF-8")]
    InvalidUtf8,
}

/// Whether the vault is willing to fall back to the insecure default key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultMode {
    Development,
    Production,
}

impl VaultMode {
    pub fn from_env_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "production" | "prod" => VaultMode::Production,
            _ => VaultMode::Development,
        }
    }
}

/// Process-wide symmetric key, derived once at startup.
#[derive(Clone)]
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    /// Derives a vault from raw key material: truncate-then-right-pad with
    /// zero bytes to exactly 32 bytes (spec §4.1).
    pub fn from_key_material(material: &str) -> Self {
        let mut key_bytes = [0u8; 32];
        let raw = material.as_bytes();
        let n = raw.len().min(32);
        key_bytes[..n].copy_from_slice(&raw[..n]);
        let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Resolves the vault key from `ENCRYPTION_KEY`, falling back to the
    /// documented insecure default with a `tracing::warn!`. Refuses to start
    /// with the fallback when `mode == Production` (spec §9).
    pub fn from_env(mode: VaultMode) -> Result<Self, String> {
        match std::env::var("ENCRYPTION_KEY") {
            Ok(material) if !material.is_empty() => Ok(Self::from_key_material(&material)),
            _ => {
                if mode == VaultMode::Production {
                    return Err(
                        "ENCRYPTION_KEY is required in production mode (NETCFG_ENV=production)"
                            .to_string(),
                    );
                }
                tracing::warn!(
                    "ENCRYPTION_KEY not set; falling back to the insecure default vault key"
                );
                Ok(Self::from_key_material(DEFAULT_KEY_MATERIAL))
            }
        }
    }

    /// Encrypts `plaintext`, returning URL-safe base64 of `nonce || ciphertext || tag`.
    #[allow(clippy::expect_used)]
    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .expect("AES-256-GCM encryption with a fresh random nonce cannot fail");
        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        URL_SAFE_NO_PAD.encode(blob)
    }

    /// Decrypts opaque ciphertext produced by `encrypt`.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CredentialDecryptError> {
        let blob = URL_SAFE_NO_PAD
            .decode(ciphertext)
            .map_err(|_| CredentialDecryptError::InvalidEncoding)?;
        if blob.len() < NONCE_LEN {
            return Err(CredentialDecryptError::Truncated);
        }
        let (nonce_bytes, sealed) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, sealed)
            .map_err(|_| CredentialDecryptError::AuthenticationFailed)?;
        String::from_utf8(plaintext).map_err(|_| CredentialDecryptError::InvalidUtf8)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
