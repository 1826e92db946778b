//! Reversible credential encoding for values kept in environment variables.
//!
//! A secret is sealed with AES-256-GCM under a key derived from an identity
//! string (a database name, a host, or `user@host`). The same identity
//! string always derives the same key, so any value encoded for an identity
//! decodes with that identity and nothing else.
//!
//! # Wire format
//! URL-safe, unpadded base64 of `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! Each encoding uses a fresh random nonce, so encoding the same secret
//! twice yields different strings.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use zeroize::Zeroizing;

use crate::error::DbmError;

/// AES-GCM nonce size: 96 bits
const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size: 128 bits
const TAG_SIZE: usize = 16;

/// AES-256 key size
const KEY_SIZE: usize = 32;

/// Fixed application salt; key uniqueness comes from the identity string
const VAULT_SALT: &[u8; 16] = b"dbmgen-vault-v1!";

/// Argon2id memory cost in KiB
const ARGON2_MEMORY_COST: u32 = 4096;

/// Argon2id iterations
const ARGON2_TIME_COST: u32 = 2;

/// Argon2id lanes
const ARGON2_PARALLELISM: u32 = 1;

/// Outcome of decoding a stored value.
///
/// Decoding never fails: a value that is not a valid encoding under the
/// given key is handed back unchanged as [`VaultValue::Passthrough`], which
/// callers treat as a plain, unencoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultValue {
    /// The value was sealed under the key and has been opened
    Decoded(String),
    /// The value could not be opened; this is the original input
    Passthrough(String),
}

impl VaultValue {
    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }

    /// Borrows the resulting value regardless of outcome
    pub fn as_str(&self) -> &str {
        match self {
            Self::Decoded(value) | Self::Passthrough(value) => value,
        }
    }

    /// Consumes the outcome, yielding the resulting value
    pub fn into_inner(self) -> String {
        match self {
            Self::Decoded(value) | Self::Passthrough(value) => value,
        }
    }
}

/// Derives the AES-256 key for an identity string.
fn derive_key(key: &str) -> crate::Result<Zeroizing<[u8; KEY_SIZE]>> {
    let params = Params::new(
        ARGON2_MEMORY_COST,
        ARGON2_TIME_COST,
        ARGON2_PARALLELISM,
        Some(KEY_SIZE),
    )
    .map_err(|e| DbmError::Vault {
        context: format!("Invalid Argon2 parameters: {}", e),
    })?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut derived = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(key.as_bytes(), VAULT_SALT, &mut *derived)
        .map_err(|e| DbmError::Vault {
            context: format!("Key derivation failed: {}", e),
        })?;

    Ok(derived)
}

/// Encodes a secret for storage under the given identity key.
///
/// # Errors
/// Returns [`DbmError::Vault`] if key derivation or encryption fails.
///
/// # Example
/// ```rust
/// use dbmgen_core::security::vault::{decode_secret, encode_secret, VaultValue};
///
/// let stored = encode_secret("s3cret", "app@db.internal")?;
/// assert_eq!(
///     decode_secret(&stored, "app@db.internal"),
///     VaultValue::Decoded("s3cret".to_string())
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn encode_secret(secret: &str, key: &str) -> crate::Result<String> {
    let derived = derive_key(key)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&*derived));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, secret.as_bytes())
        .map_err(|e| DbmError::Vault {
            context: format!("Encryption failed: {}", e),
        })?;

    let mut payload = Vec::with_capacity(NONCE_SIZE + sealed.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&sealed);

    Ok(URL_SAFE_NO_PAD.encode(payload))
}

/// Decodes a stored value under the given identity key.
///
/// Never fails; see [`VaultValue`].
pub fn decode_secret(cipher_text: &str, key: &str) -> VaultValue {
    match try_decode(cipher_text, key) {
        Some(secret) => VaultValue::Decoded(secret),
        None => {
            tracing::debug!("Stored value is not vault-encoded; using it verbatim");
            VaultValue::Passthrough(cipher_text.to_string())
        }
    }
}

fn try_decode(cipher_text: &str, key: &str) -> Option<String> {
    let payload = URL_SAFE_NO_PAD.decode(cipher_text.trim()).ok()?;
    if payload.len() < NONCE_SIZE + TAG_SIZE {
        return None;
    }
    let (nonce, sealed) = payload.split_at(NONCE_SIZE);

    let derived = derive_key(key).ok()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&*derived));
    let opened = Zeroizing::new(cipher.decrypt(Nonce::from_slice(nonce), sealed).ok()?);

    String::from_utf8(opened.to_vec()).ok()
}
