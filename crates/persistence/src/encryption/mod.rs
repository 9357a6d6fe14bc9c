//! AES-256-GCM encryption for stored pass and security tokens
//!
//! The key is bound to the machine: Argon2id over the machine fingerprint.
//! A database copied to another machine cannot be decrypted there.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::Argon2;
use miwallet_core::{Error, Result};
use rand::RngCore;

const NONCE_LEN: usize = 12;
const MACHINE_KEY_SALT: &[u8] = b"miwallet-credential-key-v1";
const DEVICE_ID_SALT: &[u8] = b"miwallet-device-id-v1";

/// Ciphertext plus the nonce it was sealed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub ciphertext: Vec<u8>,
    pub iv: [u8; NONCE_LEN],
}

impl SealedSecret {
    /// Rebuild from database columns
    pub fn from_parts(ciphertext: Vec<u8>, iv: &[u8]) -> Result<Self> {
        let iv: [u8; NONCE_LEN] = iv
            .try_into()
            .map_err(|_| Error::EncryptionError(format!("IV must be {} bytes", NONCE_LEN)))?;
        Ok(Self { ciphertext, iv })
    }
}

pub struct CredentialCipher {
    cipher: Aes256Gcm,
}

impl CredentialCipher {
    /// `key` must be exactly 32 bytes
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(Error::EncryptionError(format!(
                "Key must be 32 bytes, got {}",
                key.len()
            )));
        }

        let cipher =
            Aes256Gcm::new_from_slice(key).map_err(|e| Error::EncryptionError(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Cipher keyed to this machine
    pub fn for_this_machine() -> Result<Self> {
        Self::new(&derive_machine_key()?)
    }

    pub fn from_passphrase(passphrase: &str) -> Result<Self> {
        Self::new(&argon2_digest(passphrase, MACHINE_KEY_SALT)?)
    }

    pub fn seal(&self, plaintext: &str) -> Result<SealedSecret> {
        let mut iv = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| Error::EncryptionError(e.to_string()))?;

        Ok(SealedSecret { ciphertext, iv })
    }

    pub fn open(&self, sealed: &SealedSecret) -> Result<String> {
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&sealed.iv), sealed.ciphertext.as_ref())
            .map_err(|e| Error::EncryptionError(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| Error::EncryptionError(e.to_string()))
    }

    /// Blank or missing secrets are stored as NULL
    pub fn seal_optional(&self, plaintext: Option<&str>) -> Result<Option<SealedSecret>> {
        plaintext
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| self.seal(s))
            .transpose()
    }
}

// ─── Machine binding ─────────────────────────────────────────────────

fn argon2_digest(input: &str, salt: &[u8]) -> Result<[u8; 32]> {
    let mut out = [0u8; 32];
    Argon2::default()
        .hash_password_into(input.as_bytes(), salt, &mut out)
        .map_err(|e| Error::EncryptionError(format!("Argon2 derivation failed: {}", e)))?;
    Ok(out)
}

/// Machine id combined with the host name
pub fn machine_fingerprint() -> String {
    let machine_id = machine_uid::get().unwrap_or_else(|_| "no-machine-id".to_string());

    let hostname = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string());

    format!("miwallet-{}-{}", machine_id, hostname)
}

pub fn derive_machine_key() -> Result<[u8; 32]> {
    argon2_digest(&machine_fingerprint(), MACHINE_KEY_SALT)
}

/// Stable 16-hex-char id sent with license verification
pub fn device_id() -> Result<String> {
    let digest = argon2_digest(&machine_fingerprint(), DEVICE_ID_SALT)?;
    Ok(digest[..8].iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let cipher = CredentialCipher::from_passphrase("test-passphrase").unwrap();
        let token = "V1:J7rrshrufaw8uWrlTMO7x/WMcw6iE8kF2T5IZTbVjYKr9nvqbc8gCmqCXDLvCVdA";

        let sealed = cipher.seal(token).unwrap();
        assert_eq!(cipher.open(&sealed).unwrap(), token);
    }

    #[test]
    fn test_fresh_nonce_each_time() {
        let cipher = CredentialCipher::from_passphrase("p").unwrap();
        let a = cipher.seal("same").unwrap();
        let b = cipher.seal("same").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_other_key_cannot_open() {
        let sealed = CredentialCipher::from_passphrase("one")
            .unwrap()
            .seal("secret")
            .unwrap();
        let other = CredentialCipher::from_passphrase("two").unwrap();
        assert!(matches!(other.open(&sealed), Err(Error::EncryptionError(_))));
    }

    #[test]
    fn test_rejects_short_key_and_bad_iv() {
        assert!(CredentialCipher::new(&[0u8; 16]).is_err());
        assert!(SealedSecret::from_parts(vec![1, 2, 3], &[0u8; 8]).is_err());
        assert!(SealedSecret::from_parts(vec![1, 2, 3], &[0u8; 12]).is_ok());
    }

    #[test]
    fn test_blank_optional_not_sealed() {
        let cipher = CredentialCipher::from_passphrase("p").unwrap();
        assert!(cipher.seal_optional(None).unwrap().is_none());
        assert!(cipher.seal_optional(Some("  ")).unwrap().is_none());
        assert!(cipher.seal_optional(Some("sec")).unwrap().is_some());
    }

    #[test]
    fn test_machine_binding_is_stable() {
        assert_eq!(derive_machine_key().unwrap(), derive_machine_key().unwrap());

        let id = device_id().unwrap();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, device_id().unwrap());
    }
}
