//! Ed25519 key handling and issuer key custody.
//!
//! # Security
//! - The issuer seed is loaded ONLY from an environment variable
//! - Private key material is never logged, serialized or returned
//!   across an API boundary

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::ledger::types::{LedgerError, LedgerResult};

/// Environment variable holding the issuer's 32-byte seed, hex encoded.
pub const ISSUER_KEY_ENV_VAR: &str = "BLOODCHAIN_ISSUER_KEY";

/// An Ed25519 keypair. Owns the signing half; the verifying half and
/// all signatures travel as lowercase hex strings.
#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG. Infallible; each call
    /// yields an independent identity.
    pub fn generate() -> Self {
        Self {
            signing: SigningKey::generate(&mut OsRng),
        }
    }

    /// Rebuild a keypair from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(seed_hex: &str) -> LedgerResult<Self> {
        let raw = hex::decode(seed_hex.trim())
            .map_err(|e| LedgerError::Key(format!("invalid seed hex: {e}")))?;
        let seed: [u8; 32] = raw
            .try_into()
            .map_err(|_| LedgerError::Key("seed must be exactly 32 bytes".to_string()))?;
        Ok(Self {
            signing: SigningKey::from_bytes(&seed),
        })
    }

    /// Hex-encoded public key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing.verifying_key().to_bytes())
    }

    /// Detached signature over `message`, hex encoded.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.signing.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Verify a hex signature against a hex public key.
pub fn verify_hex(public_key_hex: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(pk_raw) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(pk_bytes) = <[u8; 32]>::try_from(pk_raw.as_slice()) else {
        return false;
    };
    let Ok(verifying) = VerifyingKey::from_bytes(&pk_bytes) else {
        return false;
    };
    let Ok(sig_raw) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(&sig_raw) else {
        return false;
    };
    verifying.verify(message, &signature).is_ok()
}

/// The service's persistent certificate-issuing identity.
///
/// One issuer identity per process: certificates are signed by the
/// hospital/blood-bank identity rather than a throwaway key minted per
/// certificate.
pub struct IssuerWallet {
    keypair: Keypair,
}

impl IssuerWallet {
    /// Load the issuer seed from `BLOODCHAIN_ISSUER_KEY`.
    pub fn from_env() -> LedgerResult<Self> {
        let seed_hex = std::env::var(ISSUER_KEY_ENV_VAR).map_err(|_| {
            LedgerError::Key(format!("environment variable {ISSUER_KEY_ENV_VAR} not set"))
        })?;
        let keypair = Keypair::from_seed_hex(&seed_hex)?;
        tracing::info!(
            public_key = %keypair.public_key_hex(),
            "Issuer wallet loaded from environment"
        );
        Ok(Self { keypair })
    }

    /// Load from the environment, or mint a process-lifetime identity
    /// when no seed is configured. Certificates issued under a generated
    /// identity cannot be re-issued under the same key after restart.
    pub fn load_or_generate() -> Self {
        match Self::from_env() {
            Ok(wallet) => wallet,
            Err(e) => {
                let keypair = Keypair::generate();
                tracing::warn!(
                    reason = %e,
                    public_key = %keypair.public_key_hex(),
                    "No issuer seed configured, generated an ephemeral issuer identity"
                );
                Self { keypair }
            }
        }
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn public_key_hex(&self) -> String {
        self.keypair.public_key_hex()
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for IssuerWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerWallet")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_yields_independent_keys() {
        let a = Keypair::generate();
        let b = Keypair::generate();
        assert_ne!(a.public_key_hex(), b.public_key_hex());
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let keypair = Keypair::generate();
        let message = b"donor certificate payload";
        let signature = keypair.sign_hex(message);
        assert!(verify_hex(&keypair.public_key_hex(), message, &signature));
        assert!(!verify_hex(&keypair.public_key_hex(), b"tampered", &signature));
    }

    #[test]
    fn test_seed_round_trip() {
        let seed_hex = hex::encode([7u8; 32]);
        let a = Keypair::from_seed_hex(&seed_hex).unwrap();
        let b = Keypair::from_seed_hex(&seed_hex).unwrap();
        assert_eq!(a.public_key_hex(), b.public_key_hex());
    }

    #[test]
    fn test_invalid_seed_rejected() {
        assert!(Keypair::from_seed_hex("not hex").is_err());
        assert!(Keypair::from_seed_hex("abcd").is_err());
    }

    #[test]
    fn test_debug_never_prints_private_key() {
        let seed_hex = hex::encode([9u8; 32]);
        let keypair = Keypair::from_seed_hex(&seed_hex).unwrap();
        let rendered = format!("{keypair:?}");
        assert!(!rendered.contains(&seed_hex));
    }
}
