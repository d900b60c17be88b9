use thiserror::Error;

/// Errors surfaced by key generation, encryption, and decryption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
  /// The requested modulus size is odd, zero, or below the supported
  /// minimum. An odd size can never be met exactly by two equal-length
  /// prime factors.
  #[error("invalid key size: bit length must be even and at least {min}, got {actual}")]
  InvalidKeySize { min: usize, actual: usize },

  /// The plaintext lies outside `[0, n)` for the key in use.
  #[error("plaintext is out of range for this key: must lie in [0, n)")]
  PlaintextOutOfRange,

  /// The ciphertext value lies outside `[0, n^2)` for the key in use.
  #[error("ciphertext is out of range for this key: must lie in [0, n^2)")]
  CiphertextOutOfRange,

  /// The ciphertext was produced under a different public key.
  #[error("ciphertext was produced under a different public key")]
  KeyMismatch,

  /// A bounded sampling loop (primes, generator candidates, or encryption
  /// blinding) used up its retry budget without an acceptable draw.
  #[error("random sampling retry budget exhausted after {attempts} attempts")]
  GenerationTimeout { attempts: usize },

  /// Decryption reached a value no genuine ciphertext can produce; the
  /// ciphertext is corrupted or belongs to another key.
  #[error("ciphertext is invalid for this key: decryption left a non-divisible residue")]
  InvalidCiphertext,

  /// The public key components are inconsistent with each other.
  #[error("public key components are inconsistent")]
  InvalidPublicKey,

  /// The private key components do not match the paired public key.
  #[error("private key does not match its public key")]
  InvalidPrivateKey,

  /// An invariant guaranteed by construction failed to hold.
  #[error("internal invariant broken: {0}")]
  Bug(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
