//! Paillier partially-homomorphic encryption over arbitrary-precision
//! integers.
//!
//! The Paillier cryptosystem is additively homomorphic: the product of two
//! ciphertexts decrypts to the sum of their plaintexts, and raising a
//! ciphertext to a constant multiplies the underlying plaintext. This lets
//! untrusted parties aggregate encrypted values (vote tallies, private
//! sums) without seeing them and without a trusted combiner.
//!
//! Key generation supports the scheme's two textbook parameterizations:
//! [`Variant::Simple`] fixes the generator to `n + 1`, while
//! [`Variant::General`] draws a pseudo-random generator of suitable order.
//! Ciphertexts from one keypair only decrypt under that keypair.
//!
//! ```
//! use paillier_he::{generate_keypair_with, PlainText, Variant};
//!
//! let keypair = generate_keypair_with(512, Variant::General).unwrap();
//! let public = keypair.public_key();
//!
//! let c1 = public.encrypt(&PlainText::from(20u64)).unwrap();
//! let c2 = public.encrypt(&PlainText::from(22u64)).unwrap();
//!
//! let sum = keypair.private_key().decrypt(&(c1 + c2)).unwrap();
//! assert_eq!(sum.into_inner(), 42u64.into());
//! ```
//!
//! Keys smaller than 2048 bits are fine for tests and experiments but
//! should not protect real data.

mod error;
mod keygen;
mod math_extensions;
mod types;

pub use error::{Error, Result};
pub use keygen::{
  generate_keypair, generate_keypair_from_rng, generate_keypair_with, Variant, DEFAULT_BIT_LENGTH,
  MIN_BIT_LENGTH,
};
pub use types::{CipherText, Keypair, PlainText, PrivateKey, PublicKey};

#[test]
fn can_encrypt_and_decrypt() {
  let keypair = generate_keypair_with(256, Variant::Simple).expect("couldn't generate keypair");
  let plaintext = PlainText::from(123u64);

  let ciphertext = keypair
    .public_key()
    .encrypt(&plaintext)
    .expect("couldn't encrypt plaintext");
  let decrypted = keypair
    .private_key()
    .decrypt(&ciphertext)
    .expect("couldn't decrypt ciphertext");

  assert_eq!(plaintext, decrypted);
}
