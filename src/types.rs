use num::traits::{One, Zero};
use num::BigInt;
use rand::Rng;
use std::ops::{Add, Mul, Sub};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::math_extensions::{gcd, l_function, mod_inv, power_mod, Modulo};

const MAX_BLINDING_DRAWS: usize = 32;

/// Public half of a Paillier keypair: the modulus `n`, its cached square,
/// and the generator `g`. Immutable once constructed and safe to share
/// across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
  pub(crate) n: BigInt,
  pub(crate) n_square: BigInt,
  pub(crate) g: BigInt,
  pub(crate) bit_length: usize,
}

impl PublicKey {
  /// Rebuilds a public key from its components, for callers that persist
  /// key material externally.
  ///
  /// `bit_length` must be the actual size of `n`, and `g` must lie in
  /// `(0, n^2)`.
  pub fn new(n: BigInt, g: BigInt, bit_length: usize) -> Result<Self> {
    if n <= BigInt::zero() || n.bits() != bit_length {
      return Err(Error::InvalidPublicKey);
    }
    let n_square = &n * &n;
    if g <= BigInt::zero() || g >= n_square {
      return Err(Error::InvalidPublicKey);
    }
    Ok(PublicKey {
      n,
      n_square,
      g,
      bit_length,
    })
  }

  /// The public modulus `n`.
  pub fn n(&self) -> &BigInt {
    &self.n
  }

  /// The generator `g`.
  pub fn g(&self) -> &BigInt {
    &self.g
  }

  /// `n^2`, the modulus of the ciphertext group.
  pub fn n_square(&self) -> &BigInt {
    &self.n_square
  }

  /// The size of `n` in bits, as sampled at generation time.
  pub fn bit_length(&self) -> usize {
    self.bit_length
  }

  /// Encrypts `m` with fresh randomness from the thread-local generator.
  ///
  /// ```
  /// # use paillier_he::{generate_keypair_with, PlainText, Variant};
  /// # let keypair = generate_keypair_with(256, Variant::Simple).unwrap();
  /// let ciphertext = keypair.public_key().encrypt(&PlainText::from(5u64)).unwrap();
  /// ```
  pub fn encrypt(&self, m: &PlainText) -> Result<CipherText> {
    self.encrypt_with_rng(m, &mut rand::thread_rng())
  }

  /// Encrypts `m`, drawing the blinding value from `rng`.
  ///
  /// `m` must lie in `[0, n)`. The blinding value `r` is drawn uniformly
  /// from `[0, n)` and redrawn while `r <= 1` or `gcd(r, n) != 1`, so the
  /// ciphertext `g^m * r^n mod n^2` carries fresh randomness on every call
  /// and two encryptions of the same message differ.
  pub fn encrypt_with_rng<R: Rng>(&self, m: &PlainText, rng: &mut R) -> Result<CipherText> {
    if m.0 < BigInt::zero() || m.0 >= self.n {
      return Err(Error::PlaintextOutOfRange);
    }
    let r = self.draw_blinding(rng)?;
    let c = (power_mod(&self.g, &m.0, &self.n_square) * power_mod(&r, &self.n, &self.n_square))
      .modulo(&self.n_square);
    CipherText::new(c, self.n_square.clone())
  }

  fn draw_blinding<R: Rng>(&self, rng: &mut R) -> Result<BigInt> {
    use num::bigint::RandBigInt;

    let one = BigInt::one();
    for _ in 0..MAX_BLINDING_DRAWS {
      let r = rng.gen_bigint_range(&BigInt::zero(), &self.n);
      if r > one && gcd(&r, &self.n) == one {
        return Ok(r);
      }
    }
    Err(Error::GenerationTimeout {
      attempts: MAX_BLINDING_DRAWS,
    })
  }
}

/// Private half of a Paillier keypair: the trapdoor `(lambda, mu)` and the
/// prime factors of the modulus, together with a shared handle to the
/// public key it was generated with.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
  pub(crate) lambda: BigInt,
  pub(crate) mu: BigInt,
  pub(crate) p: BigInt,
  pub(crate) q: BigInt,
  pub(crate) public_key: Arc<PublicKey>,
}

impl PrivateKey {
  /// Rebuilds a private key from its components, validating that the
  /// factors are distinct and reconstruct the public modulus.
  pub fn new(
    lambda: BigInt,
    mu: BigInt,
    p: BigInt,
    q: BigInt,
    public_key: Arc<PublicKey>,
  ) -> Result<Self> {
    if p == q || &p * &q != public_key.n {
      return Err(Error::InvalidPrivateKey);
    }
    Ok(PrivateKey {
      lambda,
      mu,
      p,
      q,
      public_key,
    })
  }

  /// The public key this private key is paired with.
  pub fn public_key(&self) -> &PublicKey {
    &self.public_key
  }

  /// Decrypts a ciphertext produced under the paired public key.
  ///
  /// Fails with [`Error::KeyMismatch`] for a ciphertext tagged with another
  /// modulus, [`Error::CiphertextOutOfRange`] for a value outside
  /// `[0, n^2)`, and [`Error::InvalidCiphertext`] when the recovery formula
  /// does not land in the plaintext group, which means the ciphertext is
  /// corrupted or belongs to another key.
  pub fn decrypt(&self, c: &CipherText) -> Result<PlainText> {
    let key = &*self.public_key;
    if c.n_square != key.n_square {
      return Err(Error::KeyMismatch);
    }
    if c.data < BigInt::zero() || c.data >= key.n_square {
      return Err(Error::CiphertextOutOfRange);
    }

    let u = power_mod(&c.data, &self.lambda, &key.n_square);
    let l = l_function(&u, &key.n).ok_or(Error::InvalidCiphertext)?;
    Ok(PlainText((l * &self.mu).modulo(&key.n)))
  }
}

/// A coupled public/private pair produced atomically by key generation.
/// The private half shares ownership of the public key.
pub struct Keypair {
  public: Arc<PublicKey>,
  private: PrivateKey,
}

impl Keypair {
  pub(crate) fn new(public: Arc<PublicKey>, private: PrivateKey) -> Self {
    Keypair { public, private }
  }

  pub fn public_key(&self) -> &PublicKey {
    &self.public
  }

  pub fn private_key(&self) -> &PrivateKey {
    &self.private
  }

  /// Splits the pair. The private half keeps its shared handle to the
  /// public key, so both halves stay usable independently.
  pub fn into_parts(self) -> (Arc<PublicKey>, PrivateKey) {
    (self.public, self.private)
  }
}

/// A plaintext message; valid values lie in `[0, n)` for the key in use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainText(pub(crate) BigInt);

impl PlainText {
  /// Checked constructor: `m` must lie in `[0, n)`.
  pub fn new(m: &BigInt, n: &BigInt) -> Result<Self> {
    if *m >= BigInt::zero() && m < n {
      Ok(PlainText(m.clone()))
    } else {
      Err(Error::PlaintextOutOfRange)
    }
  }

  pub fn into_inner(self) -> BigInt {
    self.0
  }
}

impl From<BigInt> for PlainText {
  /// Raw conversion; the value is range-checked when it reaches `encrypt`.
  fn from(m: BigInt) -> Self {
    PlainText(m)
  }
}

/// An element of the ciphertext group `Z_{n^2}`, tagged with the modulus
/// square it was produced under so cross-key mixing is detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherText {
  pub(crate) data: BigInt,
  pub(crate) n_square: BigInt,
}

impl CipherText {
  pub(crate) fn new(c: BigInt, n_square: BigInt) -> Result<Self> {
    if c >= BigInt::zero() && c < n_square {
      Ok(CipherText { data: c, n_square })
    } else {
      Err(Error::CiphertextOutOfRange)
    }
  }

  pub fn into_inner(self) -> BigInt {
    self.data
  }
}

impl Add<CipherText> for CipherText {
  type Output = CipherText;

  /// Homomorphic addition: the product of two ciphertexts decrypts to the
  /// sum of their plaintexts modulo `n`.
  ///
  /// # Panics
  ///
  /// Panics if the operands were encrypted under different public keys.
  ///
  /// ```
  /// # use paillier_he::{generate_keypair_with, PlainText, Variant};
  /// let keypair = generate_keypair_with(256, Variant::Simple).unwrap();
  /// let public = keypair.public_key();
  /// let c1 = public.encrypt(&PlainText::from(1u64)).unwrap();
  /// let c2 = public.encrypt(&PlainText::from(1u64)).unwrap();
  ///
  /// let sum = keypair.private_key().decrypt(&(c1 + c2)).unwrap();
  ///
  /// assert_eq!(sum, PlainText::from(2u64));
  /// ```
  ///
  /// Mixing keys panics:
  /// ```should_panic
  /// # use paillier_he::{generate_keypair_with, PlainText, Variant};
  /// # let k1 = generate_keypair_with(256, Variant::Simple).unwrap();
  /// # let k2 = generate_keypair_with(256, Variant::Simple).unwrap();
  /// let c1 = k1.public_key().encrypt(&PlainText::from(1u64)).unwrap();
  /// let c2 = k2.public_key().encrypt(&PlainText::from(1u64)).unwrap();
  ///
  /// let c = c1 + c2; // panics!
  /// ```
  #[allow(clippy::suspicious_arithmetic_impl)]
  fn add(self, rhs: Self) -> <Self as Add<Self>>::Output {
    assert_eq!(
      self.n_square, rhs.n_square,
      "ciphertexts must come from the same public key"
    );
    CipherText {
      data: (&self.data * &rhs.data).modulo(&self.n_square),
      n_square: self.n_square,
    }
  }
}

impl Sub<CipherText> for CipherText {
  type Output = CipherText;

  /// Homomorphic subtraction: multiplies by the inverse of `rhs` in the
  /// ciphertext group, decrypting to the difference of the plaintexts
  /// modulo `n`.
  ///
  /// # Panics
  ///
  /// Panics if the operands were encrypted under different public keys, or
  /// if `rhs` is not invertible modulo `n^2`. Every genuine ciphertext is
  /// invertible.
  #[allow(clippy::suspicious_arithmetic_impl)]
  fn sub(self, rhs: Self) -> <Self as Sub<Self>>::Output {
    assert_eq!(
      self.n_square, rhs.n_square,
      "ciphertexts must come from the same public key"
    );
    let rhs_inv = match mod_inv(&rhs.data, &self.n_square) {
      Some(inv) => inv,
      None => panic!("subtrahend is not invertible modulo n^2"),
    };
    CipherText {
      data: (&self.data * &rhs_inv).modulo(&self.n_square),
      n_square: self.n_square,
    }
  }
}

impl Mul<PlainText> for CipherText {
  type Output = CipherText;

  /// Homomorphic scalar multiplication: raising a ciphertext to a constant
  /// `k` decrypts to `k * m mod n`.
  ///
  /// # Panics
  ///
  /// Panics if the scalar is negative.
  ///
  /// ```
  /// # use paillier_he::{generate_keypair_with, PlainText, Variant};
  /// # let keypair = generate_keypair_with(256, Variant::Simple).unwrap();
  /// let c = keypair.public_key().encrypt(&PlainText::from(2u64)).unwrap();
  ///
  /// let scaled = c * PlainText::from(3u64);
  ///
  /// assert_eq!(keypair.private_key().decrypt(&scaled).unwrap(), PlainText::from(6u64));
  /// ```
  fn mul(self, rhs: PlainText) -> <Self as Mul<PlainText>>::Output {
    assert!(rhs.0 >= BigInt::zero(), "scalar must be non-negative");
    CipherText {
      data: power_mod(&self.data, &rhs.0, &self.n_square),
      n_square: self.n_square,
    }
  }
}

impl Mul<CipherText> for PlainText {
  type Output = CipherText;

  fn mul(self, rhs: CipherText) -> <Self as Mul<CipherText>>::Output {
    rhs * self
  }
}

mod impls {
  use super::PlainText;
  use doc_comment::doc_comment;

  macro_rules! impl_from_for_single_plaintext {
    ($t: ty) => {
      paste::item! {
        impl ::std::convert::From<$t> for PlainText {
          doc_comment!{
            concat!("Convert from `", stringify!($t), "` to a `PlainText`.
              This is a raw conversion: the value is only checked against the
              public modulus when it reaches `encrypt`, which rejects anything
              outside the range `[0, n)`."
            ),
            fn from(x: $t) -> Self {
              use num::BigInt;
              use num::traits::FromPrimitive;

              PlainText(
                BigInt::[<from_ $t>](x).unwrap()
              )
            }
          }
        }
      }
    };
  }

  macro_rules! impl_from_for_plaintext {
    ($($t:ty),+) => {
      $(
        impl_from_for_single_plaintext!($t);
      )+
    };
  }

  impl_from_for_plaintext!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::keygen::{generate_keypair_with, Variant};
  use num::traits::FromPrimitive;

  fn test_keypair() -> Keypair {
    generate_keypair_with(256, Variant::Simple).expect("key generation failed")
  }

  #[test]
  fn public_key_rebuilds_from_components() {
    let keypair = test_keypair();
    let public = keypair.public_key();

    let rebuilt =
      PublicKey::new(public.n().clone(), public.g().clone(), public.bit_length()).unwrap();
    assert_eq!(&rebuilt, public);
  }

  #[test]
  fn public_key_rejects_inconsistent_components() {
    let keypair = test_keypair();
    let public = keypair.public_key();

    let oversized_g = public.n_square() + BigInt::one();
    assert_eq!(
      PublicKey::new(public.n().clone(), oversized_g, public.bit_length()).unwrap_err(),
      Error::InvalidPublicKey
    );
    assert_eq!(
      PublicKey::new(public.n().clone(), public.g().clone(), 512).unwrap_err(),
      Error::InvalidPublicKey
    );
  }

  #[test]
  fn private_key_requires_matching_factors() {
    let keypair = test_keypair();
    let (public, private) = keypair.into_parts();

    let rebuilt = PrivateKey::new(
      private.lambda.clone(),
      private.mu.clone(),
      private.p.clone(),
      private.q.clone(),
      Arc::clone(&public),
    )
    .unwrap();
    assert!(rebuilt == private);

    let bad = PrivateKey::new(
      private.lambda.clone(),
      private.mu.clone(),
      private.p.clone(),
      private.p.clone(),
      Arc::clone(&public),
    );
    assert!(matches!(bad, Err(Error::InvalidPrivateKey)));
  }

  #[test]
  fn plaintext_constructor_enforces_range() {
    let n = BigInt::from_u64(100).unwrap();
    assert!(PlainText::new(&BigInt::from_u64(99).unwrap(), &n).is_ok());
    assert_eq!(
      PlainText::new(&n, &n).unwrap_err(),
      Error::PlaintextOutOfRange
    );
    assert_eq!(
      PlainText::new(&BigInt::from_i64(-1).unwrap(), &n).unwrap_err(),
      Error::PlaintextOutOfRange
    );
  }

  #[test]
  fn encrypt_rejects_out_of_range_plaintext() {
    let keypair = test_keypair();
    let m = PlainText::from(keypair.public_key().n().clone());
    assert_eq!(
      keypair.public_key().encrypt(&m).unwrap_err(),
      Error::PlaintextOutOfRange
    );
  }

  #[test]
  fn decrypt_rejects_out_of_range_ciphertext() {
    let keypair = test_keypair();
    let c = CipherText {
      data: keypair.public_key().n_square().clone(),
      n_square: keypair.public_key().n_square().clone(),
    };
    assert_eq!(
      keypair.private_key().decrypt(&c).unwrap_err(),
      Error::CiphertextOutOfRange
    );
  }

  #[test]
  fn non_unit_ciphertext_fails_decryption() {
    let keypair = test_keypair();
    let (public, private) = keypair.into_parts();

    // A multiple of p is not a unit mod n^2, so the recovery formula cannot
    // land back in the plaintext group.
    let c = CipherText {
      data: private.p.clone(),
      n_square: public.n_square().clone(),
    };
    assert_eq!(private.decrypt(&c).unwrap_err(), Error::InvalidCiphertext);
  }

  #[test]
  #[should_panic]
  fn adding_ciphertexts_from_different_keys_panics() {
    let k1 = test_keypair();
    let k2 = test_keypair();
    let c1 = k1.public_key().encrypt(&PlainText::from(1u64)).unwrap();
    let c2 = k2.public_key().encrypt(&PlainText::from(1u64)).unwrap();
    let _ = c1 + c2;
  }

  #[test]
  #[should_panic]
  fn negative_scalar_panics() {
    let keypair = test_keypair();
    let c = keypair
      .public_key()
      .encrypt(&PlainText::from(1u64))
      .unwrap();
    let _ = c * PlainText::from(-1i64);
  }
}
