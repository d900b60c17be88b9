use log::info;
use num::traits::One;
use num::BigInt;
use rand::Rng;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::math_extensions::{gcd, gen_prime, get_generator, l_function, lcm, mod_inv, power_mod};
use crate::types::{Keypair, PrivateKey, PublicKey};

/// Default modulus size, matching common guidance for new deployments.
pub const DEFAULT_BIT_LENGTH: usize = 2048;

/// Smallest accepted modulus size. Keys this small are for tests and
/// experiments only; production deployments should stay at
/// [`DEFAULT_BIT_LENGTH`] or above.
pub const MIN_BIT_LENGTH: usize = 256;

const MAX_MODULUS_ATTEMPTS: usize = 100;
const MAX_GENERATOR_ATTEMPTS: usize = 32;

/// Key-generation variant. Both produce working keypairs for the same
/// encryption and decryption formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
  /// `g = n + 1`, `lambda = (p-1)(q-1)`, `mu = lambda^-1 mod n`.
  Simple,
  /// `g` drawn pseudo-randomly from `Z*_{n^2}`, `lambda = lcm(p-1, q-1)`,
  /// `mu = L(g^lambda mod n^2, n)^-1 mod n`.
  General,
}

impl Default for Variant {
  fn default() -> Self {
    Variant::General
  }
}

/// Generates a keypair with the default parameters:
/// [`DEFAULT_BIT_LENGTH`] bits, [`Variant::General`].
pub fn generate_keypair() -> Result<Keypair> {
  generate_keypair_with(DEFAULT_BIT_LENGTH, Variant::default())
}

/// Generates a keypair of the given modulus size and variant.
pub fn generate_keypair_with(bit_length: usize, variant: Variant) -> Result<Keypair> {
  generate_keypair_from_rng(bit_length, variant, &mut rand::thread_rng())
}

/// Generates a keypair, drawing generator randomness from `rng`.
///
/// `bit_length` must be even and at least [`MIN_BIT_LENGTH`]: the modulus
/// is assembled from two primes of `bit_length / 2` bits each and is only
/// accepted when its size matches the request exactly, which an odd target
/// can never satisfy.
pub fn generate_keypair_from_rng<R: Rng>(
  bit_length: usize,
  variant: Variant,
  rng: &mut R,
) -> Result<Keypair> {
  if bit_length < MIN_BIT_LENGTH || bit_length % 2 != 0 {
    return Err(Error::InvalidKeySize {
      min: MIN_BIT_LENGTH,
      actual: bit_length,
    });
  }

  info!(
    "generating {}-bit Paillier keys ({:?} variant)",
    bit_length, variant
  );

  let (p, q, n, phi) = sample_modulus(bit_length)?;
  let n_square = &n * &n;

  let (g, lambda, mu) = match variant {
    Variant::Simple => {
      // g = n + 1 gives g^m = 1 + m*n (mod n^2), so lambda = phi suffices.
      let g = &n + BigInt::one();
      let mu = mod_inv(&phi, &n).ok_or(Error::Bug("accepted modulus with non-invertible phi"))?;
      (g, phi, mu)
    }
    Variant::General => derive_generator(&n, &n_square, &p, &q, rng)?,
  };

  let public = Arc::new(PublicKey {
    n,
    n_square,
    g,
    bit_length,
  });
  let private = PrivateKey {
    lambda,
    mu,
    p,
    q,
    public_key: Arc::clone(&public),
  };

  Ok(Keypair::new(public, private))
}

/// Bounded prime-sampling loop. The product of two k-bit primes lands on
/// either 2k or 2k-1 bits; only an exact match is accepted, together with
/// `p != q` and `gcd(n, phi) == 1` so the trapdoor inverse exists.
fn sample_modulus(bit_length: usize) -> Result<(BigInt, BigInt, BigInt, BigInt)> {
  let prime_bits = bit_length / 2;
  for _ in 0..MAX_MODULUS_ATTEMPTS {
    let (p, q) = match (gen_prime(prime_bits), gen_prime(prime_bits)) {
      (Some(p), Some(q)) => (p, q),
      _ => continue,
    };
    if p == q {
      continue;
    }
    let n = &p * &q;
    if n.bits() != bit_length {
      continue;
    }
    let phi = (&p - BigInt::one()) * (&q - BigInt::one());
    if gcd(&n, &phi) != BigInt::one() {
      continue;
    }
    return Ok((p, q, n, phi));
  }
  Err(Error::GenerationTimeout {
    attempts: MAX_MODULUS_ATTEMPTS,
  })
}

/// Bounded search for a usable generator. A candidate's order is a multiple
/// of `n` with overwhelming probability but is not verified directly;
/// instead a candidate is rejected whenever the decryption constant it
/// induces does not exist.
fn derive_generator<R: Rng>(
  n: &BigInt,
  n_square: &BigInt,
  p: &BigInt,
  q: &BigInt,
  rng: &mut R,
) -> Result<(BigInt, BigInt, BigInt)> {
  let lambda = lcm(&(p - BigInt::one()), &(q - BigInt::one()));
  for _ in 0..MAX_GENERATOR_ATTEMPTS {
    let g = get_generator(n, n_square, rng);
    let u = power_mod(&g, &lambda, n_square);
    let l = match l_function(&u, n) {
      Some(l) => l,
      None => continue,
    };
    let mu = match mod_inv(&l, n) {
      Some(mu) => mu,
      None => continue,
    };
    return Ok((g, lambda, mu));
  }
  Err(Error::GenerationTimeout {
    attempts: MAX_GENERATOR_ATTEMPTS,
  })
}
