use num::traits::{One, Zero};
use num::BigInt;
use rand::Rng;

pub(crate) fn lcm(a: &BigInt, b: &BigInt) -> BigInt {
  num::integer::lcm(a.clone(), b.clone())
}

pub(crate) fn gcd(a: &BigInt, b: &BigInt) -> BigInt {
  num::integer::gcd(a.clone(), b.clone())
}

/// Modular multiplicative inverse of `a` modulo `modulus`, or `None` when
/// `gcd(a, modulus) != 1` and no inverse exists.
pub(crate) fn mod_inv(a: &BigInt, modulus: &BigInt) -> Option<BigInt> {
  if gcd(a, modulus) != BigInt::one() {
    return None;
  }

  // Extended Euclid; the first Bezout coefficient is the inverse.
  let mut mn = (modulus.clone(), a.modulo(modulus));
  let mut xy = (BigInt::zero(), BigInt::one());
  while mn.1 != BigInt::zero() {
    let b = (&mn.0).modulo(&mn.1);
    xy = (xy.1.clone(), xy.0 - (&mn.0 / &mn.1) * xy.1);
    mn = (mn.1, b);
  }
  Some(xy.0.modulo(modulus))
}

pub(crate) fn power_mod(a: &BigInt, exponent: &BigInt, modulus: &BigInt) -> BigInt {
  a.modpow(exponent, modulus)
}

/// Paillier's `L` function, `(a - 1) / n`. The division must be exact;
/// returns `None` when `n` does not divide `a - 1`.
pub(crate) fn l_function(a: &BigInt, n: &BigInt) -> Option<BigInt> {
  let (quotient, remainder) = num::Integer::div_rem(&(a - BigInt::one()), n);
  if remainder.is_zero() {
    Some(quotient)
  } else {
    None
  }
}

/// Draws a generator candidate for `Z*_{n^2}` as
/// `(alpha*n + 1) * beta^n mod n^2` with `alpha`, `beta` uniform in `[0, n)`.
///
/// The order of the result is a multiple of `n` with overwhelming
/// probability, but this is not verified here; callers must check that the
/// candidate actually supports decryption and redraw when it does not.
pub(crate) fn get_generator<R: Rng>(n: &BigInt, n_square: &BigInt, rng: &mut R) -> BigInt {
  use num::bigint::RandBigInt;

  let alpha = rng.gen_bigint_range(&BigInt::zero(), n);
  let beta = rng.gen_bigint_range(&BigInt::zero(), n);
  ((alpha * n + BigInt::one()) * power_mod(&beta, n, n_square)).modulo(n_square)
}

pub(crate) fn gen_prime(bits: usize) -> Option<BigInt> {
  glass_pumpkin::prime::new(bits)
    .ok()
    .map(|big| BigInt::from_biguint(num::bigint::Sign::Plus, big))
}

pub trait Modulo<RHS = Self> {
  type Output;
  fn modulo(&self, rhs: &RHS) -> Self::Output;
}

impl Modulo<BigInt> for BigInt {
  type Output = BigInt;
  fn modulo(&self, rhs: &BigInt) -> Self::Output {
    use num::traits::sign::Signed;
    let r = self % rhs;
    if r < BigInt::zero() {
      r + rhs.abs()
    } else {
      r
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use num::traits::FromPrimitive;
  use rand::{SeedableRng, StdRng};

  #[test]
  fn l_function_divides_exactly() {
    let a = BigInt::from_u64(22).unwrap();
    let n = BigInt::from_u64(7).unwrap();
    assert_eq!(l_function(&a, &n), Some(BigInt::from_u64(3).unwrap()));
  }

  #[test]
  fn l_function_detects_non_exact_division() {
    let a = BigInt::from_u64(22).unwrap();
    let n = BigInt::from_u64(5).unwrap();
    assert_eq!(l_function(&a, &n), None);
  }

  #[test]
  fn mod_inv_of_coprime_values() {
    let a = BigInt::from_u64(3).unwrap();
    let m = BigInt::from_u64(11).unwrap();
    let inv = mod_inv(&a, &m).unwrap();
    assert_eq!((a * inv).modulo(&m), BigInt::one());
  }

  #[test]
  fn mod_inv_missing_when_not_coprime() {
    let a = BigInt::from_u64(6).unwrap();
    let m = BigInt::from_u64(9).unwrap();
    assert_eq!(mod_inv(&a, &m), None);
  }

  #[test]
  fn modulo_is_never_negative() {
    let a = BigInt::from_i64(-7).unwrap();
    let m = BigInt::from_u64(5).unwrap();
    assert_eq!(a.modulo(&m), BigInt::from_u64(3).unwrap());
  }

  #[test]
  fn lcm_of_coprimes_is_their_product() {
    let a = BigInt::from_u64(4).unwrap();
    let b = BigInt::from_u64(9).unwrap();
    assert_eq!(lcm(&a, &b), BigInt::from_u64(36).unwrap());
  }

  #[test]
  fn generator_candidates_lie_in_the_ciphertext_group() {
    let n = BigInt::from_u64(35).unwrap();
    let n_square = &n * &n;
    let mut rng = StdRng::from_seed([7u8; 32]);
    for _ in 0..20 {
      let g = get_generator(&n, &n_square, &mut rng);
      assert!(g >= BigInt::zero() && g < n_square);
    }
  }
}
