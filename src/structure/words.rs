use std::cmp::Ordering;

/// A signed 128-bit integer kept as a pair of machine words.
///
/// `high` carries the sign, `low` holds the least significant 64 bits, and
/// together they are read as one two's-complement number. This is the
/// portable arithmetic kernel behind `Duration`; with the `soft-i128`
/// feature it is also the storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Words {
  high: i64,
  low: u64,
}

const LIMB_MASK: u64 = 0xFFFF_FFFF;

impl Words {
  pub const ZERO: Words = Words { high: 0, low: 0 };
  pub const ONE: Words = Words { high: 0, low: 1 };
  pub const MIN: Words = Words {
    high: i64::MIN,
    low: 0,
  };
  pub const MAX: Words = Words {
    high: i64::MAX,
    low: u64::MAX,
  };

  pub const fn new(high: i64, low: u64) -> Words {
    Words { high, low }
  }

  /// Sign-extends a single word.
  pub const fn from_i64(value: i64) -> Words {
    Words {
      high: value >> 63,
      low: value as u64,
    }
  }

  pub const fn high(self) -> i64 {
    self.high
  }

  pub const fn low(self) -> u64 {
    self.low
  }

  pub const fn is_negative(self) -> bool {
    self.high < 0
  }

  pub fn wrapping_add(self, rhs: Words) -> Words {
    let (low, carry) = self.low.overflowing_add(rhs.low);
    Words {
      high: self
        .high
        .wrapping_add(rhs.high)
        .wrapping_add(i64::from(carry)),
      low,
    }
  }

  pub fn wrapping_sub(self, rhs: Words) -> Words {
    let (low, borrow) = self.low.overflowing_sub(rhs.low);
    Words {
      high: self
        .high
        .wrapping_sub(rhs.high)
        .wrapping_sub(i64::from(borrow)),
      low,
    }
  }

  pub fn wrapping_neg(self) -> Words {
    Words {
      high: !self.high,
      low: !self.low,
    }
    .wrapping_add(Words::ONE)
  }

  // MIN maps to itself, which is still the right bit pattern for the
  // magnitude 2^127 when read as unsigned.
  fn wrapping_abs(self) -> Words {
    if self.is_negative() {
      self.wrapping_neg()
    } else {
      self
    }
  }

  pub fn checked_add(self, rhs: Words) -> Option<Words> {
    let sum = self.wrapping_add(rhs);
    if self.is_negative() == rhs.is_negative() && sum.is_negative() != self.is_negative() {
      None
    } else {
      Some(sum)
    }
  }

  pub fn checked_sub(self, rhs: Words) -> Option<Words> {
    let difference = self.wrapping_sub(rhs);
    if self.is_negative() != rhs.is_negative() && difference.is_negative() != self.is_negative() {
      None
    } else {
      Some(difference)
    }
  }

  pub fn shift_left(self, n: u32) -> Words {
    match n {
      0 => self,
      1..=63 => Words {
        high: (self.high << n) | (self.low >> (64 - n)) as i64,
        low: self.low << n,
      },
      64..=127 => Words {
        high: (self.low << (n - 64)) as i64,
        low: 0,
      },
      _ => Words::ZERO,
    }
  }

  /// Arithmetic shift: vacated bits are filled with the sign.
  pub fn shift_right(self, n: u32) -> Words {
    match n {
      0 => self,
      1..=63 => Words {
        high: self.high >> n,
        low: (self.low >> n) | ((self.high as u64) << (64 - n)),
      },
      64..=127 => Words {
        high: self.high >> 63,
        low: (self.high >> (n - 64)) as u64,
      },
      _ => Words::from_i64(self.high >> 63),
    }
  }

  // Zero-filling shift, for magnitudes during division.
  fn shift_right_logical(self, n: u32) -> Words {
    let high = self.high as u64;
    match n {
      0 => self,
      1..=63 => Words {
        high: (high >> n) as i64,
        low: (self.low >> n) | (high << (64 - n)),
      },
      64..=127 => Words {
        high: 0,
        low: high >> (n - 64),
      },
      _ => Words::ZERO,
    }
  }

  fn cmp_unsigned(&self, other: &Words) -> Ordering {
    match (self.high as u64).cmp(&(other.high as u64)) {
      Ordering::Equal => self.low.cmp(&other.low),
      ordering => ordering,
    }
  }

  // 32-bit limbs of the raw bit pattern, least significant first.
  fn limbs(self) -> [u64; 4] {
    let high = self.high as u64;
    [
      self.low & LIMB_MASK,
      self.low >> 32,
      high & LIMB_MASK,
      high >> 32,
    ]
  }

  fn from_limbs(limbs: [u64; 4]) -> Words {
    Words {
      high: ((limbs[3] << 32) | limbs[2]) as i64,
      low: (limbs[1] << 32) | limbs[0],
    }
  }

  /// Multiplies by a signed word, returning the low 128 bits of the exact
  /// product and whether the exact product was outside the 128-bit range.
  ///
  /// The magnitudes are multiplied limb by limb (four 32-bit limbs times
  /// two), each partial product accumulated into the output limb with the
  /// carry moved one limb up. The sign is applied afterwards.
  pub fn overflowing_mul_i64(self, rhs: i64) -> (Words, bool) {
    let negative = self.is_negative() != (rhs < 0);
    let multiplicand = self.wrapping_abs().limbs();
    let multiplier = rhs.unsigned_abs();
    let multiplier = [multiplier & LIMB_MASK, multiplier >> 32];

    let mut product = [0u64; 6];
    for (i, &a) in multiplicand.iter().enumerate() {
      let mut carry = 0;
      for (j, &b) in multiplier.iter().enumerate() {
        // (2^32-1)^2 + 2 * (2^32-1) == 2^64 - 1, so this cannot wrap.
        let t = a * b + product[i + j] + carry;
        product[i + j] = t & LIMB_MASK;
        carry = t >> 32;
      }
      product[i + 2] = carry;
    }

    let magnitude = Words::from_limbs([product[0], product[1], product[2], product[3]]);
    let truncated = product[4] != 0 || product[5] != 0;
    // a magnitude of exactly 2^127 is representable only as a negative value
    let out_of_range = if negative {
      magnitude.cmp_unsigned(&Words::MIN) == Ordering::Greater
    } else {
      magnitude.is_negative()
    };
    let value = if negative {
      magnitude.wrapping_neg()
    } else {
      magnitude
    };
    (value, truncated || out_of_range)
  }

  /// Truncating division by a nonzero signed word.
  ///
  /// Restoring long division on the magnitudes, one quotient bit per
  /// position from 127 down to 0. The quotient is negated when the operand
  /// signs differ; the remainder takes the sign of the dividend.
  /// `MIN / -1` wraps to `MIN`.
  ///
  /// The caller must ensure `rhs != 0`.
  pub fn div_rem_i64(self, rhs: i64) -> (Words, Words) {
    debug_assert!(rhs != 0, "divide by zero");
    let divisor = Words {
      high: 0,
      low: rhs.unsigned_abs(),
    };
    let mut remainder = self.wrapping_abs();
    let mut quotient = Words::ZERO;
    for i in (0..128).rev() {
      quotient = quotient.shift_left(1);
      if remainder.shift_right_logical(i).cmp_unsigned(&divisor) != Ordering::Less {
        remainder = remainder.wrapping_sub(divisor.shift_left(i));
        quotient.low |= 1;
      }
    }
    if self.is_negative() != (rhs < 0) {
      quotient = quotient.wrapping_neg();
    }
    if self.is_negative() {
      remainder = remainder.wrapping_neg();
    }
    (quotient, remainder)
  }
}

impl PartialOrd for Words {
  fn partial_cmp(&self, other: &Words) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Words {
  fn cmp(&self, other: &Words) -> Ordering {
    match self.high.cmp(&other.high) {
      Ordering::Equal => self.low.cmp(&other.low),
      ordering => ordering,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::StdRng, Rng, SeedableRng};

  fn words(value: i128) -> Words {
    Words::new((value >> 64) as i64, value as u64)
  }

  fn native(value: Words) -> i128 {
    (i128::from(value.high()) << 64) | i128::from(value.low())
  }

  // Mixes small, word-boundary and full-width values.
  fn random_i128(rng: &mut StdRng) -> i128 {
    match rng.gen_range(0, 4) {
      0 => i128::from(rng.gen::<i32>()),
      1 => i128::from(rng.gen::<i64>()),
      2 => (i128::from(rng.gen::<i64>()) << 40) ^ i128::from(rng.gen::<u64>()),
      _ => rng.gen::<i128>(),
    }
  }

  #[test]
  fn from_i64_sign_extends() {
    assert_eq!(Words::from_i64(-1), Words::new(-1, u64::MAX));
    assert_eq!(Words::from_i64(5), Words::new(0, 5));
    assert_eq!(native(Words::from_i64(i64::MIN)), i128::from(i64::MIN));
  }

  #[test]
  fn add_carries_into_high_word() {
    let sum = Words::new(0, u64::MAX).wrapping_add(Words::ONE);
    assert_eq!(sum, Words::new(1, 0));
    let difference = Words::new(1, 0).wrapping_sub(Words::ONE);
    assert_eq!(difference, Words::new(0, u64::MAX));
    assert_eq!(Words::MAX.wrapping_add(Words::ONE), Words::MIN);
  }

  #[test]
  fn negation_is_complement_plus_one() {
    assert_eq!(Words::ONE.wrapping_neg(), Words::new(-1, u64::MAX));
    assert_eq!(Words::ZERO.wrapping_neg(), Words::ZERO);
    assert_eq!(Words::MIN.wrapping_neg(), Words::MIN);
    assert_eq!(Words::new(3, 0).wrapping_neg(), Words::new(-3, 0));
  }

  #[test]
  fn checked_add_sub_detect_overflow() {
    assert_eq!(Words::MAX.checked_add(Words::ONE), None);
    assert_eq!(Words::MIN.checked_sub(Words::ONE), None);
    assert_eq!(Words::MIN.checked_add(Words::MAX), Some(Words::from_i64(-1)));
    assert_eq!(Words::ZERO.checked_sub(Words::MIN), None);
  }

  #[test]
  fn ordering_uses_signed_high_then_unsigned_low() {
    assert!(Words::from_i64(-1) < Words::ZERO);
    assert!(Words::new(0, u64::MAX) < Words::new(1, 0));
    assert!(Words::MIN < Words::MAX);
    assert!(Words::new(-1, 0) < Words::new(-1, 1));
  }

  #[test]
  fn shifts_cross_word_boundary() {
    assert_eq!(Words::ONE.shift_left(64), Words::new(1, 0));
    assert_eq!(Words::ONE.shift_left(127), Words::MIN);
    assert_eq!(Words::ONE.shift_left(128), Words::ZERO);
    assert_eq!(Words::new(1, 0).shift_right(1), Words::new(0, 1 << 63));
    assert_eq!(Words::MIN.shift_right(127), Words::from_i64(-1));
    assert_eq!(Words::MIN.shift_right(200), Words::from_i64(-1));
    assert_eq!(Words::MAX.shift_right(200), Words::ZERO);
  }

  #[test]
  fn matches_native_arithmetic() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0001);
    for _ in 0..2000 {
      let a = random_i128(&mut rng);
      let b = random_i128(&mut rng);
      let n = rng.gen_range(0, 128);
      assert_eq!(native(words(a).wrapping_add(words(b))), a.wrapping_add(b));
      assert_eq!(native(words(a).wrapping_sub(words(b))), a.wrapping_sub(b));
      assert_eq!(native(words(a).wrapping_neg()), a.wrapping_neg());
      assert_eq!(words(a).cmp(&words(b)), a.cmp(&b));
      assert_eq!(native(words(a).shift_left(n)), a << n);
      assert_eq!(native(words(a).shift_right(n)), a >> n);
      assert_eq!(
        words(a).checked_add(words(b)).map(native),
        a.checked_add(b)
      );
      assert_eq!(
        words(a).checked_sub(words(b)).map(native),
        a.checked_sub(b)
      );
    }
  }

  #[test]
  fn multiply_matches_native() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0002);
    for _ in 0..2000 {
      let a = random_i128(&mut rng);
      let k: i64 = if rng.gen() {
        rng.gen()
      } else {
        i64::from(rng.gen::<i32>())
      };
      let (value, overflow) = words(a).overflowing_mul_i64(k);
      let expected = a.overflowing_mul(i128::from(k));
      assert_eq!((native(value), overflow), expected, "{} * {}", a, k);
    }
  }

  #[test]
  fn multiply_edges() {
    assert_eq!(Words::MIN.overflowing_mul_i64(1), (Words::MIN, false));
    assert_eq!(Words::MIN.overflowing_mul_i64(-1), (Words::MIN, true));
    assert!(!Words::MAX.overflowing_mul_i64(-1).1);
    assert!(Words::MAX.overflowing_mul_i64(2).1);
    let (value, overflow) = words(1 << 126).overflowing_mul_i64(-2);
    assert_eq!((native(value), overflow), (i128::MIN, false));
    assert_eq!(
      Words::from_i64(i64::MIN).overflowing_mul_i64(i64::MIN),
      (words(1 << 126), false)
    );
  }

  #[test]
  fn divide_matches_native() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0003);
    for _ in 0..500 {
      let a = random_i128(&mut rng);
      let mut k: i64 = if rng.gen() {
        rng.gen()
      } else {
        i64::from(rng.gen::<i16>())
      };
      if k == 0 {
        k = 7;
      }
      let (quotient, remainder) = words(a).div_rem_i64(k);
      assert_eq!(native(quotient), a / i128::from(k), "{} / {}", a, k);
      assert_eq!(native(remainder), a % i128::from(k), "{} % {}", a, k);
    }
  }

  #[test]
  fn divide_signs_truncate_toward_zero() {
    let cases: [(i128, i64, i128, i128); 5] = [
      (7, 2, 3, 1),
      (-7, 2, -3, -1),
      (7, -2, -3, 1),
      (-7, -2, 3, -1),
      (1, -3, 0, 1),
    ];
    for &(a, k, q, r) in cases.iter() {
      let (quotient, remainder) = words(a).div_rem_i64(k);
      assert_eq!((native(quotient), native(remainder)), (q, r));
    }
    assert_eq!(Words::MIN.div_rem_i64(-1), (Words::MIN, Words::ZERO));
    assert_eq!(Words::MIN.div_rem_i64(1), (Words::MIN, Words::ZERO));
  }
}
