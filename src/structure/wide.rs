use std::{fmt::Debug, hash::Hash};

use super::words::Words;

const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// The 128-bit signed integer operations `Duration` is built on.
///
/// Implemented by the native `i128` and by the two-word `Words` kernel, so
/// the storage can be swapped without touching `Duration` itself.
pub(crate) trait Wide: Copy + Ord + Hash + Debug {
  const ZERO: Self;
  const MIN: Self;
  const MAX: Self;

  fn from_words(high: i64, low: u64) -> Self;
  fn from_i64(value: i64) -> Self;
  fn high(self) -> i64;
  fn low(self) -> u64;

  fn wrapping_add(self, rhs: Self) -> Self;
  fn wrapping_sub(self, rhs: Self) -> Self;
  fn wrapping_neg(self) -> Self;
  fn checked_add(self, rhs: Self) -> Option<Self>;
  fn checked_sub(self, rhs: Self) -> Option<Self>;

  fn shift_left(self, n: u32) -> Self;
  fn shift_right(self, n: u32) -> Self;

  fn overflowing_mul_i64(self, rhs: i64) -> (Self, bool);
  /// `rhs` must be nonzero.
  fn div_rem_i64(self, rhs: i64) -> (Self, Self);

  fn is_negative(self) -> bool {
    self.high() < 0
  }

  /// `high * 2^64 + low`, rounded to the nearest `f64`.
  fn to_f64(self) -> f64 {
    self.high() as f64 * TWO_POW_64 + self.low() as f64
  }
}

impl Wide for i128 {
  const ZERO: i128 = 0;
  const MIN: i128 = i128::MIN;
  const MAX: i128 = i128::MAX;

  fn from_words(high: i64, low: u64) -> i128 {
    (i128::from(high) << 64) | i128::from(low)
  }

  fn from_i64(value: i64) -> i128 {
    i128::from(value)
  }

  fn high(self) -> i64 {
    (self >> 64) as i64
  }

  fn low(self) -> u64 {
    self as u64
  }

  fn wrapping_add(self, rhs: i128) -> i128 {
    i128::wrapping_add(self, rhs)
  }

  fn wrapping_sub(self, rhs: i128) -> i128 {
    i128::wrapping_sub(self, rhs)
  }

  fn wrapping_neg(self) -> i128 {
    i128::wrapping_neg(self)
  }

  fn checked_add(self, rhs: i128) -> Option<i128> {
    i128::checked_add(self, rhs)
  }

  fn checked_sub(self, rhs: i128) -> Option<i128> {
    i128::checked_sub(self, rhs)
  }

  fn shift_left(self, n: u32) -> i128 {
    if n >= 128 {
      0
    } else {
      self << n
    }
  }

  fn shift_right(self, n: u32) -> i128 {
    self >> n.min(127)
  }

  fn overflowing_mul_i64(self, rhs: i64) -> (i128, bool) {
    i128::overflowing_mul(self, i128::from(rhs))
  }

  fn div_rem_i64(self, rhs: i64) -> (i128, i128) {
    let rhs = i128::from(rhs);
    (self.wrapping_div(rhs), self.wrapping_rem(rhs))
  }
}

impl Wide for Words {
  const ZERO: Words = Words::ZERO;
  const MIN: Words = Words::MIN;
  const MAX: Words = Words::MAX;

  fn from_words(high: i64, low: u64) -> Words {
    Words::new(high, low)
  }

  fn from_i64(value: i64) -> Words {
    Words::from_i64(value)
  }

  fn high(self) -> i64 {
    Words::high(self)
  }

  fn low(self) -> u64 {
    Words::low(self)
  }

  fn wrapping_add(self, rhs: Words) -> Words {
    Words::wrapping_add(self, rhs)
  }

  fn wrapping_sub(self, rhs: Words) -> Words {
    Words::wrapping_sub(self, rhs)
  }

  fn wrapping_neg(self) -> Words {
    Words::wrapping_neg(self)
  }

  fn checked_add(self, rhs: Words) -> Option<Words> {
    Words::checked_add(self, rhs)
  }

  fn checked_sub(self, rhs: Words) -> Option<Words> {
    Words::checked_sub(self, rhs)
  }

  fn shift_left(self, n: u32) -> Words {
    Words::shift_left(self, n)
  }

  fn shift_right(self, n: u32) -> Words {
    Words::shift_right(self, n)
  }

  fn overflowing_mul_i64(self, rhs: i64) -> (Words, bool) {
    Words::overflowing_mul_i64(self, rhs)
  }

  fn div_rem_i64(self, rhs: i64) -> (Words, Words) {
    Words::div_rem_i64(self, rhs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn native_words_round_trip() {
    for &value in [0i128, 1, -1, i128::MIN, i128::MAX, 1 << 64, -(1 << 64) + 7].iter() {
      assert_eq!(i128::from_words(value.high(), value.low()), value);
      let words = Words::from_words(value.high(), value.low());
      assert_eq!(Wide::high(words), value.high());
      assert_eq!(Wide::low(words), value.low());
    }
  }

  #[test]
  fn ratio_conversion_is_high_times_two_pow_64_plus_low() {
    assert_eq!(Wide::to_f64(1i128 << 64), TWO_POW_64);
    assert_eq!(Wide::to_f64(-(1i128 << 70)), -64.0 * TWO_POW_64);
    assert_eq!(Wide::to_f64(Words::new(-4, 0)), -4.0 * TWO_POW_64);
    assert_eq!(Wide::to_f64(Words::new(2, 5)), 2.0 * TWO_POW_64 + 5.0);
  }

  #[test]
  fn native_shifts_saturate_past_width() {
    assert_eq!(Wide::shift_left(1i128, 128), 0);
    assert_eq!(Wide::shift_right(-8i128, 300), -1);
    assert_eq!(Wide::shift_right(8i128, 300), 0);
  }

  fn check_same<W: Wide>(a: i128, b: i128) {
    let (wa, wb) = (
      W::from_words(a.high(), a.low()),
      W::from_words(b.high(), b.low()),
    );
    let words = |w: W| (w.high(), w.low());
    let native = |v: i128| (v.high(), v.low());
    assert_eq!(words(Wide::wrapping_add(wa, wb)), native(a.wrapping_add(b)));
    assert_eq!(words(Wide::wrapping_sub(wa, wb)), native(a.wrapping_sub(b)));
    assert_eq!(words(Wide::wrapping_neg(wa)), native(a.wrapping_neg()));
    assert_eq!(Wide::checked_add(wa, wb).map(words), a.checked_add(b).map(native));
    assert_eq!(Wide::checked_sub(wa, wb).map(words), a.checked_sub(b).map(native));
    assert_eq!(Wide::is_negative(wa), a < 0);
    assert_eq!(wa.cmp(&wb), a.cmp(&b));
    assert_eq!(words(W::ZERO), (0, 0));
    assert_eq!(words(W::MIN), native(i128::MIN));
    assert_eq!(words(W::MAX), native(i128::MAX));
  }

  #[test]
  fn both_storages_agree_through_trait() {
    let values = [0i128, 1, -1, i128::MIN, i128::MAX, 1 << 64, -(1 << 64) + 7];
    for &a in values.iter() {
      for &b in values.iter() {
        check_same::<i128>(a, b);
        check_same::<Words>(a, b);
      }
    }
  }
}
