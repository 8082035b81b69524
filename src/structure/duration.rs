use std::{
  cmp::Ordering,
  convert::TryFrom,
  iter::Sum,
  mem::size_of,
  ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Shl, Shr, Sub, SubAssign},
  time::Duration as StdDuration,
};

use log::trace;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use speedy::{Context, Readable, Reader, Writable, Writer};
use static_assertions::const_assert;

#[cfg(feature = "soft-i128")]
use super::words::Words;
use super::wide::Wide;
use crate::result::{Error, Result};

#[cfg(not(feature = "soft-i128"))]
type Repr = i128;
#[cfg(feature = "soft-i128")]
type Repr = Words;

pub const ATTOS_PER_SEC: i64 = 1_000_000_000_000_000_000;
const ATTOS_PER_MILLI: i64 = 1_000_000_000_000_000;
const ATTOS_PER_MICRO: i64 = 1_000_000_000_000;
const ATTOS_PER_NANO: i64 = 1_000_000_000;
const NANOS_PER_SEC: i64 = 1_000_000_000;

// One second must fit a single 64-bit word with room for the sign.
const_assert!(ATTOS_PER_SEC < 1 << 62);
const_assert!(ATTOS_PER_MILLI * 1_000 == ATTOS_PER_SEC);
const_assert!(ATTOS_PER_MICRO * 1_000 == ATTOS_PER_MILLI);
const_assert!(ATTOS_PER_NANO * NANOS_PER_SEC == ATTOS_PER_SEC);

/// A signed span of time with attosecond (10^-18 s) resolution.
///
/// The value is a 128-bit two's-complement count of attoseconds, so it
/// covers roughly ±1.7 * 10^20 seconds exactly. There is no separate sign:
/// a negative duration is simply a negative count.
///
/// Arithmetic is exact. Conditions that would make a result wrong rather
/// than merely large (division by zero, a product beyond 128 bits, seconds
/// that do not fit `i64` when decomposing) panic; every such operation has a
/// `checked_*` or `try_*` twin. Addition and subtraction wrap at the 128-bit
/// boundary, use `checked_add`/`checked_sub` to detect that.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "DurationWords", into = "DurationWords")]
pub struct Duration {
  value: Repr,
}

impl Duration {
  pub const ZERO: Duration = Duration { value: <Repr as Wide>::ZERO };
  pub const MIN: Duration = Duration { value: <Repr as Wide>::MIN };
  pub const MAX: Duration = Duration { value: <Repr as Wide>::MAX };

  /// Builds the duration `seconds + attoseconds * 10^-18`.
  ///
  /// `attoseconds` does not need to be normalized: it may exceed one second
  /// and its sign may differ from the sign of `seconds`.
  ///
  /// ```
  /// # use attoduration::Duration;
  /// let d = Duration::from_components(3, -123_000_000_000_000_000);
  /// assert_eq!(d.components(), (2, 877_000_000_000_000_000));
  /// ```
  pub fn from_components(seconds: i64, attoseconds: i64) -> Duration {
    // |i64| * 10^18 < 2^123, the product always fits.
    let (whole, _) =
      Wide::overflowing_mul_i64(<Repr as Wide>::from_i64(seconds), ATTOS_PER_SEC);
    Duration {
      value: Wide::wrapping_add(whole, <Repr as Wide>::from_i64(attoseconds)),
    }
  }

  /// Reinterprets a two's-complement word pair as an attosecond count.
  pub fn from_words(high: i64, low: u64) -> Duration {
    Duration {
      value: <Repr as Wide>::from_words(high, low),
    }
  }

  /// The most significant word of the attosecond count. Carries the sign.
  pub fn high(self) -> i64 {
    Wide::high(self.value)
  }

  /// The least significant word of the attosecond count.
  pub fn low(self) -> u64 {
    Wide::low(self.value)
  }

  /// Splits into whole seconds and the attosecond remainder.
  ///
  /// The remainder is below one second in magnitude and has the sign of the
  /// duration, so `Duration::from_components(s, a)` rebuilds the value.
  ///
  /// # Panics
  ///
  /// If the whole seconds do not fit in an `i64`. See
  /// [`try_components`](Duration::try_components).
  pub fn components(self) -> (i64, i64) {
    self
      .try_components()
      .unwrap_or_else(|e| log_and_panic!("Duration::components: {}", e))
  }

  pub fn try_components(self) -> Result<(i64, i64)> {
    let (seconds, attoseconds) = Wide::div_rem_i64(self.value, ATTOS_PER_SEC);
    if Wide::high(seconds) != (Wide::low(seconds) as i64) >> 63 {
      return Error::out_of_range("whole seconds do not fit in i64");
    }
    Ok((Wide::low(seconds) as i64, Wide::low(attoseconds) as i64))
  }

  pub fn whole_seconds(self) -> i64 {
    self.components().0
  }

  pub fn subsec_attoseconds(self) -> i64 {
    self.components().1
  }

  /// Approximate value in seconds.
  pub fn as_secs_f64(self) -> f64 {
    match self.try_components() {
      Ok((seconds, attoseconds)) => seconds as f64 + attoseconds as f64 / ATTOS_PER_SEC as f64,
      Err(_) => Wide::to_f64(self.value) / ATTOS_PER_SEC as f64,
    }
  }

  pub fn is_zero(self) -> bool {
    self.value == <Repr as Wide>::ZERO
  }

  pub fn is_negative(self) -> bool {
    Wide::is_negative(self.value)
  }

  pub fn is_positive(self) -> bool {
    self.value > <Repr as Wide>::ZERO
  }

  /// -1, 0 or 1.
  pub fn signum(self) -> i64 {
    match self.value.cmp(&<Repr as Wide>::ZERO) {
      Ordering::Less => -1,
      Ordering::Equal => 0,
      Ordering::Greater => 1,
    }
  }

  /// Absolute value. `Duration::MIN.abs()` wraps to `Duration::MIN`.
  pub fn abs(self) -> Duration {
    if self.is_negative() {
      -self
    } else {
      self
    }
  }

  pub fn checked_add(self, rhs: Duration) -> Option<Duration> {
    Wide::checked_add(self.value, rhs.value).map(|value| Duration { value })
  }

  pub fn checked_sub(self, rhs: Duration) -> Option<Duration> {
    Wide::checked_sub(self.value, rhs.value).map(|value| Duration { value })
  }

  pub fn checked_neg(self) -> Option<Duration> {
    Duration::ZERO.checked_sub(self)
  }

  /// Multiplication that reports a product outside the 128-bit range as
  /// `None` instead of panicking.
  pub fn checked_mul(self, rhs: i64) -> Option<Duration> {
    match Wide::overflowing_mul_i64(self.value, rhs) {
      (value, false) => Some(Duration { value }),
      (_, true) => None,
    }
  }

  pub fn try_mul(self, rhs: i64) -> Result<Duration> {
    self
      .checked_mul(rhs)
      .map_or_else(|| Error::overflow("duration product exceeds 128 bits"), Ok)
  }

  /// Truncating division, `None` for a zero divisor.
  pub fn checked_div(self, rhs: i64) -> Option<Duration> {
    if rhs == 0 {
      None
    } else {
      Some(self.div_rem(rhs).0)
    }
  }

  pub fn try_div(self, rhs: i64) -> Result<Duration> {
    self.checked_div(rhs).ok_or(Error::DivideByZero)
  }

  /// Quotient and remainder of a truncating division.
  ///
  /// The quotient rounds toward zero and the remainder has the sign of
  /// `self`, so `quotient * rhs + remainder == self`.
  ///
  /// # Panics
  ///
  /// If `rhs` is zero.
  pub fn div_rem(self, rhs: i64) -> (Duration, Duration) {
    if rhs == 0 {
      log_and_panic!("Duration::div_rem: divide by zero");
    }
    let (quotient, remainder) = Wide::div_rem_i64(self.value, rhs);
    (
      Duration { value: quotient },
      Duration { value: remainder },
    )
  }

  /// Ratio of two durations as an `f64`.
  ///
  /// Each operand is converted with `high * 2^64 + low` before dividing, so
  /// this is an approximation meant for percentages and rough comparisons.
  /// Precision is lost for large magnitudes and for tiny negative ones.
  pub fn ratio(self, rhs: Duration) -> f64 {
    Wide::to_f64(self.value) / Wide::to_f64(rhs.value)
  }

  pub fn seconds(seconds: i64) -> Duration {
    Duration::from_components(seconds, 0)
  }

  pub fn milliseconds(milliseconds: i64) -> Duration {
    Duration::from_unit(milliseconds, 1_000, ATTOS_PER_MILLI)
  }

  pub fn microseconds(microseconds: i64) -> Duration {
    Duration::from_unit(microseconds, 1_000_000, ATTOS_PER_MICRO)
  }

  pub fn nanoseconds(nanoseconds: i64) -> Duration {
    Duration::from_unit(nanoseconds, NANOS_PER_SEC, ATTOS_PER_NANO)
  }

  /// # Panics
  ///
  /// If the result does not fit, which takes over 2 * 10^18 minutes.
  pub fn minutes(minutes: i64) -> Duration {
    Duration::seconds(minutes) * 60
  }

  pub fn hours(hours: i64) -> Duration {
    Duration::minutes(hours) * 60
  }

  pub fn days(days: i64) -> Duration {
    Duration::hours(days) * 24
  }

  pub fn weeks(weeks: i64) -> Duration {
    Duration::days(weeks) * 7
  }

  /// Exact for the given `f64`: the result is its value in attoseconds,
  /// truncated toward zero.
  ///
  /// # Panics
  ///
  /// If `seconds` is not finite or its integral part does not fit in
  /// an `i64`.
  pub fn seconds_f64(seconds: f64) -> Duration {
    Duration::from_f64_unit(seconds, 1.0, ATTOS_PER_SEC)
  }

  pub fn milliseconds_f64(milliseconds: f64) -> Duration {
    Duration::from_f64_unit(milliseconds, 1e3, ATTOS_PER_MILLI)
  }

  pub fn microseconds_f64(microseconds: f64) -> Duration {
    Duration::from_f64_unit(microseconds, 1e6, ATTOS_PER_MICRO)
  }

  pub fn minutes_f64(minutes: f64) -> Duration {
    Duration::seconds_f64(minutes * 60.0)
  }

  pub fn hours_f64(hours: f64) -> Duration {
    Duration::minutes_f64(hours * 60.0)
  }

  pub fn days_f64(days: f64) -> Duration {
    Duration::hours_f64(days * 24.0)
  }

  pub fn weeks_f64(weeks: f64) -> Duration {
    Duration::days_f64(weeks * 7.0)
  }

  fn from_unit(count: i64, per_second: i64, attos_per_unit: i64) -> Duration {
    Duration::from_components(count / per_second, (count % per_second) * attos_per_unit)
  }

  // `count` is exactly mantissa * 2^exponent, so the attosecond count is
  // built in 128-bit arithmetic and truncated toward zero only once.
  fn from_f64_unit(count: f64, per_second: f64, attos_per_unit: i64) -> Duration {
    // 2^63 is exact in f64
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if !count.is_finite() {
      log_and_panic!("Duration: cannot build from non-finite value {}", count);
    }
    let seconds = (count / per_second).trunc();
    if seconds >= LIMIT || seconds < -LIMIT {
      log_and_panic!("Duration: {} seconds do not fit in i64", seconds);
    }
    let (mantissa, exponent, sign) = num_traits::Float::integer_decode(count);
    trace!(
      "from_f64_unit: {} = {} * 2^{} units of {} as",
      count,
      mantissa,
      exponent,
      attos_per_unit
    );
    // mantissa < 2^53 and attos_per_unit < 2^60
    let magnitude = Duration::from_words(0, mantissa) * attos_per_unit;
    // |result| < 2^63 seconds < 2^123 attoseconds, so no bits leave on the left
    let magnitude = if exponent >= 0 {
      magnitude << exponent as u32
    } else {
      magnitude >> u32::from(exponent.unsigned_abs())
    };
    if sign < 0 {
      -magnitude
    } else {
      magnitude
    }
  }

}

impl Default for Duration {
  fn default() -> Duration {
    Duration::ZERO
  }
}

impl Add for Duration {
  type Output = Duration;

  fn add(self, rhs: Duration) -> Duration {
    Duration {
      value: Wide::wrapping_add(self.value, rhs.value),
    }
  }
}

impl Sub for Duration {
  type Output = Duration;

  fn sub(self, rhs: Duration) -> Duration {
    Duration {
      value: Wide::wrapping_sub(self.value, rhs.value),
    }
  }
}

impl Neg for Duration {
  type Output = Duration;

  fn neg(self) -> Duration {
    Duration {
      value: Wide::wrapping_neg(self.value),
    }
  }
}

impl AddAssign for Duration {
  fn add_assign(&mut self, rhs: Duration) {
    *self = *self + rhs;
  }
}

impl SubAssign for Duration {
  fn sub_assign(&mut self, rhs: Duration) {
    *self = *self - rhs;
  }
}

impl Mul<i64> for Duration {
  type Output = Duration;

  /// # Panics
  ///
  /// If the product does not fit in 128 bits.
  fn mul(self, rhs: i64) -> Duration {
    match self.checked_mul(rhs) {
      Some(product) => product,
      None => log_and_panic!("Duration: {:?} * {} overflows 128 bits", self, rhs),
    }
  }
}

impl Mul<Duration> for i64 {
  type Output = Duration;

  fn mul(self, rhs: Duration) -> Duration {
    rhs * self
  }
}

impl MulAssign<i64> for Duration {
  fn mul_assign(&mut self, rhs: i64) {
    *self = *self * rhs;
  }
}

impl Div<i64> for Duration {
  type Output = Duration;

  /// Truncating division.
  ///
  /// # Panics
  ///
  /// If `rhs` is zero.
  fn div(self, rhs: i64) -> Duration {
    self.div_rem(rhs).0
  }
}

impl DivAssign<i64> for Duration {
  fn div_assign(&mut self, rhs: i64) {
    *self = *self / rhs;
  }
}

impl Div for Duration {
  type Output = f64;

  /// See [`Duration::ratio`].
  fn div(self, rhs: Duration) -> f64 {
    self.ratio(rhs)
  }
}

impl Shl<u32> for Duration {
  type Output = Duration;

  fn shl(self, n: u32) -> Duration {
    Duration {
      value: Wide::shift_left(self.value, n),
    }
  }
}

/// Arithmetic shift, the sign is kept.
impl Shr<u32> for Duration {
  type Output = Duration;

  fn shr(self, n: u32) -> Duration {
    Duration {
      value: Wide::shift_right(self.value, n),
    }
  }
}

impl Sum for Duration {
  fn sum<I: Iterator<Item = Duration>>(iter: I) -> Duration {
    iter.fold(Duration::ZERO, Add::add)
  }
}

impl<'a> Sum<&'a Duration> for Duration {
  fn sum<I: Iterator<Item = &'a Duration>>(iter: I) -> Duration {
    iter.copied().sum()
  }
}

impl Zero for Duration {
  fn zero() -> Duration {
    Duration::ZERO
  }

  fn is_zero(&self) -> bool {
    Duration::is_zero(*self)
  }
}

mod duration_checked {
  use super::Duration;
  checked_impl!(CheckedAdd, checked_add, Duration);
  checked_impl!(CheckedSub, checked_sub, Duration);
  checked_impl!(unary CheckedNeg, checked_neg, Duration);
}

// Conversions to and from other duration types

impl From<StdDuration> for Duration {
  /// Exact: every `std::time::Duration` fits.
  fn from(duration: StdDuration) -> Duration {
    let seconds = <Repr as Wide>::from_words(0, duration.as_secs());
    let (whole, _) = Wide::overflowing_mul_i64(seconds, ATTOS_PER_SEC);
    let fraction =
      <Repr as Wide>::from_i64(i64::from(duration.subsec_nanos()) * ATTOS_PER_NANO);
    Duration {
      value: Wide::wrapping_add(whole, fraction),
    }
  }
}

impl TryFrom<Duration> for StdDuration {
  type Error = Error;

  /// Fails for negative durations. Precision below one nanosecond is
  /// truncated.
  fn try_from(duration: Duration) -> Result<StdDuration> {
    if duration.is_negative() {
      return Error::out_of_range("std::time::Duration cannot be negative");
    }
    let (seconds, attoseconds) = Wide::div_rem_i64(duration.value, ATTOS_PER_SEC);
    if Wide::high(seconds) != 0 {
      return Error::out_of_range("whole seconds do not fit in u64");
    }
    Ok(StdDuration::new(
      Wide::low(seconds),
      (Wide::low(attoseconds) / ATTOS_PER_NANO as u64) as u32,
    ))
  }
}

impl From<chrono::Duration> for Duration {
  fn from(duration: chrono::Duration) -> Duration {
    // subsec_nanos carries the sign of the whole duration
    Duration::from_components(
      duration.num_seconds(),
      i64::from(duration.subsec_nanos()) * ATTOS_PER_NANO,
    )
  }
}

impl TryFrom<Duration> for chrono::Duration {
  type Error = Error;

  /// Precision below one nanosecond is truncated toward zero.
  fn try_from(duration: Duration) -> Result<chrono::Duration> {
    let (seconds, attoseconds) = duration.try_components()?;
    let nanos = attoseconds / ATTOS_PER_NANO;
    // chrono wants a non-negative nanosecond part
    let (seconds, nanos) = if nanos < 0 {
      match seconds.checked_sub(1) {
        Some(seconds) => (seconds, nanos + NANOS_PER_SEC),
        None => return Error::out_of_range("outside the chrono::Duration range"),
      }
    } else {
      (seconds, nanos)
    };
    chrono::Duration::new(seconds, nanos as u32).map_or_else(
      || Error::out_of_range("outside the chrono::Duration range"),
      Ok,
    )
  }
}

impl PartialEq<StdDuration> for Duration {
  fn eq(&self, other: &StdDuration) -> bool {
    *self == Duration::from(*other)
  }
}

impl PartialEq<Duration> for StdDuration {
  fn eq(&self, other: &Duration) -> bool {
    Duration::from(*self) == *other
  }
}

impl PartialOrd<StdDuration> for Duration {
  fn partial_cmp(&self, other: &StdDuration) -> Option<Ordering> {
    Some(self.cmp(&Duration::from(*other)))
  }
}

impl PartialOrd<Duration> for StdDuration {
  fn partial_cmp(&self, other: &Duration) -> Option<Ordering> {
    Some(Duration::from(*self).cmp(other))
  }
}

// Serialization
//
// Both speedy and serde see the attosecond count as two words, high word
// first. With speedy each word follows the context endianness, e.g.
// Duration::from_words(0, 1) in big endian is
// 00 00 00 00 00 00 00 00 00 00 00 00 00 00 00 01

#[derive(Serialize, Deserialize)]
struct DurationWords {
  high: i64,
  low: u64,
}

impl From<DurationWords> for Duration {
  fn from(words: DurationWords) -> Duration {
    Duration::from_words(words.high, words.low)
  }
}

impl From<Duration> for DurationWords {
  fn from(duration: Duration) -> DurationWords {
    DurationWords {
      high: duration.high(),
      low: duration.low(),
    }
  }
}

impl<'a, C: Context> Readable<'a, C> for Duration {
  #[inline]
  fn read_from<R: Reader<'a, C>>(reader: &mut R) -> std::result::Result<Self, C::Error> {
    let high: i64 = reader.read_value()?;
    let low: u64 = reader.read_value()?;
    Ok(Duration::from_words(high, low))
  }

  #[inline]
  fn minimum_bytes_needed() -> usize {
    size_of::<i64>() + size_of::<u64>()
  }
}

impl<C: Context> Writable<C> for Duration {
  #[inline]
  fn write_to<T: ?Sized + Writer<C>>(&self, writer: &mut T) -> std::result::Result<(), C::Error> {
    writer.write_i64(self.high())?;
    writer.write_u64(self.low())?;
    Ok(())
  }
}
