use std::result;

/// This is a specialized Result, similar to std::io::Result
pub type Result<T> = result::Result<T, Error>;

/// Failures reported by the fallible (`try_*` and `TryFrom`) entry points.
///
/// The operator forms (`+`, `*`, `/`, ...) treat the same conditions as
/// programmer errors and panic instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
  /// The value does not fit the requested representation.
  #[error("out of range: {reason}")]
  OutOfRange { reason: String },

  /// Scalar division with a zero divisor.
  #[error("divide by zero")]
  DivideByZero,

  /// The exact result of an arithmetic operation exceeds 128 bits.
  #[error("arithmetic overflow: {reason}")]
  Overflow { reason: String },

  /// The operation observed a cancelled `Canceller`.
  #[error("operation was cancelled")]
  Cancelled,
}

impl Error {
  pub fn out_of_range<T>(reason: &str) -> Result<T> {
    Err(Error::OutOfRange {
      reason: reason.to_string(),
    })
  }

  pub fn overflow<T>(reason: &str) -> Result<T> {
    Err(Error::Overflow {
      reason: reason.to_string(),
    })
  }
}

/// Logs the message at error level, then panics with it.
///
/// Used where a violated precondition would otherwise produce a silently
/// wrong duration.
#[doc(hidden)]
#[macro_export]
macro_rules! log_and_panic {
  ($($arg:tt)*) => (
      { log::error!($($arg)*);
        panic!($($arg)*)
      }
    )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn helpers_build_errors() {
    let r: Result<()> = Error::out_of_range("seconds");
    assert_eq!(
      r,
      Err(Error::OutOfRange {
        reason: "seconds".to_string()
      })
    );
    let r: Result<()> = Error::overflow("mul");
    assert_eq!(r.unwrap_err().to_string(), "arithmetic overflow: mul");
    assert_eq!(Error::Cancelled.to_string(), "operation was cancelled");
  }
}
