//! Exact signed durations with attosecond resolution.
//!
//! [`Duration`] stores a span of time as a 128-bit two's-complement count of
//! attoseconds (10^-18 s). It decomposes into whole seconds plus an
//! attosecond remainder, converts to and from `std::time::Duration` and
//! `chrono::Duration`, and supports exact addition, subtraction, negation,
//! scaling by integers and truncating division.
//!
//! ```
//! use attoduration::Duration;
//!
//! let d = Duration::seconds(10) / 3;
//! assert_eq!(d.components(), (3, 333_333_333_333_333_333));
//! assert_eq!(Duration::milliseconds(1500), Duration::seconds(1) + Duration::milliseconds(500));
//! ```
//!
//! By default the value is a native `i128`. The `soft-i128` feature stores
//! it in the portable [`Words`](structure::words::Words) kernel instead,
//! which implements the same arithmetic on an `(i64, u64)` pair.
//!
//! [`Canceller`] is a small at-most-once cancellation flag, and
//! [`TaskCanceller`] cancels through a handler object that may arrive late.

#[macro_use]
mod result;
#[macro_use]
mod checked_impl;
#[macro_use]
mod serialization_test;

mod canceller;
pub mod structure;

pub use canceller::{Canceller, TaskCanceller};
pub use result::{Error, Result};
pub use structure::duration::{Duration, ATTOS_PER_SEC};
