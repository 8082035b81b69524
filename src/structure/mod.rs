pub(crate) mod duration;
mod wide;

/// The two-word 128-bit kernel, usable on its own.
pub mod words;
