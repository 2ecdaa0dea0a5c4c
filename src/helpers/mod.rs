//! Presentation helpers
//!
//! Small pure functions that turn post data into display values:
//! localized dates and estimated reading time.

mod date;
mod readtime;

pub use date::*;
pub use readtime::*;
