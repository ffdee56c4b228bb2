//! Boundary marshaling
//!
//! Adapters that move data across the host/native boundary:
//! - Option lists to null-terminated `char**` arrays
//! - Host closures to `GDALProgressFunc` trampolines
//! - Null and string checks shared by the safe wrappers
//!
//! # Safety
//!
//! All pointer juggling for these conversions is isolated here; callers only
//! see owned values and scoped closures.

pub mod options;
pub mod progress;
pub mod safety;

pub use options::{csl_to_vec, OptionArray, Options};
pub use progress::{with_progress, ProgressFn};
