//! Feature derivation for ski-slope condition models.
//!
//! Raw daily weather is corrected for elevation and folded, day by day, into
//! the eight model inputs of [`features::ModelInput`]. The carried state
//! (previous peak, cumulative heat, snow depth) is seeded from the archive
//! history and then threaded through the forecast horizon per course.

pub mod assembler;
pub mod cache;
pub mod elevation;
pub mod features;
pub mod recurrence;
