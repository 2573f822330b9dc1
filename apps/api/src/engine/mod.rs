//! The pure engine: normalization, validation, duplicate detection and edit
//! reconciliation. Nothing in here performs I/O.

pub mod dedup;
pub mod normalize;
pub mod reconcile;
pub mod validation;

pub use reconcile::{reconcile, EditedFields};
pub use validation::{ValidationConfig, ValidationReport};
