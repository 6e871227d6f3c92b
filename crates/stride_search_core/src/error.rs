//! Error types for the stride search core.
//!
//! Every fallible operation in this crate returns [`StrideError`]. Empty query
//! results are never errors; an empty match set is a valid outcome.

/// Enumeration of the failures the core can report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StrideError {
    /// Geographic input outside the valid domain (latitude beyond the poles,
    /// or a non-finite coordinate). Never silently clamped.
    #[error("Invalid geographic coordinate: lat = {lat}, lon = {lon}")]
    Domain { lat: f64, lon: f64 },

    /// A spatial index was requested over zero points.
    #[error("Cannot build a spatial index over an empty dataset")]
    EmptyDataset,

    /// A sector was evaluated with a criteria list that does not match the
    /// workspace it allocated. This is a caller bug: the criteria list changed
    /// without calling `alloc_workspace` again.
    #[error("Criterion workspace mismatch: {reason} (workspace has {expected} slots, criteria list has {found})")]
    CriterionWorkspaceMismatch {
        expected: usize,
        found: usize,
        reason: String,
    },

    /// Latitude/longitude arrays handed over by a data source have a shape the
    /// arena cannot use.
    #[error("Invalid grid shape: {0}")]
    GridShape(String),

    /// Invalid search configuration.
    #[error("Invalid search configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StrideError>;
