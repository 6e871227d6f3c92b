//! Interface to the external data source.
//!
//! The core only consumes grid coordinates (through
//! [`crate::PointArena`]); field values are read by criteria through this
//! trait. Readers for concrete file formats live outside this crate.

use crate::types::DataHandle;

/// Field values addressable by data handle and time index.
pub trait FieldSource: Send + Sync {
    /// Name reported on events, usually the file or dataset name.
    fn name(&self) -> &str;

    /// Number of time steps available.
    fn time_steps(&self) -> usize;

    /// Value of `variable` at `handle` for `time_index`, or `None` when the
    /// variable, point, or time step does not exist.
    fn value(&self, variable: &str, handle: &DataHandle, time_index: usize) -> Option<f64>;
}
