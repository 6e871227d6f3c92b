//! Crate-level tests for the stride search core
//!
//! This module exercises the components together:
//! - Coordinate transform properties over random points
//! - Spatial index answers checked against brute-force scans
//! - The sector pipeline on small hand-checked grids
