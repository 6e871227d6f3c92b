//! # Stride Search - Driver
//!
//! Runs a sector-based event search over a synthetic dataset and writes every
//! detected event to stdout as one JSON object per line. Logs go to stderr.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (created on first run)
//! stride_search
//!
//! # Specify custom configuration
//! stride_search --config storms.toml
//!
//! # Override specific settings
//! stride_search --sector-radius 750 --timesteps 8 --log-level debug
//!
//! # JSON logging, single-threaded evaluation
//! stride_search --json-logs --sequential
//! ```
//!
//! ## Configuration
//!
//! The driver loads configuration from a TOML file (default:
//! `stride_search.toml`). If the file doesn't exist, a default configuration
//! will be created.

pub mod app;
pub mod cli;
pub mod config;
pub mod criteria;
pub mod error;
pub mod logging;
pub mod source;

use tracing::error;

pub use app::{Application, RunSummary};
pub use cli::CliArgs;
pub use config::{AnomalySettings, AppConfig, DatasetSettings, FieldSettings, LoggingSettings};
pub use criteria::{build_criteria, CriterionSettings, MaxThreshold, MinThreshold};
pub use error::{DriverError, Result};
pub use source::AnalyticSource;

/// Main entry point for the stride search driver.
///
/// Handles the complete run:
/// 1. Command-line argument parsing
/// 2. Configuration loading for the logging settings
/// 3. Logging system initialization
/// 4. Application creation and execution
pub fn init() -> Result<RunSummary> {
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let mut logging = AppConfig::load_from_file(&args.config_path)
        .map(|config| config.logging)
        .unwrap_or_default();
    if let Some(level) = &args.log_level {
        logging.level = level.clone();
    }
    logging::setup_logging(&logging, args.json_logs)?;

    let app = Application::new(args).inspect_err(|e| error!("Failed to start application: {e}"))?;
    app.run().inspect_err(|e| error!("Application error: {e}"))
}
