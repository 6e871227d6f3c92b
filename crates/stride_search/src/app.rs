//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that wires a data source,
//! the spatial index, the sector list and the criteria together and runs the
//! search over every time step.

use crate::cli::CliArgs;
use crate::config::AppConfig;
use crate::criteria::build_criteria;
use crate::error::{DriverError, Result};
use crate::logging::display_banner;
use crate::source::AnalyticSource;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use stride_search_core::{sort_events, CriteriaList, FieldSource, SectorList, StrideError};
use tracing::{debug, info, warn};

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Time steps evaluated
    pub timesteps_searched: usize,
    /// Time steps skipped because the source had no points
    pub timesteps_skipped: usize,
    /// Events written
    pub events: usize,
}

/// A configured search, ready to run.
///
/// Owns the data source, the criteria built against it, and the sector list
/// tiling the configured region.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Number of time steps to search
    timesteps: usize,
    source: Arc<AnalyticSource>,
    criteria: CriteriaList,
    sectors: SectorList,
}

impl Application {
    /// Creates an application from command-line arguments.
    ///
    /// Loads the configuration file (creating a default one if missing),
    /// applies the command-line overrides, and validates the result.
    pub fn new(args: CliArgs) -> Result<Self> {
        info!("Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path)?;

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }
        if let Some(radius) = args.sector_radius_km {
            config.search.sector_radius_km = radius;
        }
        if let Some(timesteps) = args.timesteps {
            config.dataset.timesteps = timesteps;
        }
        if args.sequential {
            config.search.parallel = false;
        }

        display_banner();
        Self::from_config(config)
    }

    /// Creates an application from an already merged configuration.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        config.validate().map_err(DriverError::InvalidConfig)?;
        info!("Configuration loaded and validated successfully");

        let source = Arc::new(AnalyticSource::new(&config.dataset)?);
        let criteria = build_criteria(&config.criteria, source.clone());

        let search = &config.search;
        let mut sectors = SectorList::strided(
            &search.region,
            search.sector_radius_km,
            search.sphere_radius_km,
            criteria.len(),
        )?;
        sectors.alloc_workspaces(&criteria);

        Ok(Self {
            timesteps: source.time_steps(),
            config,
            source,
            criteria,
            sectors,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    /// Runs the search, writing events to stdout.
    pub fn run(self) -> Result<RunSummary> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_with_writer(&mut out)
    }

    /// Runs the search, writing one JSON object per event and line to `out`.
    ///
    /// Within a time step events are written in (sector center, criterion)
    /// order. A time step without data is logged and skipped.
    pub fn run_with_writer<W: Write>(mut self, out: &mut W) -> Result<RunSummary> {
        self.log_configuration_summary();
        let mut summary = RunSummary::default();

        for time_index in 0..self.timesteps {
            let Some(timestamp) = self.source.timestamp(time_index) else {
                warn!(time_index, "Time step is outside the calendar, stopping");
                break;
            };

            let arena = self.source.arena(time_index);
            let index = match arena.build_index(
                self.config.search.metric,
                self.config.search.sphere_radius_km,
            ) {
                Ok(index) => index,
                Err(StrideError::EmptyDataset) => {
                    warn!(time_index, %timestamp, "No data points, skipping time step");
                    summary.timesteps_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            self.sectors.link_to_data(&index, &arena);
            let mut events = self.sectors.evaluate_at_timestep(
                &self.criteria,
                timestamp,
                self.source.name(),
                time_index,
                self.config.search.parallel,
            )?;
            sort_events(&mut events);

            for event in &events {
                serde_json::to_writer(&mut *out, event)?;
                out.write_all(b"\n")?;
            }
            debug!(time_index, stats = ?index.stats(), "Index statistics");

            summary.timesteps_searched += 1;
            summary.events += events.len();
        }

        out.flush()?;
        info!(
            searched = summary.timesteps_searched,
            skipped = summary.timesteps_skipped,
            events = summary.events,
            "Search complete"
        );
        Ok(summary)
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        let search = &self.config.search;
        info!("Configuration Summary:");
        info!(
            "  Region: lat [{}, {}], lon [{}, {}]",
            search.region.south, search.region.north, search.region.west, search.region.east
        );
        info!(
            "  Sectors: {} of radius {} km ({:?} metric)",
            self.sectors.len(),
            search.sector_radius_km,
            search.metric
        );
        info!(
            "  Dataset: {} ({} points, {} time steps)",
            self.source.name(),
            self.source.grid_len(),
            self.timesteps
        );
        info!(
            "  Criteria: {}",
            self.criteria
                .iter()
                .map(|c| c.id())
                .collect::<Vec<_>>()
                .join(", ")
        );
        info!("  Parallel: {}", search.parallel);
    }
}
