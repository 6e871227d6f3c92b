//! Command-line interface handling for the stride search driver.
//!
//! This module provides command-line argument parsing using the `clap`
//! builder API. Every option overrides the matching configuration file
//! setting.

use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional override for the number of time steps searched
    pub timesteps: Option<usize>,
    /// Optional override for the sector radius in kilometres
    pub sector_radius_km: Option<f64>,
    /// Evaluate sectors on the calling thread only
    pub sequential: bool,
}

impl CliArgs {
    /// Parses the process arguments.
    ///
    /// Exits with clap's usage message when the arguments are invalid.
    pub fn parse() -> Self {
        Self::from_matches(&Self::command().get_matches())
    }

    /// Parses an explicit argument list, the first item being the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Ok(Self::from_matches(&Self::command().try_get_matches_from(args)?))
    }

    fn command() -> Command {
        Command::new("Stride Search")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Sector-based search for events in gridded data on the sphere")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("stride_search.toml"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .arg(
                Arg::new("timesteps")
                    .short('t')
                    .long("timesteps")
                    .value_name("COUNT")
                    .help("Number of time steps to search")
                    .value_parser(value_parser!(usize)),
            )
            .arg(
                Arg::new("sector-radius")
                    .short('r')
                    .long("sector-radius")
                    .value_name("KM")
                    .help("Sector radius in kilometres")
                    .value_parser(value_parser!(f64)),
            )
            .arg(
                Arg::new("sequential")
                    .long("sequential")
                    .help("Evaluate sectors sequentially instead of on the thread pool")
                    .action(clap::ArgAction::SetTrue),
            )
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_default(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            timesteps: matches.get_one::<usize>("timesteps").copied(),
            sector_radius_km: matches.get_one::<f64>("sector-radius").copied(),
            sequential: matches.get_flag("sequential"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["stride_search"]).unwrap();
        assert_eq!(args.config_path, PathBuf::from("stride_search.toml"));
        assert!(args.log_level.is_none());
        assert!(!args.json_logs);
        assert!(args.timesteps.is_none());
        assert!(args.sector_radius_km.is_none());
        assert!(!args.sequential);
    }

    #[test]
    fn test_overrides() {
        let args = CliArgs::try_parse_from([
            "stride_search",
            "--config",
            "search.toml",
            "-l",
            "debug",
            "--json-logs",
            "--timesteps",
            "12",
            "--sector-radius",
            "750.5",
            "--sequential",
        ])
        .unwrap();
        assert_eq!(args.config_path, PathBuf::from("search.toml"));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.json_logs);
        assert_eq!(args.timesteps, Some(12));
        assert_eq!(args.sector_radius_km, Some(750.5));
        assert!(args.sequential);
    }

    #[test]
    fn test_rejects_non_numeric_radius() {
        assert!(CliArgs::try_parse_from(["stride_search", "--sector-radius", "wide"]).is_err());
    }
}
