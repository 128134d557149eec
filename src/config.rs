//! Command line configuration.

use std::path::PathBuf;

use clap::Parser;
use time::OffsetDateTime;

use crate::{
    db::DEFAULT_DB_FILE,
    host::Authorization,
    location::{Position, StaticLocationService},
};

/// Records a sample expense, tagged with the current location when location
/// permission is granted, then updates and deletes it again.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// File path to the application SQLite database.
    #[arg(long, default_value = DEFAULT_DB_FILE)]
    pub db_path: PathBuf,

    /// Start with fine (precise) location permission already granted.
    #[arg(long)]
    pub grant_fine: bool,

    /// Start with coarse (approximate) location permission already granted.
    #[arg(long)]
    pub grant_coarse: bool,

    /// Deny the location permission request instead of approving it.
    #[arg(long)]
    pub deny_requests: bool,

    /// Treat the satellite location provider as switched off.
    #[arg(long)]
    pub gps_disabled: bool,

    /// Treat the network location provider as switched off.
    #[arg(long)]
    pub network_disabled: bool,

    /// Cached satellite position as "latitude,longitude".
    #[arg(long, allow_hyphen_values = true, value_parser = parse_position)]
    pub gps_fix: Option<Position>,

    /// Cached network position as "latitude,longitude".
    #[arg(long, allow_hyphen_values = true, value_parser = parse_position)]
    pub network_fix: Option<Position>,

    /// Also write debug logs to this file.
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Print a JSON report of the run to stdout when finished.
    #[arg(long)]
    pub json: bool,
}

impl Config {
    /// The location permissions held at start up.
    pub fn authorization(&self) -> Authorization {
        Authorization {
            fine: self.grant_fine,
            coarse: self.grant_coarse,
        }
    }

    /// The location service described by the provider flags.
    ///
    /// Both fixes are given the same time, so neither is more recent than
    /// the other and the satellite fix wins when both providers are on.
    pub fn location_service(&self) -> StaticLocationService {
        let fixed_at = OffsetDateTime::now_utc();
        let stamp = |fix: Option<Position>| fix.map(|position| Position { fixed_at, ..position });

        StaticLocationService {
            gps_enabled: !self.gps_disabled,
            network_enabled: !self.network_disabled,
            gps_position: stamp(self.gps_fix),
            network_position: stamp(self.network_fix),
        }
    }
}

fn parse_position(s: &str) -> Result<Position, String> {
    s.parse().map_err(|error: crate::Error| error.to_string())
}
