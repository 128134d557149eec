//! Resolves the current location into a string for tagging transactions.
//!
//! The lookup only reads positions that the location service has already
//! cached, so it never waits for a new fix. Whenever no position can be used
//! the result is [NO_LOCATION] rather than an error.

use std::{fmt::Display, str::FromStr};

use time::OffsetDateTime;

use crate::{Error, host::Authorization};

/// The location stored when the location is unknown or may not be read.
pub const NO_LOCATION: &str = "none";

/// A source of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Satellite positioning.
    Gps,
    /// Positioning from cell towers and Wi-Fi.
    Network,
}

impl Provider {
    /// Every provider, in the order they are queried.
    pub const ALL: [Provider; 2] = [Provider::Gps, Provider::Network];
}

/// A position reported by a [Provider].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Degrees north of the equator.
    pub latitude: f64,
    /// Degrees east of the prime meridian.
    pub longitude: f64,
    /// When the provider determined the position.
    pub fixed_at: OffsetDateTime,
}

impl Position {
    /// Create a position fixed at the current time.
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            fixed_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl FromStr for Position {
    type Err = Error;

    /// Parse a "latitude,longitude" string, e.g. "-6.914744,107.609810".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidPosition(s.to_owned());

        let (latitude, longitude) = s.split_once(',').ok_or_else(invalid)?;
        let latitude: f64 = latitude.trim().parse().map_err(|_| invalid())?;
        let longitude: f64 = longitude.trim().parse().map_err(|_| invalid())?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(invalid());
        }

        Ok(Position::now(latitude, longitude))
    }
}

/// The platform service that knows about location providers.
pub trait LocationService {
    /// Whether the user has switched `provider` on.
    fn is_provider_enabled(&self, provider: Provider) -> bool;

    /// The last position `provider` determined, if it has one cached.
    ///
    /// Must return immediately instead of waiting for a new fix.
    fn last_known_position(&self, provider: Provider) -> Option<Position>;
}

/// A location service with fixed provider switches and cached positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticLocationService {
    /// Whether [Provider::Gps] is switched on.
    pub gps_enabled: bool,
    /// Whether [Provider::Network] is switched on.
    pub network_enabled: bool,
    /// The cached satellite position.
    pub gps_position: Option<Position>,
    /// The cached network position.
    pub network_position: Option<Position>,
}

impl LocationService for StaticLocationService {
    fn is_provider_enabled(&self, provider: Provider) -> bool {
        match provider {
            Provider::Gps => self.gps_enabled,
            Provider::Network => self.network_enabled,
        }
    }

    fn last_known_position(&self, provider: Provider) -> Option<Position> {
        match provider {
            Provider::Gps => self.gps_position,
            Provider::Network => self.network_position,
        }
    }
}

/// Turns the location service's cached positions into location strings.
#[derive(Debug, Clone)]
pub struct LocationResolver<L> {
    service: L,
}

impl<L: LocationService> LocationResolver<L> {
    /// Create a resolver that reads positions from `service`.
    pub fn new(service: L) -> Self {
        Self { service }
    }

    /// Whether at least one provider is switched on.
    pub fn is_location_enabled(&self) -> bool {
        Provider::ALL
            .iter()
            .any(|provider| self.service.is_provider_enabled(*provider))
    }

    /// Get the current location as "latitude,longitude", or [NO_LOCATION].
    ///
    /// Returns [NO_LOCATION] without querying any provider when
    /// `authorization` lacks either location permission or when every
    /// provider is switched off. Otherwise the most recent cached position
    /// of the enabled providers is used, with ties going to the provider
    /// that comes first in [Provider::ALL].
    pub fn get_location_string(&self, authorization: Authorization) -> String {
        if !authorization.is_fully_granted() {
            tracing::debug!("Location permission not granted, using \"{NO_LOCATION}\"");
            return NO_LOCATION.to_owned();
        }

        if !self.is_location_enabled() {
            tracing::debug!("No location provider is enabled, using \"{NO_LOCATION}\"");
            return NO_LOCATION.to_owned();
        }

        let latest = Provider::ALL
            .iter()
            .filter(|provider| self.service.is_provider_enabled(**provider))
            .filter_map(|provider| {
                let position = self.service.last_known_position(*provider);
                tracing::debug!("Last known position from {provider:?}: {position:?}");
                position
            })
            .fold(None, |latest: Option<Position>, position| match latest {
                Some(latest) if latest.fixed_at >= position.fixed_at => Some(latest),
                _ => Some(position),
            });

        match latest {
            Some(position) => position.to_string(),
            None => {
                tracing::debug!("No cached position available, using \"{NO_LOCATION}\"");
                NO_LOCATION.to_owned()
            }
        }
    }
}
