// 🚗 Traffic Record - One reading per location per run, with provenance
//
// A record is either LIVE (figures derived from a provider reading) or
// SYNTHETIC (drawn from a congestion-state range after the live path failed).
// The provenance travels with the record so reports and tests can tell them apart.

use super::live::{LiveReading, Unavailable};
use crate::entities::location::serialize_name;
use crate::entities::Location;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// PROVENANCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CongestionState {
    Congested,
    FreeFlowing,
}

impl CongestionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CongestionState::Congested => "congested",
            CongestionState::FreeFlowing => "free-flowing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TrafficProvenance {
    /// Accepted provider reading
    Live(LiveReading),

    /// Fallback generator output, with the reason live data was unusable
    Synthetic {
        state: CongestionState,
        reason: Unavailable,
    },
}

impl TrafficProvenance {
    pub fn label(&self) -> &'static str {
        match self {
            TrafficProvenance::Live(_) => "live",
            TrafficProvenance::Synthetic { .. } => "synthetic",
        }
    }
}

// ============================================================================
// TRAFFIC RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficRecord {
    timestamp: DateTime<Utc>,

    #[serde(serialize_with = "serialize_name")]
    location: Arc<Location>,

    vehicle_count: u32,

    average_speed_kmh: f64,

    provenance: TrafficProvenance,
}

impl TrafficRecord {
    /// Build a live record; the average speed is the reading's current speed
    pub fn live(
        timestamp: DateTime<Utc>,
        location: Arc<Location>,
        vehicle_count: u32,
        reading: LiveReading,
    ) -> Result<Self> {
        validate_speed(&location, reading.current_speed_kmh)?;
        validate_speed(&location, reading.free_flow_speed_kmh)?;

        Ok(Self::assemble(
            timestamp,
            location,
            vehicle_count,
            reading.current_speed_kmh,
            TrafficProvenance::Live(reading),
        ))
    }

    /// Build a synthetic record
    pub fn synthetic(
        timestamp: DateTime<Utc>,
        location: Arc<Location>,
        vehicle_count: u32,
        average_speed_kmh: f64,
        state: CongestionState,
        reason: Unavailable,
    ) -> Result<Self> {
        validate_speed(&location, average_speed_kmh)?;

        Ok(Self::assemble(
            timestamp,
            location,
            vehicle_count,
            average_speed_kmh,
            TrafficProvenance::Synthetic { state, reason },
        ))
    }

    /// Callers guarantee the speed is finite and non-negative
    pub(crate) fn assemble(
        timestamp: DateTime<Utc>,
        location: Arc<Location>,
        vehicle_count: u32,
        average_speed_kmh: f64,
        provenance: TrafficProvenance,
    ) -> Self {
        TrafficRecord {
            timestamp,
            location,
            vehicle_count,
            average_speed_kmh,
            provenance,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn location(&self) -> &Arc<Location> {
        &self.location
    }

    pub fn location_name(&self) -> &str {
        &self.location.name
    }

    pub fn vehicle_count(&self) -> u32 {
        self.vehicle_count
    }

    pub fn average_speed_kmh(&self) -> f64 {
        self.average_speed_kmh
    }

    pub fn provenance(&self) -> &TrafficProvenance {
        &self.provenance
    }

    pub fn is_live(&self) -> bool {
        matches!(self.provenance, TrafficProvenance::Live(_))
    }
}

fn validate_speed(location: &Location, speed_kmh: f64) -> Result<()> {
    if speed_kmh.is_finite() && speed_kmh >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidRecord(format!(
            "{}: speed {} km/h is not a non-negative number",
            location.name, speed_kmh
        )))
    }
}

// ============================================================================
// TESTS
// ============================================================================
