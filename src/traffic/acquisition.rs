// 🛰️ Traffic Acquisition Service - Live first, synthetic always
//
// acquire(location) is TOTAL: it always returns exactly one TrafficRecord.
//
//   1. live fetch (single attempt, own timeout)
//   2. reading must be well-formed, confidence > threshold, road open
//   3. usable  → vehicle count from speed deficit, speed = current speed
//      unusable → synthetic generator
//
// Fetches for different locations run concurrently (bounded); each one
// resolves to a complete record before it is collected.

use super::live::{LiveReading, LiveTrafficQuery, LiveTrafficSource, Unavailable};
use super::record::{TrafficProvenance, TrafficRecord};
use super::synthetic::SyntheticTrafficGenerator;
use crate::config::LiveTrafficConfig;
use crate::entities::Location;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

pub struct TrafficAcquisitionService {
    config: LiveTrafficConfig,
    source: Arc<dyn LiveTrafficSource>,
    fallback: SyntheticTrafficGenerator,
}

impl TrafficAcquisitionService {
    pub fn new(
        config: LiveTrafficConfig,
        source: Arc<dyn LiveTrafficSource>,
        fallback: SyntheticTrafficGenerator,
    ) -> Self {
        TrafficAcquisitionService {
            config,
            source,
            fallback,
        }
    }

    /// Acquire one traffic record for a location (never fails)
    pub async fn acquire(&self, location: &Arc<Location>) -> TrafficRecord {
        match self.fetch_usable(location).await {
            Ok(reading) => {
                tracing::debug!(
                    location = %location.name,
                    current_speed = reading.current_speed_kmh,
                    confidence = reading.confidence,
                    "Using live traffic"
                );
                self.live_record(location, reading)
            }
            Err(reason) => {
                match &reason {
                    Unavailable::Disabled => {}
                    other => tracing::warn!(
                        location = %location.name,
                        reason = %other,
                        "Live traffic unavailable, using synthetic fallback"
                    ),
                }
                self.fallback.generate(location, reason, Utc::now())
            }
        }
    }

    /// Acquire records for every location, sorted by location name
    pub async fn acquire_all(&self, locations: &[Arc<Location>]) -> Vec<TrafficRecord> {
        let mut records: Vec<TrafficRecord> = stream::iter(locations)
            .map(|location| self.acquire(location))
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .collect()
            .await;

        records.sort_by(|a, b| a.location_name().cmp(b.location_name()));

        let live = records.iter().filter(|r| r.is_live()).count();
        tracing::info!(
            total = records.len(),
            live,
            synthetic = records.len() - live,
            "Built traffic records (live when possible)"
        );

        records
    }

    async fn fetch_usable(&self, location: &Location) -> Result<LiveReading, Unavailable> {
        if !self.config.enabled {
            return Err(Unavailable::Disabled);
        }

        let query = LiveTrafficQuery {
            latitude: location.latitude,
            longitude: location.longitude,
            radius_m: self.config.search_radius_m,
        };

        let reading = tokio::time::timeout(self.config.timeout(), self.source.fetch(&query))
            .await
            .map_err(|_| Unavailable::Timeout(self.config.timeout_ms))??;

        self.accept(reading)
    }

    /// Acceptance gate: well-formed, confident enough, road open
    pub fn accept(&self, reading: LiveReading) -> Result<LiveReading, Unavailable> {
        reading.validate()?;

        if reading.confidence <= self.config.min_confidence {
            return Err(Unavailable::LowConfidence {
                confidence: reading.confidence,
                threshold: self.config.min_confidence,
            });
        }
        if reading.road_closure {
            return Err(Unavailable::RoadClosure);
        }

        Ok(reading)
    }

    /// Vehicle count grows with the speed deficit, floored at the minimum
    pub fn vehicle_count_for(&self, reading: &LiveReading) -> u32 {
        let deficit = reading.free_flow_speed_kmh - reading.current_speed_kmh;
        let estimate = (self.config.base_vehicle_count
            + deficit * self.config.vehicles_per_kmh_deficit)
            .trunc();

        // `as` saturates, so huge deficits clamp to u32::MAX
        estimate.max(self.config.min_vehicle_count as f64) as u32
    }

    fn live_record(&self, location: &Arc<Location>, reading: LiveReading) -> TrafficRecord {
        TrafficRecord::assemble(
            Utc::now(),
            Arc::clone(location),
            self.vehicle_count_for(&reading),
            reading.current_speed_kmh,
            TrafficProvenance::Live(reading),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
