// 🎲 Synthetic Traffic - Two-state fallback generator
//
// When live data is unusable a location gets a CONGESTED or FREE-FLOWING
// reading drawn from disjoint ranges:
//
//   congested:     more vehicles, lower speed
//   free-flowing:  fewer vehicles, higher speed
//
// Which state applies is a configurable policy (hotspot set + probabilities).
// Each location draws from its own RNG, seeded from the run seed and the
// location name, so results don't depend on the order fetches complete in.

use super::live::Unavailable;
use super::record::{CongestionState, TrafficProvenance, TrafficRecord};
use crate::config::{FallbackConfig, TrafficRange};
use crate::entities::{Location, LocationRegistry};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

pub struct SyntheticTrafficGenerator {
    config: FallbackConfig,
    hotspots: HashSet<String>,
    seed: u64,
}

impl SyntheticTrafficGenerator {
    /// Create a generator; every hotspot must be a registered location
    pub fn new(config: FallbackConfig, registry: &LocationRegistry, seed: Option<u64>) -> Result<Self> {
        config.validate()?;

        for hotspot in &config.hotspots {
            if !registry.contains(hotspot) {
                return Err(Error::UnknownLocation(format!("fallback hotspot '{}'", hotspot)));
            }
        }

        let hotspots = config.hotspots.iter().cloned().collect();
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());

        Ok(SyntheticTrafficGenerator {
            config,
            hotspots,
            seed,
        })
    }

    pub fn is_hotspot(&self, location_name: &str) -> bool {
        self.hotspots.contains(location_name)
    }

    /// Probability that a location is generated in the congested state
    pub fn congestion_probability(&self, location_name: &str) -> f64 {
        if self.is_hotspot(location_name) {
            self.config.hotspot_congestion_probability
        } else {
            self.config.background_congestion_probability
        }
    }

    pub fn range_for(&self, state: CongestionState) -> &TrafficRange {
        match state {
            CongestionState::Congested => &self.config.congested,
            CongestionState::FreeFlowing => &self.config.free_flowing,
        }
    }

    /// Generate a fallback record for a location
    pub fn generate(&self, location: &Arc<Location>, reason: Unavailable, now: DateTime<Utc>) -> TrafficRecord {
        let mut rng = self.rng_for(&location.name);

        let state = if rng.gen_bool(self.congestion_probability(&location.name)) {
            CongestionState::Congested
        } else {
            CongestionState::FreeFlowing
        };

        let range = self.range_for(state);
        let vehicle_count = rng.gen_range(range.min_vehicles..=range.max_vehicles);
        let speed = rng.gen_range(range.min_speed_kmh..=range.max_speed_kmh);
        let age = rng.gen_range(1..=self.config.max_age_minutes);

        TrafficRecord::assemble(
            now - Duration::minutes(age),
            Arc::clone(location),
            vehicle_count,
            speed as f64,
            TrafficProvenance::Synthetic { state, reason },
        )
    }

    fn rng_for(&self, location_name: &str) -> StdRng {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(location_name.as_bytes());
        let digest = hasher.finalize();

        let mut seed = [0u8; 8];
        seed.copy_from_slice(&digest[..8]);
        StdRng::seed_from_u64(u64::from_le_bytes(seed))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(config: FallbackConfig, seed: u64) -> SyntheticTrafficGenerator {
        let registry = LocationRegistry::with_default_locations();
        SyntheticTrafficGenerator::new(config, &registry, Some(seed)).unwrap()
    }

    fn state_of(record: &TrafficRecord) -> CongestionState {
        match record.provenance() {
            TrafficProvenance::Synthetic { state, .. } => *state,
            TrafficProvenance::Live(_) => panic!("expected synthetic record"),
        }
    }

    #[test]
    fn test_records_fall_within_state_range() {
        let config = FallbackConfig {
            background_congestion_probability: 0.5,
            ..Default::default()
        };
        let registry = LocationRegistry::with_default_locations();
        let generator = SyntheticTrafficGenerator::new(config.clone(), &registry, Some(3)).unwrap();
        let now = Utc::now();

        for location in registry.all() {
            let record = generator.generate(location, Unavailable::Disabled, now);
            let range = match state_of(&record) {
                CongestionState::Congested => config.congested,
                CongestionState::FreeFlowing => config.free_flowing,
            };

            assert!(range.contains(record.vehicle_count(), record.average_speed_kmh()));

            let age = (now - record.timestamp()).num_minutes();
            assert!((1..=5).contains(&age));
        }
    }

    #[test]
    fn test_hotspot_policy() {
        let always = FallbackConfig {
            hotspots: vec!["Mumbai".to_string()],
            hotspot_congestion_probability: 1.0,
            background_congestion_probability: 0.0,
            ..Default::default()
        };
        let generator = generator(always, 1);
        let registry = LocationRegistry::with_default_locations();
        let now = Utc::now();

        let mumbai = registry.resolve("Mumbai").unwrap();
        let pune = registry.resolve("Pune").unwrap();

        assert_eq!(
            state_of(&generator.generate(&mumbai, Unavailable::Disabled, now)),
            CongestionState::Congested
        );
        assert_eq!(
            state_of(&generator.generate(&pune, Unavailable::Disabled, now)),
            CongestionState::FreeFlowing
        );
    }

    #[test]
    fn test_unknown_hotspot_rejected() {
        let registry = LocationRegistry::with_default_locations();
        let config = FallbackConfig {
            hotspots: vec!["Hitech City".to_string()],
            ..Default::default()
        };

        let result = SyntheticTrafficGenerator::new(config, &registry, Some(1));
        assert!(matches!(result, Err(Error::UnknownLocation(_))));
    }

    #[test]
    fn test_same_seed_same_record() {
        let registry = LocationRegistry::with_default_locations();
        let location = registry.resolve("Chennai").unwrap();
        let now = Utc::now();

        let a = generator(FallbackConfig::default(), 99).generate(&location, Unavailable::Disabled, now);
        let b = generator(FallbackConfig::default(), 99).generate(&location, Unavailable::Disabled, now);

        assert_eq!(a, b);
    }

    #[test]
    fn test_reason_is_kept() {
        let registry = LocationRegistry::with_default_locations();
        let location = registry.resolve("Agra").unwrap();

        let record = generator(FallbackConfig::default(), 5).generate(
            &location,
            Unavailable::Status(503),
            Utc::now(),
        );

        assert!(matches!(
            record.provenance(),
            TrafficProvenance::Synthetic { reason: Unavailable::Status(503), .. }
        ));
    }
}
