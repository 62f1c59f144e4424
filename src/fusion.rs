// 🔗 Fusion Engine - Sentiment × Traffic × Coordinates, one record per location
//
// Join rules:
//   traffic      REQUIRED (drives the output rows)
//   coordinates  REQUIRED (from the registry, never from the record)
//   sentiment    OPTIONAL (None when a location had no feedback, NOT 0.0)
//
// Congestion is a pure function of average speed:
//   congestion = clamp(1 - speed / reference_speed, 0, 1)

use crate::config::FusionConfig;
use crate::entities::location::serialize_name;
use crate::entities::{Location, LocationRegistry};
use crate::error::{Error, Result};
use crate::sentiment::ScoredFeedback;
use crate::traffic::{TrafficProvenance, TrafficRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Normalized slowdown relative to the reference free-flow speed
///
/// Always within [0, 1]; a degenerate reference (0, negative, NaN) yields 0.
pub fn congestion_score(speed_kmh: f64, reference_speed_kmh: f64) -> f64 {
    if !(reference_speed_kmh.is_finite() && reference_speed_kmh > 0.0) {
        return 0.0;
    }

    let score = 1.0 - speed_kmh / reference_speed_kmh;
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

// ============================================================================
// FUSED RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedLocationRecord {
    #[serde(serialize_with = "serialize_name")]
    location: Arc<Location>,

    /// Mean polarity of the location's feedback (None = no feedback)
    mean_sentiment: Option<f64>,

    feedback_count: usize,

    congestion_score: f64,

    vehicle_count: u32,

    average_speed_kmh: f64,

    provenance: TrafficProvenance,
}

impl FusedLocationRecord {
    pub fn location(&self) -> &Arc<Location> {
        &self.location
    }

    pub fn location_name(&self) -> &str {
        &self.location.name
    }

    pub fn latitude(&self) -> f64 {
        self.location.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.location.longitude
    }

    pub fn mean_sentiment(&self) -> Option<f64> {
        self.mean_sentiment
    }

    pub fn feedback_count(&self) -> usize {
        self.feedback_count
    }

    pub fn congestion_score(&self) -> f64 {
        self.congestion_score
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

    /// Minimal record carrying only the signals the rule engine reads
    #[cfg(test)]
    pub(crate) fn with_signals(name: &str, congestion_score: f64, mean_sentiment: Option<f64>) -> Self {
        use crate::traffic::{CongestionState, Unavailable};

        FusedLocationRecord {
            location: Arc::new(Location::new(name, 0.0, 0.0).expect("valid test location")),
            mean_sentiment,
            feedback_count: usize::from(mean_sentiment.is_some()),
            congestion_score,
            vehicle_count: 100,
            average_speed_kmh: 50.0 * (1.0 - congestion_score),
            provenance: TrafficProvenance::Synthetic {
                state: CongestionState::FreeFlowing,
                reason: Unavailable::Disabled,
            },
        }
    }
}

// ============================================================================
// FUSION ENGINE
// ============================================================================

pub struct FusionEngine {
    config: FusionConfig,
}

#[derive(Default)]
struct SentimentAccumulator {
    sum: f64,
    count: usize,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        FusionEngine { config }
    }

    pub fn congestion_score(&self, speed_kmh: f64) -> f64 {
        congestion_score(speed_kmh, self.config.reference_speed_kmh)
    }

    /// Mean polarity per location; locations without feedback are absent
    pub fn mean_sentiment(
        &self,
        feedback: &[ScoredFeedback],
        registry: &LocationRegistry,
    ) -> BTreeMap<String, (f64, usize)> {
        let mut totals: BTreeMap<String, SentimentAccumulator> = BTreeMap::new();

        for item in feedback {
            if !registry.is_registered(item.record.location()) {
                tracing::warn!(
                    location = %item.location_name(),
                    "Excluding feedback for unregistered location"
                );
                continue;
            }

            let entry = totals.entry(item.location_name().to_string()).or_default();
            entry.sum += item.polarity;
            entry.count += 1;
        }

        totals
            .into_iter()
            .map(|(name, acc)| (name, (acc.sum / acc.count as f64, acc.count)))
            .collect()
    }

    /// Fuse feedback and traffic into one record per traffic location, sorted by name
    pub fn fuse(
        &self,
        feedback: &[ScoredFeedback],
        traffic: &[TrafficRecord],
        registry: &LocationRegistry,
    ) -> Result<Vec<FusedLocationRecord>> {
        let sentiment = self.mean_sentiment(feedback, registry);

        let mut by_location: BTreeMap<&str, &TrafficRecord> = BTreeMap::new();
        for record in traffic {
            if !registry.is_registered(record.location()) {
                tracing::warn!(
                    location = %record.location_name(),
                    "Excluding traffic record for unregistered location"
                );
                continue;
            }
            if by_location.insert(record.location_name(), record).is_some() {
                return Err(Error::DuplicateTraffic(record.location_name().to_string()));
            }
        }

        let mut fused = Vec::with_capacity(by_location.len());
        for (name, record) in by_location {
            let location = registry.resolve(name)?;
            let (mean_sentiment, feedback_count) = match sentiment.get(name) {
                Some(&(mean, count)) => (Some(mean), count),
                None => (None, 0),
            };

            fused.push(FusedLocationRecord {
                location,
                mean_sentiment,
                feedback_count,
                congestion_score: self.congestion_score(record.average_speed_kmh()),
                vehicle_count: record.vehicle_count(),
                average_speed_kmh: record.average_speed_kmh(),
                provenance: record.provenance().clone(),
            });
        }

        let orphaned = sentiment
            .keys()
            .filter(|name| !fused.iter().any(|f| f.location_name() == name.as_str()))
            .count();
        if orphaned > 0 {
            tracing::debug!(orphaned, "Feedback locations without a traffic record were dropped");
        }

        tracing::info!(
            locations = fused.len(),
            with_sentiment = fused.iter().filter(|f| f.mean_sentiment.is_some()).count(),
            "Combined and aggregated data for all locations"
        );

        Ok(fused)
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::{FeedbackChannel, FeedbackRecord};
    use crate::traffic::{CongestionState, LiveReading, Unavailable};
    use chrono::Utc;

    fn registry() -> LocationRegistry {
        LocationRegistry::with_default_locations()
    }

    fn scored(registry: &LocationRegistry, name: &str, polarity: f64) -> ScoredFeedback {
        ScoredFeedback {
            record: FeedbackRecord::for_location(
                registry,
                Utc::now(),
                name,
                "some feedback",
                FeedbackChannel::MobileApp,
            )
            .unwrap(),
            polarity,
            subjectivity: 0.5,
        }
    }

    fn traffic(registry: &LocationRegistry, name: &str, speed: f64) -> TrafficRecord {
        TrafficRecord::synthetic(
            Utc::now(),
            registry.resolve(name).unwrap(),
            120,
            speed,
            CongestionState::FreeFlowing,
            Unavailable::Disabled,
        )
        .unwrap()
    }

    #[test]
    fn test_congestion_reference_points() {
        assert_eq!(congestion_score(50.0, 50.0), 0.0);
        assert_eq!(congestion_score(0.0, 50.0), 1.0);
        assert_eq!(congestion_score(25.0, 50.0), 0.5);
        assert_eq!(congestion_score(80.0, 50.0), 0.0);
    }

    #[test]
    fn test_congestion_monotonic() {
        let mut previous = f64::INFINITY;
        for tenth in 0..=800 {
            let score = congestion_score(tenth as f64 / 10.0, 50.0);
            assert!(score <= previous);
            assert!((0.0..=1.0).contains(&score));
            previous = score;
        }
    }

    #[test]
    fn test_mean_sentiment_per_location() {
        let registry = registry();
        let engine = FusionEngine::default();
        let feedback = vec![
            scored(&registry, "Pune", -0.5),
            scored(&registry, "Pune", 0.1),
            scored(&registry, "Agra", 0.4),
        ];

        let means = engine.mean_sentiment(&feedback, &registry);

        let (pune, pune_count) = means["Pune"];
        assert!((pune - (-0.2)).abs() < 1e-12);
        assert_eq!(pune_count, 2);
        assert_eq!(means["Agra"], (0.4, 1));
        assert!(!means.contains_key("Delhi"));
    }

    #[test]
    fn test_missing_sentiment_is_none_not_zero() {
        let registry = registry();
        let engine = FusionEngine::default();
        let feedback = vec![
            scored(&registry, "Pune", 0.0),
        ];
        let traffic = vec![traffic(&registry, "Pune", 30.0), traffic(&registry, "Delhi", 10.0)];

        let fused = engine.fuse(&feedback, &traffic, &registry).unwrap();

        assert_eq!(fused.len(), 2);
        let delhi = &fused[0];
        let pune = &fused[1];

        assert_eq!(delhi.location_name(), "Delhi");
        assert_eq!(delhi.mean_sentiment(), None);
        assert_eq!(delhi.feedback_count(), 0);

        assert_eq!(pune.mean_sentiment(), Some(0.0));
        assert_eq!(pune.feedback_count(), 1);
    }

    #[test]
    fn test_fused_record_carries_traffic_and_coordinates() {
        let registry = registry();
        let engine = FusionEngine::default();
        let reading = LiveReading {
            current_speed_kmh: 10.0,
            free_flow_speed_kmh: 40.0,
            confidence: 0.9,
            road_closure: false,
        };
        let live = TrafficRecord::live(Utc::now(), registry.resolve("Kochi").unwrap(), 350, reading).unwrap();

        let fused = engine.fuse(&[], &[live], &registry).unwrap();

        let kochi = &fused[0];
        assert_eq!(kochi.latitude(), 9.9312);
        assert_eq!(kochi.longitude(), 76.2673);
        assert_eq!(kochi.vehicle_count(), 350);
        assert_eq!(kochi.average_speed_kmh(), 10.0);
        assert!((kochi.congestion_score() - 0.8).abs() < 1e-12);
        assert_eq!(kochi.provenance().label(), "live");
    }

    #[test]
    fn test_unregistered_location_excluded() {
        let registry = registry();
        let engine = FusionEngine::default();

        let stranger = Arc::new(Location::new("Gachibowli", 17.44, 78.35).unwrap());
        let foreign_traffic = TrafficRecord::synthetic(
            Utc::now(),
            stranger.clone(),
            300,
            8.0,
            CongestionState::Congested,
            Unavailable::Disabled,
        )
        .unwrap();
        let foreign_feedback = ScoredFeedback {
            record: FeedbackRecord::new(Utc::now(), stranger, "Huge jam", FeedbackChannel::Twitter).unwrap(),
            polarity: -0.9,
            subjectivity: 0.8,
        };

        let fused = engine
            .fuse(
                &[foreign_feedback],
                &[foreign_traffic, traffic(&registry, "Thane", 35.0)],
                &registry,
            )
            .unwrap();

        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].location_name(), "Thane");
    }

    #[test]
    fn test_wrong_coordinates_excluded() {
        let registry = registry();
        let engine = FusionEngine::default();

        let moved = Arc::new(Location::new("Thane", 0.0, 0.0).unwrap());
        let record = TrafficRecord::synthetic(
            Utc::now(),
            moved,
            100,
            30.0,
            CongestionState::FreeFlowing,
            Unavailable::Disabled,
        )
        .unwrap();

        let fused = engine.fuse(&[], &[record], &registry).unwrap();
        assert!(fused.is_empty());
    }

    #[test]
    fn test_duplicate_traffic_rejected() {
        let registry = registry();
        let engine = FusionEngine::default();
        let traffic = vec![traffic(&registry, "Pune", 30.0), traffic(&registry, "Pune", 20.0)];

        let result = engine.fuse(&[], &traffic, &registry);
        assert!(matches!(result, Err(Error::DuplicateTraffic(name)) if name == "Pune"));
    }

    #[test]
    fn test_degenerate_reference_speed_stays_in_range() {
        assert_eq!(congestion_score(0.0, 0.0), 0.0);
        assert_eq!(congestion_score(30.0, 0.0), 0.0);
        assert_eq!(congestion_score(30.0, -10.0), 0.0);
        assert_eq!(congestion_score(30.0, f64::NAN), 0.0);
        assert_eq!(congestion_score(f64::NAN, 50.0), 0.0);

        let engine = FusionEngine::new(FusionConfig {
            reference_speed_kmh: 0.0,
        });
        assert!(!engine.congestion_score(0.0).is_nan());
    }

    #[test]
    fn test_custom_reference_speed() {
        let engine = FusionEngine::new(FusionConfig {
            reference_speed_kmh: 40.0,
        });

        assert_eq!(engine.congestion_score(10.0), 0.75);
        assert_eq!(engine.congestion_score(40.0), 0.0);
    }

    #[test]
    fn test_fusion_is_repeatable() {
        let registry = registry();
        let engine = FusionEngine::default();
        let feedback = vec![
            scored(&registry, "Pune", -0.3),
            scored(&registry, "Mumbai", 0.6),
            scored(&registry, "Pune", -0.1),
        ];
        let traffic = vec![
            traffic(&registry, "Mumbai", 12.0),
            traffic(&registry, "Pune", 33.0),
        ];

        let first = serde_json::to_string(&engine.fuse(&feedback, &traffic, &registry).unwrap()).unwrap();
        let second = serde_json::to_string(&engine.fuse(&feedback, &traffic, &registry).unwrap()).unwrap();

        assert_eq!(first, second);
    }
}
