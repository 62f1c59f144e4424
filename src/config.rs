// ⚙️ Engine Configuration - Thresholds, ranges and endpoints as data
//
// Every tunable the pipeline uses lives here and is passed into the component
// that needs it. Nothing reads module-level constants at run time, so tests can
// vary any threshold without touching global state.
//
// Loaded from an optional TOML file; every section and field has a default.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// LIVE TRAFFIC
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveTrafficConfig {
    /// Query the live provider at all (false = synthetic only)
    pub enabled: bool,

    /// Provider base URL (no trailing slash)
    pub base_url: String,

    /// Provider API key; usually supplied through the environment instead
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-call timeout in milliseconds
    pub timeout_ms: u64,

    /// Search radius around each location, in metres
    pub search_radius_m: f64,

    /// Readings must report a confidence strictly above this
    pub min_confidence: f64,

    /// Upper bound on concurrent live fetches
    pub max_concurrent_fetches: usize,

    /// Vehicle count at zero speed deficit
    pub base_vehicle_count: f64,

    /// Extra vehicles per km/h below free-flow speed
    pub vehicles_per_kmh_deficit: f64,

    /// Floor for the derived vehicle count
    pub min_vehicle_count: u32,
}

impl Default for LiveTrafficConfig {
    fn default() -> Self {
        LiveTrafficConfig {
            enabled: true,
            base_url: "https://api.tomtom.com".to_string(),
            api_key: None,
            timeout_ms: 5_000,
            search_radius_m: 500.0,
            min_confidence: 0.7,
            max_concurrent_fetches: 8,
            base_vehicle_count: 50.0,
            vehicles_per_kmh_deficit: 10.0,
            min_vehicle_count: 10,
        }
    }
}

impl LiveTrafficConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ============================================================================
// SYNTHETIC FALLBACK
// ============================================================================

/// Inclusive ranges a synthetic record is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficRange {
    pub min_vehicles: u32,
    pub max_vehicles: u32,
    pub min_speed_kmh: u32,
    pub max_speed_kmh: u32,
}

impl TrafficRange {
    pub fn contains(&self, vehicle_count: u32, speed_kmh: f64) -> bool {
        (self.min_vehicles..=self.max_vehicles).contains(&vehicle_count)
            && speed_kmh >= self.min_speed_kmh as f64
            && speed_kmh <= self.max_speed_kmh as f64
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.min_vehicles > self.max_vehicles || self.min_speed_kmh > self.max_speed_kmh {
            return Err(Error::Config(format!("{} range is inverted: {:?}", label, self)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Locations that are likely to be congested when live data is missing
    pub hotspots: Vec<String>,

    /// Probability a hotspot is generated as congested
    pub hotspot_congestion_probability: f64,

    /// Probability any other location is generated as congested
    pub background_congestion_probability: f64,

    pub congested: TrafficRange,

    pub free_flowing: TrafficRange,

    /// Synthetic timestamps are backdated by 1..=max_age_minutes
    pub max_age_minutes: i64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig {
            hotspots: vec![
                "Bengaluru".to_string(),
                "Hyderabad".to_string(),
                "Gurugram".to_string(),
            ],
            hotspot_congestion_probability: 0.7,
            background_congestion_probability: 0.0,
            congested: TrafficRange {
                min_vehicles: 200,
                max_vehicles: 500,
                min_speed_kmh: 5,
                max_speed_kmh: 15,
            },
            free_flowing: TrafficRange {
                min_vehicles: 50,
                max_vehicles: 199,
                min_speed_kmh: 16,
                max_speed_kmh: 40,
            },
            max_age_minutes: 5,
        }
    }
}

impl FallbackConfig {
    /// Probabilities in [0, 1]; congested range strictly slower and busier
    pub fn validate(&self) -> Result<()> {
        check_unit_interval(
            "fallback.hotspot_congestion_probability",
            self.hotspot_congestion_probability,
        )?;
        check_unit_interval(
            "fallback.background_congestion_probability",
            self.background_congestion_probability,
        )?;
        self.congested.validate("fallback.congested")?;
        self.free_flowing.validate("fallback.free_flowing")?;

        // Congested and free-flowing ranges must not overlap: slower and busier
        if self.congested.max_speed_kmh >= self.free_flowing.min_speed_kmh {
            return Err(Error::Config(
                "congested speeds must lie strictly below free-flowing speeds".to_string(),
            ));
        }
        if self.congested.min_vehicles <= self.free_flowing.max_vehicles {
            return Err(Error::Config(
                "congested vehicle counts must lie strictly above free-flowing counts"
                    .to_string(),
            ));
        }
        if self.max_age_minutes < 1 {
            return Err(Error::Config("fallback.max_age_minutes must be at least 1".to_string()));
        }

        Ok(())
    }
}

// ============================================================================
// FUSION + RECOMMENDATIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Nominal free-flow speed; at or above it congestion is 0
    pub reference_speed_kmh: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        FusionConfig {
            reference_speed_kmh: 50.0,
        }
    }
}

/// Rule thresholds (all comparisons are strict)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    /// Rule 1: congestion above this ...
    pub frustration_congestion: f64,

    /// ... and sentiment below this
    pub frustration_sentiment: f64,

    /// Rule 2: congestion above this
    pub severe_congestion: f64,

    /// Rule 3: sentiment below this
    pub negative_sentiment: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        RecommendationThresholds {
            frustration_congestion: 0.7,
            frustration_sentiment: -0.2,
            severe_congestion: 0.8,
            negative_sentiment: -0.4,
        }
    }
}

// ============================================================================
// FEEDBACK GENERATOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Number of synthetic feedback entries per run
    pub entries: usize,

    pub min_age_minutes: i64,

    pub max_age_minutes: i64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        FeedbackConfig {
            entries: 50,
            min_age_minutes: 5,
            max_age_minutes: 120,
        }
    }
}

impl FeedbackConfig {
    /// Ages are non-negative and the range is not inverted
    pub fn validate(&self) -> Result<()> {
        if self.min_age_minutes < 0 || self.min_age_minutes > self.max_age_minutes {
            return Err(Error::Config(format!(
                "feedback age range {}..={} is invalid",
                self.min_age_minutes, self.max_age_minutes
            )));
        }
        Ok(())
    }
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for synthetic data (None = fresh entropy each run)
    pub seed: Option<u64>,

    pub traffic: LiveTrafficConfig,

    pub fallback: FallbackConfig,

    pub fusion: FusionConfig,

    pub rules: RecommendationThresholds,

    pub feedback: FeedbackConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file and validate it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!("Read {:?} failed: {}", path.as_ref(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and the relationship between the fallback states
    pub fn validate(&self) -> Result<()> {
        let traffic = &self.traffic;
        if traffic.timeout_ms == 0 {
            return Err(Error::Config("traffic.timeout_ms must be positive".to_string()));
        }
        if traffic.max_concurrent_fetches == 0 {
            return Err(Error::Config(
                "traffic.max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        if !(traffic.search_radius_m.is_finite() && traffic.search_radius_m > 0.0) {
            return Err(Error::Config("traffic.search_radius_m must be positive".to_string()));
        }
        check_unit_interval("traffic.min_confidence", traffic.min_confidence)?;

        self.fallback.validate()?;

        if !(self.fusion.reference_speed_kmh.is_finite() && self.fusion.reference_speed_kmh > 0.0) {
            return Err(Error::Config(
                "fusion.reference_speed_kmh must be positive".to_string(),
            ));
        }

        self.feedback.validate()?;

        Ok(())
    }
}

fn check_unit_interval(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!("{} must be within [0, 1], got {}", field, value)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
