// 💬 Citizen Feedback - Records, CSV loading, synthetic generator
//
// Feedback is one of the two independent signals. Records are created here
// (from a CSV export or the generator) and never mutated afterwards; the
// sentiment scorer wraps them instead of changing them.

use crate::config::FeedbackConfig;
use crate::entities::location::serialize_name;
use crate::entities::{Location, LocationRegistry};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// FEEDBACK CHANNEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackChannel {
    MobileApp,
    Twitter,
    /// Any other named source (call centre, web form, ...)
    Other(String),
}

impl FeedbackChannel {
    /// Parse a channel label as it appears in exports ("Mobile App", "Twitter")
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace(' ', "").as_str() {
            "mobileapp" | "app" => FeedbackChannel::MobileApp,
            "twitter" | "x" => FeedbackChannel::Twitter,
            _ => FeedbackChannel::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FeedbackChannel::MobileApp => "Mobile App",
            FeedbackChannel::Twitter => "Twitter",
            FeedbackChannel::Other(label) => label,
        }
    }
}

impl fmt::Display for FeedbackChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// FEEDBACK RECORD
// ============================================================================

/// A single piece of citizen feedback, tied to a registered location
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRecord {
    timestamp: DateTime<Utc>,

    #[serde(serialize_with = "serialize_name")]
    location: Arc<Location>,

    text: String,

    channel: FeedbackChannel,
}

impl FeedbackRecord {
    /// Create a record; the text must contain something to score
    pub fn new(
        timestamp: DateTime<Utc>,
        location: Arc<Location>,
        text: impl Into<String>,
        channel: FeedbackChannel,
    ) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::InvalidRecord(format!(
                "empty feedback text for {}",
                location.name
            )));
        }

        Ok(FeedbackRecord {
            timestamp,
            location,
            text,
            channel,
        })
    }

    /// Create a record by location name, rejecting names the registry doesn't know
    pub fn for_location(
        registry: &LocationRegistry,
        timestamp: DateTime<Utc>,
        location_name: &str,
        text: impl Into<String>,
        channel: FeedbackChannel,
    ) -> Result<Self> {
        let location = registry.resolve(location_name)?;
        Self::new(timestamp, location, text, channel)
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

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn channel(&self) -> &FeedbackChannel {
        &self.channel
    }
}

// ============================================================================
// CSV SOURCE
// ============================================================================

/// One row of a feedback export: timestamp,location,feedback_text,source
#[derive(Debug, Deserialize)]
struct RawFeedback {
    timestamp: DateTime<Utc>,
    location: String,
    feedback_text: String,
    source: String,
}

/// Load feedback from a CSV export
///
/// Fails on the first row that names an unknown location or has empty text.
pub fn load_feedback_csv(path: &Path, registry: &LocationRegistry) -> Result<Vec<FeedbackRecord>> {
    let reader = csv::Reader::from_path(path)?;
    read_feedback(reader, registry)
}

fn read_feedback<R: std::io::Read>(
    mut reader: csv::Reader<R>,
    registry: &LocationRegistry,
) -> Result<Vec<FeedbackRecord>> {
    let mut records = Vec::new();

    for (line, row) in reader.deserialize::<RawFeedback>().enumerate() {
        let raw = row?;
        let record = FeedbackRecord::for_location(
            registry,
            raw.timestamp,
            &raw.location,
            raw.feedback_text,
            FeedbackChannel::from_label(&raw.source),
        )
        .map_err(|e| Error::InvalidRecord(format!("feedback row {}: {}", line + 2, e)))?;
        records.push(record);
    }

    tracing::info!(count = records.len(), "Loaded citizen feedback from CSV");
    Ok(records)
}

// ============================================================================
// SYNTHETIC GENERATOR
// ============================================================================

const SAMPLE_COMMENTS: &[&str] = &[
    "Huge traffic jam near the flyover, it's been an hour!",
    "The new park is beautiful, great work by the municipality.",
    "Garbage has not been collected for three days on Road No. 12.",
    "Streetlight is not working, it's a safety concern at night.",
    "Water logging after just a little rain is unacceptable.",
    "The metro is so convenient and clean, love it!",
    "Too much noise pollution from construction late at night.",
    "Potholes on this road are damaging our vehicles.",
];

/// Randomized stand-in for a real feedback feed
pub struct FeedbackGenerator {
    config: FeedbackConfig,
    rng: StdRng,
}

impl FeedbackGenerator {
    /// Create a generator; the age range must be valid
    pub fn new(config: FeedbackConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(FeedbackGenerator { config, rng })
    }

    /// Generate the configured number of entries relative to now
    pub fn generate(&mut self, registry: &LocationRegistry) -> Vec<FeedbackRecord> {
        self.generate_at(registry, Utc::now())
    }

    /// Generate entries backdated from a fixed reference time
    pub fn generate_at(&mut self, registry: &LocationRegistry, now: DateTime<Utc>) -> Vec<FeedbackRecord> {
        let mut records = Vec::with_capacity(self.config.entries);

        for _ in 0..self.config.entries {
            let Some(location) = registry.all().choose(&mut self.rng) else {
                break;
            };
            let age = self
                .rng
                .gen_range(self.config.min_age_minutes..=self.config.max_age_minutes);
            let text = SAMPLE_COMMENTS.choose(&mut self.rng).copied().unwrap_or_default();
            let channel = if self.rng.gen_bool(0.5) {
                FeedbackChannel::MobileApp
            } else {
                FeedbackChannel::Twitter
            };

            records.push(FeedbackRecord {
                timestamp: now - Duration::minutes(age),
                location: Arc::clone(location),
                text: text.to_string(),
                channel,
            });
        }

        tracing::info!(count = records.len(), "Simulated citizen feedback entries");
        records
    }
}

// ============================================================================
// TESTS
// ============================================================================
