// 📊 Pipeline Report - Fused records × recommendations, ready for a renderer
//
// This is where the engine's obligation ends: one fully-populated row per
// location (coordinates, congestion, recommendation always present; sentiment
// may be empty). Renderers read the CSV/JSON export or the rows directly.

use crate::entities::CITY_CENTER;
use crate::error::{Error, Result};
use crate::fusion::FusedLocationRecord;
use crate::recommendation::{Advisory, Priority, Recommendation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use uuid::Uuid;

// ============================================================================
// DASHBOARD ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub priority: Priority,
    pub advisory: Advisory,
    pub recommendation: String,
    /// Empty when the location had no feedback
    pub avg_sentiment_polarity: Option<f64>,
    pub feedback_count: usize,
    pub congestion_score: f64,
    pub average_speed_kmh: f64,
    pub vehicle_count: u32,
    /// "live" or "synthetic"
    pub traffic_source: String,
}

impl DashboardRow {
    fn new(fused: &FusedLocationRecord, recommendation: &Recommendation) -> Self {
        DashboardRow {
            location: fused.location_name().to_string(),
            latitude: fused.latitude(),
            longitude: fused.longitude(),
            priority: recommendation.priority,
            advisory: recommendation.advisory,
            recommendation: recommendation.text().to_string(),
            avg_sentiment_polarity: fused.mean_sentiment(),
            feedback_count: fused.feedback_count(),
            congestion_score: fused.congestion_score(),
            average_speed_kmh: fused.average_speed_kmh(),
            vehicle_count: fused.vehicle_count(),
            traffic_source: fused.provenance().label().to_string(),
        }
    }
}

// ============================================================================
// PIPELINE REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// (latitude, longitude) renderers centre the map on
    pub map_center: (f64, f64),
    /// Sorted by location name
    pub rows: Vec<DashboardRow>,
}

impl PipelineReport {
    /// Join fused records with their recommendations (every record needs one)
    pub fn build(fused: &[FusedLocationRecord], recommendations: &[Recommendation]) -> Result<Self> {
        let by_location: HashMap<&str, &Recommendation> = recommendations
            .iter()
            .map(|r| (r.location.as_str(), r))
            .collect();

        let mut rows = fused
            .iter()
            .map(|record| {
                by_location
                    .get(record.location_name())
                    .map(|rec| DashboardRow::new(record, rec))
                    .ok_or_else(|| {
                        Error::InvalidRecord(format!(
                            "no recommendation for {}",
                            record.location_name()
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        rows.sort_by(|a, b| a.location.cmp(&b.location));

        Ok(PipelineReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            map_center: CITY_CENTER,
            rows,
        })
    }

    pub fn row(&self, location: &str) -> Option<&DashboardRow> {
        self.rows.iter().find(|r| r.location == location)
    }

    /// Highest priority first, then most congested, then by name
    pub fn ranked(&self) -> Vec<&DashboardRow> {
        let mut ranked: Vec<&DashboardRow> = self.rows.iter().collect();
        ranked.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(b.congestion_score.total_cmp(&a.congestion_score))
                .then(a.location.cmp(&b.location))
        });
        ranked
    }

    pub fn priority_counts(&self) -> BTreeMap<Priority, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.priority).or_insert(0) += 1;
        }
        counts
    }

    pub fn live_count(&self) -> usize {
        self.rows.iter().filter(|r| r.traffic_source == "live").count()
    }

    /// SHA-256 over the rows only (run id and timestamp excluded)
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.rows)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Write the rows as CSV (ranked order)
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in self.ranked() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the whole report as pretty JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Console table of the ranked recommendations
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<20} {:<8} {:>10} {:>10} {:>8}  {}\n",
            "Location", "Priority", "Congestion", "Sentiment", "Source", "Recommendation"
        ));

        for row in self.ranked() {
            let sentiment = row
                .avg_sentiment_polarity
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "n/a".to_string());

            out.push_str(&format!(
                "{:<20} {:<8} {:>10.2} {:>10} {:>8}  {}\n",
                row.location,
                row.priority,
                row.congestion_score,
                sentiment,
                row.traffic_source,
                row.recommendation
            ));
        }

        let counts = self.priority_counts();
        out.push_str(&format!(
            "\n{} locations: {} high, {} medium, {} low ({} live traffic)\n",
            self.rows.len(),
            counts.get(&Priority::High).copied().unwrap_or(0),
            counts.get(&Priority::Medium).copied().unwrap_or(0),
            counts.get(&Priority::Low).copied().unwrap_or(0),
            self.live_count()
        ));
        out
    }
}

// ============================================================================
// TESTS
// ============================================================================
