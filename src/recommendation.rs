// 🚦 Recommendation Engine - Ordered rules, first match wins
//
//   1. congestion > 0.7 AND sentiment < -0.2  → HIGH    dispatch traffic warden
//   2. congestion > 0.8                       → MEDIUM  congestion alert
//   3. sentiment < -0.4                       → HIGH    review citizen feedback
//   4. otherwise                              → LOW     normal
//
// A location with NO sentiment (no feedback) never satisfies a sentiment
// condition: rules 1 and 3 cannot fire for it. It is not treated as 0.0.

use crate::config::RecommendationThresholds;
use crate::fusion::FusedLocationRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// PRIORITY + ADVISORY
// ============================================================================

/// Ordered: Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Advisory {
    DispatchWarden,
    CongestionAlert,
    ReviewFeedback,
    Normal,
}

impl Advisory {
    pub fn text(&self) -> &'static str {
        match self {
            Advisory::DispatchWarden => {
                "ACTION: High traffic and public frustration detected. Dispatch traffic warden immediately."
            }
            Advisory::CongestionAlert => {
                "ALERT: Severe traffic congestion. Monitor signals and update public traffic alerts."
            }
            Advisory::ReviewFeedback => {
                "ACTION: High negative sentiment detected. Review recent citizen feedback for urgent issues (e.g., sanitation, safety)."
            }
            Advisory::Normal => "Status: Normal.",
        }
    }

    /// Rule that produces this advisory (1-based evaluation order)
    pub fn rule_number(&self) -> u8 {
        match self {
            Advisory::DispatchWarden => 1,
            Advisory::CongestionAlert => 2,
            Advisory::ReviewFeedback => 3,
            Advisory::Normal => 4,
        }
    }
}

// ============================================================================
// RECOMMENDATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub location: String,
    pub priority: Priority,
    pub advisory: Advisory,
}

impl Recommendation {
    pub fn text(&self) -> &'static str {
        self.advisory.text()
    }

    pub fn is_actionable(&self) -> bool {
        self.priority > Priority::Low
    }
}

// ============================================================================
// RECOMMENDATION ENGINE
// ============================================================================

pub struct RecommendationEngine {
    thresholds: RecommendationThresholds,
}

impl RecommendationEngine {
    pub fn new(thresholds: RecommendationThresholds) -> Self {
        RecommendationEngine { thresholds }
    }

    /// Classify a fused record
    pub fn classify(&self, record: &FusedLocationRecord) -> Recommendation {
        let (priority, advisory) = self.evaluate(record.congestion_score(), record.mean_sentiment());

        Recommendation {
            location: record.location_name().to_string(),
            priority,
            advisory,
        }
    }

    /// Classify every record, preserving order
    pub fn classify_all(&self, records: &[FusedLocationRecord]) -> Vec<Recommendation> {
        let recommendations: Vec<Recommendation> = records.iter().map(|r| self.classify(r)).collect();

        tracing::info!(
            count = recommendations.len(),
            actionable = recommendations.iter().filter(|r| r.is_actionable()).count(),
            "Generated recommendations"
        );

        recommendations
    }

    /// Rule evaluation on raw signals (first match wins)
    pub fn evaluate(&self, congestion: f64, sentiment: Option<f64>) -> (Priority, Advisory) {
        let t = &self.thresholds;

        // A missing sentiment never passes a "below" threshold
        let sentiment_below = |threshold: f64| sentiment.map_or(false, |s| s < threshold);

        if congestion > t.frustration_congestion && sentiment_below(t.frustration_sentiment) {
            (Priority::High, Advisory::DispatchWarden)
        } else if congestion > t.severe_congestion {
            (Priority::Medium, Advisory::CongestionAlert)
        } else if sentiment_below(t.negative_sentiment) {
            (Priority::High, Advisory::ReviewFeedback)
        } else {
            (Priority::Low, Advisory::Normal)
        }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(RecommendationThresholds::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
