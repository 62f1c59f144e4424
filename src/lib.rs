// Smart-City Feedback & Optimisation Engine - Core Library
// Exposes all modules for use in the CLI, embedding, and tests

pub mod config;
pub mod entities;
pub mod error;
pub mod feedback;       // Citizen feedback records, CSV loading, synthetic generator
pub mod fusion;         // Sentiment × traffic join + congestion score
pub mod pipeline;       // End-to-end run
pub mod recommendation; // Ordered first-match rule engine
pub mod report;         // Dashboard rows, CSV/JSON export
pub mod sentiment;      // Lexicon scorer
pub mod traffic;        // Live acquisition + synthetic fallback

// Re-export commonly used types
pub use config::{
    EngineConfig, FallbackConfig, FeedbackConfig, FusionConfig, LiveTrafficConfig,
    RecommendationThresholds, TrafficRange,
};
pub use entities::{Location, LocationRegistry, CITY_CENTER};
pub use error::{Error, Result};
pub use feedback::{load_feedback_csv, FeedbackChannel, FeedbackGenerator, FeedbackRecord};
pub use fusion::{congestion_score, FusedLocationRecord, FusionEngine};
pub use pipeline::{live_source, Pipeline};
pub use recommendation::{Advisory, Priority, Recommendation, RecommendationEngine};
pub use report::{DashboardRow, PipelineReport};
pub use sentiment::{score_feedback, LexiconScorer, ScoredFeedback, SentimentScore, SentimentScorer};
pub use traffic::{
    CongestionState, LiveReading, LiveTrafficQuery, LiveTrafficSource, OfflineSource,
    SyntheticTrafficGenerator, TomTomClient, TrafficAcquisitionService, TrafficProvenance,
    TrafficRecord, Unavailable,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
