// 🏙️ Pipeline - feedback + traffic → fusion → recommendations → report
//
//   feedback ──score──┐
//                     ├──fuse──classify──report
//   registry ─acquire─┘
//
// Only traffic acquisition is async (live fetches). Everything after it is a
// pure function of its inputs, so analyse() over frozen inputs is repeatable.

use crate::config::EngineConfig;
use crate::entities::LocationRegistry;
use crate::error::Result;
use crate::feedback::FeedbackRecord;
use crate::fusion::FusionEngine;
use crate::recommendation::RecommendationEngine;
use crate::report::PipelineReport;
use crate::sentiment::{score_feedback, LexiconScorer, SentimentScorer};
use crate::traffic::{
    LiveTrafficSource, OfflineSource, SyntheticTrafficGenerator, TomTomClient,
    TrafficAcquisitionService, TrafficRecord,
};
use std::sync::Arc;

/// Pick the live source: TomTom when enabled and keyed, offline otherwise
pub fn live_source(config: &EngineConfig, api_key: Option<String>) -> Result<Arc<dyn LiveTrafficSource>> {
    if !config.traffic.enabled {
        tracing::info!("Live traffic disabled, all traffic will be synthetic");
        return Ok(Arc::new(OfflineSource));
    }

    match api_key.filter(|key| !key.trim().is_empty()) {
        Some(key) => Ok(Arc::new(TomTomClient::new(&config.traffic, key)?)),
        None => {
            tracing::warn!("No TomTom API key configured, all traffic will be synthetic");
            Ok(Arc::new(OfflineSource))
        }
    }
}

pub struct Pipeline {
    registry: Arc<LocationRegistry>,
    scorer: Box<dyn SentimentScorer>,
    acquisition: TrafficAcquisitionService,
    fusion: FusionEngine,
    recommender: RecommendationEngine,
}

impl Pipeline {
    /// Validate the configuration and wire every stage (hotspots are checked
    /// against the registry by the fallback generator)
    pub fn new(
        config: &EngineConfig,
        registry: Arc<LocationRegistry>,
        source: Arc<dyn LiveTrafficSource>,
    ) -> Result<Self> {
        config.validate()?;

        let fallback = SyntheticTrafficGenerator::new(config.fallback.clone(), &registry, config.seed)?;

        Ok(Pipeline {
            registry,
            scorer: Box::new(LexiconScorer::default()),
            acquisition: TrafficAcquisitionService::new(config.traffic.clone(), source, fallback),
            fusion: FusionEngine::new(config.fusion.clone()),
            recommender: RecommendationEngine::new(config.rules.clone()),
        })
    }

    /// Swap the sentiment scorer
    pub fn with_scorer(mut self, scorer: Box<dyn SentimentScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    /// Acquire traffic for every registered location, then analyse
    pub async fn run(&self, feedback: &[FeedbackRecord]) -> Result<PipelineReport> {
        tracing::info!(
            locations = self.registry.len(),
            feedback = feedback.len(),
            "Starting pipeline run"
        );

        let traffic = self.acquisition.acquire_all(self.registry.all()).await;
        self.analyse(feedback, &traffic)
    }

    /// Score, fuse and classify already-gathered inputs
    pub fn analyse(&self, feedback: &[FeedbackRecord], traffic: &[TrafficRecord]) -> Result<PipelineReport> {
        let scored = score_feedback(self.scorer.as_ref(), feedback);
        let fused = self.fusion.fuse(&scored, traffic, &self.registry)?;
        let recommendations = self.recommender.classify_all(&fused);

        PipelineReport::build(&fused, &recommendations)
    }
}

// ============================================================================
// TESTS
// ============================================================================
