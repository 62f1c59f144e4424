// 📡 Live Traffic Source - Provider seam + TomTom Flow Segment client
//
// A live source answers one question: "what is traffic doing around this
// point right now?". Every way that can go wrong collapses into Unavailable,
// which the acquisition service treats identically (fall back, no retry).

use crate::config::LiveTrafficConfig;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const USER_AGENT: &str = concat!("smart-city-engine/", env!("CARGO_PKG_VERSION"));

/// Equatorial circumference in metres (tile width at zoom 0)
const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

const MAX_ZOOM: u8 = 22;

// ============================================================================
// QUERY + READING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveTrafficQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

/// What a provider reports for a road segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    pub current_speed_kmh: f64,
    pub free_flow_speed_kmh: f64,
    /// Provider-reported reliability, 0.0 ..= 1.0
    pub confidence: f64,
    pub road_closure: bool,
}

impl LiveReading {
    /// Reject readings that cannot be turned into a record
    pub fn validate(&self) -> std::result::Result<(), Unavailable> {
        let speeds_ok = [self.current_speed_kmh, self.free_flow_speed_kmh]
            .iter()
            .all(|s| s.is_finite() && *s >= 0.0);

        if !speeds_ok {
            return Err(Unavailable::Parse(format!(
                "invalid speeds: current={} free_flow={}",
                self.current_speed_kmh, self.free_flow_speed_kmh
            )));
        }
        if !self.confidence.is_finite() {
            return Err(Unavailable::Parse("confidence is not a number".to_string()));
        }
        Ok(())
    }
}

/// Why live data could not be used
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum Unavailable {
    /// Live fetching switched off (offline mode or no API key)
    #[error("live traffic disabled")]
    Disabled,

    #[error("timed out after {0} ms")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-success status
    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("unreadable response: {0}")]
    Parse(String),

    #[error("confidence {confidence} not above {threshold}")]
    LowConfidence { confidence: f64, threshold: f64 },

    #[error("road reported closed")]
    RoadClosure,
}

// ============================================================================
// SOURCE TRAIT
// ============================================================================

#[async_trait]
pub trait LiveTrafficSource: Send + Sync {
    /// Single attempt; the caller enforces the overall timeout
    async fn fetch(&self, query: &LiveTrafficQuery) -> std::result::Result<LiveReading, Unavailable>;

    /// False for sources that can never produce a reading
    fn is_available(&self) -> bool {
        true
    }
}

/// Source used when live data is switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineSource;

#[async_trait]
impl LiveTrafficSource for OfflineSource {
    async fn fetch(&self, _query: &LiveTrafficQuery) -> std::result::Result<LiveReading, Unavailable> {
        Err(Unavailable::Disabled)
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ============================================================================
// TOMTOM CLIENT
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowSegmentResponse {
    flow_segment_data: FlowSegmentData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlowSegmentData {
    current_speed: f64,
    free_flow_speed: f64,
    confidence: f64,
    road_closure: bool,
}

impl From<FlowSegmentData> for LiveReading {
    fn from(data: FlowSegmentData) -> Self {
        LiveReading {
            current_speed_kmh: data.current_speed,
            free_flow_speed_kmh: data.free_flow_speed,
            confidence: data.confidence,
            road_closure: data.road_closure,
        }
    }
}

/// TomTom Traffic Flow Segment Data (v4, absolute speeds in km/h)
pub struct TomTomClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout_ms: u64,
}

impl TomTomClient {
    pub fn new(config: &LiveTrafficConfig, api_key: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;

        Ok(TomTomClient {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Request URL for a query (zoom level derived from the search radius)
    pub fn url(&self, query: &LiveTrafficQuery) -> String {
        format!(
            "{}/traffic/services/4/flowSegmentData/absolute/{}/json?point={:.5},{:.5}&unit=KMPH&openLr=false&key={}",
            self.base_url,
            zoom_for_radius(query.radius_m),
            query.latitude,
            query.longitude,
            self.api_key
        )
    }
}

#[async_trait]
impl LiveTrafficSource for TomTomClient {
    async fn fetch(&self, query: &LiveTrafficQuery) -> std::result::Result<LiveReading, Unavailable> {
        let response = self
            .http_client
            .get(self.url(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Unavailable::Timeout(self.timeout_ms)
                } else {
                    // Don't echo the URL: it carries the API key
                    Unavailable::Transport(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Unavailable::Status(status.as_u16()));
        }

        let body: FlowSegmentResponse = response
            .json()
            .await
            .map_err(|e| Unavailable::Parse(e.without_url().to_string()))?;

        Ok(body.flow_segment_data.into())
    }
}

/// Map zoom level whose tile spans roughly the search diameter
pub fn zoom_for_radius(radius_m: f64) -> u8 {
    if !(radius_m.is_finite() && radius_m > 0.0) {
        return MAX_ZOOM;
    }
    let zoom = (EARTH_CIRCUMFERENCE_M / (2.0 * radius_m)).log2().floor();
    zoom.clamp(0.0, MAX_ZOOM as f64) as u8
}

// ============================================================================
// TESTS
// ============================================================================
