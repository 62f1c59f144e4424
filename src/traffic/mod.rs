// Traffic acquisition: live provider, synthetic fallback, provenance-tagged records

pub mod acquisition;
pub mod live;
pub mod record;
pub mod synthetic;

pub use acquisition::TrafficAcquisitionService;
pub use live::{
    zoom_for_radius, LiveReading, LiveTrafficQuery, LiveTrafficSource, OfflineSource, TomTomClient,
    Unavailable,
};
pub use record::{CongestionState, TrafficProvenance, TrafficRecord};
pub use synthetic::SyntheticTrafficGenerator;
