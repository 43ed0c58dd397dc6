pub mod client;
pub mod messages;
pub mod smoother;

pub use client::{HttpScoringClient, ScoringBackend};
pub use messages::{LiveInsights, RawMetrics, ScoringData, ScoringEnvelope, ScoringRequest};
pub use smoother::{
    MetricObservation, MetricSmoother, MetricsSnapshot, METRIC_HISTORY_CAP, SMOOTHING_ALPHA,
};
