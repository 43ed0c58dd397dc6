pub mod config;
pub mod error;
pub mod http;
pub mod interview;
pub mod media;
pub mod scoring;
pub mod store;

pub use config::Config;
pub use error::MockviewError;
pub use http::{create_router, AppState};
pub use interview::{
    behavioral_score, duration_minutes, Advance, LiveConfig, LiveInterview, LiveStats,
    QuestionAnswer, QuestionSequencer, SequencerState, DEFAULT_BEHAVIORAL_QUESTIONS,
};
pub use media::{
    AudioChunk, ChunkPolicy, MediaBackend, MediaBackendConfig, MediaBackendFactory, MediaCapture,
    MediaFrame, MediaSource, RollingChunker, SyntheticBackend, VideoFrame,
};
pub use scoring::{
    HttpScoringClient, LiveInsights, MetricObservation, MetricSmoother, MetricsSnapshot,
    ScoringBackend, ScoringEnvelope, ScoringRequest,
};
pub use store::{LocalStore, Rubric, Session, SessionMode, SessionPatch, StudySet, UserStats};
