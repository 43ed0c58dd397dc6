pub mod backend;
pub mod capture;
pub mod chunk;
pub mod frame;

pub use backend::{
    AudioChunk, MediaBackend, MediaBackendConfig, MediaBackendFactory, MediaFrame, MediaSource,
    SyntheticBackend, VideoFrame,
};
pub use capture::MediaCapture;
pub use chunk::{encode_wav, ChunkPolicy, RollingChunker};
pub use frame::encode_jpeg;
