use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub capture: CaptureConfig,
    pub scoring: ScoringConfig,
    pub interview: InterviewConfig,
    pub storage: StorageConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    pub video_width: u32,
    pub video_height: u32,
    /// JPEG quality for sampled frames (0-100)
    pub jpeg_quality: u8,
    /// Duration of each rolling audio chunk
    pub chunk_duration_ms: u64,
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Endpoint that receives the multipart (frame, audio, transcript) upload
    pub endpoint_url: String,
    /// Interval between frame samples
    pub sample_interval_ms: u64,
    /// Tail of the running transcript sent with each sample
    pub transcript_tail_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterviewConfig {
    /// Answer window per question, in seconds
    pub question_duration_secs: u64,
    /// EMA weight applied to fresh metric observations
    pub smoothing_alpha: f64,
    /// Number of smoothed snapshots retained for the history display
    pub metric_history_cap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        let mut cfg: Config = settings.try_deserialize()?;

        // BACKEND_URL env var overrides the configured proxy target
        if let Ok(url) = std::env::var("BACKEND_URL") {
            cfg.backend.base_url = url;
        }

        Ok(cfg)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "mockview".to_string(),
                http: HttpConfig {
                    bind: "127.0.0.1".to_string(),
                    port: 8090,
                },
            },
            capture: CaptureConfig {
                video_width: 640,
                video_height: 360,
                jpeg_quality: 70,
                chunk_duration_ms: 2000,
                sample_rate: 16000,
                channels: 1,
            },
            scoring: ScoringConfig {
                endpoint_url: "http://localhost:8000/behavioral/stream".to_string(),
                sample_interval_ms: 2000,
                transcript_tail_chars: 1000,
            },
            interview: InterviewConfig {
                question_duration_secs: 120,
                smoothing_alpha: 0.4,
                metric_history_cap: 90,
            },
            storage: StorageConfig {
                data_path: "data".to_string(),
            },
            backend: BackendConfig {
                base_url: "http://localhost:8000".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_tuning() {
        let cfg = Config::default();
        assert_eq!(cfg.capture.video_width, 640);
        assert_eq!(cfg.capture.video_height, 360);
        assert_eq!(cfg.scoring.sample_interval_ms, 2000);
        assert_eq!(cfg.interview.question_duration_secs, 120);
        assert!((cfg.interview.smoothing_alpha - 0.4).abs() < f64::EPSILON);
        assert_eq!(cfg.interview.metric_history_cap, 90);
    }
}
