use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// EMA weight applied to fresh observations
pub const SMOOTHING_ALPHA: f64 = 0.4;

/// Snapshots retained for the history display
pub const METRIC_HISTORY_CAP: usize = 90;

/// Six smoothed performance channels, each always within [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub speech_clarity: f64,
    pub tone_confidence: f64,
    pub emotional_stability: f64,
    pub eye_contact: f64,
    pub expressions: f64,
    pub engagement: f64,
}

/// A raw observation; channels the scorer did not report stay `None`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricObservation {
    pub speech_clarity: Option<f64>,
    pub tone_confidence: Option<f64>,
    pub emotional_stability: Option<f64>,
    pub eye_contact: Option<f64>,
    pub expressions: Option<f64>,
    pub engagement: Option<f64>,
}

/// Exponential smoothing over the metric channels
///
/// Each update blends the previous snapshot with the fresh observation at
/// weight alpha. A missing channel falls back to its previous value, so the
/// snapshot never grows a hole. Every computed snapshot is appended to a
/// bounded history buffer used only for display.
pub struct MetricSmoother {
    alpha: f64,
    snapshot: MetricsSnapshot,
    history: VecDeque<MetricsSnapshot>,
    history_cap: usize,
}

impl MetricSmoother {
    pub fn new() -> Self {
        Self::with_tuning(SMOOTHING_ALPHA, METRIC_HISTORY_CAP)
    }

    pub fn with_tuning(alpha: f64, history_cap: usize) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            snapshot: MetricsSnapshot::default(),
            history: VecDeque::new(),
            history_cap: history_cap.max(1),
        }
    }

    /// Blend a fresh observation into the snapshot and return the result
    pub fn observe(&mut self, raw: MetricObservation) -> MetricsSnapshot {
        let prev = self.snapshot;
        let next = MetricsSnapshot {
            speech_clarity: blend(self.alpha, prev.speech_clarity, raw.speech_clarity),
            tone_confidence: blend(self.alpha, prev.tone_confidence, raw.tone_confidence),
            emotional_stability: blend(
                self.alpha,
                prev.emotional_stability,
                raw.emotional_stability,
            ),
            eye_contact: blend(self.alpha, prev.eye_contact, raw.eye_contact),
            expressions: blend(self.alpha, prev.expressions, raw.expressions),
            engagement: blend(self.alpha, prev.engagement, raw.engagement),
        };

        self.snapshot = next;
        self.history.push_back(next);
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }

        next
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot
    }

    pub fn history(&self) -> &VecDeque<MetricsSnapshot> {
        &self.history
    }
}

impl Default for MetricSmoother {
    fn default() -> Self {
        Self::new()
    }
}

fn blend(alpha: f64, prev: f64, observed: Option<f64>) -> f64 {
    // Non-finite observations count as missing
    let value = match observed {
        Some(v) if v.is_finite() => v.clamp(0.0, 100.0),
        _ => prev,
    };
    ((1.0 - alpha) * prev + alpha * value).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(value: f64) -> MetricObservation {
        MetricObservation {
            speech_clarity: Some(value),
            tone_confidence: Some(value),
            emotional_stability: Some(value),
            eye_contact: Some(value),
            expressions: Some(value),
            engagement: Some(value),
        }
    }

    #[test]
    fn test_blend_weights_new_observation() {
        let mut smoother = MetricSmoother::new();
        smoother.observe(uniform(100.0));
        // 0.6 * 0 + 0.4 * 100
        assert!((smoother.snapshot().speech_clarity - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_channel_keeps_previous_value() {
        let mut smoother = MetricSmoother::new();
        smoother.observe(uniform(50.0));
        let before = smoother.snapshot();

        smoother.observe(MetricObservation {
            engagement: Some(80.0),
            ..Default::default()
        });

        let after = smoother.snapshot();
        assert!((after.speech_clarity - before.speech_clarity).abs() < 1e-9);
        assert!(after.engagement > before.engagement);
    }

    #[test]
    fn test_non_finite_observation_treated_as_missing() {
        let mut smoother = MetricSmoother::new();
        smoother.observe(uniform(60.0));
        let before = smoother.snapshot();

        smoother.observe(MetricObservation {
            speech_clarity: Some(f64::NAN),
            ..Default::default()
        });

        let after = smoother.snapshot();
        assert!(after.speech_clarity.is_finite());
        assert!((after.speech_clarity - before.speech_clarity).abs() < 1e-9);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut smoother = MetricSmoother::with_tuning(0.4, 5);
        for i in 0..20 {
            smoother.observe(uniform(i as f64));
        }
        assert_eq!(smoother.history().len(), 5);
    }
}
