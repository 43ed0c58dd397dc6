use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::smoother::MetricObservation;

/// One sample uploaded to the scoring endpoint
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    pub session_id: String,
    /// JPEG-encoded camera frame (required by the endpoint)
    pub frame_jpeg: Vec<u8>,
    /// Most recent completed audio chunk, WAV-packaged
    pub audio_wav: Option<Vec<u8>>,
    /// Tail of the running transcript
    pub transcript_tail: String,
}

/// Envelope returned by the scoring endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub data: ScoringData,
    #[serde(rename = "sessionId", default)]
    pub session_id: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringData {
    #[serde(default)]
    pub metrics: RawMetrics,
    /// Speech-to-text of the uploaded audio chunk
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub observations: Option<String>,
    #[serde(rename = "topStrength", default)]
    pub top_strength: Option<String>,
    #[serde(rename = "topWeakness", default)]
    pub top_weakness: Option<String>,
}

/// Metric fields exactly as the endpoint sent them, before coercion.
///
/// The endpoint promises numbers but has been observed returning strings and
/// omitting fields, so each channel stays a raw JSON value until
/// `observation()` coerces it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetrics {
    #[serde(rename = "speechClarity", default)]
    pub speech_clarity: Option<Value>,
    #[serde(rename = "toneConfidence", default)]
    pub tone_confidence: Option<Value>,
    #[serde(rename = "emotionalStability", default)]
    pub emotional_stability: Option<Value>,
    #[serde(rename = "eyeContact", default)]
    pub eye_contact: Option<Value>,
    #[serde(rename = "expressions", default)]
    pub expressions: Option<Value>,
    #[serde(rename = "engagement", default)]
    pub engagement: Option<Value>,
}

impl RawMetrics {
    /// Coerce each channel to a clamped number; unparsable or missing
    /// channels become "no observation"
    pub fn observation(&self) -> MetricObservation {
        MetricObservation {
            speech_clarity: coerce_metric(self.speech_clarity.as_ref()),
            tone_confidence: coerce_metric(self.tone_confidence.as_ref()),
            emotional_stability: coerce_metric(self.emotional_stability.as_ref()),
            eye_contact: coerce_metric(self.eye_contact.as_ref()),
            expressions: coerce_metric(self.expressions.as_ref()),
            engagement: coerce_metric(self.engagement.as_ref()),
        }
    }
}

fn coerce_metric(value: Option<&Value>) -> Option<f64> {
    let num = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !num.is_finite() {
        return None;
    }
    Some(num.clamp(0.0, 100.0))
}

/// Narrative feedback carried alongside the metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveInsights {
    pub observations: String,
    pub top_strength: String,
    pub top_weakness: String,
}

impl ScoringData {
    /// Narrative fields, if the endpoint sent any
    pub fn insights(&self) -> Option<LiveInsights> {
        if self.observations.is_none() && self.top_strength.is_none() && self.top_weakness.is_none()
        {
            return None;
        }
        Some(LiveInsights {
            observations: self.observations.clone().unwrap_or_default(),
            top_strength: self.top_strength.clone().unwrap_or_default(),
            top_weakness: self.top_weakness.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_metric_accepts_numbers_and_numeric_strings() {
        assert_eq!(coerce_metric(Some(&json!(72.5))), Some(72.5));
        assert_eq!(coerce_metric(Some(&json!("88"))), Some(88.0));
        assert_eq!(coerce_metric(Some(&json!(" 42.5 "))), Some(42.5));
    }

    #[test]
    fn test_coerce_metric_clamps_out_of_range() {
        assert_eq!(coerce_metric(Some(&json!(-50))), Some(0.0));
        assert_eq!(coerce_metric(Some(&json!(250))), Some(100.0));
    }

    #[test]
    fn test_coerce_metric_rejects_garbage() {
        assert_eq!(coerce_metric(None), None);
        assert_eq!(coerce_metric(Some(&json!("excellent"))), None);
        assert_eq!(coerce_metric(Some(&json!(null))), None);
        assert_eq!(coerce_metric(Some(&json!([1, 2]))), None);
        assert_eq!(coerce_metric(Some(&json!("NaN"))), None);
    }

    #[test]
    fn test_envelope_parses_partial_metrics() {
        let body = json!({
            "ok": true,
            "data": {
                "metrics": { "speechClarity": 70, "engagement": "65" },
                "transcript": "so my background is"
            },
            "sessionId": "abc"
        });
        let envelope: ScoringEnvelope = serde_json::from_value(body).unwrap();
        assert!(envelope.ok);
        let obs = envelope.data.metrics.observation();
        assert_eq!(obs.speech_clarity, Some(70.0));
        assert_eq!(obs.engagement, Some(65.0));
        assert_eq!(obs.eye_contact, None);
        assert_eq!(envelope.data.transcript.as_deref(), Some("so my background is"));
    }

    #[test]
    fn test_insights_absent_when_no_narrative_fields() {
        let data = ScoringData::default();
        assert!(data.insights().is_none());
    }
}
