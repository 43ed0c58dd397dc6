// Tests for strict parsing of the scoring envelope

use mockview::scoring::ScoringEnvelope;

#[test]
fn test_full_envelope_parses() {
    let body = r#"{
        "ok": true,
        "data": {
            "metrics": {
                "speechClarity": 72, "toneConfidence": 68,
                "emotionalStability": 75, "eyeContact": 60,
                "expressions": 66, "engagement": 80
            },
            "transcript": "I led the migration project",
            "observations": "Calm and composed delivery.",
            "topStrength": "structured answers",
            "topWeakness": "limited eye contact"
        },
        "sessionId": "interview-1"
    }"#;

    let envelope: ScoringEnvelope = serde_json::from_str(body).unwrap();
    assert!(envelope.ok);
    assert_eq!(envelope.session_id, "interview-1");

    let obs = envelope.data.metrics.observation();
    assert_eq!(obs.speech_clarity, Some(72.0));
    assert_eq!(obs.engagement, Some(80.0));

    let insights = envelope.data.insights().expect("narrative fields present");
    assert_eq!(insights.top_strength, "structured answers");
    assert_eq!(insights.top_weakness, "limited eye contact");
}

#[test]
fn test_failure_envelope_parses_with_zeroed_metrics() {
    let body = r#"{
        "ok": false,
        "error": "Unable to analyze frame",
        "data": {
            "metrics": {
                "speechClarity": 0, "toneConfidence": 0,
                "emotionalStability": 0, "eyeContact": 0,
                "expressions": 0, "engagement": 0
            },
            "transcript": "",
            "observations": "Error: Unable to analyze. Check console logs.",
            "topStrength": "",
            "topWeakness": ""
        },
        "sessionId": ""
    }"#;

    let envelope: ScoringEnvelope = serde_json::from_str(body).unwrap();
    assert!(!envelope.ok);
    assert_eq!(envelope.error.as_deref(), Some("Unable to analyze frame"));

    // The zeros are well-formed; deciding not to apply them is the caller's
    // job, exercised in the live interview tests
    let obs = envelope.data.metrics.observation();
    assert_eq!(obs.speech_clarity, Some(0.0));
}

#[test]
fn test_minimal_envelope_defaults_optional_fields() {
    let body = r#"{ "ok": true }"#;

    let envelope: ScoringEnvelope = serde_json::from_str(body).unwrap();
    assert!(envelope.ok);
    assert!(envelope.error.is_none());
    assert!(envelope.data.transcript.is_none());
    assert!(envelope.data.insights().is_none());

    let obs = envelope.data.metrics.observation();
    assert_eq!(obs.speech_clarity, None);
    assert_eq!(obs.engagement, None);
}

#[test]
fn test_non_json_body_is_a_parse_failure() {
    let result = serde_json::from_str::<ScoringEnvelope>("Internal Server Error");
    assert!(result.is_err());
}

#[test]
fn test_numeric_strings_and_garbage_coexist() {
    let body = r#"{
        "ok": true,
        "data": {
            "metrics": {
                "speechClarity": "81.5",
                "toneConfidence": "strong",
                "engagement": 120
            }
        },
        "sessionId": "s"
    }"#;

    let envelope: ScoringEnvelope = serde_json::from_str(body).unwrap();
    let obs = envelope.data.metrics.observation();
    assert_eq!(obs.speech_clarity, Some(81.5));
    assert_eq!(obs.tone_confidence, None, "unparsable means no observation");
    assert_eq!(obs.engagement, Some(100.0), "clamped to the upper bound");
    assert_eq!(obs.eye_contact, None, "missing means no observation");
}
