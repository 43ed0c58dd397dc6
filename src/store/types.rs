use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::interview::QuestionAnswer;
use crate::scoring::MetricsSnapshot;

/// Practice modes a session can run in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Quick,
    Full,
    Behavioral,
    System,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
            Self::Behavioral => "behavioral",
            Self::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "quick" => Some(Self::Quick),
            "full" => Some(Self::Full),
            "behavioral" => Some(Self::Behavioral),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One question attached to a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRef {
    pub id: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl QuestionRef {
    pub fn is_behavioral(&self) -> bool {
        if self.kind.as_deref() == Some("behavioral") {
            return true;
        }
        self.category
            .as_deref()
            .map(|c| c.contains("behavioral"))
            .unwrap_or(false)
    }
}

/// Structured result payload attached to a finished session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rubric {
    pub metrics: MetricsSnapshot,
    pub transcript: String,
    pub question_answers: Vec<QuestionAnswer>,
}

/// One interview attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub mode: SessionMode,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u64>,
    #[serde(default)]
    pub questions: Vec<QuestionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric: Option<Rubric>,
}

impl Session {
    pub fn new(id: String, mode: SessionMode, questions: Vec<QuestionRef>) -> Self {
        Self {
            id,
            mode,
            started_at: Utc::now(),
            ended_at: None,
            duration_min: None,
            questions,
            score: None,
            rubric: None,
        }
    }
}

/// Fields a finalization writes back onto a stored session
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_min: Option<u64>,
    pub score: Option<u32>,
    pub rubric: Option<Rubric>,
}

impl SessionPatch {
    pub fn apply(self, session: &mut Session) {
        if let Some(ended_at) = self.ended_at {
            session.ended_at = Some(ended_at);
        }
        if let Some(duration_min) = self.duration_min {
            session.duration_min = Some(duration_min);
        }
        if let Some(score) = self.score {
            session.score = Some(score);
        }
        if let Some(rubric) = self.rubric {
            session.rubric = Some(rubric);
        }
    }
}

/// Aggregate practice counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub completed: u64,
    pub avg_score: f64,
    pub practice_minutes: u64,
}

impl UserStats {
    /// Fold one finished session into the running aggregate
    pub fn record(&mut self, score: u32, duration_min: u64) {
        let total = self.avg_score * self.completed as f64 + score as f64;
        self.completed += 1;
        self.avg_score = total / self.completed as f64;
        self.practice_minutes += duration_min;
    }
}

/// Parsed-email plus generated-question bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySet {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub summary: StudySummary,
    pub parsed: Value,
    pub questions: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudySummary {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub interview_type: Option<String>,
}

/// Map a parsed interview type onto a session mode
pub fn mode_from_interview_type(interview_type: &str) -> SessionMode {
    let t = interview_type.to_lowercase();
    if t.contains("behavior") {
        SessionMode::Behavioral
    } else if t.contains("system") {
        SessionMode::System
    } else if t.contains("quick") {
        SessionMode::Quick
    } else {
        SessionMode::Full
    }
}

/// Bridge the question payload shapes produced upstream into `QuestionRef`s.
///
/// Accepts either `{ "questions": [...] }` or
/// `{ "categories": [{ "questions": [...] }] }`; entries may carry the prompt
/// under `prompt`, `title`, or `question`.
pub fn normalize_questions(generated: &Value) -> Vec<QuestionRef> {
    fn entry_to_ref(entry: &Value, index: usize) -> QuestionRef {
        let id = entry
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string());
        let prompt = ["prompt", "title", "question"]
            .iter()
            .find_map(|key| entry.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();
        QuestionRef {
            id,
            prompt,
            difficulty: None,
            kind: entry.get("type").and_then(Value::as_str).map(str::to_string),
            category: entry
                .get("category")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    if let Some(questions) = generated.get("questions").and_then(Value::as_array) {
        return questions
            .iter()
            .enumerate()
            .map(|(i, q)| entry_to_ref(q, i))
            .collect();
    }

    if let Some(categories) = generated.get("categories").and_then(Value::as_array) {
        let mut refs = Vec::new();
        for category in categories {
            if let Some(questions) = category.get("questions").and_then(Value::as_array) {
                for question in questions {
                    let index = refs.len();
                    refs.push(entry_to_ref(question, index));
                }
            }
        }
        return refs;
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_from_interview_type() {
        assert_eq!(
            mode_from_interview_type("Behavioral Interview"),
            SessionMode::Behavioral
        );
        assert_eq!(
            mode_from_interview_type("system design"),
            SessionMode::System
        );
        assert_eq!(mode_from_interview_type("quick screen"), SessionMode::Quick);
        assert_eq!(mode_from_interview_type("onsite"), SessionMode::Full);
    }

    #[test]
    fn test_normalize_flat_questions() {
        let generated = json!({
            "questions": [
                { "id": "q1", "prompt": "Tell me about a conflict." },
                { "title": "Walk me through your resume." }
            ]
        });
        let refs = normalize_questions(&generated);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id, "q1");
        assert_eq!(refs[1].id, "1");
        assert_eq!(refs[1].prompt, "Walk me through your resume.");
    }

    #[test]
    fn test_normalize_categorized_questions() {
        let generated = json!({
            "categories": [
                { "questions": [{ "question": "Why this company?" }] },
                { "questions": [{ "question": "Biggest failure?" }] }
            ]
        });
        let refs = normalize_questions(&generated);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].prompt, "Biggest failure?");
    }

    #[test]
    fn test_question_ref_behavioral_detection() {
        let by_kind = QuestionRef {
            id: "1".into(),
            prompt: "x".into(),
            difficulty: None,
            kind: Some("behavioral".into()),
            category: None,
        };
        let by_category = QuestionRef {
            id: "2".into(),
            prompt: "y".into(),
            difficulty: None,
            kind: None,
            category: Some("behavioral-leadership".into()),
        };
        let neither = QuestionRef {
            id: "3".into(),
            prompt: "z".into(),
            difficulty: None,
            kind: Some("technical".into()),
            category: None,
        };
        assert!(by_kind.is_behavioral());
        assert!(by_category.is_behavioral());
        assert!(!neither.is_behavioral());
    }

    #[test]
    fn test_user_stats_running_average() {
        let mut stats = UserStats::default();
        stats.record(80, 10);
        stats.record(60, 5);
        assert_eq!(stats.completed, 2);
        assert!((stats.avg_score - 70.0).abs() < 1e-9);
        assert_eq!(stats.practice_minutes, 15);
    }
}
