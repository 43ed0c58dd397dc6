use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{MockviewError, Result};

use super::types::{
    mode_from_interview_type, normalize_questions, QuestionRef, Session, SessionMode,
    SessionPatch, StudySet, StudySummary, UserStats,
};

const STATS_KEY: &str = "mv.stats";
const SESSIONS_KEY: &str = "mv.sessions";
const STUDY_KEY: &str = "mv.studySets";

/// Recency caps for the session and study-set lists
const LIST_CAP: usize = 10;

type SessionMap = HashMap<SessionMode, Vec<Session>>;

/// Single-writer JSON key-value store
///
/// Each key is one JSON file under the data directory. All mutation goes
/// through one mutex, so a read-modify-write (stats update, session patch)
/// can never interleave with another writer in the same process. Reads of a
/// missing or corrupt key return the fallback value rather than an error.
pub struct LocalStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let path = self.key_path(key);
        let Ok(bytes) = fs::read(&path) else {
            return fallback;
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!("Discarding unreadable value for {}: {}", key, e);
                fallback
            }
        }
    }

    /// Whole-value write: temp file then rename
    fn write_key<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.key_path(key);
        let tmp = self.data_dir.join(format!("{key}.json.tmp"));
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| MockviewError::Storage {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // UserStats
    // ------------------------------------------------------------------

    pub fn user_stats(&self) -> UserStats {
        let _guard = self.guard();
        self.read_key(STATS_KEY, UserStats::default())
    }

    pub fn set_user_stats(&self, stats: UserStats) -> Result<()> {
        let _guard = self.guard();
        self.write_key(STATS_KEY, &stats)
    }

    /// Fold one finished session into the aggregate counters
    pub fn record_completion(&self, score: u32, duration_min: u64) -> Result<UserStats> {
        let _guard = self.guard();
        let mut stats: UserStats = self.read_key(STATS_KEY, UserStats::default());
        stats.record(score, duration_min);
        self.write_key(STATS_KEY, &stats)?;
        Ok(stats)
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    /// Sessions for a mode, most recent first
    pub fn sessions(&self, mode: SessionMode) -> Vec<Session> {
        let _guard = self.guard();
        let map: SessionMap = self.read_key(SESSIONS_KEY, SessionMap::new());
        let mut list = map.get(&mode).cloned().unwrap_or_default();
        list.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        list
    }

    pub fn get_session(&self, mode: SessionMode, id: &str) -> Option<Session> {
        self.sessions(mode).into_iter().find(|s| s.id == id)
    }

    /// Prepend a session to its mode's recency list, aging out past the cap
    pub fn push_session(&self, session: Session) -> Result<()> {
        let _guard = self.guard();
        let mut map: SessionMap = self.read_key(SESSIONS_KEY, SessionMap::new());
        let list = map.entry(session.mode).or_default();
        list.insert(0, session);
        list.truncate(LIST_CAP);
        self.write_key(SESSIONS_KEY, &map)
    }

    /// Patch an existing session in place; returns false when the id is unknown
    pub fn update_session(
        &self,
        mode: SessionMode,
        id: &str,
        patch: SessionPatch,
    ) -> Result<bool> {
        let _guard = self.guard();
        let mut map: SessionMap = self.read_key(SESSIONS_KEY, SessionMap::new());
        let Some(list) = map.get_mut(&mode) else {
            return Ok(false);
        };
        let Some(session) = list.iter_mut().find(|s| s.id == id) else {
            return Ok(false);
        };
        patch.apply(session);
        self.write_key(SESSIONS_KEY, &map)?;
        Ok(true)
    }

    /// Create a session record from a parsed interview email and a generated
    /// question payload; up to 8 questions extracted from the email itself
    /// override the generated ones
    pub fn create_session_from_email(
        &self,
        parsed: &Value,
        generated: &Value,
    ) -> Result<(SessionMode, String)> {
        let interview_type = parsed
            .get("interview_type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mode = mode_from_interview_type(interview_type);
        let id = Uuid::new_v4().to_string();

        let mut questions = normalize_questions(generated);
        let email_questions: Vec<&str> = parsed
            .get("extracted_questions")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(Value::as_str).take(8).collect())
            .unwrap_or_default();
        if !email_questions.is_empty() {
            questions = email_questions
                .iter()
                .enumerate()
                .map(|(i, q)| QuestionRef {
                    id: format!("seed-{}", i + 1),
                    prompt: (*q).to_string(),
                    difficulty: None,
                    kind: None,
                    category: None,
                })
                .collect();
        }

        self.push_session(Session::new(id.clone(), mode, questions))?;
        Ok((mode, id))
    }

    // ------------------------------------------------------------------
    // Study sets
    // ------------------------------------------------------------------

    pub fn study_sets(&self) -> Vec<StudySet> {
        let _guard = self.guard();
        self.read_key(STUDY_KEY, Vec::new())
    }

    pub fn push_study_set(&self, set: StudySet) -> Result<()> {
        let _guard = self.guard();
        let mut list: Vec<StudySet> = self.read_key(STUDY_KEY, Vec::new());
        list.insert(0, set);
        list.truncate(LIST_CAP);
        self.write_key(STUDY_KEY, &list)
    }

    pub fn clear_study_sets(&self) -> Result<()> {
        let _guard = self.guard();
        self.write_key(STUDY_KEY, &Vec::<StudySet>::new())
    }

    /// Bundle a parsed email and its generated questions into a study set
    pub fn push_study_bundle(&self, parsed: Value, questions: Value) -> Result<StudySet> {
        let summary = StudySummary {
            company: parsed
                .get("company")
                .and_then(Value::as_str)
                .map(str::to_string),
            position: parsed
                .get("position")
                .and_then(Value::as_str)
                .map(str::to_string),
            interview_type: parsed
                .get("interview_type")
                .and_then(Value::as_str)
                .map(str::to_string),
        };
        let set = StudySet {
            id: Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now(),
            summary,
            parsed,
            questions,
        };
        self.push_study_set(set.clone())?;
        Ok(set)
    }
}
