pub mod local;
pub mod types;

pub use local::LocalStore;
pub use types::{
    mode_from_interview_type, normalize_questions, QuestionRef, Rubric, Session, SessionMode,
    SessionPatch, StudySet, StudySummary, UserStats,
};
