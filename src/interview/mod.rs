pub mod live;
pub mod questions;
pub mod sequencer;

pub use live::{behavioral_score, duration_minutes, LiveConfig, LiveInterview, LiveStats};
pub use questions::{default_questions, questions_for_session, DEFAULT_BEHAVIORAL_QUESTIONS};
pub use sequencer::{
    Advance, QuestionAnswer, QuestionSequencer, SequencerState, QUESTION_DURATION_SECS,
};
