use crate::store::{LocalStore, SessionMode};

/// Prompts used when a session carries no behavioral questions of its own
pub const DEFAULT_BEHAVIORAL_QUESTIONS: [&str; 8] = [
    "Tell me about yourself and your background.",
    "Describe a challenging project you worked on. What was your role?",
    "Tell me about a time you disagreed with a teammate. How did you handle it?",
    "Give me an example of when you had to learn something new quickly.",
    "Describe a situation where you had to make a decision with incomplete information.",
    "Tell me about a time you failed. What did you learn from it?",
    "How do you handle competing priorities and tight deadlines?",
    "Describe a time when you had to persuade someone to see things your way.",
];

pub fn default_questions() -> Vec<String> {
    DEFAULT_BEHAVIORAL_QUESTIONS
        .iter()
        .map(|q| q.to_string())
        .collect()
}

/// Behavioral prompts for a stored session, falling back to the default list
///
/// A session seeded from an email may carry a mixed question set; only
/// entries tagged behavioral are used. An unknown session id, a missing
/// question set, or a set with no behavioral entries all yield the defaults.
pub fn questions_for_session(store: &LocalStore, mode: SessionMode, session_id: &str) -> Vec<String> {
    if let Some(session) = store.get_session(mode, session_id) {
        let behavioral: Vec<String> = session
            .questions
            .iter()
            .filter(|q| q.is_behavioral())
            .map(|q| q.prompt.clone())
            .filter(|prompt| !prompt.is_empty())
            .collect();
        if !behavioral.is_empty() {
            return behavioral;
        }
    }
    default_questions()
}
