use serde::{Deserialize, Serialize};

use super::questions::default_questions;

/// Answer window per question, in seconds
pub const QUESTION_DURATION_SECS: u64 = 120;

/// Progress through the question list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    NotStarted,
    /// Answering the question at this index
    Answering(usize),
    Finished,
}

/// Where an advance landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Question(usize),
    Finished,
}

/// One closed answer window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    /// Transcript accumulated while the window was open
    pub answer: String,
    #[serde(rename = "duration")]
    pub duration_secs: u64,
}

/// Finite progression through a fixed question list
///
/// Each question gets a bounded answer window. A 1 Hz driver calls `tick`;
/// when the window is exhausted the sequencer performs the same transition a
/// manual advance does: it captures a `QuestionAnswer` and moves on. The last
/// advance lands on `Finished`, which is never left again.
pub struct QuestionSequencer {
    questions: Vec<String>,
    budget_secs: u64,
    state: SequencerState,
    remaining_secs: u64,
    answers: Vec<QuestionAnswer>,
}

impl QuestionSequencer {
    /// An empty question list falls back to the built-in default prompts
    pub fn new(questions: Vec<String>) -> Self {
        Self::with_budget(questions, QUESTION_DURATION_SECS)
    }

    pub fn with_budget(questions: Vec<String>, budget_secs: u64) -> Self {
        let questions = if questions.is_empty() {
            default_questions()
        } else {
            questions
        };
        let budget_secs = budget_secs.max(1);
        Self {
            questions,
            budget_secs,
            state: SequencerState::NotStarted,
            remaining_secs: budget_secs,
            answers: Vec::new(),
        }
    }

    /// Open the first question's answer window
    pub fn begin(&mut self) {
        if self.state == SequencerState::NotStarted {
            self.state = SequencerState::Answering(0);
            self.remaining_secs = self.budget_secs;
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == SequencerState::Finished
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            SequencerState::Answering(i) => Some(i),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_index().map(|i| self.questions[i].as_str())
    }

    pub fn question_at(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }

    pub fn remaining_secs(&self) -> u64 {
        match self.state {
            SequencerState::Answering(_) => self.remaining_secs,
            SequencerState::NotStarted => self.budget_secs,
            SequencerState::Finished => 0,
        }
    }

    /// 1 Hz driver: count down the open window, auto-advancing at zero
    pub fn tick(&mut self, transcript: &str) -> Option<Advance> {
        match self.state {
            SequencerState::Answering(_) => {
                self.remaining_secs = self.remaining_secs.saturating_sub(1);
                if self.remaining_secs == 0 {
                    Some(self.advance(transcript))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Close the current window, capturing the answer, and move on
    ///
    /// From the last question this lands on `Finished`; further calls are
    /// no-ops that report `Finished` again.
    pub fn advance(&mut self, transcript: &str) -> Advance {
        match self.state {
            SequencerState::NotStarted => {
                self.begin();
                Advance::Question(0)
            }
            SequencerState::Answering(i) => {
                let duration_secs = self.budget_secs - self.remaining_secs;
                self.answers.push(QuestionAnswer {
                    question: self.questions[i].clone(),
                    answer: transcript.to_string(),
                    duration_secs,
                });

                if i + 1 < self.questions.len() {
                    self.state = SequencerState::Answering(i + 1);
                    self.remaining_secs = self.budget_secs;
                    Advance::Question(i + 1)
                } else {
                    self.state = SequencerState::Finished;
                    self.remaining_secs = 0;
                    Advance::Finished
                }
            }
            SequencerState::Finished => Advance::Finished,
        }
    }

    pub fn answers(&self) -> &[QuestionAnswer] {
        &self.answers
    }

    pub fn take_answers(&mut self) -> Vec<QuestionAnswer> {
        std::mem::take(&mut self.answers)
    }
}
