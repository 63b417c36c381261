//! Voice command classification
//!
//! Finalized transcripts are matched against two fixed vocabularies by
//! substring, so "going" counts as "go" and "please stop now" as "stop".

use std::fmt;

/// Words that ask the game to stop
pub const STOP_WORDS: [&str; 5] = ["stop", "pause", "halt", "freeze", "wait"];

/// Words that ask the game to start or resume
pub const START_WORDS: [&str; 6] = ["start", "go", "begin", "play", "continue", "resume"];

/// A classified voice command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Stop,
    Start,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("stop"),
            Self::Start => f.write_str("start"),
        }
    }
}

/// Classify a finalized transcript
///
/// Both vocabularies are checked independently, so one utterance can carry
/// both intents. Stop is always reported first.
#[must_use]
pub fn classify(transcript: &str) -> Vec<Intent> {
    let normalized = transcript.to_lowercase();
    let normalized = normalized.trim();

    let mut intents = Vec::with_capacity(2);
    if STOP_WORDS.iter().any(|word| normalized.contains(word)) {
        intents.push(Intent::Stop);
    }
    if START_WORDS.iter().any(|word| normalized.contains(word)) {
        intents.push(Intent::Start);
    }
    intents
}
