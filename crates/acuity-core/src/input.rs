//! Mapping raw user input to directions.
//!
//! Two sources: single key characters (`hjkl`, `wasd`) and free-form
//! transcripts from speech recognition or typed text. Anything unrecognized
//! maps to `None` and never reaches the engine.

use crate::optotype::Direction;

/// Word lists checked in order. Earlier entries win when a transcript
/// mentions more than one direction.
const TRANSCRIPT_VOCABULARY: [(Direction, &[&str], &[&str]); 4] = [
    (Direction::Up, &["up", "top", "upward", "above"], &["上", "うえ"]),
    (Direction::Down, &["down", "bottom", "downward", "below"], &["下", "した"]),
    (Direction::Left, &["left"], &["左", "ひだり"]),
    (Direction::Right, &["right"], &["右", "みぎ"]),
];

/// Direction named in a recognized transcript, if any.
///
/// English words match whole words case-insensitively. Japanese terms match
/// anywhere in the text since recognizers do not insert word breaks.
/// Precedence is up, down, left, right.
pub fn direction_from_transcript(transcript: &str) -> Option<Direction> {
    let lowered = transcript.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    TRANSCRIPT_VOCABULARY
        .iter()
        .find(|(_, english, japanese)| {
            english.iter().any(|e| words.contains(e)) || japanese.iter().any(|j| lowered.contains(j))
        })
        .map(|(direction, _, _)| *direction)
}

/// Direction bound to a single key, vi-style or WASD.
pub fn direction_from_key(c: char) -> Option<Direction> {
    match c.to_ascii_lowercase() {
        'k' | 'w' => Some(Direction::Up),
        'j' | 's' => Some(Direction::Down),
        'h' | 'a' => Some(Direction::Left),
        'l' | 'd' => Some(Direction::Right),
        _ => None,
    }
}
