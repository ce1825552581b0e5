use thiserror::Error;

use crate::model::MessageId;

/// Configuration rejected before any scheduling happens.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("fps must be a positive finite number no larger than 1000, got {0}")]
    InvalidFps(f64),

    #[error("chars_per_second must be a positive finite number, got {0}")]
    InvalidReadingSpeed(f64),

    #[error("{field} must not be negative, got {value}")]
    NegativeFrames { field: &'static str, value: i64 },

    #[error("{field} must be at most {max}, got {value}")]
    TooManyFrames {
        field: &'static str,
        value: i64,
        max: i64,
    },

    #[error("layout.chars_per_line must be at least 1")]
    ZeroCharsPerLine,

    #[error("segment line '{text}' has invalid clip duration {seconds}")]
    InvalidSegmentClip { text: String, seconds: f64 },

    #[error("single-reply start offset must be a non-negative number, got {0}")]
    InvalidReplyStart(f64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    #[error("line {line}: unknown directive '{name}'")]
    UnknownDirective { line: usize, name: String },

    #[error("line {line}: directive '{name}' requires a value")]
    MissingValue { line: usize, name: String },

    #[error("line {line}: unknown sender '{sender}' (expected A or B)")]
    BadSender { line: usize, sender: String },

    #[error("line {line}: expected 'SENDER: text'")]
    MalformedLine { line: usize },

    #[error("line {line}: bad clip duration '{raw}'")]
    BadClipDuration { line: usize, raw: String },
}

/// Internal post-condition failures detected after pagination or timing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleInvariantError {
    #[error("pagination emitted {actual} messages for {expected} inputs")]
    MessageCountMismatch { expected: usize, actual: usize },

    #[error("pagination emitted an empty screen at index {screen} ({input_len} inputs)")]
    EmptyScreen { screen: usize, input_len: usize },

    #[error("screen order diverges from source order at message {expected:?} (found {found:?})")]
    OrderMismatch { expected: MessageId, found: MessageId },

    #[error("screen {screen} has negative range {start_frame}..{end_frame}")]
    NegativeRange {
        screen: usize,
        start_frame: i64,
        end_frame: i64,
    },

    #[error("screen {screen} starts at {start_frame} before previous screen ends at {previous_end}")]
    OverlappingRange {
        screen: usize,
        start_frame: i64,
        previous_end: i64,
    },

    #[error("message {id:?} appears at negative frame {frame}")]
    NegativeFrame { id: MessageId, frame: i64 },

    #[error("message {id:?} appears at {appear_frame}, before its predecessor at {previous_frame}")]
    NonMonotonic {
        id: MessageId,
        appear_frame: i64,
        previous_frame: i64,
    },

    #[error("message {id:?} has no timing entry")]
    MissingTiming { id: MessageId },
}
