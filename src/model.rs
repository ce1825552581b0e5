use serde::{Deserialize, Serialize};

/// Longest clip or segment offset accepted from a script or config (one day).
pub const MAX_CLIP_SECONDS: f64 = 86_400.0;

/// Highest frame rate accepted from a config.
pub const MAX_FPS: f64 = 1_000.0;

/// Stable identity of a resolved message (its position in the resolved stream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    A,
    B,
}

impl Sender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" | "a" => Some(Sender::A),
            "B" | "b" => Some(Sender::B),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sender::A => "A",
            Sender::B => "B",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Content,
    Media,
}

pub const DEFAULT_THEME: &str = "light";

/// A resolved script message, ready for scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    #[serde(default)]
    pub clip_duration_seconds: Option<f64>,
    pub conversation_id: u32,
    pub starts_conversation: bool,
    pub theme: String,
    #[serde(default)]
    pub kind: MessageKind,
}

impl Message {
    /// Clip length in seconds, only when synthesis produced a usable one.
    pub fn clip_seconds(&self) -> Option<f64> {
        self.clip_duration_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
    }

    pub fn has_clip(&self) -> bool {
        self.clip_seconds().is_some()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedMessage {
    pub message: Message,
    pub appear_frame: i64,
    pub duration_frames: i64,
}

impl TimedMessage {
    pub fn end_frame(&self) -> i64 {
        self.appear_frame.saturating_add(self.duration_frames)
    }
}

/// One fixed-height page of the conversation display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    pub messages: Vec<Message>,
    pub show_header_chrome: bool,
    pub theme: String,
    pub conversation_id: u32,
}

impl Screen {
    pub fn message_ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.messages.iter().map(|m| m.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenFrameRange {
    pub start_frame: i64,
    pub end_frame: i64,
}

impl ScreenFrameRange {
    pub fn duration_frames(&self) -> i64 {
        (self.end_frame - self.start_frame).max(0)
    }
}

/// A spliced sponsor line, placed on the absolute timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCue {
    pub text: String,
    #[serde(default)]
    pub sender: Option<Sender>,
    pub start_frame: i64,
    pub duration_frames: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPlacement {
    pub insert_after: usize,
    pub start_frame: i64,
    pub duration_frames: i64,
    pub cues: Vec<SegmentCue>,
}

impl SegmentPlacement {
    pub fn end_frame(&self) -> i64 {
        self.start_frame.saturating_add(self.duration_frames)
    }
}

/// The full render plan handed to the renderer and audio mixer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub fps: f64,
    pub timed_messages: Vec<TimedMessage>,
    pub screens: Vec<Screen>,
    pub screen_ranges: Vec<ScreenFrameRange>,
    #[serde(default)]
    pub segment: Option<SegmentPlacement>,
    pub total_frames: i64,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.timed_messages.is_empty()
    }

    pub fn duration_ms(&self) -> i64 {
        crate::formats::time::frames_to_ms(self.total_frames, self.fps)
    }

    pub fn timed(&self, id: MessageId) -> Option<&TimedMessage> {
        self.timed_messages.iter().find(|t| t.message.id == id)
    }
}
