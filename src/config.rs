use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::{
    error::ConfigError,
    model::{MAX_CLIP_SECONDS, MAX_FPS, Sender},
    timeline::estimate::MAX_FRAMES,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: Logging,
    pub timing: Timing,
    pub layout: Layout,
    pub output: Output,
    pub monetization: Option<Monetization>,
}

impl Config {
    pub fn load(path_opt: Option<&Path>) -> Result<Self> {
        let default_path = Path::new("threadcast.toml");
        let path = if let Some(p) = path_opt {
            Some(p)
        } else if default_path.exists() {
            Some(default_path)
        } else {
            None
        };

        let mut cfg = Config::default();

        if let Some(path) = path {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed reading config file: {}", path.display()))?;
            let parsed: Config = toml::from_str(&raw)
                .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
            cfg = parsed;
        }

        Ok(cfg)
    }

    pub fn to_toml_pretty(&self) -> Result<String> {
        let s = toml::to_string_pretty(self).context("failed serializing config as TOML")?;
        Ok(s)
    }

    /// Reject configurations the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timing;
        if !t.fps.is_finite() || t.fps <= 0.0 || t.fps > MAX_FPS {
            return Err(ConfigError::InvalidFps(t.fps));
        }
        if !t.chars_per_second.is_finite() || t.chars_per_second <= 0.0 {
            return Err(ConfigError::InvalidReadingSpeed(t.chars_per_second));
        }

        let frame_fields = [
            ("timing.initial_delay_frames", t.initial_delay_frames),
            ("timing.inter_message_gap_frames", t.inter_message_gap_frames),
            ("timing.trailing_buffer_frames", t.trailing_buffer_frames),
            ("timing.min_visible_frames", t.min_visible_frames),
            ("timing.intro_frames", t.intro_frames),
            ("timing.outro_frames", t.outro_frames),
        ];
        for (field, value) in frame_fields {
            check_frames(field, value)?;
        }

        if self.layout.chars_per_line == 0 {
            return Err(ConfigError::ZeroCharsPerLine);
        }

        if let Some(m) = &self.monetization {
            m.validate()?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub format: String,
    pub debug_message_samples: usize,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            debug_message_samples: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub fps: f64,
    pub chars_per_second: f64,
    pub initial_delay_frames: i64,
    pub inter_message_gap_frames: i64,
    pub trailing_buffer_frames: i64,
    pub prefer_clip_duration: bool,
    /// Floor for how long the final message stays on screen.
    pub min_visible_frames: i64,
    pub intro_enabled: bool,
    pub intro_frames: i64,
    pub outro_enabled: bool,
    pub outro_frames: i64,
    /// Reserve the outro before the first clip of each new conversation.
    pub outro_on_conversation_change: bool,
    /// Also reserve it when that conversation begins right after a sponsor segment.
    pub outro_after_segment: bool,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            fps: 30.0,
            chars_per_second: 18.0,
            initial_delay_frames: 0,
            inter_message_gap_frames: 10,
            trailing_buffer_frames: 30,
            prefer_clip_duration: true,
            min_visible_frames: 15,
            intro_enabled: false,
            intro_frames: 15,
            outro_enabled: false,
            outro_frames: 20,
            outro_on_conversation_change: true,
            outro_after_segment: false,
        }
    }
}

impl Timing {
    /// Start of the first message, after the optional intro animation.
    pub fn lead_in_frames(&self) -> i64 {
        let intro = if self.intro_enabled { self.intro_frames } else { 0 };
        self.initial_delay_frames.saturating_add(intro)
    }

    pub fn effective_outro_frames(&self) -> i64 {
        if self.outro_enabled { self.outro_frames } else { 0 }
    }

    /// Pause inserted before a clip that opens a new conversation.
    pub fn conversation_outro_frames(&self) -> i64 {
        if self.outro_on_conversation_change {
            self.effective_outro_frames()
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub screen_height: u32,
    pub header_height: u32,
    pub header_once_per_conversation: bool,
    pub chars_per_line: u32,
    pub line_height: u32,
    pub bubble_padding: u32,
    pub tail_allowance: u32,
    pub message_gap: u32,
    pub group_margin: u32,
    pub group_gap: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            screen_height: 1500,
            header_height: 160,
            header_once_per_conversation: false,
            chars_per_line: 28,
            line_height: 42,
            bubble_padding: 28,
            tail_allowance: 10,
            message_gap: 8,
            group_margin: 18,
            group_gap: 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    /// "frames" or "seconds" for the JSON export.
    pub time_units: String,
    pub wrapped: bool,
    pub srt_wrap_width: usize,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            time_units: "frames".to_string(),
            wrapped: true,
            srt_wrap_width: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentLine {
    pub text: String,
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub clip_duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SegmentShape {
    Exchange {
        #[serde(default)]
        exchange_gap_frames: i64,
        #[serde(default)]
        lines: Vec<SegmentLine>,
    },
    SingleReply {
        reply_start_seconds: f64,
        reply: SegmentLine,
    },
}

/// Sponsored segment content and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monetization {
    pub insert_after: usize,
    #[serde(default)]
    pub gap_frames: i64,
    pub intro: SegmentLine,
    pub shape: SegmentShape,
}

impl Monetization {
    fn validate(&self) -> Result<(), ConfigError> {
        check_frames("monetization.gap_frames", self.gap_frames)?;
        check_line_clip(&self.intro)?;
        match &self.shape {
            SegmentShape::Exchange {
                exchange_gap_frames,
                lines,
            } => {
                check_frames(
                    "monetization.shape.exchange_gap_frames",
                    *exchange_gap_frames,
                )?;
                lines.iter().try_for_each(check_line_clip)
            }
            SegmentShape::SingleReply {
                reply_start_seconds,
                reply,
            } => {
                if !(0.0..=MAX_CLIP_SECONDS).contains(reply_start_seconds) {
                    return Err(ConfigError::InvalidReplyStart(*reply_start_seconds));
                }
                check_line_clip(reply)
            }
        }
    }
}

fn check_frames(field: &'static str, value: i64) -> Result<(), ConfigError> {
    if value < 0 {
        return Err(ConfigError::NegativeFrames { field, value });
    }
    if value > MAX_FRAMES {
        return Err(ConfigError::TooManyFrames {
            field,
            value,
            max: MAX_FRAMES,
        });
    }
    Ok(())
}

fn check_line_clip(line: &SegmentLine) -> Result<(), ConfigError> {
    match line.clip_duration_seconds {
        Some(s) if !(s > 0.0 && s <= MAX_CLIP_SECONDS) => Err(ConfigError::InvalidSegmentClip {
            text: line.text.clone(),
            seconds: s,
        }),
        _ => Ok(()),
    }
}

pub fn init_tracing(logging: &Logging, cli_override_level: Option<&str>) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = cli_override_level.unwrap_or(logging.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let is_json = logging.format.to_lowercase() == "json";

    if is_json {
        fmt()
            .with_env_filter(filter)
            .event_format(fmt::format().json())
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .pretty()
            .init();
    }

    tracing::info!(
        level = level,
        format = logging.format.as_str(),
        "logging initialized"
    );

    Ok(())
}
