//! Frame-duration and pixel-height estimates for single messages and bubble groups.

use crate::{config::Layout, model::Message};

/// Products like `0.1 * 30.0` land a hair above the integer they mean.
const FRAME_EPSILON: f64 = 1e-9;

/// Ceiling for any single duration, far above a real video and far below
/// the point where summing a long script could overflow.
pub const MAX_FRAMES: i64 = 1 << 40;

pub fn seconds_to_frames(seconds: f64, fps: f64) -> i64 {
    ceil_frames(seconds * fps)
}

/// Frames needed to read `chars` characters at `chars_per_second`.
pub fn reading_frames(chars: usize, fps: f64, chars_per_second: f64) -> i64 {
    if chars == 0 {
        return 0;
    }
    ceil_frames(chars as f64 / chars_per_second * fps)
}

/// Duration of a text line, preferring a known clip length when asked to.
pub fn line_frames(
    text: &str,
    clip_seconds: Option<f64>,
    fps: f64,
    chars_per_second: f64,
    prefer_clip_duration: bool,
) -> i64 {
    match clip_seconds.filter(|s| s.is_finite() && *s > 0.0) {
        Some(seconds) if prefer_clip_duration => seconds_to_frames(seconds, fps),
        _ => reading_frames(text.chars().count(), fps, chars_per_second),
    }
}

pub fn estimate_frames(
    message: &Message,
    fps: f64,
    chars_per_second: f64,
    prefer_clip_duration: bool,
) -> i64 {
    line_frames(
        &message.text,
        message.clip_duration_seconds,
        fps,
        chars_per_second,
        prefer_clip_duration,
    )
}

fn ceil_frames(raw: f64) -> i64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    ((raw - FRAME_EPSILON).ceil().max(0.0) as i64).min(MAX_FRAMES)
}

pub fn message_height(message: &Message, layout: &Layout) -> u32 {
    let chars = message.char_count() as u32;
    let lines = chars.div_ceil(layout.chars_per_line.max(1));
    layout
        .bubble_padding
        .saturating_add(lines.saturating_mul(layout.line_height))
        .saturating_add(layout.tail_allowance)
}

/// Height of a run of consecutive same-sender messages, including its trailing margin.
pub fn group_height(messages: &[Message], layout: &Layout) -> u32 {
    if messages.is_empty() {
        return 0;
    }
    let bubbles = messages
        .iter()
        .fold(0u32, |acc, m| acc.saturating_add(message_height(m, layout)));
    let gaps = (messages.len() as u32 - 1).saturating_mul(layout.message_gap);
    bubbles
        .saturating_add(gaps)
        .saturating_add(layout.group_margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageId, MessageKind, Sender};

    fn msg(text: &str, clip: Option<f64>) -> Message {
        Message {
            id: MessageId(0),
            text: text.to_string(),
            sender: Sender::A,
            clip_duration_seconds: clip,
            conversation_id: 0,
            starts_conversation: true,
            theme: "light".into(),
            kind: MessageKind::Content,
        }
    }

    #[test]
    fn reading_speed_rounds_up() {
        assert_eq!(estimate_frames(&msg("Hi", None), 30.0, 18.0, true), 4);
        assert_eq!(estimate_frames(&msg("How are you", None), 30.0, 18.0, true), 19);
        assert_eq!(estimate_frames(&msg("Good", None), 30.0, 18.0, true), 7);
    }

    #[test]
    fn clip_duration_wins_when_preferred() {
        let m = msg("a fairly long line of text", Some(2.0));
        assert_eq!(estimate_frames(&m, 30.0, 18.0, true), 60);
        assert_eq!(estimate_frames(&m, 30.0, 18.0, false), 44);
    }

    #[test]
    fn non_positive_clip_falls_back_to_text() {
        assert_eq!(estimate_frames(&msg("Good", Some(0.0)), 30.0, 18.0, true), 7);
        assert_eq!(estimate_frames(&msg("Good", Some(-1.0)), 30.0, 18.0, true), 7);
    }

    #[test]
    fn enormous_durations_are_capped() {
        assert_eq!(seconds_to_frames(1e300, 30.0), MAX_FRAMES);
        assert_eq!(reading_frames(10, 30.0, 1e-300), MAX_FRAMES);
    }

    #[test]
    fn empty_text_is_zero_frames() {
        assert_eq!(estimate_frames(&msg("", None), 30.0, 18.0, true), 0);
    }

    #[test]
    fn float_noise_does_not_add_a_frame() {
        assert_eq!(seconds_to_frames(0.1, 30.0), 3);
        assert_eq!(seconds_to_frames(1.5, 30.0), 45);
    }

    #[test]
    fn heights_are_monotonic_in_text_length() {
        let layout = Layout::default();
        let short = message_height(&msg("hey", None), &layout);
        let long = message_height(&msg(&"x".repeat(200), None), &layout);
        assert!(long > short);
        assert_eq!(
            short,
            layout.bubble_padding + layout.line_height + layout.tail_allowance
        );
    }

    #[test]
    fn group_height_adds_gaps_and_margin() {
        let layout = Layout::default();
        let a = msg("hey", None);
        let one = message_height(&a, &layout);
        let group = vec![a.clone(), a.clone(), a];
        assert_eq!(
            group_height(&group, &layout),
            3 * one + 2 * layout.message_gap + layout.group_margin
        );
        assert_eq!(group_height(&[], &layout), 0);
    }
}
