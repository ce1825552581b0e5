//! Appearance-frame assignment and the clip non-overlap pass.

use crate::{
    config::Timing,
    model::{Message, MessageId, TimedMessage},
    timeline::estimate::estimate_frames,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingParams {
    pub fps: f64,
    pub chars_per_second: f64,
    pub initial_delay_frames: i64,
    pub gap_frames: i64,
    pub trailing_buffer_frames: i64,
    pub prefer_clip_duration: bool,
}

impl TimingParams {
    pub fn from_config(t: &Timing) -> Self {
        Self {
            fps: t.fps,
            chars_per_second: t.chars_per_second,
            initial_delay_frames: t.lead_in_frames(),
            gap_frames: t.inter_message_gap_frames,
            trailing_buffer_frames: t.trailing_buffer_frames,
            prefer_clip_duration: t.prefer_clip_duration,
        }
    }

    pub fn starting_at(self, initial_delay_frames: i64) -> Self {
        Self {
            initial_delay_frames,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimingPass {
    pub timed: Vec<TimedMessage>,
    pub total_frames: i64,
}

pub fn assign_timing(messages: &[Message], params: &TimingParams) -> TimingPass {
    let mut cursor = params.initial_delay_frames;
    let mut timed = Vec::with_capacity(messages.len());

    for (i, message) in messages.iter().enumerate() {
        let duration = estimate_frames(
            message,
            params.fps,
            params.chars_per_second,
            params.prefer_clip_duration,
        );
        timed.push(TimedMessage {
            message: message.clone(),
            appear_frame: cursor,
            duration_frames: duration,
        });
        cursor = cursor.saturating_add(duration);
        if i + 1 < messages.len() {
            cursor = cursor.saturating_add(params.gap_frames);
        }
    }

    TimingPass {
        timed,
        total_frames: cursor.saturating_add(params.trailing_buffer_frames),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapParams {
    pub fps: f64,
    pub chars_per_second: f64,
    /// Pause reserved before a clip that opens a new conversation.
    pub outro_frames: i64,
}

/// Where the audio track stands between resolver runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapCursor {
    pub audio_end_frame: i64,
    pub clips_seen: bool,
    /// Skip the conversation outro on the next clip only.
    pub suppress_next_outro: bool,
    pub last_appear_frame: i64,
}

impl OverlapCursor {
    /// Resume after a spliced segment that ends at `segment_end_frame`.
    pub fn after_segment(segment_end_frame: i64, outro_after_segment: bool) -> Self {
        Self {
            audio_end_frame: segment_end_frame,
            clips_seen: true,
            suppress_next_outro: !outro_after_segment,
            last_appear_frame: segment_end_frame,
        }
    }
}

/// A clip that had to move to keep audio from overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapShift {
    pub id: MessageId,
    pub from_frame: i64,
    pub to_frame: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlapPass {
    pub timed: Vec<TimedMessage>,
    pub cursor: OverlapCursor,
    pub shifts: Vec<OverlapShift>,
}

pub fn resolve_overlap(timed: Vec<TimedMessage>, params: &OverlapParams) -> OverlapPass {
    resolve_overlap_from(timed, params, OverlapCursor::default())
}

/// Push clip-bearing messages past the end of the previous clip.
///
/// Messages without a clip keep their frame unless an earlier shift would
/// put them ahead of their predecessor; they are then held at the
/// predecessor's frame so source order stays non-decreasing.
pub fn resolve_overlap_from(
    timed: Vec<TimedMessage>,
    params: &OverlapParams,
    mut cursor: OverlapCursor,
) -> OverlapPass {
    let mut shifts = Vec::new();
    let mut out = Vec::with_capacity(timed.len());

    for mut t in timed {
        if !t.message.has_clip() {
            t.appear_frame = t.appear_frame.max(cursor.last_appear_frame);
            cursor.last_appear_frame = t.appear_frame;
            out.push(t);
            continue;
        }

        let mut start = t.appear_frame.max(cursor.audio_end_frame);
        let wants_outro =
            t.message.starts_conversation && cursor.clips_seen && params.outro_frames > 0;
        if wants_outro && !cursor.suppress_next_outro {
            start = start.saturating_add(params.outro_frames);
        }
        start = start.max(cursor.last_appear_frame);

        if start != t.appear_frame {
            tracing::debug!(
                id = t.message.id.0,
                from = t.appear_frame,
                to = start,
                "clip shifted"
            );
            shifts.push(OverlapShift {
                id: t.message.id,
                from_frame: t.appear_frame,
                to_frame: start,
            });
        }

        let clip_frames = estimate_frames(&t.message, params.fps, params.chars_per_second, true);
        t.appear_frame = start;
        t.duration_frames = t.duration_frames.max(clip_frames);

        cursor.audio_end_frame = start.saturating_add(clip_frames);
        cursor.clips_seen = true;
        cursor.suppress_next_outro = false;
        cursor.last_appear_frame = start;
        out.push(t);
    }

    OverlapPass {
        timed: out,
        cursor,
        shifts,
    }
}
