//! Splicing a sponsored segment into the main timeline.

use crate::{
    config::{Monetization, SegmentLine, SegmentShape},
    model::{SegmentCue, SegmentPlacement, TimedMessage},
    timeline::{
        estimate::{line_frames, seconds_to_frames},
        timing::{TimingParams, assign_timing},
    },
};

/// Segment lines relative to the segment's own frame 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPlan {
    pub cues: Vec<SegmentCue>,
    pub duration_frames: i64,
}

fn segment_line_frames(line: &SegmentLine, params: &TimingParams) -> i64 {
    line_frames(
        &line.text,
        line.clip_duration_seconds,
        params.fps,
        params.chars_per_second,
        true,
    )
}

fn relative_cue(line: &SegmentLine, start_frame: i64, duration_frames: i64) -> SegmentCue {
    SegmentCue {
        text: line.text.clone(),
        sender: line.sender,
        start_frame,
        duration_frames,
    }
}

pub fn plan_segment(segment: &Monetization, params: &TimingParams) -> SegmentPlan {
    let intro_frames = segment_line_frames(&segment.intro, params);
    let mut cues = vec![relative_cue(&segment.intro, 0, intro_frames)];

    let duration_frames = match &segment.shape {
        SegmentShape::Exchange {
            exchange_gap_frames,
            lines,
        } => lines.iter().fold(intro_frames, |line_end, line| {
            let start = line_end.saturating_add(*exchange_gap_frames);
            let frames = segment_line_frames(line, params);
            cues.push(relative_cue(line, start, frames));
            start.saturating_add(frames)
        }),
        SegmentShape::SingleReply {
            reply_start_seconds,
            reply,
        } => {
            let start = seconds_to_frames(*reply_start_seconds, params.fps);
            let frames = segment_line_frames(reply, params);
            cues.push(relative_cue(reply, start, frames));
            // An intro running past the reply still has to finish.
            start.saturating_add(frames).max(intro_frames)
        }
    };

    SegmentPlan {
        cues,
        duration_frames,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpliceResult {
    pub timed: Vec<TimedMessage>,
    pub placement: SegmentPlacement,
}

/// Insert `segment` after the first `segment.insert_after` messages and
/// re-time everything behind it. The segment starts once every preceding
/// message has finished.
pub fn splice(
    main: Vec<TimedMessage>,
    segment: &Monetization,
    params: &TimingParams,
) -> SpliceResult {
    let insert_after = segment.insert_after.min(main.len());
    let gap = segment.gap_frames;

    // Normally the last preceding message; an earlier clip can still be playing.
    let segment_start = main[..insert_after]
        .iter()
        .map(TimedMessage::end_frame)
        .max()
        .unwrap_or(params.initial_delay_frames)
        .saturating_add(gap);

    let plan = plan_segment(segment, params);
    let segment_end = segment_start.saturating_add(plan.duration_frames);

    let mut timed = main;
    let tail: Vec<_> = timed
        .split_off(insert_after)
        .into_iter()
        .map(|t| t.message)
        .collect();
    let retimed = assign_timing(&tail, &params.starting_at(segment_end.saturating_add(gap)));
    timed.extend(retimed.timed);

    let cues = plan
        .cues
        .into_iter()
        .map(|cue| SegmentCue {
            start_frame: segment_start.saturating_add(cue.start_frame),
            ..cue
        })
        .collect();

    tracing::debug!(
        insert_after,
        start_frame = segment_start,
        duration_frames = plan.duration_frames,
        shifted = tail.len(),
        "segment spliced"
    );

    SpliceResult {
        timed,
        placement: SegmentPlacement {
            insert_after,
            start_frame: segment_start,
            duration_frames: plan.duration_frames,
            cues,
        },
    }
}
