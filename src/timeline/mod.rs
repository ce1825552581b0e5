//! Scheduling engine: message stream in, time-indexed render plan out.
//!
//! Every call is a pure function of its inputs. The same messages and config
//! always produce the same [`Schedule`], so a preview and the final render can
//! compute it independently.

pub mod estimate;
pub mod finalize;
pub mod paginate;
pub mod splice;
pub mod timing;

use std::collections::HashSet;

use crate::{
    config::Config,
    error::{ConfigError, ScheduleInvariantError},
    model::{Message, MessageId, Schedule, ScreenFrameRange, TimedMessage},
};

use self::{
    finalize::{FinalizeParams, finalize, screen_ranges},
    paginate::{paginate, unpaginated},
    splice::splice,
    timing::{
        OverlapCursor, OverlapParams, TimingParams, assign_timing, resolve_overlap,
        resolve_overlap_from,
    },
};

/// Notes the engine hands back alongside the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleDiagnostic {
    ClipShifted {
        id: MessageId,
        from_frame: i64,
        to_frame: i64,
    },
    SegmentSpliced {
        insert_after: usize,
        start_frame: i64,
        duration_frames: i64,
    },
    TotalRaisedToFloor {
        computed: i64,
        floor: i64,
    },
    /// A post-condition failed and the one-screen fallback was used.
    InvariantFallback {
        stage: &'static str,
        input_len: usize,
        error: ScheduleInvariantError,
    },
    /// A post-condition failed with no fallback available.
    InvariantViolation {
        stage: &'static str,
        input_len: usize,
        error: ScheduleInvariantError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOutcome {
    pub schedule: Schedule,
    pub diagnostics: Vec<ScheduleDiagnostic>,
}

impl ScheduleOutcome {
    pub fn fell_back(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, ScheduleDiagnostic::InvariantFallback { .. }))
    }
}

/// Build the full render plan for `messages`.
pub fn build_schedule(
    messages: &[Message],
    cfg: &Config,
) -> Result<ScheduleOutcome, ConfigError> {
    cfg.validate()?;

    let span = tracing::info_span!("build_schedule", messages = messages.len());
    let _g = span.enter();

    let timing_cfg = &cfg.timing;
    let params = TimingParams::from_config(timing_cfg);
    let overlap = OverlapParams {
        fps: timing_cfg.fps,
        chars_per_second: timing_cfg.chars_per_second,
        outro_frames: timing_cfg.conversation_outro_frames(),
    };
    let mut diagnostics = Vec::new();

    let pass = assign_timing(messages, &params);
    tracing::debug!(
        messages = pass.timed.len(),
        provisional_total = pass.total_frames,
        "timing assigned"
    );

    let resolved = resolve_overlap(pass.timed, &overlap);
    let mut shifts = resolved.shifts;
    let mut timed = resolved.timed;

    let mut segment = None;
    if let Some(m) = &cfg.monetization {
        let spliced = splice(timed, m, &params);
        let placement = spliced.placement;
        let mut head = spliced.timed;
        let tail = head.split_off(placement.insert_after);

        let cursor =
            OverlapCursor::after_segment(placement.end_frame(), timing_cfg.outro_after_segment);
        // The tail was re-timed from scratch; its first-pass shifts no longer apply.
        let retimed: HashSet<MessageId> = tail.iter().map(|t| t.message.id).collect();
        shifts.retain(|s| !retimed.contains(&s.id));

        let tail = resolve_overlap_from(tail, &overlap, cursor);
        shifts.extend(tail.shifts);
        head.extend(tail.timed);
        timed = head;

        diagnostics.push(ScheduleDiagnostic::SegmentSpliced {
            insert_after: placement.insert_after,
            start_frame: placement.start_frame,
            duration_frames: placement.duration_frames,
        });
        segment = Some(placement);
    }

    diagnostics.extend(shifts.into_iter().map(|s| ScheduleDiagnostic::ClipShifted {
        id: s.id,
        from_frame: s.from_frame,
        to_frame: s.to_frame,
    }));

    if let Err(error) = check_timing(messages, &timed) {
        tracing::warn!(%error, input_len = messages.len(), "timing post-condition failed");
        diagnostics.push(ScheduleDiagnostic::InvariantViolation {
            stage: "timing",
            input_len: messages.len(),
            error,
        });
    }

    let mut screens = match paginate(messages, &cfg.layout) {
        Ok(screens) => screens,
        Err(error) => {
            tracing::warn!(
                %error,
                input_len = messages.len(),
                "pagination failed, using a single screen"
            );
            diagnostics.push(ScheduleDiagnostic::InvariantFallback {
                stage: "paginate",
                input_len: messages.len(),
                error,
            });
            unpaginated(messages)
        }
    };
    tracing::debug!(screens = screens.len(), "paginated");

    let length = finalize(
        &timed,
        &screens,
        segment.as_ref().map(|s| s.end_frame()),
        &FinalizeParams {
            trailing_buffer_frames: timing_cfg.trailing_buffer_frames,
            outro_frames: timing_cfg.effective_outro_frames(),
            min_visible_frames: timing_cfg.min_visible_frames,
        },
    );
    if let Some(computed) = length.raised_from {
        diagnostics.push(ScheduleDiagnostic::TotalRaisedToFloor {
            computed,
            floor: length.total_frames,
        });
    }
    let total_frames = length.total_frames;

    let screen_ranges = match screen_ranges(&screens, &timed, segment.as_ref(), total_frames) {
        Ok(ranges) => ranges,
        Err(error) => {
            tracing::warn!(
                %error,
                input_len = messages.len(),
                "screen ranges invalid, using a single screen"
            );
            diagnostics.push(ScheduleDiagnostic::InvariantFallback {
                stage: "screen_ranges",
                input_len: messages.len(),
                error,
            });
            screens = unpaginated(messages);
            screens
                .iter()
                .map(|_| ScreenFrameRange {
                    start_frame: 0,
                    end_frame: total_frames,
                })
                .collect()
        }
    };

    tracing::info!(
        messages = timed.len(),
        screens = screens.len(),
        total_frames,
        segment = segment.is_some(),
        "schedule built"
    );

    Ok(ScheduleOutcome {
        schedule: Schedule {
            fps: timing_cfg.fps,
            timed_messages: timed,
            screens,
            screen_ranges,
            segment,
            total_frames,
        },
        diagnostics,
    })
}

/// Timed output must cover every input, in order, with non-negative and
/// non-decreasing frames inside each conversation.
pub fn check_timing(
    messages: &[Message],
    timed: &[TimedMessage],
) -> Result<(), ScheduleInvariantError> {
    if timed.len() != messages.len() {
        return Err(ScheduleInvariantError::MessageCountMismatch {
            expected: messages.len(),
            actual: timed.len(),
        });
    }

    let mut previous: Option<&TimedMessage> = None;
    for (m, t) in messages.iter().zip(timed) {
        if m.id != t.message.id {
            return Err(ScheduleInvariantError::OrderMismatch {
                expected: m.id,
                found: t.message.id,
            });
        }
        if t.appear_frame < 0 {
            return Err(ScheduleInvariantError::NegativeFrame {
                id: t.message.id,
                frame: t.appear_frame,
            });
        }
        if let Some(p) = previous {
            let same_conversation = p.message.conversation_id == t.message.conversation_id;
            if same_conversation && t.appear_frame < p.appear_frame {
                return Err(ScheduleInvariantError::NonMonotonic {
                    id: t.message.id,
                    appear_frame: t.appear_frame,
                    previous_frame: p.appear_frame,
                });
            }
        }
        previous = Some(t);
    }

    Ok(())
}
