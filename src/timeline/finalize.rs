//! Total-length reconciliation and per-screen frame ranges.

use std::collections::HashMap;

use crate::{
    error::ScheduleInvariantError,
    model::{MessageId, Screen, ScreenFrameRange, SegmentPlacement, TimedMessage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeParams {
    pub trailing_buffer_frames: i64,
    /// Exit animation of the terminal screen; 0 when disabled.
    pub outro_frames: i64,
    pub min_visible_frames: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalLength {
    pub total_frames: i64,
    /// Set when the computed length was below the last message's floor.
    pub raised_from: Option<i64>,
}

pub fn finalize(
    timed: &[TimedMessage],
    screens: &[Screen],
    segment_end_frame: Option<i64>,
    params: &FinalizeParams,
) -> FinalLength {
    let trailing = params.trailing_buffer_frames;
    let natural_end = timed
        .last()
        .map_or(trailing, |last| last.end_frame().saturating_add(trailing));
    let outro = if screens.is_empty() {
        0
    } else {
        params.outro_frames
    };
    let computed = natural_end
        .max(segment_end_frame.unwrap_or(0))
        .saturating_add(outro);

    let floor = timed.last().map_or(0, |last| {
        last.appear_frame
            .saturating_add(last.duration_frames.max(params.min_visible_frames))
            .saturating_add(trailing)
    });

    if computed < floor {
        tracing::debug!(computed, floor, "total length raised to last-message floor");
        FinalLength {
            total_frames: floor,
            raised_from: Some(computed),
        }
    } else {
        FinalLength {
            total_frames: computed,
            raised_from: None,
        }
    }
}

/// Frame span of every screen, looked up through message identity.
///
/// A screen runs until the next one starts. When a spliced segment sits
/// between two screens, the earlier one ends where the segment starts.
pub fn screen_ranges(
    screens: &[Screen],
    timed: &[TimedMessage],
    segment: Option<&SegmentPlacement>,
    total_frames: i64,
) -> Result<Vec<ScreenFrameRange>, ScheduleInvariantError> {
    let positions: HashMap<MessageId, usize> = timed
        .iter()
        .enumerate()
        .map(|(i, t)| (t.message.id, i))
        .collect();

    let locate = |id: MessageId| {
        positions
            .get(&id)
            .copied()
            .ok_or(ScheduleInvariantError::MissingTiming { id })
    };

    let mut spans = Vec::with_capacity(screens.len());
    for (i, screen) in screens.iter().enumerate() {
        let (Some(first), Some(last)) = (screen.messages.first(), screen.messages.last()) else {
            return Err(ScheduleInvariantError::EmptyScreen {
                screen: i,
                input_len: timed.len(),
            });
        };
        let first_pos = locate(first.id)?;
        let last_pos = locate(last.id)?;
        let start = if i == 0 {
            0
        } else {
            timed[first_pos].appear_frame
        };
        spans.push((start, first_pos, last_pos));
    }

    let before_segment = |pos: usize| segment.is_some_and(|s| pos < s.insert_after);

    let mut ranges = Vec::with_capacity(spans.len());
    for (i, &(start, _, last_pos)) in spans.iter().enumerate() {
        let next = spans.get(i + 1);
        let segment_follows = before_segment(last_pos)
            && next.is_none_or(|&(_, next_first, _)| !before_segment(next_first));
        let end = match (segment, next) {
            (Some(s), _) if segment_follows => s.start_frame,
            (_, Some(&(next_start, _, _))) => next_start,
            (_, None) => total_frames,
        };
        ranges.push(ScreenFrameRange {
            start_frame: start,
            end_frame: end,
        });
    }

    check_ranges(&ranges)?;
    Ok(ranges)
}

pub fn check_ranges(ranges: &[ScreenFrameRange]) -> Result<(), ScheduleInvariantError> {
    let mut previous_end = 0;
    for (screen, r) in ranges.iter().enumerate() {
        if r.start_frame < 0 || r.end_frame < r.start_frame {
            return Err(ScheduleInvariantError::NegativeRange {
                screen,
                start_frame: r.start_frame,
                end_frame: r.end_frame,
            });
        }
        if r.start_frame < previous_end {
            return Err(ScheduleInvariantError::OverlappingRange {
                screen,
                start_frame: r.start_frame,
                previous_end,
            });
        }
        previous_end = r.end_frame;
    }
    Ok(())
}
