use std::collections::HashMap;

use crate::{
    directives::{DirectiveEntry, ScriptEntry, ScriptLine},
    error::DirectiveError,
    formats::time::{format_vtt_timestamp, frames_to_ms, parse_time_to_ms},
    model::{MessageId, MessageKind, Schedule, SegmentPlacement},
};

const MEDIA_PREFIX: &str = "[media]";

/// Parse a plain-text script.
///
/// ```text
/// # comment
/// /theme dark
/// A: Hi there {1.8}
/// B: [media] beach.jpg
/// /conversation
/// ```
pub fn parse_txt(input: &str) -> Result<Vec<ScriptEntry>, DirectiveError> {
    let mut entries = Vec::new();

    for (line_no, raw_line) in input.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('/') {
            let (name, value) = match rest.split_once(char::is_whitespace) {
                Some((n, v)) => (n, Some(v.trim().to_string())),
                None => (rest, None),
            };
            entries.push(ScriptEntry::Directive(DirectiveEntry {
                directive: name.to_string(),
                value,
                line: line_no,
            }));
            continue;
        }

        let (sender, body) = line
            .split_once(':')
            .ok_or(DirectiveError::MalformedLine { line: line_no })?;
        let (text, clip_duration_seconds) = split_clip_annotation(body.trim(), line_no)?;
        let (kind, text) = match text.strip_prefix(MEDIA_PREFIX) {
            Some(caption) => (MessageKind::Media, caption.trim()),
            None => (MessageKind::Content, text),
        };

        entries.push(ScriptEntry::Line(ScriptLine {
            sender: sender.trim().to_string(),
            text: text.to_string(),
            clip_duration_seconds,
            kind,
            line: line_no,
        }));
    }

    Ok(entries)
}

/// Split a trailing `{2.4}` clip length off a line body.
fn split_clip_annotation(body: &str, line: usize) -> Result<(&str, Option<f64>), DirectiveError> {
    let Some(open) = body.strip_suffix('}').and_then(|b| b.rfind('{')) else {
        return Ok((body, None));
    };
    let raw = &body[open + 1..body.len() - 1];
    let ms = parse_time_to_ms(raw).map_err(|_| DirectiveError::BadClipDuration {
        line,
        raw: raw.to_string(),
    })?;
    Ok((body[..open].trim_end(), Some(ms as f64 / 1000.0)))
}

pub fn write_txt(s: &Schedule) -> String {
    let positions: HashMap<MessageId, usize> = s
        .timed_messages
        .iter()
        .enumerate()
        .map(|(i, t)| (t.message.id, i))
        .collect();
    let stamp = |frame: i64| format_vtt_timestamp(frames_to_ms(frame, s.fps));

    let mut out = String::new();
    let mut segment_written = false;

    for (i, (screen, range)) in s.screens.iter().zip(&s.screen_ranges).enumerate() {
        out.push_str(&format!(
            "== screen {} [{} --> {}] conversation={} theme={}{}\n",
            i + 1,
            stamp(range.start_frame),
            stamp(range.end_frame),
            screen.conversation_id,
            screen.theme,
            if screen.show_header_chrome { " header" } else { "" },
        ));

        for m in &screen.messages {
            let Some(t) = positions.get(&m.id).map(|&p| &s.timed_messages[p]) else {
                continue;
            };
            if let Some(seg) = &s.segment {
                if !segment_written && positions[&m.id] >= seg.insert_after {
                    write_segment(&mut out, seg, &stamp);
                    segment_written = true;
                }
            }
            let media = if m.kind == MessageKind::Media { "[media] " } else { "" };
            out.push_str(&format!(
                "[{} --> {}] {}: {}{}\n",
                stamp(t.appear_frame),
                stamp(t.end_frame()),
                m.sender.as_str(),
                media,
                m.text.trim(),
            ));
        }
    }

    if let Some(seg) = &s.segment {
        if !segment_written {
            write_segment(&mut out, seg, &stamp);
        }
    }

    out.push_str(&format!("== end {}\n", stamp(s.total_frames)));
    out
}

fn write_segment(out: &mut String, seg: &SegmentPlacement, stamp: &dyn Fn(i64) -> String) {
    out.push_str(&format!(
        "-- segment [{} --> {}]\n",
        stamp(seg.start_frame),
        stamp(seg.end_frame()),
    ));
    for cue in &seg.cues {
        let who = cue.sender.map_or("*", |s| s.as_str());
        out.push_str(&format!(
            "[{} --> {}] {}: {}\n",
            stamp(cue.start_frame),
            stamp(cue.start_frame + cue.duration_frames),
            who,
            cue.text.trim(),
        ));
    }
}
