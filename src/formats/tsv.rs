use anyhow::{Result, anyhow};
use csv::WriterBuilder;

use crate::{formats::time::frames_to_ms, model::Schedule};

const COLUMNS: [&str; 8] = [
    "id",
    "screen",
    "sender",
    "appear_frame",
    "duration_frames",
    "start_ms",
    "clip_seconds",
    "text",
];

/// Cue sheet for the audio mixer: one row per message and per segment line.
pub fn write_tsv(s: &Schedule) -> Result<String> {
    let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(vec![]);
    wtr.write_record(COLUMNS)?;

    for t in &s.timed_messages {
        let screen = s
            .screens
            .iter()
            .position(|sc| sc.message_ids().any(|id| id == t.message.id))
            .map(|i| (i + 1).to_string())
            .unwrap_or_default();
        wtr.write_record([
            t.message.id.0.to_string(),
            screen,
            t.message.sender.as_str().to_string(),
            t.appear_frame.to_string(),
            t.duration_frames.to_string(),
            frames_to_ms(t.appear_frame, s.fps).to_string(),
            t.message
                .clip_seconds()
                .map(|c| format!("{c:.3}"))
                .unwrap_or_default(),
            t.message.text.clone(),
        ])?;
    }

    if let Some(seg) = &s.segment {
        for (i, cue) in seg.cues.iter().enumerate() {
            wtr.write_record([
                format!("segment-{i}"),
                String::new(),
                cue.sender.map(|x| x.as_str().to_string()).unwrap_or_default(),
                cue.start_frame.to_string(),
                cue.duration_frames.to_string(),
                frames_to_ms(cue.start_frame, s.fps).to_string(),
                String::new(),
                cue.text.clone(),
            ])?;
        }
    }

    let data = wtr.into_inner().map_err(|e| anyhow!(e.to_string()))?;
    Ok(String::from_utf8(data)?)
}
