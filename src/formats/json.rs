use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    directives::ScriptEntry,
    formats::time::frames_to_seconds,
    model::{MessageKind, Schedule, Sender},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedSchedule {
    pub schema: String,
    pub version: u32,
    pub fps: f64,
    pub total: Value,
    pub messages: Vec<JsonMessage>,
    pub screens: Vec<JsonScreen>,
    #[serde(default)]
    pub segment: Option<JsonSegment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonMessage {
    pub id: u32,
    pub sender: Sender,
    pub text: String,
    pub kind: MessageKind,
    pub conversation_id: u32,
    pub theme: String,
    pub appear: Value,
    pub duration: Value,
    #[serde(default)]
    pub clip_duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonScreen {
    pub start: Value,
    pub end: Value,
    pub header: bool,
    pub theme: String,
    pub conversation_id: u32,
    pub message_ids: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSegment {
    pub insert_after: usize,
    pub start: Value,
    pub duration: Value,
    pub cues: Vec<JsonCue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonCue {
    pub start: Value,
    pub duration: Value,
    pub text: String,
    #[serde(default)]
    pub sender: Option<Sender>,
}

pub fn write_json(s: &Schedule, time_units: &str, wrapped: bool) -> Result<String> {
    let time = |frames: i64| encode_time(frames, s.fps, time_units);

    let messages: Vec<JsonMessage> = s
        .timed_messages
        .iter()
        .map(|t| JsonMessage {
            id: t.message.id.0,
            sender: t.message.sender,
            text: t.message.text.clone(),
            kind: t.message.kind,
            conversation_id: t.message.conversation_id,
            theme: t.message.theme.clone(),
            appear: time(t.appear_frame),
            duration: time(t.duration_frames),
            clip_duration_seconds: t.message.clip_seconds(),
        })
        .collect();

    if !wrapped {
        return Ok(serde_json::to_string_pretty(&messages)?);
    }

    let w = WrappedSchedule {
        schema: "threadcast.schedule".to_string(),
        version: 1,
        fps: s.fps,
        total: time(s.total_frames),
        messages,
        screens: s
            .screens
            .iter()
            .zip(&s.screen_ranges)
            .map(|(screen, range)| JsonScreen {
                start: time(range.start_frame),
                end: time(range.end_frame),
                header: screen.show_header_chrome,
                theme: screen.theme.clone(),
                conversation_id: screen.conversation_id,
                message_ids: screen.message_ids().map(|id| id.0).collect(),
            })
            .collect(),
        segment: s.segment.as_ref().map(|seg| JsonSegment {
            insert_after: seg.insert_after,
            start: time(seg.start_frame),
            duration: time(seg.duration_frames),
            cues: seg
                .cues
                .iter()
                .map(|c| JsonCue {
                    start: time(c.start_frame),
                    duration: time(c.duration_frames),
                    text: c.text.clone(),
                    sender: c.sender,
                })
                .collect(),
        }),
    };
    Ok(serde_json::to_string_pretty(&w)?)
}

fn encode_time(frames: i64, fps: f64, units: &str) -> Value {
    match units {
        "seconds" => Value::from(frames_to_seconds(frames, fps)),
        _ => Value::from(frames),
    }
}

/// Accepts `{"entries": [...]}`, `{"messages": [...]}` or a bare array.
pub fn parse_json(input: &str) -> Result<Vec<ScriptEntry>> {
    let v: Value = serde_json::from_str(input)?;

    let arr = if let Some(entries) = v.get("entries") {
        entries
    } else if let Some(messages) = v.get("messages") {
        messages
    } else if v.is_array() {
        &v
    } else {
        return Err(anyhow!("unrecognized JSON script shape"));
    };

    let mut entries: Vec<ScriptEntry> = serde_json::from_value(arr.clone())
        .map_err(|e| anyhow!("bad script entry: {e}"))?;
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.set_line(i + 1);
    }
    Ok(entries)
}
