use textwrap::wrap;

use crate::{
    formats::time::{format_srt_timestamp, frames_to_ms},
    model::{Schedule, Sender},
};

struct Caption<'a> {
    start_frame: i64,
    end_frame: i64,
    speaker: &'a str,
    text: &'a str,
}

/// Caption track: one cue per message plus the sponsor segment's lines.
pub fn write_srt(s: &Schedule, wrap_width: usize) -> String {
    let mut captions: Vec<Caption<'_>> = s
        .timed_messages
        .iter()
        .map(|t| Caption {
            start_frame: t.appear_frame,
            end_frame: t.end_frame().max(t.appear_frame + 1),
            speaker: t.message.sender.as_str(),
            text: t.message.text.as_str(),
        })
        .collect();

    if let Some(seg) = &s.segment {
        captions.extend(seg.cues.iter().map(|c| Caption {
            start_frame: c.start_frame,
            end_frame: (c.start_frame + c.duration_frames).max(c.start_frame + 1),
            speaker: c.sender.map_or("", Sender::as_str),
            text: c.text.as_str(),
        }));
    }
    captions.sort_by_key(|c| c.start_frame);

    let mut out = String::new();
    for (i, c) in captions.iter().enumerate() {
        out.push_str(&(i + 1).to_string());
        out.push('\n');

        out.push_str(&format!(
            "{} --> {}\n",
            format_srt_timestamp(frames_to_ms(c.start_frame, s.fps)),
            format_srt_timestamp(frames_to_ms(c.end_frame, s.fps))
        ));

        let text = if c.speaker.is_empty() {
            c.text.trim().to_string()
        } else {
            format!("{}: {}", c.speaker, c.text.trim())
        };
        for line in wrap(&text, wrap_width.max(1)) {
            out.push_str(&line);
            out.push('\n');
        }

        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, Monetization, SegmentLine, SegmentShape},
        model::{Message, MessageId, MessageKind, Sender},
        timeline::build_schedule,
    };

    fn messages() -> Vec<Message> {
        ["Hi", "A much longer reply that needs wrapping onto a second line"]
            .iter()
            .enumerate()
            .map(|(i, text)| Message {
                id: MessageId(i as u32),
                text: text.to_string(),
                sender: if i == 0 { Sender::A } else { Sender::B },
                clip_duration_seconds: Some(1.0),
                conversation_id: 0,
                starts_conversation: i == 0,
                theme: "light".into(),
                kind: MessageKind::Content,
            })
            .collect()
    }

    #[test]
    fn numbers_cues_and_wraps_text() {
        let out = build_schedule(&messages(), &Config::default()).unwrap();
        let srt = write_srt(&out.schedule, 30);
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,000\nA: Hi\n\n2\n"));
        let cue_two = srt.split("\n\n").nth(1).unwrap();
        assert!(cue_two.lines().count() > 3);
    }

    #[test]
    fn segment_lines_are_interleaved_by_time() {
        let mut cfg = Config::default();
        cfg.monetization = Some(Monetization {
            insert_after: 1,
            gap_frames: 0,
            intro: SegmentLine {
                text: "Brought to you by".into(),
                sender: None,
                clip_duration_seconds: Some(1.0),
            },
            shape: SegmentShape::Exchange {
                exchange_gap_frames: 0,
                lines: vec![],
            },
        });
        let out = build_schedule(&messages(), &cfg).unwrap();
        let srt = write_srt(&out.schedule, 80);
        let sponsor = srt.find("Brought to you by").unwrap();
        let reply = srt.find("B: A much longer").unwrap();
        assert!(sponsor < reply);
    }
}
