//! Expands authoring directives into per-message flags.
//!
//! Scripts interleave spoken lines with directives such as `theme dark` or
//! `conversation`. The scheduler never sees directives; it receives the
//! resolved [`Message`] stream produced here.

use serde::{Deserialize, Serialize};

use crate::{
    error::DirectiveError,
    model::{DEFAULT_THEME, MAX_CLIP_SECONDS, Message, MessageId, MessageKind, Sender},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptLine {
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub clip_duration_seconds: Option<f64>,
    #[serde(default)]
    pub kind: MessageKind,
    /// 1-based source position, for error reporting.
    #[serde(skip)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveEntry {
    pub directive: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(skip)]
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptEntry {
    Directive(DirectiveEntry),
    Line(ScriptLine),
}

impl ScriptEntry {
    pub fn line(&self) -> usize {
        match self {
            ScriptEntry::Directive(d) => d.line,
            ScriptEntry::Line(l) => l.line,
        }
    }

    pub fn set_line(&mut self, line: usize) {
        match self {
            ScriptEntry::Directive(d) => d.line = line,
            ScriptEntry::Line(l) => l.line = line,
        }
    }
}

struct Resolver {
    messages: Vec<Message>,
    theme: String,
    conversation_id: u32,
    pending_start: bool,
}

impl Resolver {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            theme: DEFAULT_THEME.to_string(),
            conversation_id: 0,
            pending_start: true,
        }
    }

    fn apply_directive(&mut self, d: &DirectiveEntry) -> Result<(), DirectiveError> {
        match d.directive.trim().to_lowercase().as_str() {
            "theme" => {
                let value = d
                    .value
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| DirectiveError::MissingValue {
                        line: d.line,
                        name: "theme".to_string(),
                    })?;
                self.theme = value.to_string();
            }
            "conversation" => {
                // Back-to-back markers open a single conversation.
                if !self.pending_start {
                    self.conversation_id += 1;
                    self.pending_start = true;
                }
            }
            other => {
                return Err(DirectiveError::UnknownDirective {
                    line: d.line,
                    name: other.to_string(),
                });
            }
        }
        Ok(())
    }

    fn push_line(&mut self, l: &ScriptLine) -> Result<(), DirectiveError> {
        let sender = Sender::parse(&l.sender).ok_or_else(|| DirectiveError::BadSender {
            line: l.line,
            sender: l.sender.clone(),
        })?;

        if let Some(s) = l.clip_duration_seconds {
            if !(0.0..=MAX_CLIP_SECONDS).contains(&s) {
                return Err(DirectiveError::BadClipDuration {
                    line: l.line,
                    raw: s.to_string(),
                });
            }
        }

        self.messages.push(Message {
            id: MessageId(self.messages.len() as u32),
            text: l.text.clone(),
            sender,
            clip_duration_seconds: l.clip_duration_seconds,
            conversation_id: self.conversation_id,
            starts_conversation: self.pending_start,
            theme: self.theme.clone(),
            kind: l.kind,
        });
        self.pending_start = false;
        Ok(())
    }
}

pub fn resolve_directives(entries: &[ScriptEntry]) -> Result<Vec<Message>, DirectiveError> {
    let mut resolver = Resolver::new();
    for entry in entries {
        match entry {
            ScriptEntry::Directive(d) => resolver.apply_directive(d)?,
            ScriptEntry::Line(l) => resolver.push_line(l)?,
        }
    }
    tracing::debug!(
        entries = entries.len(),
        messages = resolver.messages.len(),
        conversations = resolver.messages.last().map_or(0, |m| m.conversation_id + 1),
        "directives resolved"
    );
    Ok(resolver.messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn say(sender: &str, text: &str) -> ScriptEntry {
        ScriptEntry::Line(ScriptLine {
            sender: sender.into(),
            text: text.into(),
            clip_duration_seconds: None,
            kind: MessageKind::Content,
            line: 0,
        })
    }

    fn directive(name: &str, value: Option<&str>) -> ScriptEntry {
        ScriptEntry::Directive(DirectiveEntry {
            directive: name.into(),
            value: value.map(str::to_string),
            line: 0,
        })
    }

    #[test]
    fn first_message_starts_conversation_zero() {
        let messages = resolve_directives(&[say("A", "hi"), say("B", "yo")]).unwrap();
        assert!(messages[0].starts_conversation);
        assert!(!messages[1].starts_conversation);
        assert_eq!(messages[1].conversation_id, 0);
        assert_eq!(messages[1].id, MessageId(1));
        assert_eq!(messages[0].theme, DEFAULT_THEME);
    }

    #[test]
    fn conversation_marker_opens_exactly_one_new_conversation() {
        let messages = resolve_directives(&[
            directive("conversation", None),
            say("A", "one"),
            directive("conversation", None),
            directive("conversation", None),
            say("B", "two"),
        ])
        .unwrap();
        assert_eq!(messages[0].conversation_id, 0);
        assert_eq!(messages[1].conversation_id, 1);
        assert!(messages[1].starts_conversation);
    }

    #[test]
    fn theme_applies_to_following_messages() {
        let messages = resolve_directives(&[
            say("A", "one"),
            directive("theme", Some(" dark ")),
            say("A", "two"),
        ])
        .unwrap();
        assert_eq!(messages[0].theme, "light");
        assert_eq!(messages[1].theme, "dark");
        assert!(!messages[1].starts_conversation);
    }

    #[test]
    fn reports_bad_input_with_line_numbers() {
        let mut bad = directive("zoom", None);
        bad.set_line(4);
        assert_eq!(
            resolve_directives(&[bad]),
            Err(DirectiveError::UnknownDirective {
                line: 4,
                name: "zoom".into()
            })
        );
        assert!(matches!(
            resolve_directives(&[directive("theme", None)]),
            Err(DirectiveError::MissingValue { .. })
        ));
        assert!(matches!(
            resolve_directives(&[say("C", "who")]),
            Err(DirectiveError::BadSender { .. })
        ));
    }

    #[test]
    fn rejects_clip_lengths_past_a_day() {
        let mut line = ScriptLine {
            sender: "A".into(),
            text: "long".into(),
            clip_duration_seconds: Some(1e300),
            kind: MessageKind::Content,
            line: 3,
        };
        assert!(matches!(
            resolve_directives(&[ScriptEntry::Line(line.clone())]),
            Err(DirectiveError::BadClipDuration { line: 3, .. })
        ));

        line.clip_duration_seconds = Some(MAX_CLIP_SECONDS);
        assert!(resolve_directives(&[ScriptEntry::Line(line)]).is_ok());
    }

    #[test]
    fn json_entries_deserialize_into_both_shapes() {
        let raw = r#"[{"directive":"theme","value":"dark"},{"sender":"A","text":"hi","clip_duration_seconds":1.2}]"#;
        let entries: Vec<ScriptEntry> = serde_json::from_str(raw).unwrap();
        assert!(matches!(entries[0], ScriptEntry::Directive(_)));
        assert!(matches!(entries[1], ScriptEntry::Line(_)));
    }
}
