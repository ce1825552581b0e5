use rand::{Rng, SeedableRng, rngs::StdRng};
use threadcast::{
    ScheduleDiagnostic,
    config::{Config, Monetization, SegmentLine, SegmentShape},
    directives::{DirectiveEntry, ScriptEntry, ScriptLine, resolve_directives},
    model::{Message, MessageKind, Schedule},
    timeline::{
        build_schedule,
        estimate::{estimate_frames, seconds_to_frames},
    },
};

/// Seeded so every property run is reproducible.
fn random_script(seed: u64, len: usize) -> Vec<Message> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut entries = Vec::new();
    for _ in 0..len {
        match rng.gen_range(0..10) {
            0 => entries.push(ScriptEntry::Directive(DirectiveEntry {
                directive: "conversation".into(),
                value: None,
                line: 0,
            })),
            1 => entries.push(ScriptEntry::Directive(DirectiveEntry {
                directive: "theme".into(),
                value: Some(if rng.gen_bool(0.5) { "dark" } else { "light" }.into()),
                line: 0,
            })),
            _ => {
                let chars = rng.gen_range(0..160);
                let clip = if rng.gen_ratio(1, 3) {
                    None
                } else {
                    Some(0.2 + f64::from(rng.gen_range(0..40u32)) / 10.0)
                };
                entries.push(ScriptEntry::Line(ScriptLine {
                    sender: if rng.gen_bool(0.5) { "A" } else { "B" }.into(),
                    text: "w".repeat(chars),
                    clip_duration_seconds: clip,
                    kind: MessageKind::Content,
                    line: 0,
                }));
            }
        }
    }
    resolve_directives(&entries).unwrap()
}

fn configs() -> Vec<Config> {
    let mut plain = Config::default();
    plain.timing.prefer_clip_duration = false;

    let mut tight = Config::default();
    tight.layout.screen_height = 300;
    tight.layout.header_once_per_conversation = true;
    tight.timing.outro_enabled = true;
    tight.timing.intro_enabled = true;

    let mut zero = Config::default();
    zero.layout.screen_height = 0;

    let mut sponsored = Config::default();
    sponsored.timing.outro_enabled = true;
    sponsored.monetization = Some(Monetization {
        insert_after: 3,
        gap_frames: 6,
        intro: SegmentLine {
            text: "This chat is brought to you by".into(),
            sender: None,
            clip_duration_seconds: Some(1.5),
        },
        shape: SegmentShape::Exchange {
            exchange_gap_frames: 4,
            lines: vec![SegmentLine {
                text: "wait really?".into(),
                sender: None,
                clip_duration_seconds: None,
            }],
        },
    });

    vec![Config::default(), plain, tight, zero, sponsored]
}

fn assert_properties(messages: &[Message], cfg: &Config, s: &Schedule) {
    // Completeness: screens reproduce the input exactly.
    let flattened: Vec<&Message> = s.screens.iter().flat_map(|sc| sc.messages.iter()).collect();
    assert_eq!(flattened.len(), messages.len());
    for (a, b) in flattened.iter().zip(messages) {
        assert_eq!(*a, b);
    }
    assert_eq!(s.screens.len(), s.screen_ranges.len());

    // Progress: no empty screens.
    assert!(s.screens.iter().all(|sc| !sc.messages.is_empty()));

    // Screens never span conversations.
    for sc in &s.screens {
        assert!(sc.messages.iter().all(|m| m.conversation_id == sc.conversation_id));
    }

    // Monotonicity within a conversation.
    for pair in s.timed_messages.windows(2) {
        if pair[0].message.conversation_id == pair[1].message.conversation_id {
            assert!(pair[0].appear_frame <= pair[1].appear_frame);
        }
        assert!(pair[0].appear_frame >= 0);
    }

    // No audio overlap between clip-bearing messages.
    let clips: Vec<_> = s
        .timed_messages
        .iter()
        .filter_map(|t| {
            t.message
                .clip_seconds()
                .map(|c| (t.appear_frame, seconds_to_frames(c, cfg.timing.fps)))
        })
        .collect();
    for pair in clips.windows(2) {
        assert!(pair[0].0 + pair[0].1 <= pair[1].0);
    }

    // Sufficient total length.
    if let Some(last) = s.timed_messages.last() {
        let duration = estimate_frames(
            &last.message,
            cfg.timing.fps,
            cfg.timing.chars_per_second,
            cfg.timing.prefer_clip_duration,
        );
        assert!(s.total_frames >= last.appear_frame + duration + cfg.timing.trailing_buffer_frames);
    }

    // Ranges are ordered and inside the video.
    let mut previous_end = 0;
    for r in &s.screen_ranges {
        assert!(r.start_frame >= previous_end);
        assert!(r.end_frame >= r.start_frame);
        assert!(r.end_frame <= s.total_frames);
        previous_end = r.end_frame;
    }
}

#[test]
fn generated_scripts_hold_every_property() {
    for cfg in configs() {
        for seed in 1..60u64 {
            let messages = random_script(seed, (seed % 25) as usize + 1);
            let outcome = build_schedule(&messages, &cfg).unwrap();
            assert!(!outcome.fell_back(), "seed {seed} fell back");
            assert_properties(&messages, &cfg, &outcome.schedule);
        }
    }
}

#[test]
fn identical_inputs_give_identical_schedules() {
    for cfg in configs() {
        let messages = random_script(42, 30);
        let a = build_schedule(&messages, &cfg).unwrap();
        let b = build_schedule(&messages, &cfg).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.schedule).unwrap(),
            serde_json::to_string(&b.schedule).unwrap()
        );
    }
}

#[test]
fn concurrent_calls_do_not_interfere() {
    let cfg = configs().pop().unwrap();
    let messages = random_script(7, 40);
    let expected = build_schedule(&messages, &cfg).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| build_schedule(&messages, &cfg).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn empty_script_is_only_the_trailing_buffer() {
    let cfg = Config::default();
    let outcome = build_schedule(&[], &cfg).unwrap();
    assert!(outcome.schedule.screens.is_empty());
    assert!(outcome.schedule.timed_messages.is_empty());
    assert_eq!(outcome.schedule.total_frames, cfg.timing.trailing_buffer_frames);

    let mut bare = Config::default();
    bare.timing.trailing_buffer_frames = 0;
    assert_eq!(build_schedule(&[], &bare).unwrap().schedule.total_frames, 0);
}

#[test]
fn single_reply_segment_shifts_later_messages() {
    let mut cfg = Config::default();
    cfg.timing.inter_message_gap_frames = 0;
    cfg.monetization = Some(Monetization {
        insert_after: 2,
        gap_frames: 0,
        intro: SegmentLine {
            text: "Sponsored".into(),
            sender: None,
            clip_duration_seconds: Some(1.5),
        },
        shape: SegmentShape::SingleReply {
            reply_start_seconds: 3.0,
            reply: SegmentLine {
                text: "Nice".into(),
                sender: None,
                clip_duration_seconds: Some(2.0),
            },
        },
    });

    let entries: Vec<ScriptEntry> = ["Hey", "You up?", "Yeah", "Guess what"]
        .iter()
        .enumerate()
        .map(|(i, text)| {
            ScriptEntry::Line(ScriptLine {
                sender: if i % 2 == 0 { "A" } else { "B" }.into(),
                text: text.to_string(),
                clip_duration_seconds: Some(1.0),
                kind: MessageKind::Content,
                line: i + 1,
            })
        })
        .collect();
    let messages = resolve_directives(&entries).unwrap();
    let outcome = build_schedule(&messages, &cfg).unwrap();
    let segment = outcome.schedule.segment.clone().unwrap();
    assert_eq!(segment.duration_frames, 90 + 60);
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| matches!(d, ScheduleDiagnostic::SegmentSpliced { insert_after: 2, .. })));

    let before = &outcome.schedule.timed_messages[1];
    assert_eq!(segment.start_frame, before.end_frame());
    for t in &outcome.schedule.timed_messages[2..] {
        assert!(t.appear_frame >= segment.end_frame());
    }
    assert!(outcome.schedule.total_frames >= segment.end_frame());
}

#[test]
fn oversized_lone_message_gets_one_screen() {
    let mut cfg = Config::default();
    cfg.layout.screen_height = 100;
    let messages = resolve_directives(&[ScriptEntry::Line(ScriptLine {
        sender: "A".into(),
        text: "x".repeat(2_000),
        clip_duration_seconds: None,
        kind: MessageKind::Content,
        line: 1,
    })])
    .unwrap();
    let outcome = build_schedule(&messages, &cfg).unwrap();
    assert_eq!(outcome.schedule.screens.len(), 1);
    assert_eq!(outcome.schedule.screens[0].messages.len(), 1);
}
