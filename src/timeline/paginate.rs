//! Greedy packing of bubble groups into fixed-height screens.

use crate::{
    config::Layout,
    error::ScheduleInvariantError,
    model::{Message, Screen},
    timeline::estimate::{group_height, message_height},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    None,
    Theme,
    Conversation,
}

/// Whether `next` must start a new bubble group after `prev`.
fn breaks_group(prev: &Message, next: &Message) -> bool {
    next.sender != prev.sender
        || next.starts_conversation
        || next.conversation_id != prev.conversation_id
        || next.theme != prev.theme
}

#[derive(Debug)]
struct OpenScreen {
    screen: Screen,
    used: u32,
    capacity: u32,
}

impl OpenScreen {
    fn new(first: &Message, show_header_chrome: bool, layout: &Layout) -> Self {
        let header = if show_header_chrome {
            layout.header_height
        } else {
            0
        };
        Self {
            screen: Screen {
                messages: Vec::new(),
                show_header_chrome,
                theme: first.theme.clone(),
                conversation_id: first.conversation_id,
            },
            used: 0,
            capacity: layout.screen_height.saturating_sub(header),
        }
    }

    fn is_empty(&self) -> bool {
        self.screen.messages.is_empty()
    }

    fn with_gap(&self, height: u32, gap: u32) -> u32 {
        let gap = if self.is_empty() { 0 } else { gap };
        self.used.saturating_add(gap).saturating_add(height)
    }

    fn fits(&self, height: u32, gap: u32) -> bool {
        self.with_gap(height, gap) <= self.capacity
    }

    fn append_group(&mut self, group: &[Message], height: u32, gap: u32) {
        self.used = self.with_gap(height, gap);
        self.screen.messages.extend_from_slice(group);
    }

    fn append_message(&mut self, message: &Message, height: u32, gap: u32) {
        self.used = self.with_gap(height, gap);
        self.screen.messages.push(message.clone());
    }
}

#[derive(Debug, Default)]
struct Pagination {
    closed: Vec<Screen>,
    open: Option<OpenScreen>,
}

impl Pagination {
    fn boundary_for(&self, first: &Message) -> Boundary {
        let Some(open) = &self.open else {
            return Boundary::Conversation;
        };
        if first.starts_conversation || first.conversation_id != open.screen.conversation_id {
            Boundary::Conversation
        } else if first.theme != open.screen.theme {
            Boundary::Theme
        } else {
            Boundary::None
        }
    }

    fn close_open(&mut self) {
        if let Some(open) = self.open.take() {
            self.closed.push(open.screen);
        }
    }

    fn push_group(mut self, group: &[Message], layout: &Layout) -> Self {
        let Some(first) = group.first() else {
            return self;
        };
        let height = group_height(group, layout);
        let boundary = self.boundary_for(first);

        if boundary == Boundary::None {
            if let Some(open) = self.open.as_mut() {
                if open.fits(height, layout.group_gap) {
                    open.append_group(group, height, layout.group_gap);
                    return self;
                }
            }
        }

        self.close_open();
        let show_header =
            boundary == Boundary::Conversation || !layout.header_once_per_conversation;
        let mut fresh = OpenScreen::new(first, show_header, layout);

        if height <= fresh.capacity {
            fresh.append_group(group, height, layout.group_gap);
            self.open = Some(fresh);
            return self;
        }

        self.split_group(group, fresh, layout)
    }

    /// Spread an oversized group message by message. A screen always takes
    /// its first message even when that message alone exceeds the budget.
    fn split_group(mut self, group: &[Message], mut open: OpenScreen, layout: &Layout) -> Self {
        for message in group {
            let height = message_height(message, layout);
            if !open.is_empty() && !open.fits(height, layout.message_gap) {
                let next = OpenScreen::new(message, !layout.header_once_per_conversation, layout);
                let full = std::mem::replace(&mut open, next);
                self.closed.push(full.screen);
            }
            open.append_message(message, height, layout.message_gap);
        }
        open.used = open.used.saturating_add(layout.group_margin);
        self.open = Some(open);
        self
    }

    fn finish(mut self) -> Vec<Screen> {
        self.close_open();
        self.closed
    }
}

/// Partition `messages` into screens that fit `layout.screen_height`.
///
/// Screens never span a conversation or theme change. The result is checked
/// against the input before it is returned.
pub fn paginate(
    messages: &[Message],
    layout: &Layout,
) -> Result<Vec<Screen>, ScheduleInvariantError> {
    let screens = messages
        .chunk_by(|prev, next| !breaks_group(prev, next))
        .fold(Pagination::default(), |acc, group| {
            acc.push_group(group, layout)
        })
        .finish();

    check_partition(messages, &screens)?;
    Ok(screens)
}

/// Screens must hold every input message exactly once, in source order, and
/// none may be empty.
pub fn check_partition(
    messages: &[Message],
    screens: &[Screen],
) -> Result<(), ScheduleInvariantError> {
    let actual: usize = screens.iter().map(|s| s.messages.len()).sum();
    if actual != messages.len() {
        return Err(ScheduleInvariantError::MessageCountMismatch {
            expected: messages.len(),
            actual,
        });
    }

    if let Some(screen) = screens.iter().position(|s| s.messages.is_empty()) {
        return Err(ScheduleInvariantError::EmptyScreen {
            screen,
            input_len: messages.len(),
        });
    }

    let emitted = screens.iter().flat_map(|s| s.message_ids());
    for (expected, found) in messages.iter().map(|m| m.id).zip(emitted) {
        if expected != found {
            return Err(ScheduleInvariantError::OrderMismatch { expected, found });
        }
    }

    Ok(())
}

/// Fallback layout: one screen holding the whole conversation.
pub fn unpaginated(messages: &[Message]) -> Vec<Screen> {
    let Some(first) = messages.first() else {
        return Vec::new();
    };
    vec![Screen {
        messages: messages.to_vec(),
        show_header_chrome: true,
        theme: first.theme.clone(),
        conversation_id: first.conversation_id,
    }]
}
