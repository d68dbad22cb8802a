use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    pub shown_at: Instant,
}

/// Toasts that disappear on their own after `ttl`.
#[derive(Debug)]
pub struct Notices {
    ttl: Duration,
    items: VecDeque<Notice>,
}

/// Older toasts are dropped past this many.
const MAX_NOTICES: usize = 4;

impl Notices {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            items: VecDeque::new(),
        }
    }

    pub fn push(&mut self, kind: NoticeKind, text: impl Into<String>, now: Instant) {
        let text = text.into();
        // Repeated failures (e.g. every request after a token expired) collapse.
        if let Some(last) = self.items.back_mut() {
            if last.kind == kind && last.text == text {
                last.shown_at = now;
                return;
            }
        }
        self.items.push_back(Notice {
            kind,
            text,
            shown_at: now,
        });
        while self.items.len() > MAX_NOTICES {
            self.items.pop_front();
        }
    }

    /// Drop expired notices. Returns whether anything changed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        let ttl = self.ttl;
        self.items
            .retain(|n| now.saturating_duration_since(n.shown_at) < ttl);
        before != self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.items.back()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
