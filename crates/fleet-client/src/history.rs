//! Command recall history for an interactive session.
//!
//! Submitted lines are kept newest-last, capped with oldest-first
//! eviction. Recall walks a cursor from newest to oldest; stepping
//! back past the newest entry restores whatever the operator had
//! half-typed when they started recalling.

use std::collections::VecDeque;

/// Bounded recall history with a cursor
#[derive(Debug)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    cap: usize,
    /// Index into `entries` while recalling; `None` means not
    /// recalling. 0 is the oldest entry.
    cursor: Option<usize>,
    /// The in-progress line stashed when recall began
    stash: String,
}

impl CommandHistory {
    /// Create a history holding at most `cap` entries
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
            cursor: None,
            stash: String::new(),
        }
    }

    /// Record a submitted command and reset recall.
    ///
    /// Empty and whitespace-only lines are not recorded.
    pub fn push(&mut self, command: &str) {
        self.cursor = None;
        self.stash.clear();

        if command.trim().is_empty() {
            return;
        }
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(command.to_string());
    }

    /// Step towards older entries.
    ///
    /// On the first step the operator's current `pending` line is
    /// stashed so it can be restored later. Returns the entry the
    /// cursor now points at, or `None` if the history is empty or the
    /// cursor is already at the oldest entry.
    pub fn recall_up(&mut self, pending: &str) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }

        let next = match self.cursor {
            None => {
                self.stash = pending.to_string();
                self.entries.len() - 1
            }
            Some(0) => return None,
            Some(i) => i - 1,
        };

        self.cursor = Some(next);
        self.entries.get(next).map(String::as_str)
    }

    /// Step towards newer entries.
    ///
    /// Stepping past the newest entry ends recall and returns the
    /// stashed in-progress line. Returns `None` when not recalling.
    pub fn recall_down(&mut self) -> Option<String> {
        let i = self.cursor?;

        if i + 1 < self.entries.len() {
            self.cursor = Some(i + 1);
            self.entries.get(i + 1).cloned()
        } else {
            self.cursor = None;
            Some(std::mem::take(&mut self.stash))
        }
    }

    /// Whether a recall walk is in progress
    pub fn recalling(&self) -> bool {
        self.cursor.is_some()
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no commands have been recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
