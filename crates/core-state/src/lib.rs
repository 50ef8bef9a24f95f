//! Cursor state and the grouped, cursor-aware undo log.
//!
//! The log is a flat sequence of five tagged variants rather than a class
//! hierarchy: applying one dispatches on the tag, matching how the source
//! buffer core models its undo action union. `UndoEngine` only tracks the
//! log and its bookkeeping indices — it has no notion of a `Buffer` or a
//! broadcast target; applying a replayed step to the document is the edit
//! engine's job (`core-model`), which keeps this crate decoupled from the
//! observer-broadcast machinery.

use core_text::Position;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Sentinel meaning "always snap to end of line".
pub const GHOST_EOL: i64 = -1;
/// Sentinel meaning "always snap to the first non-whitespace column".
pub const GHOST_BOL: i64 = -2;

/// A cursor: a position plus the sticky visual column used by vertical motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub pos: Position,
    pub ghost_x: i64,
}

impl Cursor {
    pub const fn at(pos: Position) -> Self {
        Self { pos, ghost_x: 0 }
    }

    pub const fn origin() -> Self {
        Self::at(Position::origin())
    }
}

/// One entry in the undo log.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    GroupBegin,
    GroupEnd,
    CursorSnapshot(Vec<Cursor>),
    Insert {
        a: Position,
        b: Position,
        bytes: String,
        cursor_hint: i32,
    },
    Delete {
        a: Position,
        b: Position,
        bytes: String,
        cursor_hint: i32,
    },
}

/// Sink the edit engine posts clipboard text to on multi-cursor delete
/// synthesis. Kept as a trait so the core never depends on a concrete
/// system-clipboard crate.
pub trait ClipboardSink {
    fn set_clipboard_text(&mut self, text: String);
}

/// A sink that just remembers the last payload; used by tests and by any
/// caller that has not wired a real clipboard yet.
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    pub last: Option<String>,
}

impl ClipboardSink for RecordingClipboard {
    fn set_clipboard_text(&mut self, text: String) {
        self.last = Some(text);
    }
}

#[derive(Debug, Default)]
pub struct UndoEngine {
    log: Vec<UndoEntry>,
    next_undo_index: usize,
    /// `None` means the save marker is unreachable (invalidated by redo truncation).
    last_save_index: Option<usize>,
    action_group_depth: u32,
    /// Reentrant: undo/redo replay of one group may itself call through
    /// engine operations that would otherwise record new undo entries.
    undo_disabled: u32,
    groups_elided: AtomicU64,
    redo_truncations: AtomicU64,
}

impl UndoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_undo_index(&self) -> usize {
        self.next_undo_index
    }

    pub fn is_undo_disabled(&self) -> bool {
        self.undo_disabled > 0
    }

    pub fn groups_elided(&self) -> u64 {
        self.groups_elided.load(Ordering::Relaxed)
    }

    pub fn redo_truncations(&self) -> u64 {
        self.redo_truncations.load(Ordering::Relaxed)
    }

    /// `modified() <=> is_file_bound && last_save_index != next_undo_index`.
    pub fn modified(&self, is_file_bound: bool) -> bool {
        is_file_bound && self.last_save_index != Some(self.next_undo_index)
    }

    pub fn mark_saved(&mut self) {
        self.last_save_index = Some(self.next_undo_index);
    }

    /// Open an action group. Nested `action_begin`/`action_end` pairs
    /// collapse into a single recorded group (reentrant depth).
    pub fn action_begin(&mut self, cursors: &[Cursor]) {
        if self.undo_disabled > 0 {
            return;
        }
        if self.action_group_depth == 0 {
            self.push_entry(UndoEntry::GroupBegin);
            self.push_entry(UndoEntry::CursorSnapshot(cursors.to_vec()));
        }
        self.action_group_depth += 1;
    }

    /// Close an action group. Returns the clipboard payload to post, if the
    /// group's net effect meets the clipboard-synthesis rule (deletes only,
    /// no inserts).
    pub fn action_end(&mut self, cursors: &[Cursor]) -> Option<String> {
        if self.undo_disabled > 0 {
            return None;
        }
        self.action_group_depth -= 1;
        if self.action_group_depth != 0 {
            return None;
        }

        let changed = match self.log.last() {
            Some(UndoEntry::CursorSnapshot(pre)) => pre.as_slice() != cursors,
            _ => true,
        };
        if !changed {
            // Pop the opening CURSOR_SNAPSHOT and GROUP_BEGIN: nothing happened.
            self.log.pop();
            self.log.pop();
            self.next_undo_index -= 2;
            self.groups_elided.fetch_add(1, Ordering::Relaxed);
            trace!(target: "state.undo", "no_op_group_elided");
            return None;
        }

        self.push_entry(UndoEntry::CursorSnapshot(cursors.to_vec()));
        self.push_entry(UndoEntry::GroupEnd);

        self.synthesize_clipboard()
    }

    /// Group start index of the just-closed group (the `GroupEnd` just
    /// pushed sits at `next_undo_index - 1`).
    fn synthesize_clipboard(&self) -> Option<String> {
        let end = self.next_undo_index - 1;
        debug_assert!(matches!(self.log[end], UndoEntry::GroupEnd));
        let mut start = end;
        while !matches!(self.log[start - 1], UndoEntry::GroupBegin) {
            start -= 1;
        }
        debug_assert!(matches!(self.log[start], UndoEntry::CursorSnapshot(_)));

        if self.log[start..end].iter().any(|e| matches!(e, UndoEntry::Insert { .. })) {
            return None;
        }

        let mut by_cursor: std::collections::BTreeMap<i32, String> = std::collections::BTreeMap::new();
        let mut any = false;
        for entry in &self.log[start..end] {
            if let UndoEntry::Delete { bytes, cursor_hint, .. } = entry {
                if *cursor_hint >= 0 {
                    by_cursor.entry(*cursor_hint).or_default().push_str(bytes);
                    any = true;
                }
            }
        }
        if !any {
            return None;
        }
        Some(by_cursor.into_values().collect::<Vec<_>>().join("\n"))
    }

    /// Record a completed `Insert`/`Delete`. No-op while undo is disabled
    /// (during replay). Truncates any pending redo tail and invalidates the
    /// save marker if it lay in the discarded tail.
    pub fn push_undo_action(&mut self, entry: UndoEntry) {
        debug_assert!(matches!(entry, UndoEntry::Insert { .. } | UndoEntry::Delete { .. }));
        if self.undo_disabled > 0 {
            return;
        }
        self.push_entry(entry);
    }

    fn push_entry(&mut self, entry: UndoEntry) {
        if self.next_undo_index < self.log.len() {
            self.log.truncate(self.next_undo_index);
            if let Some(save) = self.last_save_index {
                if save > self.next_undo_index {
                    self.last_save_index = None;
                    self.redo_truncations.fetch_add(1, Ordering::Relaxed);
                    trace!(target: "state.undo", "save_marker_invalidated_by_redo_truncation");
                }
            }
        }
        self.log.push(entry);
        self.next_undo_index = self.log.len();
    }

    /// Begin a replay transaction (undo or redo): reentrant, disables undo
    /// recording so the replayed ops don't append new entries.
    pub fn begin_replay(&mut self) {
        self.undo_disabled += 1;
    }

    pub fn end_replay(&mut self) {
        self.undo_disabled -= 1;
    }

    /// Pop one group off the log and return its interior entries (markers
    /// excluded) in the order they must be applied to undo it: the
    /// post-group cursor snapshot first, then ops back to front, then the
    /// pre-group snapshot last (so it wins).
    pub fn undo_steps(&mut self) -> Option<Vec<UndoEntry>> {
        if self.next_undo_index == 0 {
            return None;
        }
        self.next_undo_index -= 1;
        debug_assert!(matches!(self.log[self.next_undo_index], UndoEntry::GroupEnd));
        self.next_undo_index -= 1;

        let mut steps = Vec::new();
        loop {
            steps.push(self.log[self.next_undo_index].clone());
            if matches!(self.log[self.next_undo_index], UndoEntry::GroupBegin) || self.next_undo_index == 0 {
                break;
            }
            self.next_undo_index -= 1;
        }
        // The GROUP_BEGIN marker itself is not a replay step.
        if matches!(steps.last(), Some(UndoEntry::GroupBegin)) {
            steps.pop();
        }
        trace!(target: "state.undo", next_undo_index = self.next_undo_index, steps = steps.len(), "undo");
        Some(steps)
    }

    /// Symmetric to `undo_steps`: walk a group forward, returning entries in
    /// application order (pre-snapshot first, ops forward, post-snapshot last).
    pub fn redo_steps(&mut self) -> Option<Vec<UndoEntry>> {
        if self.next_undo_index == self.log.len() {
            return None;
        }
        debug_assert!(matches!(self.log[self.next_undo_index], UndoEntry::GroupBegin));
        self.next_undo_index += 1;

        let mut steps = Vec::new();
        while !matches!(self.log[self.next_undo_index], UndoEntry::GroupEnd) {
            steps.push(self.log[self.next_undo_index].clone());
            self.next_undo_index += 1;
        }
        self.next_undo_index += 1;
        trace!(target: "state.undo", next_undo_index = self.next_undo_index, steps = steps.len(), "redo");
        Some(steps)
    }
}
