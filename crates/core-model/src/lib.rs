//! The View layer and Edit Engine: the multi-cursor document model that
//! sits on top of `core-text`'s line store and `core-state`'s undo log.
//!
//! A `Document` bundles a `Buffer` with its `UndoEngine` and tokenizer
//! output; a `View` is a pane's cursor array and jumplist. The Edit Engine
//! (`edit` module) is the only thing that mutates a `Document`'s lines —
//! every other operation in this crate (motion, autoindent, query helpers)
//! reduces to its two primitives, `insert` and `remove_range` (spec §4.1).

pub mod autoindent;
pub mod edit;
pub mod motion;
pub mod query;

pub use core_parse::{Language, ParseResult, Tokenizer, detect_language};
pub use core_state::{ClipboardSink, Cursor, GHOST_BOL, GHOST_EOL, RecordingClipboard, UndoEngine, UndoEntry};
pub use core_text::{Buffer, Highlight, LineEnding, LoadError, Position, Range};

/// A buffer plus the state that rides along with every mutation: its undo
/// log and the tokenizer output autoindent depends on.
pub struct Document {
    pub buffer: Buffer,
    pub undo: UndoEngine,
    pub language: Language,
    pub parse: ParseResult,
}

impl Document {
    pub fn from_file(path: &std::path::Path, default_tab_type: i32) -> Result<Self, LoadError> {
        let buffer = Buffer::from_file(path)?;
        let language = detect_language(path);
        Ok(Self::finish_load(buffer, language, default_tab_type))
    }

    pub fn dynamic(description: impl Into<String>, default_tab_type: i32) -> Self {
        let mut buffer = Buffer::dynamic(description);
        buffer.tab_type = default_tab_type;
        Self { buffer, undo: UndoEngine::new(), language: Language::None, parse: ParseResult::default() }
    }

    fn finish_load(mut buffer: Buffer, language: Language, default_tab_type: i32) -> Self {
        autoindent::guess_tab_type(&mut buffer, default_tab_type);
        let mut doc = Self { buffer, undo: UndoEngine::new(), language, parse: ParseResult::default() };
        doc.reparse(&core_parse::ReferenceScanner);
        doc
    }

    /// Rebuild the tokenizer output for the whole buffer (spec §4.1: the
    /// parser is a whole-buffer re-tokenizer, incremental parsing is out of
    /// scope).
    pub fn reparse(&mut self, tokenizer: &dyn Tokenizer) {
        self.parse = tokenizer.parse(self.buffer.lines(), self.language);
        tracing::trace!(target: "model.parse", tokens = self.parse.tokens.len(), "reparsed");
    }

    pub fn is_modified(&self) -> bool {
        self.undo.modified(self.buffer.is_file_bound())
    }

    /// Reload the bound file from disk and clamp every view's cursors and
    /// jumplist back into range (spec §9's `reload`/`clamp_cursors` pairing).
    pub fn reload(&mut self, views: &mut [View]) -> Result<(), LoadError> {
        self.buffer.reload()?;
        for view in views.iter_mut() {
            view.clamp_to(&self.buffer);
        }
        self.reparse(&core_parse::ReferenceScanner);
        Ok(())
    }
}

/// A pane's cursor array and per-pane jumplist (spec §3 "View").
#[derive(Debug, Clone)]
pub struct View {
    pub cursors: Vec<Cursor>,
    pub jumplist: Vec<Position>,
    pub jumplist_pos: usize,
    /// Endpoints of the active visual-mode selection, if any — an observer
    /// the edit engine translates across mutations exactly like a cursor
    /// (spec §4.1 "both endpoints of every active selection anchor").
    pub selection_anchor: Option<Range>,
}

impl View {
    pub fn new() -> Self {
        Self { cursors: vec![Cursor::origin()], jumplist: Vec::new(), jumplist_pos: 0, selection_anchor: None }
    }

    pub fn at(pos: Position) -> Self {
        Self { cursors: vec![Cursor::at(pos)], jumplist: Vec::new(), jumplist_pos: 0, selection_anchor: None }
    }

    /// Clamp every cursor, jumplist entry, and selection anchor endpoint
    /// back into a buffer's valid range (invariant 2), e.g. after a reload.
    pub fn clamp_to(&mut self, buffer: &Buffer) {
        for c in &mut self.cursors {
            clamp_position(&mut c.pos, buffer);
        }
        for p in &mut self.jumplist {
            clamp_position(p, buffer);
        }
        if let Some(anchor) = &mut self.selection_anchor {
            clamp_position(&mut anchor.a, buffer);
            clamp_position(&mut anchor.b, buffer);
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_position(p: &mut Position, buffer: &Buffer) {
    p.y = p.y.min(buffer.line_count() - 1);
    p.x = p.x.min(buffer.line_len(p.y));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_starts_with_one_cursor_at_origin() {
        let v = View::new();
        assert_eq!(v.cursors.len(), 1);
        assert_eq!(v.cursors[0].pos, Position::origin());
    }

    #[test]
    fn clamp_to_pulls_cursors_back_into_a_shrunk_buffer() {
        let mut v = View::at(Position::new(5, 10));
        let buffer = Buffer::from_lines(vec!["ab".into()], LineEnding::Lf);
        v.clamp_to(&buffer);
        assert_eq!(v.cursors[0].pos, Position::new(0, 2));
    }
}
