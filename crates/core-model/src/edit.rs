//! The two edit primitives (spec §4.1) and the position-observer broadcast
//! every other mutation in this crate reduces to.

use crate::{Document, View};
use core_state::{ClipboardSink, Cursor, UndoEntry};
use core_text::{Position, Range};

/// Update `p` for an insertion of the bytes that now occupy `[a, b)`. Returns
/// whether `p` actually moved (callers use this to know which cursors need
/// their `ghost_x` recomputed).
pub fn move_on_insert(p: &mut Position, a: Position, b: Position) -> bool {
    let before = *p;
    if p.y == a.y && p.x >= a.x {
        p.y += b.y - a.y;
        p.x = b.x + (p.x - a.x);
    } else if p.y > a.y {
        p.y += b.y - a.y;
    }
    *p != before
}

/// Update `p` for a deletion of `[a, b)` (`a <= b`). Returns whether `p` moved.
pub fn move_on_delete(p: &mut Position, a: Position, b: Position) -> bool {
    let before = *p;
    if a <= *p && *p <= b {
        *p = a;
    } else if b.y > a.y && p.y > b.y {
        p.y -= b.y - a.y;
    } else if p.y == b.y && p.x + 1 >= b.x {
        p.y = a.y;
        let diff = p.x as isize - b.x as isize;
        p.x = (a.x as isize + diff) as usize;
    }
    *p != before
}

/// Broadcast an edit's `(a, b)` range to every position this document's
/// views and highlights own (spec §4.1 "broadcast targets"). `f` is one of
/// `move_on_insert`/`move_on_delete` bound to `(a, b)`.
fn broadcast(doc: &mut Document, views: &mut [View], ctx: &core_config::EditorContext, mut f: impl FnMut(&mut Position) -> bool) {
    for view in views.iter_mut() {
        for cursor in &mut view.cursors {
            if f(&mut cursor.pos) {
                cursor.ghost_x = doc.buffer.visual_offset(cursor.pos.y, cursor.pos.x, ctx.tab_width as usize) as i64;
            }
        }
        for p in &mut view.jumplist {
            f(p);
        }
        if let Some(anchor) = &mut view.selection_anchor {
            f(&mut anchor.a);
            f(&mut anchor.b);
        }
    }
    for h in &mut doc.buffer.highlights {
        f(&mut h.range.a);
        f(&mut h.range.b);
    }
}

/// Splice `s` into the document at `at`, record the inverse undo entry,
/// broadcast the mutation to every observer, and optionally re-tokenize.
/// Returns the exclusive end position `b` (spec §4.1 `insert`).
#[allow(clippy::too_many_arguments)]
pub fn insert(
    doc: &mut Document,
    views: &mut [View],
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
    at: Position,
    s: &str,
    cursor_hint: i32,
    re_parse: bool,
) -> Position {
    debug_assert!(at.y < doc.buffer.line_count());
    debug_assert!(at.x <= doc.buffer.line_len(at.y));

    let b = doc.buffer.splice_insert(at, s);

    if !doc.undo.is_undo_disabled() {
        doc.undo.push_undo_action(UndoEntry::Insert { a: at, b, bytes: s.to_string(), cursor_hint });
    }

    broadcast(doc, views, ctx, |p| move_on_insert(p, at, b));

    if re_parse {
        doc.reparse(tokenizer);
    }
    doc.buffer.push_highlight(Range::new(at, b), 2.0);

    tracing::trace!(target: "text.edit", y = at.y, x = at.x, len = s.len(), "insert");
    b
}

/// Remove `[a, b)` (`a <= b`; `a == b` is the spec's silent `EmptyRange`
/// no-op). Records the inverse undo entry and broadcasts the mutation.
/// Spec §9's open question resolves `b < a` as a caller precondition
/// violation, asserted rather than silently normalized.
pub fn remove_range(
    doc: &mut Document,
    views: &mut [View],
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
    a: Position,
    b: Position,
    cursor_hint: i32,
    re_parse: bool,
) {
    debug_assert!(a <= b, "remove_range requires a <= b (spec §9)");
    if a == b {
        return;
    }

    let bytes = doc.buffer.splice_remove(a, b);

    if !doc.undo.is_undo_disabled() {
        doc.undo.push_undo_action(UndoEntry::Delete { a, b, bytes, cursor_hint });
    }

    broadcast(doc, views, ctx, |p| move_on_delete(p, a, b));

    if re_parse {
        doc.reparse(tokenizer);
    }

    tracing::trace!(target: "text.edit", ay = a.y, ax = a.x, by = b.y, bx = b.x, "remove_range");
}

/// Append a new empty line at the end of the buffer: a thin `insert` of a
/// bare `\n` after the last line's last byte (spec §10.7 `push_line`).
/// Returns the position of the new line's start.
pub fn push_line(
    doc: &mut Document,
    views: &mut [View],
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
    cursor_hint: i32,
    re_parse: bool,
) -> Position {
    let y = doc.buffer.line_count() - 1;
    let at = Position::new(y, doc.buffer.line_len(y));
    insert(doc, views, ctx, tokenizer, at, "\n", cursor_hint, re_parse)
}

/// Delete line `y` wholesale: a thin `remove_range` spanning from its start
/// to the start of the following line, so the removed bytes carry the
/// trailing newline with them (spec §10.7 `delete_line`). The last line has
/// no following newline to take, so it's merged backward into its
/// predecessor instead; a single-line buffer just has its content cleared,
/// preserving the invariant that a buffer always has at least one line.
pub fn delete_line(
    doc: &mut Document,
    views: &mut [View],
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
    y: usize,
    cursor_hint: i32,
    re_parse: bool,
) {
    let n = doc.buffer.line_count();
    if n == 1 {
        let len = doc.buffer.line_len(0);
        if len > 0 {
            remove_range(doc, views, ctx, tokenizer, Position::new(0, 0), Position::new(0, len), cursor_hint, re_parse);
        }
        return;
    }
    if y + 1 < n {
        remove_range(doc, views, ctx, tokenizer, Position::new(y, 0), Position::new(y + 1, 0), cursor_hint, re_parse);
    } else {
        let prev_len = doc.buffer.line_len(y - 1);
        let len = doc.buffer.line_len(y);
        remove_range(doc, views, ctx, tokenizer, Position::new(y - 1, prev_len), Position::new(y, len), cursor_hint, re_parse);
    }
}

/// Undo one action group: walk its entries back to front, applying each
/// inverted, then re-parse once (spec §4.2 `undo`). `_raw_mode_depth` is
/// held nonzero for the duration so replayed inserts don't re-trigger
/// autoindent (spec §9 "Reentrant raw mode") — undo must be a strict inverse.
pub fn undo(
    doc: &mut Document,
    views: &mut [View],
    home_view: usize,
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
) -> bool {
    let Some(steps) = doc.undo.undo_steps() else { return false };
    doc.undo.begin_replay();
    doc.buffer._raw_mode_depth += 1;
    for step in steps {
        match step {
            UndoEntry::Insert { a, b, .. } => remove_range(doc, views, ctx, tokenizer, a, b, -1, false),
            UndoEntry::Delete { a, bytes, .. } => {
                insert(doc, views, ctx, tokenizer, a, &bytes, -1, false);
            }
            UndoEntry::CursorSnapshot(cursors) => views[home_view].cursors = cursors,
            UndoEntry::GroupBegin | UndoEntry::GroupEnd => {}
        }
    }
    doc.reparse(tokenizer);
    doc.buffer._raw_mode_depth -= 1;
    doc.undo.end_replay();
    true
}

/// Redo one action group: walk its entries forward, applying each as
/// originally performed (spec §4.2 `redo`). Same raw-mode suppression as `undo`.
pub fn redo(
    doc: &mut Document,
    views: &mut [View],
    home_view: usize,
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
) -> bool {
    let Some(steps) = doc.undo.redo_steps() else { return false };
    doc.undo.begin_replay();
    doc.buffer._raw_mode_depth += 1;
    for step in steps {
        match step {
            UndoEntry::Insert { a, bytes, .. } => {
                insert(doc, views, ctx, tokenizer, a, &bytes, -1, false);
            }
            UndoEntry::Delete { a, b, .. } => remove_range(doc, views, ctx, tokenizer, a, b, -1, false),
            UndoEntry::CursorSnapshot(cursors) => views[home_view].cursors = cursors,
            UndoEntry::GroupBegin | UndoEntry::GroupEnd => {}
        }
    }
    doc.reparse(tokenizer);
    doc.buffer._raw_mode_depth -= 1;
    doc.undo.end_replay();
    true
}

/// The single characters that re-trigger autoindent on the line they land in
/// when typed interactively (spec §4.4 "Insert-character autoindent hook").
const AUTOINDENT_TRIGGERS: [char; 4] = ['}', ')', ']', '>'];

/// Recompute and splice in line `y`'s indentation to match `autoindent`'s
/// target level, via the ordinary `remove_range`/`insert` primitives (so the
/// reindent is itself undoable and broadcasts to observers like any other edit).
fn autoindent_line(
    doc: &mut Document,
    views: &mut [View],
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
    y: usize,
) {
    let target = crate::autoindent::autoindent(&doc.buffer, &doc.parse, y);
    let (a, b, ws) = crate::autoindent::set_indent(&doc.buffer, y, target);
    let mut changed = false;
    if b.x > a.x {
        remove_range(doc, views, ctx, tokenizer, a, b, -1, false);
        changed = true;
    }
    if !ws.is_empty() {
        insert(doc, views, ctx, tokenizer, a, &ws, -1, false);
        changed = true;
    }
    if changed {
        doc.reparse(tokenizer);
    }
}

/// Insert one user-typed character at `at` and, unless raw mode is active
/// (paste/undo replay), re-run autoindent on its line if it's one of the
/// bracket-closing triggers (spec §4.4). Returns the exclusive end position.
pub fn type_char(
    doc: &mut Document,
    views: &mut [View],
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
    at: Position,
    ch: char,
    cursor_hint: i32,
) -> Position {
    let mut buf = [0u8; 4];
    let s = ch.encode_utf8(&mut buf);
    let b = insert(doc, views, ctx, tokenizer, at, s, cursor_hint, true);
    if doc.buffer._raw_mode_depth == 0 && AUTOINDENT_TRIGGERS.contains(&ch) {
        autoindent_line(doc, views, ctx, tokenizer, at.y);
    }
    b
}

/// Close an action group, posting the synthesized clipboard payload (if
/// any) to `clipboard` (spec §4.2 step 3).
pub fn action_end(doc: &mut Document, view: &View, clipboard: &mut dyn ClipboardSink) {
    if let Some(text) = doc.undo.action_end(&view.cursors) {
        clipboard.set_clipboard_text(text);
    }
}

/// Reset the document to a single empty line and a single cursor at the
/// origin, wrapped in one action group: repeatedly `delete_line` the last
/// line, then `delete_line` whatever remains on line 0.
#[allow(clippy::too_many_arguments)]
pub fn empty(
    doc: &mut Document,
    views: &mut [View],
    home_view: usize,
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
    clipboard: &mut dyn ClipboardSink,
) {
    doc.undo.action_begin(&views[home_view].cursors);

    while doc.buffer.line_count() > 1 {
        let last = doc.buffer.line_count() - 1;
        delete_line(doc, views, ctx, tokenizer, last, -1, false);
    }
    delete_line(doc, views, ctx, tokenizer, 0, -1, false);
    doc.reparse(tokenizer);

    for view in views.iter_mut() {
        view.cursors = vec![Cursor::origin()];
    }

    action_end(doc, &views[home_view], clipboard);
}

/// Trim trailing whitespace from every line, wrapped in one action group —
/// a common pre-save hook that reduces entirely to `remove_range`.
pub fn remove_trailing_whitespace(
    doc: &mut Document,
    views: &mut [View],
    home_view: usize,
    ctx: &core_config::EditorContext,
    tokenizer: &dyn core_parse::Tokenizer,
    clipboard: &mut dyn ClipboardSink,
) {
    doc.undo.action_begin(&views[home_view].cursors);

    for y in 0..doc.buffer.line_count() {
        if let Some((a, b)) = crate::autoindent::trailing_whitespace_range(&doc.buffer, y) {
            remove_range(doc, views, ctx, tokenizer, a, b, -1, false);
        }
    }
    doc.reparse(tokenizer);

    action_end(doc, &views[home_view], clipboard);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use core_config::EditorContext;
    use core_parse::ReferenceScanner;
    use core_state::Cursor;
    use core_text::{Buffer, LineEnding};

    fn doc_from(lines: &[&str]) -> Document {
        let buffer = Buffer::from_lines(lines.iter().map(|s| s.to_string()).collect(), LineEnding::Lf);
        Document { buffer, undo: core_state::UndoEngine::new(), language: core_parse::Language::None, parse: core_parse::ParseResult::default() }
    }

    #[test]
    fn move_on_insert_and_delete_are_inverses_outside_the_edited_range() {
        let a = Position::new(0, 2);
        let b = Position::new(0, 5);
        let mut p = Position::new(1, 3); // on a later line, unaffected by same-line logic but shifted by row delta 0
        let before = p;
        move_on_insert(&mut p, a, b);
        move_on_delete(&mut p, a, b);
        assert_eq!(p, before);
    }

    #[test]
    fn multi_cursor_insert_scenario() {
        let mut doc = doc_from(&["ab", "cd"]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let mut views = vec![View { cursors: vec![Cursor::at(Position::new(0, 0)), Cursor::at(Position::new(1, 0))], jumplist: Vec::new(), jumplist_pos: 0, selection_anchor: None }];

        doc.undo.action_begin(&views[0].cursors);
        insert(&mut doc, &mut views, &ctx, &tok, Position::new(0, 0), "X", 0, false);
        insert(&mut doc, &mut views, &ctx, &tok, views[0].cursors[1].pos, "X", 1, false);
        doc.undo.action_end(&views[0].cursors);

        assert_eq!(doc.buffer.line(0).unwrap(), "Xab");
        assert_eq!(doc.buffer.line(1).unwrap(), "Xcd");
        assert_eq!(views[0].cursors[0].pos, Position::new(0, 1));
        assert_eq!(views[0].cursors[1].pos, Position::new(1, 1));

        undo(&mut doc, &mut views, 0, &ctx, &tok);
        assert_eq!(doc.buffer.line(0).unwrap(), "ab");
        assert_eq!(doc.buffer.line(1).unwrap(), "cd");
        assert_eq!(views[0].cursors[0].pos, Position::new(0, 0));
        assert_eq!(views[0].cursors[1].pos, Position::new(1, 0));
    }

    #[test]
    fn cross_line_delete_scenario() {
        let mut doc = doc_from(&["hello", "world"]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let mut views = vec![View { cursors: vec![Cursor::at(Position::new(1, 4))], jumplist: Vec::new(), jumplist_pos: 0, selection_anchor: None }];

        remove_range(&mut doc, &mut views, &ctx, &tok, Position::new(0, 2), Position::new(1, 3), -1, false);

        assert_eq!(doc.buffer.line_count(), 1);
        assert_eq!(doc.buffer.line(0).unwrap(), "held");
        assert_eq!(views[0].cursors[0].pos, Position::new(0, 3));
    }

    #[test]
    fn deleting_a_range_containing_a_cursor_collapses_it_to_a() {
        let mut doc = doc_from(&["abcdef"]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let a = Position::new(0, 1);
        let mut views = vec![View { cursors: vec![Cursor::at(Position::new(0, 3))], jumplist: Vec::new(), jumplist_pos: 0, selection_anchor: None }];
        remove_range(&mut doc, &mut views, &ctx, &tok, a, Position::new(0, 4), -1, false);
        assert_eq!(views[0].cursors[0].pos, a);
    }

    #[test]
    fn no_op_group_elision_leaves_undo_log_length_unchanged() {
        let mut doc = doc_from(&["abc"]);
        let cursors = vec![Cursor::at(Position::new(0, 0))];
        doc.undo.action_begin(&cursors);
        doc.undo.action_end(&cursors);
        assert_eq!(doc.undo.next_undo_index(), 0);
    }

    #[test]
    fn clipboard_synthesis_on_multi_cursor_delete_line() {
        // "foo\nbar\n" is three lines -- "foo", "bar", and the trailing empty
        // line the final '\n' opens.
        let mut doc = doc_from(&["foo", "bar", ""]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let mut views = vec![View { cursors: vec![Cursor::at(Position::new(0, 0)), Cursor::at(Position::new(1, 0))], jumplist: Vec::new(), jumplist_pos: 0, selection_anchor: None }];
        let mut clipboard = core_state::RecordingClipboard::default();

        doc.undo.action_begin(&views[0].cursors);
        delete_line(&mut doc, &mut views, &ctx, &tok, 0, 0, false);
        let y = views[0].cursors[1].pos.y;
        delete_line(&mut doc, &mut views, &ctx, &tok, y, 1, false);
        action_end(&mut doc, &views[0], &mut clipboard);

        assert_eq!(clipboard.last.as_deref(), Some("foo\n\nbar\n"));
    }

    #[test]
    fn push_line_appends_an_empty_line_and_undoes_cleanly() {
        let mut doc = doc_from(&["foo"]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let mut views = vec![View::new()];

        doc.undo.action_begin(&views[0].cursors);
        push_line(&mut doc, &mut views, &ctx, &tok, -1, false);
        doc.undo.action_end(&views[0].cursors);

        assert_eq!(doc.buffer.lines().to_vec(), vec!["foo".to_string(), "".to_string()]);

        undo(&mut doc, &mut views, 0, &ctx, &tok);
        assert_eq!(doc.buffer.lines().to_vec(), vec!["foo".to_string()]);
    }

    #[test]
    fn delete_line_in_the_middle_carries_its_newline_away() {
        let mut doc = doc_from(&["foo", "bar", "baz"]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let mut views = vec![View::new()];

        delete_line(&mut doc, &mut views, &ctx, &tok, 1, -1, false);

        assert_eq!(doc.buffer.lines().to_vec(), vec!["foo".to_string(), "baz".to_string()]);
    }

    #[test]
    fn delete_line_on_the_last_line_merges_backward() {
        let mut doc = doc_from(&["foo", "bar"]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let mut views = vec![View::new()];

        delete_line(&mut doc, &mut views, &ctx, &tok, 1, -1, false);

        assert_eq!(doc.buffer.lines().to_vec(), vec!["foobar".to_string()]);
    }

    #[test]
    fn autoindent_on_closing_brace_scenario_3() {
        // spec §8 scenario 3: tab style 2 spaces, cursor at (2,2) inside the
        // two-space indent of a blank third line, typing '}' dedents it to 0.
        let mut doc = doc_from(&["if (x) {", "  y;", "  "]);
        doc.buffer.tab_type = 2;
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        doc.reparse(&tok);
        let mut views = vec![View::new()];

        type_char(&mut doc, &mut views, &ctx, &tok, Position::new(2, 2), '}', -1);

        assert_eq!(doc.buffer.line(2).unwrap(), "}");
    }

    #[test]
    fn type_char_does_not_autoindent_while_raw_mode_is_active() {
        let mut doc = doc_from(&["if (x) {", "  y;", "  "]);
        doc.buffer.tab_type = 2;
        doc.buffer._raw_mode_depth += 1;
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        doc.reparse(&tok);
        let mut views = vec![View::new()];

        type_char(&mut doc, &mut views, &ctx, &tok, Position::new(2, 2), '}', -1);

        assert_eq!(doc.buffer.line(2).unwrap(), "  }");
    }

    #[test]
    fn insert_newline_at_end_of_line_and_at_start_of_next_are_equivalent() {
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;

        let mut doc1 = doc_from(&["hi", "there"]);
        let mut views1 = vec![View::new()];
        insert(&mut doc1, &mut views1, &ctx, &tok, Position::new(0, 2), "\n", -1, false);

        let mut doc2 = doc_from(&["hi", "there"]);
        let mut views2 = vec![View::new()];
        insert(&mut doc2, &mut views2, &ctx, &tok, Position::new(1, 0), "\n", -1, false);

        assert_eq!(doc1.buffer.lines(), doc2.buffer.lines());
    }

    #[test]
    fn empty_resets_buffer_to_one_blank_line_and_one_cursor_at_origin() {
        let mut doc = doc_from(&["foo", "bar", "baz"]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let mut views = vec![View { cursors: vec![Cursor::at(Position::new(1, 2)), Cursor::at(Position::new(2, 0))], jumplist: Vec::new(), jumplist_pos: 0, selection_anchor: None }];
        let mut clipboard = core_state::RecordingClipboard::default();

        empty(&mut doc, &mut views, 0, &ctx, &tok, &mut clipboard);

        assert_eq!(doc.buffer.line_count(), 1);
        assert_eq!(doc.buffer.line(0).unwrap(), "");
        assert_eq!(views[0].cursors, vec![Cursor::origin()]);

        undo(&mut doc, &mut views, 0, &ctx, &tok);
        assert_eq!(doc.buffer.lines().to_vec(), vec!["foo".to_string(), "bar".to_string(), "baz".to_string()]);
        assert_eq!(views[0].cursors, vec![Cursor::at(Position::new(1, 2)), Cursor::at(Position::new(2, 0))]);
    }

    #[test]
    fn remove_trailing_whitespace_trims_every_line_in_one_group() {
        let mut doc = doc_from(&["foo  ", "bar", "baz\t"]);
        let ctx = EditorContext::default();
        let tok = ReferenceScanner;
        let mut views = vec![View::new()];
        let mut clipboard = core_state::RecordingClipboard::default();

        remove_trailing_whitespace(&mut doc, &mut views, 0, &ctx, &tok, &mut clipboard);

        assert_eq!(doc.buffer.lines().to_vec(), vec!["foo".to_string(), "bar".to_string(), "baz".to_string()]);

        undo(&mut doc, &mut views, 0, &ctx, &tok);
        assert_eq!(doc.buffer.lines().to_vec(), vec!["foo  ".to_string(), "bar".to_string(), "baz\t".to_string()]);
    }
}
