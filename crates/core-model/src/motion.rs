//! Cursor motion: horizontal/vertical movement with sticky `ghost_x`,
//! cursor bookkeeping (dedup/collapse), the per-view jumplist, and scalar
//! text search (spec §4.3).

use core_state::{Cursor, GHOST_BOL, GHOST_EOL};
use core_text::{Buffer, Position};

/// Recompute `ghost_x` for a cursor that just moved horizontally: the
/// sticky column tracks visual offset until the next vertical motion.
fn stick(buffer: &Buffer, cursor: &mut Cursor, tab_width: usize) {
    cursor.ghost_x = buffer.visual_offset(cursor.pos.y, cursor.pos.x, tab_width) as i64;
}

/// Move one character left/right, clamped to the buffer (no line wrap).
/// `dx` may be negative. Resets `ghost_x` to the new column.
pub fn move_x(buffer: &Buffer, cursor: &mut Cursor, dx: i64, tab_width: usize) {
    let len = buffer.line_len(cursor.pos.y) as i64;
    let x = (cursor.pos.x as i64 + dx).clamp(0, len);
    cursor.pos.x = x as usize;
    stick(buffer, cursor, tab_width);
}

/// Move `dy` lines up/down, honoring `ghost_x`'s sentinels: `GHOST_EOL`
/// always snaps to end of line, `GHOST_BOL` to the first non-whitespace
/// column, a non-negative value to the closest byte offset at that visual
/// column (spec §4.3 "sticky column").
pub fn move_y(buffer: &Buffer, cursor: &mut Cursor, dy: i64, tab_width: usize) {
    let last = buffer.line_count() as i64 - 1;
    let y = (cursor.pos.y as i64 + dy).clamp(0, last) as usize;
    cursor.pos.y = y;
    cursor.pos.x = resolve_ghost_x(buffer, y, cursor.ghost_x, tab_width);
}

fn resolve_ghost_x(buffer: &Buffer, y: usize, ghost_x: i64, tab_width: usize) -> usize {
    if ghost_x == GHOST_EOL {
        buffer.line_len(y)
    } else if ghost_x == GHOST_BOL {
        buffer.begin_of_line(y)
    } else {
        buffer.byte_offset_for_visual(y, ghost_x as usize, tab_width)
    }
}

/// Jump straight to `p`, clamped into the buffer, resetting `ghost_x`.
pub fn move_to(buffer: &Buffer, cursor: &mut Cursor, p: Position, tab_width: usize) {
    cursor.pos.y = p.y.min(buffer.line_count() - 1);
    cursor.pos.x = p.x.min(buffer.line_len(cursor.pos.y));
    stick(buffer, cursor, tab_width);
}

/// Move to column `x` on the current line, clamped, resetting `ghost_x`.
pub fn move_to_x(buffer: &Buffer, cursor: &mut Cursor, x: usize, tab_width: usize) {
    cursor.pos.x = x.min(buffer.line_len(cursor.pos.y));
    stick(buffer, cursor, tab_width);
}

/// Move to line `y`, keeping the existing `ghost_x` (a vertical-only jump
/// behaves like repeated `move_y`, not like `move_to`).
pub fn move_to_y(buffer: &Buffer, cursor: &mut Cursor, y: usize, tab_width: usize) {
    cursor.pos.y = y.min(buffer.line_count() - 1);
    cursor.pos.x = resolve_ghost_x(buffer, cursor.pos.y, cursor.ghost_x, tab_width);
}

/// Move to the first non-whitespace column of the current line.
pub fn goto_beginline(buffer: &Buffer, cursor: &mut Cursor, tab_width: usize) {
    cursor.pos.x = buffer.begin_of_line(cursor.pos.y);
    cursor.ghost_x = GHOST_BOL;
    let _ = tab_width;
}

/// Move to the end of the current line.
pub fn goto_endline(buffer: &Buffer, cursor: &mut Cursor) {
    cursor.pos.x = buffer.line_len(cursor.pos.y);
    cursor.ghost_x = GHOST_EOL;
}

/// Remove duplicate cursors (same position), keeping the first occurrence,
/// and stable-sort the remainder by position (spec §3 "multi-cursor
/// invariant": cursors are always distinct and ordered).
pub fn deduplicate_cursors(cursors: &mut Vec<Cursor>) {
    let before = cursors.len();
    cursors.sort_by_key(|c| c.pos);
    cursors.dedup_by_key(|c| c.pos);
    if cursors.len() != before {
        tracing::trace!(target: "model.view", before, after = cursors.len(), "deduplicate_cursors");
    }
}

/// Merge cursors whose positions have crossed or collided after an edit
/// (e.g. two cursors landing on the same byte after a joint deletion).
/// Equivalent to `deduplicate_cursors` but named separately to match the
/// two call sites the edit engine distinguishes: per-edit dedup vs.
/// post-group cleanup.
pub fn collapse_cursors(cursors: &mut Vec<Cursor>) {
    deduplicate_cursors(cursors);
    if cursors.is_empty() {
        cursors.push(Cursor::origin());
    }
}

/// Push `p` onto the jumplist, discarding any forward history (mirrors the
/// undo log's redo-truncation-on-new-entry behavior). Skipped if `p` equals
/// the entry just before the current position — repeated jumps from the same
/// spot shouldn't pile up identical stops (spec §4.3 `jumplist_push`).
pub fn jumplist_push(jumplist: &mut Vec<Position>, jumplist_pos: &mut usize, p: Position) {
    if *jumplist_pos > 0 && jumplist[*jumplist_pos - 1] == p {
        return;
    }
    jumplist.truncate(*jumplist_pos);
    jumplist.push(p);
    *jumplist_pos = jumplist.len();
    tracing::trace!(target: "model.view", y = p.y, x = p.x, len = jumplist.len(), "jumplist_push");
}

/// Step the jumplist backward, returning the position to jump to, if any.
/// Collapses the view's cursors first, then skips any entry that equals the
/// (now-single) current cursor position (spec §4.3 `jumplist_prev`).
pub fn jumplist_prev(jumplist: &[Position], jumplist_pos: &mut usize, cursors: &mut Vec<Cursor>) -> Option<Position> {
    collapse_cursors(cursors);
    let current = cursors[0].pos;
    while *jumplist_pos > 0 {
        *jumplist_pos -= 1;
        let p = jumplist[*jumplist_pos];
        if p != current {
            return Some(p);
        }
    }
    None
}

/// Symmetric forward step; only the current-position skip applies (forward
/// traversal does not itself collapse cursors in the source).
pub fn jumplist_next(jumplist: &[Position], jumplist_pos: &mut usize, current: Position) -> Option<Position> {
    while *jumplist_pos + 1 < jumplist.len() {
        *jumplist_pos += 1;
        let p = jumplist[*jumplist_pos];
        if p != current {
            return Some(p);
        }
    }
    None
}

/// Search forward from `from` for the first occurrence of `needle`: the
/// current line's suffix first, then every following line from its start —
/// no wraparound past the end of the buffer (spec §4.3 `find`, grounded in
/// `BufferData::find`'s `for (++y; y < lines.size; ++y)`). `stay` controls
/// whether the scan may match at `from` itself (`stay=true`) or must start
/// one byte past it (`stay=false`, the usual "find next" case).
pub fn find(buffer: &Buffer, from: Position, needle: &str, stay: bool) -> Option<Position> {
    if needle.is_empty() {
        return None;
    }
    let start = if stay { from.x } else { from.x + 1 };
    if let Some(line) = buffer.line(from.y) {
        if start <= line.len() {
            if let Some(rel) = line[start..].find(needle) {
                return Some(Position::new(from.y, start + rel));
            }
        }
    }
    for y in from.y + 1..buffer.line_count() {
        let line = buffer.line(y).unwrap_or("");
        if let Some(rel) = line.find(needle) {
            return Some(Position::new(y, rel));
        }
    }
    None
}

/// Symmetric backward search: the current line's prefix up to (and, if
/// `stay`, including) `from.x`, then every prior line from its end, no
/// wraparound (spec §4.3 `find_r`, grounded in `BufferData::find_r`).
pub fn find_r(buffer: &Buffer, from: Position, needle: &str, stay: bool) -> Option<Position> {
    if needle.is_empty() {
        return None;
    }
    let end = if stay { from.x + 1 } else { from.x };
    if let Some(line) = buffer.line(from.y) {
        if let Some(rel) = line[..end.min(line.len())].rfind(needle) {
            return Some(Position::new(from.y, rel));
        }
    }
    for y in (0..from.y).rev() {
        let line = buffer.line(y).unwrap_or("");
        if let Some(rel) = line.rfind(needle) {
            return Some(Position::new(y, rel));
        }
    }
    None
}

/// Search and, if found, move the cursor there (spec §4.3 `find_and_move`).
/// Returns whether the cursor moved.
pub fn find_and_move(buffer: &Buffer, cursor: &mut Cursor, needle: &str, stay: bool, tab_width: usize) -> bool {
    match find(buffer, cursor.pos, needle, stay) {
        Some(p) => {
            move_to(buffer, cursor, p, tab_width);
            true
        }
        None => false,
    }
}

/// Backward counterpart of `find_and_move`.
pub fn find_and_move_r(buffer: &Buffer, cursor: &mut Cursor, needle: &str, stay: bool, tab_width: usize) -> bool {
    match find_r(buffer, cursor.pos, needle, stay) {
        Some(p) => {
            move_to(buffer, cursor, p, tab_width);
            true
        }
        None => false,
    }
}
