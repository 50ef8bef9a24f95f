//! Line-vector text storage: `Position`, `Range`, and the `Buffer` that owns a
//! document's lines.
//!
//! Storage is an ordered `Vec<String>` of lines, never a rope or piece table:
//! each line is a plain owned byte-string with no embedded `\n`. Positions are
//! byte offsets into a line, not grapheme or character counts; `grapheme` and
//! `advance`/`advance_r` below are what keep callers from landing mid-UTF-8.

use std::path::{Path, PathBuf};

pub mod grapheme;

/// A position inside a buffer: `y` indexes a line, `x` is a byte offset within it.
/// `x` may equal the line's byte length (the "just past end" slot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub y: usize,
    pub x: usize,
}

impl Position {
    pub const fn new(y: usize, x: usize) -> Self {
        Self { y, x }
    }

    pub const fn origin() -> Self {
        Self { y: 0, x: 0 }
    }
}

/// A half-open range `[a, b)` with `a <= b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub a: Position,
    pub b: Position,
}

impl Range {
    /// Construct a range, swapping endpoints if passed out of order.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b { Self { a, b } } else { Self { a: b, b: a } }
    }

    pub fn contains(&self, p: Position) -> bool {
        self.a <= p && p < self.b
    }
}

/// Detected end-of-line convention. Affects serialization only, never indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// A transient highlight span with a decaying alpha, used only by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub range: Range,
    pub alpha: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8")]
    InvalidEncoding { path: PathBuf },
}

/// Read a file into lines plus its detected line ending. Lines never contain
/// `\r` or `\n`; a file with no trailing newline still yields a final,
/// possibly-empty-but-present, last line per invariant (1).
pub fn lines_from_file(path: &Path) -> Result<(Vec<String>, LineEnding), LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|_| LoadError::InvalidEncoding {
        path: path.to_path_buf(),
    })?;
    let ending = if text.contains("\r\n") {
        LineEnding::CrLf
    } else {
        LineEnding::Lf
    };
    let normalized = text.replace("\r\n", "\n");
    let mut lines: Vec<String> = normalized.split('\n').map(str::to_owned).collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    Ok((lines, ending))
}

/// The document's owned line store and the buffer-local metadata that rides
/// along with it: detected line ending, language tag, tab style, highlight
/// list, and the reentrant raw-mode counter that suppresses autoindent and
/// similar conveniences during paste/undo replay.
///
/// Undo state and cursors are deliberately not here — they live in
/// `core-state` and `core-model` respectively, so this crate stays a pure
/// text store with no notion of "who is looking at it".
#[derive(Debug, Clone)]
pub struct Buffer {
    lines: Vec<String>,
    pub line_ending: LineEnding,
    pub filename: Option<PathBuf>,
    pub description: String,
    pub is_dynamic: bool,
    /// `0` = hard tabs, `k > 0` = `k` spaces. Set once after load, per invariant (7).
    pub tab_type: i32,
    pub _raw_mode_depth: u32,
    pub highlights: Vec<Highlight>,
}

impl Buffer {
    /// A scratch buffer: one empty line, dynamic (not file-bound).
    pub fn dynamic(description: impl Into<String>) -> Self {
        Self {
            lines: vec![String::new()],
            line_ending: LineEnding::Lf,
            filename: None,
            description: description.into(),
            is_dynamic: true,
            tab_type: -1,
            _raw_mode_depth: 0,
            highlights: Vec::new(),
        }
    }

    pub fn from_lines(lines: Vec<String>, line_ending: LineEnding) -> Self {
        let lines = if lines.is_empty() { vec![String::new()] } else { lines };
        Self {
            lines,
            line_ending,
            filename: None,
            description: String::new(),
            is_dynamic: false,
            tab_type: -1,
            _raw_mode_depth: 0,
            highlights: Vec::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let (lines, line_ending) = lines_from_file(path)?;
        let mut b = Self::from_lines(lines, line_ending);
        b.filename = Some(path.to_path_buf());
        tracing::trace!(target: "text.buffer", path = %path.display(), lines = b.line_count(), "loaded");
        Ok(b)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, y: usize) -> Option<&str> {
        self.lines.get(y).map(String::as_str)
    }

    pub fn line_len(&self, y: usize) -> usize {
        self.lines.get(y).map(String::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    /// The byte at `p`, or `'\n'` if `p.x` is at or past the line's end (§10.7 `getchar`).
    pub fn getchar(&self, p: Position) -> char {
        match self.line(p.y) {
            Some(line) if p.x < line.len() => line[p.x..].chars().next().unwrap_or('\n'),
            _ => '\n',
        }
    }

    /// Raw `insert` splice with no undo recording or observer broadcast — the
    /// pure line-vector mutation described in spec §4.1. Returns the
    /// exclusive end position `b`. Callers needing undo/broadcast semantics
    /// go through `core-model`'s edit engine, which calls this.
    pub fn splice_insert(&mut self, at: Position, s: &str) -> Position {
        debug_assert!(at.y < self.lines.len());
        debug_assert!(at.x <= self.lines[at.y].len());

        if !s.contains('\n') {
            self.lines[at.y].insert_str(at.x, s);
            return Position::new(at.y, at.x + s.len());
        }

        let suffix = self.lines[at.y].split_off(at.x);
        let mut head = std::mem::take(&mut self.lines[at.y]);
        let mut chunks: Vec<&str> = s.split('\n').collect();
        let tail_len = chunks.last().map(|c| c.len()).unwrap_or(0);
        let k = chunks.len() - 1;

        head.push_str(chunks.remove(0));
        self.lines[at.y] = head;
        let mut insert_at = at.y + 1;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut line = chunk.to_string();
            if i == k - 1 {
                line.push_str(&suffix);
            }
            self.lines.insert(insert_at, line);
            insert_at += 1;
        }
        Position::new(at.y + k, tail_len)
    }

    /// Raw `remove_range` splice, no undo/broadcast. Precondition: `a <= b`
    /// (§9's Open Question: `b < a` is a caller bug, not normalized here).
    /// Returns the removed text with embedded `\n` at former line breaks.
    pub fn splice_remove(&mut self, a: Position, b: Position) -> String {
        debug_assert!(a <= b, "remove_range requires a <= b");
        if a == b {
            return String::new();
        }
        let b_y = b.y.min(self.lines.len() - 1);
        let b_x = if b.y >= self.lines.len() { self.lines[b_y].len() } else { b.x };

        if a.y == b_y {
            let removed = self.lines[a.y][a.x..b_x].to_string();
            self.lines[a.y].replace_range(a.x..b_x, "");
            return removed;
        }

        let mut removed = String::new();
        removed.push_str(&self.lines[a.y][a.x..]);
        removed.push('\n');
        for y in a.y + 1..b_y {
            removed.push_str(&self.lines[y]);
            removed.push('\n');
        }
        removed.push_str(&self.lines[b_y][..b_x]);

        let tail = self.lines[b_y][b_x..].to_string();
        self.lines[a.y].truncate(a.x);
        self.lines[a.y].push_str(&tail);
        self.lines.drain(a.y + 1..=b_y);
        removed
    }

    /// Append a blank line at the end of the buffer (§10.7 `push_line`).
    pub fn push_line(&mut self) {
        self.lines.push(String::new());
    }

    /// Remove the line at `y` outright (§10.7 `delete_line`); the buffer is
    /// never left with zero lines (invariant 1) — the last line is cleared
    /// instead of removed.
    pub fn delete_line(&mut self, y: usize) {
        if self.lines.len() > 1 {
            self.lines.remove(y);
        } else {
            self.lines[0].clear();
        }
    }

    /// Step one UTF-8 character forward, skipping continuation bytes;
    /// wraps to the next line at end-of-line. Returns `true` if the walk ran
    /// off the end of the buffer (clamped in place).
    pub fn advance(&self, p: &mut Position) -> bool {
        let len = self.line_len(p.y);
        if p.x < len {
            p.x = next_char_boundary(&self.lines[p.y], p.x);
        } else {
            p.x = 0;
            p.y += 1;
            if p.y >= self.lines.len() {
                p.y = self.lines.len() - 1;
                p.x = self.line_len(p.y);
                return true;
            }
        }
        false
    }

    /// Step one UTF-8 character backward, skipping continuation bytes;
    /// wraps to the end of the previous line at start-of-line.
    pub fn advance_r(&self, p: &mut Position) -> bool {
        if p.x > 0 {
            p.x = prev_char_boundary(&self.lines[p.y], p.x);
        } else if p.y == 0 {
            return true;
        } else {
            p.y -= 1;
            p.x = self.line_len(p.y);
        }
        false
    }

    /// Byte offset of the first non-whitespace byte on line `y` (§10.7 `begin_of_line`).
    pub fn begin_of_line(&self, y: usize) -> usize {
        match self.line(y) {
            Some(line) => line.find(|c: char| !c.is_whitespace()).unwrap_or(line.len()),
            None => 0,
        }
    }

    /// On-screen column of byte offset `x` on line `y`: counts code points by
    /// terminal display width (wide CJK/emoji codepoints count as 2, per
    /// `unicode_width`), expanding tabs to `tab_width`. Full grapheme-cluster
    /// segmentation is out of scope (spec Non-goal); this operates codepoint
    /// by codepoint rather than clustering combining marks.
    pub fn visual_offset(&self, y: usize, x: usize, tab_width: usize) -> usize {
        let Some(line) = self.line(y) else { return 0 };
        let mut col = 0usize;
        for (idx, ch) in line.char_indices() {
            if idx >= x {
                break;
            }
            col += char_width(ch, col, tab_width);
        }
        col
    }

    /// Inverse of `visual_offset`: the byte offset whose visual column is
    /// closest to (without exceeding) `target_col`.
    pub fn byte_offset_for_visual(&self, y: usize, target_col: usize, tab_width: usize) -> usize {
        let Some(line) = self.line(y) else { return 0 };
        let mut col = 0usize;
        for (idx, ch) in line.char_indices() {
            let next_col = col + char_width(ch, col, tab_width);
            if next_col > target_col {
                return idx;
            }
            col = next_col;
        }
        line.len()
    }

    /// Materialize `r` as an owned string with `\n` at line boundaries (§10.7 `range_to_string`).
    pub fn range_to_string(&self, r: Range) -> String {
        if r.a.y == r.b.y {
            return self.line(r.a.y).map(|l| l[r.a.x..r.b.x].to_string()).unwrap_or_default();
        }
        let mut s = String::new();
        if let Some(first) = self.line(r.a.y) {
            s.push_str(&first[r.a.x..]);
        }
        s.push('\n');
        for y in r.a.y + 1..r.b.y {
            if let Some(l) = self.line(y) {
                s.push_str(l);
            }
            s.push('\n');
        }
        if r.b.x > 0 {
            if let Some(last) = self.line(r.b.y) {
                s.push_str(&last[..r.b.x]);
            }
        }
        s
    }

    /// Tick every highlight's alpha down by `dt`, dropping entries that reach zero.
    pub fn decay_highlights(&mut self, dt: f32) {
        for h in &mut self.highlights {
            h.alpha -= dt;
        }
        self.highlights.retain(|h| h.alpha > 0.0);
    }

    pub fn push_highlight(&mut self, range: Range, alpha: f32) {
        self.highlights.push(Highlight { range, alpha });
    }

    pub fn is_file_bound(&self) -> bool {
        !self.is_dynamic && self.filename.is_some()
    }

    /// Serialize the lines back to bytes, re-joined with the detected
    /// line-ending style (spec §6 "Persisted state").
    pub fn to_bytes(&self) -> Vec<u8> {
        self.lines.join(self.line_ending.as_str()).into_bytes()
    }

    /// Write the buffer to `filename` (or its bound path). Does not touch
    /// undo state; callers mark the save point via `UndoEngine::mark_saved`.
    pub fn save_to_file(&self, path: &Path) -> Result<(), LoadError> {
        std::fs::write(path, self.to_bytes()).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Re-read the bound file from disk, replacing lines and line ending.
    /// Fails (without mutating `self`) if the buffer is not file-bound or
    /// the read fails — the core never leaves a buffer partially reloaded
    /// (spec §7 propagation policy).
    pub fn reload(&mut self) -> Result<(), LoadError> {
        let path = self.filename.clone().ok_or_else(|| LoadError::Io {
            path: PathBuf::new(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "buffer is not file-bound"),
        })?;
        let (lines, line_ending) = lines_from_file(&path)?;
        self.lines = if lines.is_empty() { vec![String::new()] } else { lines };
        self.line_ending = line_ending;
        tracing::trace!(target: "text.buffer", path = %path.display(), lines = self.lines.len(), "reloaded");
        Ok(())
    }
}

/// Display width of one codepoint at current column `col`: `tab_width`'s
/// worth for `\t` (expanding to the next tab stop), else the terminal column
/// width `unicode_width` reports (1 for narrow, 2 for wide CJK/emoji).
fn char_width(ch: char, col: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        tab_width - (col % tab_width)
    } else {
        unicode_width::UnicodeWidthChar::width(ch).unwrap_or(1)
    }
}

fn next_char_boundary(s: &str, byte: usize) -> usize {
    if byte >= s.len() {
        return s.len();
    }
    let mut i = byte + 1;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn prev_char_boundary(s: &str, byte: usize) -> usize {
    if byte == 0 {
        return 0;
    }
    let mut i = byte - 1;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
