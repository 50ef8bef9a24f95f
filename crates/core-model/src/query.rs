//! Read-only query helpers over a document's token stream and rectangular
//! position ranges (spec §4.5).

use core_parse::{ParseResult, TokenInfo, TokenKind};
use core_text::{Buffer, Position, Range};

/// Binary search `parse.tokens` (sorted by start position, per
/// `core_parse::ParseResult`'s own invariant) for the token containing `p`,
/// if any (spec §4.5 `gettoken`).
pub fn gettoken(parse: &ParseResult, p: Position) -> Option<&TokenInfo> {
    let idx = parse.tokens.partition_point(|t| t.a <= p);
    if idx == 0 {
        return None;
    }
    let candidate = &parse.tokens[idx - 1];
    (candidate.a <= p && p < candidate.b).then_some(candidate)
}

/// Step `p` back one byte and look up the token there; return its start
/// position iff that token is an identifier whose range still contains the
/// stepped-back `p` (spec §4.5 `find_start_of_identifier`). `None` if `p` is
/// at buffer start or the byte behind it isn't part of an identifier token.
pub fn find_start_of_identifier(buffer: &Buffer, parse: &ParseResult, p: Position) -> Option<Position> {
    let mut stepped = p;
    if buffer.advance_r(&mut stepped) {
        return None;
    }
    let token = gettoken(parse, stepped)?;
    (token.kind == TokenKind::Identifier && token.a <= stepped && stepped < token.b).then_some(token.a)
}

/// A rectangular block of a buffer's position space: top-left corner
/// `(x, y)`, width `w`, height `h` (spec §4.5 `getrect`'s `r = (x,y,w,h)`,
/// grounded in `BufferRectIter`'s `Rect`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// Lazily iterate the rectangular block row-major: for each row, every byte
/// column from `r.x` up to `min(r.x + r.w, line.len)` inclusive, yielding the
/// actual byte at that column or a synthetic `'\n'` once `x` reaches the
/// row's end (spec §4.5 `getrect`; grounded in `BufferRectIter::next`/`operator*`).
pub struct RectIter<'a> {
    buffer: &'a Buffer,
    x0: usize,
    w: usize,
    y_end: usize,
    x: usize,
    y: usize,
}

impl Iterator for RectIter<'_> {
    type Item = (Position, char);

    fn next(&mut self) -> Option<Self::Item> {
        if self.y > self.y_end {
            return None;
        }
        let p = Position::new(self.y, self.x);
        let ch = self.buffer.getchar(p);
        let row_end = (self.x0 + self.w).min(self.buffer.line_len(self.y));
        if self.x >= row_end {
            self.y += 1;
            self.x = self.x0;
        } else {
            self.x += 1;
        }
        Some((p, ch))
    }
}

/// Build the lazy rectangular iterator for block `r`, clamping its height to
/// `h' = min(r.h, lines.len - 1 - r.y)` (spec §4.5).
pub fn getrect(buffer: &Buffer, r: Rect) -> RectIter<'_> {
    let max_h = buffer.line_count() - 1 - r.y;
    let y_end = r.y + r.h.min(max_h);
    RectIter { buffer, x0: r.x, w: r.w, y_end, x: r.x, y: r.y }
}

/// Concatenate the text of `ranges`, collapsing consecutive whitespace
/// (including the newlines between them) into single spaces — the "merged
/// range" used to build a one-line preview of a multi-line span (spec
/// §4.5 `get_merged_range`).
pub fn get_merged_range(buffer: &Buffer, ranges: &[Range]) -> String {
    let mut out = String::new();
    for r in ranges {
        let text = buffer.range_to_string(*r);
        for word in text.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_parse::{Language, ReferenceScanner, Tokenizer};
    use core_text::LineEnding;

    #[test]
    fn gettoken_finds_the_enclosing_identifier() {
        let b = Buffer::from_lines(vec!["foo bar".into()], LineEnding::Lf);
        let parse = ReferenceScanner.parse(b.lines(), Language::None);
        let token = gettoken(&parse, Position::new(0, 1)).unwrap();
        assert_eq!(token.text, "foo");
    }

    #[test]
    fn gettoken_returns_none_between_tokens() {
        let b = Buffer::from_lines(vec!["foo bar".into()], LineEnding::Lf);
        let parse = ReferenceScanner.parse(b.lines(), Language::None);
        assert!(gettoken(&parse, Position::new(0, 3)).is_none());
    }

    #[test]
    fn find_start_of_identifier_walks_back_to_the_first_letter() {
        let b = Buffer::from_lines(vec!["  my_var".into()], LineEnding::Lf);
        let parse = ReferenceScanner.parse(b.lines(), Language::None);
        let start = find_start_of_identifier(&b, &parse, Position::new(0, 8));
        assert_eq!(start, Some(Position::new(0, 2)));
    }

    #[test]
    fn find_start_of_identifier_none_when_preceding_byte_is_not_an_identifier() {
        let b = Buffer::from_lines(vec!["foo (bar)".into()], LineEnding::Lf);
        let parse = ReferenceScanner.parse(b.lines(), Language::None);
        // position 5 is just past '(' -- stepping back one byte lands on '(', not an identifier.
        assert_eq!(find_start_of_identifier(&b, &parse, Position::new(0, 5)), None);
    }

    #[test]
    fn getrect_iterates_row_major_emitting_synthetic_newline_at_row_end() {
        let b = Buffer::from_lines(vec!["ab".into(), "xyz".into()], LineEnding::Lf);
        let r = Rect { x: 0, y: 0, w: 2, h: 1 };
        let cells: Vec<_> = getrect(&b, r).collect();
        assert_eq!(
            cells,
            vec![
                (Position::new(0, 0), 'a'),
                (Position::new(0, 1), 'b'),
                (Position::new(0, 2), '\n'),
                (Position::new(1, 0), 'x'),
                (Position::new(1, 1), 'y'),
                (Position::new(1, 2), '\n'),
            ]
        );
    }

    #[test]
    fn getrect_clamps_height_to_buffer_end() {
        let b = Buffer::from_lines(vec!["ab".into()], LineEnding::Lf);
        let r = Rect { x: 0, y: 0, w: 1, h: 5 };
        let rows: std::collections::BTreeSet<usize> = getrect(&b, r).map(|(p, _)| p.y).collect();
        assert_eq!(rows, std::collections::BTreeSet::from([0]));
    }

    #[test]
    fn get_merged_range_collapses_whitespace_across_lines() {
        let b = Buffer::from_lines(vec!["hello   world".into(), "again".into()], LineEnding::Lf);
        let merged = get_merged_range(&b, &[Range::new(Position::new(0, 0), Position::new(1, 5))]);
        assert_eq!(merged, "hello world again");
    }
}
