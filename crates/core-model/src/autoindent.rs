//! Tab-type detection and the autoindent/reindent algorithms (spec §4.4).
//!
//! `tab_type` is `0` for hard tabs, `k > 0` for `k`-space soft tabs. Once a
//! file is loaded its tab type is fixed for the session (invariant 7) —
//! `guess_tab_type` only ever runs once, right after load.

use core_parse::{ParseResult, TokenKind};
use core_text::{Buffer, Position};

const STATEMENT_KEYWORDS: [&str; 4] = ["for", "if", "while", "else"];

/// Inspect the buffer's existing indentation to infer its tab style,
/// falling back to `default_tab_type` when no line gives a usable signal
/// (an empty file, or one that's all block comments/blank lines).
pub fn guess_tab_type(buffer: &mut Buffer, default_tab_type: i32) {
    let mut in_block_comment = false;
    for y in 0..buffer.line_count() {
        let line = buffer.line(y).unwrap_or("");
        let trimmed = line.trim();
        if in_block_comment {
            if trimmed.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("/*") && !trimmed.contains("*/") {
            in_block_comment = true;
            continue;
        }
        let leading: &str = &line[..line.len() - line.trim_start().len()];
        if leading.is_empty() {
            continue;
        }
        if leading.starts_with('\t') {
            buffer.tab_type = 0;
            tracing::trace!(target: "model.autoindent", tab_type = 0, "guessed_tab_type");
            return;
        }
        if leading.starts_with(' ') {
            buffer.tab_type = leading.len() as i32;
            tracing::trace!(target: "model.autoindent", tab_type = buffer.tab_type, "guessed_tab_type");
            return;
        }
    }
    buffer.tab_type = default_tab_type;
    tracing::trace!(target: "model.autoindent", tab_type = buffer.tab_type, "guessed_tab_type_default");
}

/// Indent *level* of line `y`'s existing leading whitespace (spec §4.4
/// `getindent`): count of leading `\t` for hard-tab buffers, or leading
/// spaces divided by `tab_type` for soft ones. Not a byte offset — see
/// `leading_ws_len` for that.
pub fn getindent(buffer: &Buffer, y: usize) -> i32 {
    let line = buffer.line(y).unwrap_or("");
    if buffer.tab_type <= 0 {
        line.chars().take_while(|&c| c == '\t').count() as i32
    } else {
        let spaces = line.chars().take_while(|&c| c == ' ').count();
        (spaces / buffer.tab_type as usize) as i32
    }
}

/// Byte length of line `y`'s leading whitespace run, used by `set_indent` to
/// know how much to splice over.
fn leading_ws_len(buffer: &Buffer, y: usize) -> usize {
    buffer.begin_of_line(y)
}

/// Net bracket delta contributed by the tokens that *start* on line `y`
/// (spec §4.4 `indentdepth`): `+1` per `{ [ (`, `−1` per `} ] )`. Also
/// reports whether the first token on the line is an identifier matching one
/// of the brace-less statement keywords (`for`, `if`, `while`, `else`),
/// which autoindent treats as opening an implicit indent level even with no
/// trailing `{`.
pub fn indentdepth(parse: &ParseResult, y: usize, has_statement: &mut bool) -> i32 {
    let mut depth = 0i32;
    let mut first = true;
    *has_statement = false;
    for token in parse.tokens.iter().filter(|t| t.a.y == y) {
        match token.kind {
            TokenKind::BraceOpen => depth += 1,
            TokenKind::BraceClose => depth -= 1,
            _ => {}
        }
        if first {
            first = false;
            if token.kind == TokenKind::Identifier && STATEMENT_KEYWORDS.contains(&token.text.as_str()) {
                *has_statement = true;
            }
        }
    }
    depth
}

/// Compute the indent *level* line `y` should have (spec §4.4 `Autoindent`):
/// base it on the nearest prior non-empty line `y'`, add a level if `y'`
/// opened a brace or a brace-less statement, remove one if `y` itself starts
/// by closing a level it didn't open; then walk further upward un-indenting
/// one level per dangling single-statement line (`if`/`for`/... with no
/// braces) so nested brace-less chains don't stack up.
pub fn autoindent(buffer: &Buffer, parse: &ParseResult, y: usize) -> i32 {
    let mut yp = None;
    let mut cursor = y;
    while cursor > 0 {
        cursor -= 1;
        if !buffer.line(cursor).unwrap_or("").trim().is_empty() {
            yp = Some(cursor);
            break;
        }
    }
    let Some(yp) = yp else { return 0 };

    let mut sp = false;
    let dp = indentdepth(parse, yp, &mut sp);
    let ip = getindent(buffer, yp);

    let mut s = false;
    let d = indentdepth(parse, y, &mut s);

    let mut t = ip;
    if dp > 0 || sp {
        t += 1;
    }
    if d < 0 && !s {
        t -= 1;
    }

    let mut cursor = yp;
    while cursor > 0 {
        cursor -= 1;
        let mut hs = false;
        let dd = indentdepth(parse, cursor, &mut hs);
        if dd == 0 && hs {
            t -= 1;
        } else {
            break;
        }
    }

    let t = t.max(0);
    tracing::trace!(target: "model.autoindent", y, levels = t, "autoindent");
    t
}

/// Replace line `y`'s leading whitespace so its indent equals `levels`
/// (spec §4.4 `set_indent`), rendering with the buffer's tab style. Returns
/// the `(a, b, replacement)` triple the caller splices in with `insert` /
/// `remove_range`.
pub fn set_indent(buffer: &Buffer, y: usize, levels: i32) -> (Position, Position, String) {
    let old_len = leading_ws_len(buffer, y);
    let new_ws = render_indent(buffer.tab_type, levels.max(0) as usize);
    (Position::new(y, 0), Position::new(y, old_len), new_ws)
}

/// Add one indent level to line `y`'s current indent (used by block-shift
/// commands, spec §4.4 "indent adjust" reducing to `insert`/`remove_range`).
pub fn add_indent(buffer: &Buffer, y: usize) -> i32 {
    getindent(buffer, y) + 1
}

fn render_indent(tab_type: i32, levels: usize) -> String {
    if tab_type <= 0 {
        "\t".repeat(levels)
    } else {
        " ".repeat(levels * tab_type as usize)
    }
}

/// The literal whitespace to splice in when the user presses Tab at column
/// `x` on line `y` (spec §4.4 `insert_tab`): a single `\t` for hard-tab
/// buffers, or enough spaces to reach the next `tab_type`-column stop.
pub fn insert_tab(buffer: &Buffer, y: usize, x: usize) -> String {
    if buffer.tab_type <= 0 {
        "\t".to_string()
    } else {
        let tab_type = buffer.tab_type as usize;
        let col = buffer.visual_offset(y, x, tab_type);
        " ".repeat(tab_type - (col % tab_type))
    }
}

/// Range of trailing whitespace on line `y`, if any (spec §4.4
/// `remove_trailing_whitespace`, run on save).
pub fn trailing_whitespace_range(buffer: &Buffer, y: usize) -> Option<(Position, Position)> {
    let line = buffer.line(y)?;
    let trimmed = line.trim_end();
    if trimmed.len() == line.len() {
        return None;
    }
    Some((Position::new(y, trimmed.len()), Position::new(y, line.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_parse::{Language, ReferenceScanner, Tokenizer};
    use core_text::LineEnding;

    #[test]
    fn guess_tab_type_detects_hard_tabs() {
        let mut b = Buffer::from_lines(vec!["if (x) {".into(), "\tdo_thing();".into()], LineEnding::Lf);
        guess_tab_type(&mut b, 4);
        assert_eq!(b.tab_type, 0);
    }

    #[test]
    fn guess_tab_type_detects_space_width() {
        let mut b = Buffer::from_lines(vec!["if (x) {".into(), "  do_thing();".into()], LineEnding::Lf);
        guess_tab_type(&mut b, 4);
        assert_eq!(b.tab_type, 2);
    }

    #[test]
    fn guess_tab_type_skips_block_comments_and_blank_lines() {
        let mut b = Buffer::from_lines(
            vec!["/*".into(), " * header".into(), " */".into(), "".into(), "  real_code();".into()],
            LineEnding::Lf,
        );
        guess_tab_type(&mut b, 4);
        assert_eq!(b.tab_type, 2);
    }

    #[test]
    fn guess_tab_type_falls_back_to_default_on_blank_file() {
        let mut b = Buffer::from_lines(vec![String::new()], LineEnding::Lf);
        guess_tab_type(&mut b, 4);
        assert_eq!(b.tab_type, 4);
    }

    #[test]
    fn autoindent_adds_one_level_inside_a_brace() {
        let mut b = Buffer::from_lines(vec!["if (x) {".into(), "".into()], LineEnding::Lf);
        b.tab_type = 2;
        let parse = ReferenceScanner.parse(b.lines(), Language::C);
        let levels = autoindent(&b, &parse, 1);
        assert_eq!(levels, 1);
    }

    #[test]
    fn autoindent_dedents_a_closing_brace_per_scenario_3() {
        // spec §8 scenario 3: tab style 2 spaces, "if (x) {" / "  y;" / "" with
        // the cursor on the blank third line typing '}'.
        let mut b = Buffer::from_lines(vec!["if (x) {".into(), "  y;".into(), "  ".into()], LineEnding::Lf);
        b.tab_type = 2;
        let parse = ReferenceScanner.parse(b.lines(), Language::C);
        let levels = autoindent(&b, &parse, 2);
        assert_eq!(levels, 1); // "}" itself hasn't been typed yet; line 2 still opens at depth 0 relative
        let (a, bnd, ws) = set_indent(&b, 2, levels);
        assert_eq!((a, bnd), (Position::new(2, 0), Position::new(2, 2)));
        assert_eq!(ws, "  ");
    }

    #[test]
    fn autoindent_on_closing_brace_line_dedents_to_match_opener() {
        let mut b = Buffer::from_lines(vec!["if (x) {".into(), "  y;".into(), "  }".into()], LineEnding::Lf);
        b.tab_type = 2;
        let parse = ReferenceScanner.parse(b.lines(), Language::C);
        let levels = autoindent(&b, &parse, 2);
        assert_eq!(levels, 0);
        let (a, bnd, ws) = set_indent(&b, 2, levels);
        assert_eq!(ws, "");
        assert_eq!((a, bnd), (Position::new(2, 0), Position::new(2, 2)));
    }

    #[test]
    fn autoindent_unindents_dangling_brace_less_statement_chains() {
        // "if (a)" / "  if (b)" / "    stmt();" / "next();" -- each dangling
        // (brace-less) "if" above the target line cancels one level of the
        // indent its own opener contributed, so a chain of bare ifs doesn't
        // compound depth the way brace-delimited nesting would, and the
        // line past the whole chain returns to column zero.
        let mut b = Buffer::from_lines(
            vec!["if (a)".into(), "  if (b)".into(), "    stmt();".into(), "next();".into()],
            LineEnding::Lf,
        );
        b.tab_type = 2;
        let parse = ReferenceScanner.parse(b.lines(), Language::C);
        assert_eq!(autoindent(&b, &parse, 2), 1);
        assert_eq!(autoindent(&b, &parse, 3), 0);
    }

    #[test]
    fn trailing_whitespace_range_finds_trailing_spaces() {
        let b = Buffer::from_lines(vec!["hi   ".into()], LineEnding::Lf);
        let (a, bnd) = trailing_whitespace_range(&b, 0).unwrap();
        assert_eq!(a, Position::new(0, 2));
        assert_eq!(bnd, Position::new(0, 5));
    }

    #[test]
    fn insert_tab_on_space_buffer_pads_to_next_stop() {
        let mut b = Buffer::from_lines(vec!["  x".into()], LineEnding::Lf);
        b.tab_type = 4;
        let tab = insert_tab(&b, 0, 2);
        assert_eq!(tab, "  ");
    }

    #[test]
    fn getindent_counts_levels_not_bytes() {
        let mut b = Buffer::from_lines(vec!["    x".into()], LineEnding::Lf);
        b.tab_type = 2;
        assert_eq!(getindent(&b, 0), 2);
    }
}
