//! The tokenizer trait boundary the edit engine consumes (spec §6), plus a
//! minimal reference scanner (spec §10.6) sufficient to drive autoindent.
//!
//! The engine only ever needs token *kind* equality and an identifier's text
//! slice for keyword matching — it never depends on a concrete grammar, so a
//! real incremental parser can implement `Tokenizer` in place of
//! `ReferenceScanner` without touching `core-model`.

use core_text::{Position, Range};

/// Filename-suffix based language tag (spec §6 "Language detection").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    C,
    CSharp,
    Python,
    Julia,
    Bash,
    Colorscheme,
    Go,
    None,
}

/// Detect a buffer's language from its filename, the way the source editor's
/// `Language` enum is picked by suffix rather than content sniffing.
pub fn detect_language(path: &std::path::Path) -> Language {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if file_name.eq_ignore_ascii_case("makefile") {
        return Language::Bash;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("c" | "cpp" | "h" | "hpp") => Language::C,
        Some("cs") => Language::CSharp,
        Some("py") => Language::Python,
        Some("jl") => Language::Julia,
        Some("sh") => Language::Bash,
        Some("cmantic-colorscheme") => Language::Colorscheme,
        Some("go") => Language::Go,
        _ => Language::None,
    }
}

/// The token kinds the edit engine's autoindent logic actually inspects
/// (spec §6: bracket pairs plus identifiers, for keyword matching).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    BraceOpen,
    BraceClose,
    Identifier,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub kind: TokenKind,
    pub a: Position,
    pub b: Position,
    pub text: String,
}

/// Output of a whole-buffer re-tokenization pass. Tokens are sorted by `a`,
/// the precondition `gettoken`'s binary search relies on.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub tokens: Vec<TokenInfo>,
    pub definitions: Vec<Range>,
}

/// Consumed interface (spec §6): the engine treats this as opaque except for
/// token-kind equality and identifier text.
pub trait Tokenizer {
    fn parse(&self, lines: &[String], language: Language) -> ParseResult;
}

/// Minimal scanner recognizing `{ } ( ) [ ]` and `[A-Za-z_][A-Za-z0-9_]*`
/// identifiers — enough to drive `indentdepth` and the leading-statement
/// check, not a general-purpose lexer for any language in §6's table.
pub struct ReferenceScanner;

impl Tokenizer for ReferenceScanner {
    fn parse(&self, lines: &[String], _language: Language) -> ParseResult {
        let mut tokens = Vec::new();
        for (y, line) in lines.iter().enumerate() {
            let bytes = line.as_bytes();
            let mut x = 0;
            while x < bytes.len() {
                let c = bytes[x];
                if matches!(c, b'{' | b'[' | b'(') {
                    tokens.push(TokenInfo {
                        kind: TokenKind::BraceOpen,
                        a: Position::new(y, x),
                        b: Position::new(y, x + 1),
                        text: (c as char).to_string(),
                    });
                    x += 1;
                } else if matches!(c, b'}' | b']' | b')') {
                    tokens.push(TokenInfo {
                        kind: TokenKind::BraceClose,
                        a: Position::new(y, x),
                        b: Position::new(y, x + 1),
                        text: (c as char).to_string(),
                    });
                    x += 1;
                } else if c == b'_' || c.is_ascii_alphabetic() {
                    let start = x;
                    while x < bytes.len() && (bytes[x] == b'_' || bytes[x].is_ascii_alphanumeric()) {
                        x += 1;
                    }
                    tokens.push(TokenInfo {
                        kind: TokenKind::Identifier,
                        a: Position::new(y, start),
                        b: Position::new(y, x),
                        text: line[start..x].to_string(),
                    });
                } else {
                    x += 1;
                }
            }
        }
        ParseResult { tokens, definitions: Vec::new() }
    }
}
