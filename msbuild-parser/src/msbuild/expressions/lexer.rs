//! Tokenizer for MSBuild expressions
//!
//! The logos lexer splits expression text into punctuation, identifiers, digit runs,
//! whitespace and `%XX` escapes. Lexing never fails: anything the token set does not
//! describe becomes [`ExprToken::Other`], so the grammar sees every character of the
//! input and spans stay contiguous.
//!
//! Spans are character offsets into the lexed text, matching the offsets
//! [`crate::msbuild::text::PositionIndex`] works in.

use logos::Logos;
use std::fmt;
use std::ops::Range;

#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprToken {
    #[token("$(")]
    EvaluateOpen,
    #[token("@(")]
    ItemGroupOpen,
    #[token("%(")]
    ItemMetadataOpen,
    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    Arrow,
    #[token("==")]
    Equals,
    #[token("!=")]
    NotEquals,
    #[token("!")]
    Bang,
    #[token("'")]
    Quote,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Period,

    /// `%XX`, decoded
    #[regex("%[0-9A-Fa-f][0-9A-Fa-f]", decode_escape)]
    Escape(char),

    #[regex("[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned(), priority = 3)]
    Identifier(String),

    #[regex("[0-9]+", |lex| lex.slice().to_owned(), priority = 3)]
    Number(String),

    #[regex(r"[ \t\r\n]+", |lex| lex.slice().to_owned(), priority = 3)]
    Whitespace(String),

    #[regex(".", |lex| lex.slice().chars().next(), priority = 1)]
    Other(char),
}

fn decode_escape(lex: &mut logos::Lexer<ExprToken>) -> Option<char> {
    u8::from_str_radix(&lex.slice()[1..], 16)
        .ok()
        .map(char::from)
}

impl ExprToken {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, ExprToken::Whitespace(_))
    }

    /// Case-insensitive keyword check (`And`, `or`, `NOT`, ...).
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, ExprToken::Identifier(name) if name.eq_ignore_ascii_case(keyword))
    }

    /// The text this token contributes to a string: escapes decoded, everything else verbatim.
    pub fn decoded(&self) -> String {
        match self {
            ExprToken::Escape(ch) => ch.to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for ExprToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprToken::EvaluateOpen => f.write_str("$("),
            ExprToken::ItemGroupOpen => f.write_str("@("),
            ExprToken::ItemMetadataOpen => f.write_str("%("),
            ExprToken::OpenParen => f.write_str("("),
            ExprToken::CloseParen => f.write_str(")"),
            ExprToken::OpenBracket => f.write_str("["),
            ExprToken::CloseBracket => f.write_str("]"),
            ExprToken::DoubleColon => f.write_str("::"),
            ExprToken::Arrow => f.write_str("->"),
            ExprToken::Equals => f.write_str("=="),
            ExprToken::NotEquals => f.write_str("!="),
            ExprToken::Bang => f.write_str("!"),
            ExprToken::Quote => f.write_str("'"),
            ExprToken::Comma => f.write_str(","),
            ExprToken::Semicolon => f.write_str(";"),
            ExprToken::Period => f.write_str("."),
            ExprToken::Escape(ch) => write!(f, "%{:02X}", u32::from(*ch)),
            ExprToken::Identifier(text) | ExprToken::Number(text) | ExprToken::Whitespace(text) => {
                f.write_str(text)
            }
            ExprToken::Other(ch) => write!(f, "{ch}"),
        }
    }
}

/// Tokenize `source`, pairing each token with its character span.
pub fn tokenize(source: &str) -> Vec<(ExprToken, Range<usize>)> {
    let mut lexer = ExprToken::lexer(source);
    let mut tokens = Vec::new();
    let mut offset = 0;

    while let Some(result) = lexer.next() {
        let slice = lexer.slice();
        match result {
            Ok(token) => {
                let width = slice.chars().count();
                tokens.push((token, offset..offset + width));
                offset += width;
            }
            Err(()) => {
                for ch in slice.chars() {
                    tokens.push((ExprToken::Other(ch), offset..offset + 1));
                    offset += 1;
                }
            }
        }
    }

    tokens
}
