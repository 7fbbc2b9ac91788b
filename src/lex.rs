// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

/// A byte range of a field's text, kept alive by the shared source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    Comma,
    OpenParen,
    CloseParen,
    Equals,

    // unsupported tokens
    XGreater,
    XLess,
    XPipe,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    /// Whether a `-` following this token starts an operand (negation)
    /// rather than continuing one (subtraction).
    pub const fn expects_operand(&self) -> bool {
        matches!(
            self,
            Self::Op(_) | Self::Comma | Self::OpenParen | Self::Equals
        )
    }

    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident
            | Self::Number
            | Self::Op(_)
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen
            | Self::Equals => false,

            // unsupported tokens
            Self::XGreater
            | Self::XLess
            | Self::XPipe
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

/// Splits a field's text into tokens. Stops after the first error.
#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    prev: Option<TokTyp>,
    has_errored: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            prev: None,
            has_errored: false,
        }
    }

    fn span(&self, start: usize, chr: char) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, chr.len_utf8())
    }

    fn skip_whitespace(&mut self) {
        while self.cur.next_if(|(_, chr)| chr.is_whitespace()).is_some() {}
    }

    /// Single-character tokens.
    fn symbol(chr: char) -> Option<TokTyp> {
        Some(match chr {
            '+' => TokTyp::Op(OperatorTyp::Add),
            '*' => TokTyp::Op(OperatorTyp::Mul),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '^' => TokTyp::Op(OperatorTyp::Pow),
            ',' => TokTyp::Comma,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,
            '=' => TokTyp::Equals,

            '>' => TokTyp::XGreater,
            '<' => TokTyp::XLess,
            '|' => TokTyp::XPipe,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,
            '{' => TokTyp::XOpenCurly,
            '}' => TokTyp::XCloseCurly,
            _ => return None,
        })
    }

    /// Extends a token starting at `start` over every following character
    /// matching `predicate`.
    fn consume_while(
        &mut self,
        start: usize,
        typ: TokTyp,
        predicate: impl Fn(char) -> bool,
    ) -> Tok {
        let mut end = start;
        while let Some((idx, chr)) = self.cur.next_if(|&(_, chr)| predicate(chr)) {
            end = idx + chr.len_utf8();
        }
        Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), start, end - start),
        }
    }

    fn error(&mut self, typ: LexErrTyp, loc: SubStr) -> Option<Result<Tok, LexErr>> {
        self.has_errored = true;
        Some(Err(LexErr { typ, loc }))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.skip_whitespace();
        let (idx, chr) = self.cur.peek().copied()?;

        let tok = if let Some(typ) = Self::symbol(chr) {
            self.cur.next();
            Tok {
                typ,
                loc: self.span(idx, chr),
            }
        } else if chr == '-' {
            self.cur.next();
            // negation wherever an operand is expected
            let typ = match self.prev {
                Some(prev) if !prev.expects_operand() => TokTyp::Op(OperatorTyp::Sub),
                _ => TokTyp::Op(OperatorTyp::Neg),
            };
            Tok {
                typ,
                loc: self.span(idx, chr),
            }
        } else if chr.is_alphabetic() {
            self.consume_while(idx, TokTyp::Ident, |c| c.is_alphanumeric() || c == '_')
        } else if chr.is_ascii_digit() || chr == '.' {
            self.consume_while(idx, TokTyp::Number, |c| c.is_ascii_digit() || c == '.')
        } else {
            let loc = self.span(idx, chr);
            return self.error(LexErrTyp::InvalidChar, loc);
        };

        if tok.typ.is_unsupported() {
            return self.error(LexErrTyp::Unsupported(tok.typ), tok.loc);
        }
        self.prev = Some(tok.typ);
        Some(Ok(tok))
    }
}
