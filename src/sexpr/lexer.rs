use logos::{Logos, SpannedIter};

use super::AtomKind;

pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) span: logos::Span,
}

pub(super) struct TokenIter<'a> {
    iter: SpannedIter<'a, LogosTokenKind>,
}

impl<'a> TokenIter<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            iter: LogosTokenKind::lexer(input).spanned(),
        }
    }
}

impl<'a> Iterator for TokenIter<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        match self.iter.next() {
            Some((Ok(LogosTokenKind::QuotedString), span)) => {
                // Strip the surrounding quotes but remember they were there
                let span = (span.start + 1)..(span.end - 1);
                Some(Token {
                    kind: TokenKind::Atom(AtomKind::Quoted),
                    span,
                })
            }
            Some((Ok(kind), span)) => {
                let kind = match kind {
                    LogosTokenKind::LParen => TokenKind::LParen,
                    LogosTokenKind::RParen => TokenKind::RParen,
                    LogosTokenKind::String => TokenKind::Atom(AtomKind::Bare),
                    LogosTokenKind::QuotedString | LogosTokenKind::WS => unreachable!(),
                };
                Some(Token { kind, span })
            }
            Some((Err(_), span)) => Some(Token {
                kind: TokenKind::Error,
                span,
            }),
            None => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum TokenKind {
    LParen,
    RParen,
    Atom(AtomKind),
    Error,
}

#[derive(Logos, Clone, Copy, Debug, PartialEq, Eq)]
enum LogosTokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r#""([^"\\]|\\["\\bnfrt]|u[a-fA-F0-9]{4})*""#)]
    QuotedString,
    #[regex(r#"([^"() \t\r\f\n])+"#)]
    String,
    #[regex(r"[ \t\r\f\n]+", logos::skip)]
    WS,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_atoms_and_parens() {
        let input = "(lib_id \"Device:R\" \"\" \n)";
        let it = TokenIter::new(input);
        let expected = vec![
            (TokenKind::LParen, "("),
            (TokenKind::Atom(AtomKind::Bare), "lib_id"),
            (TokenKind::Atom(AtomKind::Quoted), "Device:R"),
            (TokenKind::Atom(AtomKind::Quoted), ""),
            (TokenKind::RParen, ")"),
        ];

        let result: Vec<_> = it
            .map(|token| (token.kind, &input[token.span.clone()]))
            .collect();

        assert_eq!(result, expected);
    }
}
