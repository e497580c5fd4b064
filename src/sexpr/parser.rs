use std::iter::Peekable;

use crate::error::ParseError;

use super::{
    lexer::{Token, TokenIter, TokenKind},
    AtomKind, SExpr,
};

pub(super) struct Parser<'a> {
    input: &'a str,
    iter: Peekable<TokenIter<'a>>,
}

type Span = logos::Span;

/// Span-level parse tree. Resolved against the input text in a second step
/// so that recursion does not have to thread the input string through.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParsedSExpr {
    List(Span, Vec<ParsedSExpr>),
    Atom(Span, AtomKind),
}

impl ParsedSExpr {
    fn into_sexpr(self, input: &str) -> SExpr {
        match self {
            ParsedSExpr::List(label_span, children) => {
                let label = &input[label_span];
                let children: Box<[SExpr]> =
                    children.into_iter().map(|c| c.into_sexpr(input)).collect();
                SExpr::List(label, children)
            }
            ParsedSExpr::Atom(span, kind) => SExpr::Atom(&input[span], kind),
        }
    }
}

impl<'a> Parser<'a> {
    pub(super) fn new(input: &'a str) -> Self {
        Self {
            input,
            iter: TokenIter::new(input).peekable(),
        }
    }

    fn get(&mut self) -> Result<Token, ParseError> {
        let Some(tok) = self.iter.next() else {
            let end = self.input.len();
            return Err(ParseError::UnexpectedEof { at: end..end });
        };
        Ok(tok)
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.iter.peek().map(|tok| tok.kind)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let tok = self.get()?;
        if tok.kind == kind {
            Ok(tok)
        } else {
            Err(ParseError::UnexpectedToken {
                expected: format!("{:?}", kind),
                found: format!("{:?}", tok.kind),
                at: tok.span.clone(),
            })
        }
    }

    fn expect_atom(&mut self) -> Result<Token, ParseError> {
        let tok = self.get()?;
        if let TokenKind::Atom(_) = tok.kind {
            Ok(tok)
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "Atom".to_owned(),
                found: format!("{:?}", tok.kind),
                at: tok.span.clone(),
            })
        }
    }

    fn skip(&mut self) {
        self.get()
            .expect("skip should not be called after EOF is found");
    }

    fn parse_sexpr(&mut self) -> Result<ParsedSExpr, ParseError> {
        self.expect(TokenKind::LParen)?;
        let label = self.expect_atom()?;

        let mut children = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::RParen) => {
                    self.skip();
                    break Ok(ParsedSExpr::List(label.span.clone(), children));
                }
                Some(TokenKind::LParen) => {
                    children.push(self.parse_sexpr()?);
                }
                Some(TokenKind::Atom(kind)) => {
                    children.push(ParsedSExpr::Atom(self.get()?.span.clone(), kind));
                }
                Some(TokenKind::Error) => {
                    let tok = self.get()?;
                    break Err(ParseError::UnknownToken {
                        at: tok.span.clone(),
                    });
                }
                None => {
                    let end = self.input.len();
                    break Err(ParseError::UnexpectedEof { at: end..end });
                }
            }
        }
    }

    /// Parsing is all-or-nothing: anything left over after the root
    /// expression fails the whole run.
    fn expect_end(&mut self) -> Result<(), ParseError> {
        match self.iter.next() {
            None => Ok(()),
            Some(tok) => Err(ParseError::TrailingInput {
                at: tok.span.clone(),
            }),
        }
    }
}

impl<'a> TryFrom<&'a str> for SExpr<'a> {
    type Error = ParseError;

    fn try_from(input: &'a str) -> Result<Self, Self::Error> {
        let mut parser = Parser::new(input);
        let sexpr = parser.parse_sexpr()?;
        parser.expect_end()?;
        let sexpr = sexpr.into_sexpr(input);
        Ok(sexpr)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ParseError;
    use crate::sexpr::SExpr;
    use rstest::*;

    #[rstest]
    #[case("(abc)", "(abc)")]
    #[case("(abc\n)", "(abc)")]
    #[case("(a \"b\")", "(a \"b\")")]
    #[case("(a (b \"1\") c)", "(a (b \"1\") c)")]
    fn can_parse_sexpr(#[case] input: &str, #[case] expected: &str) {
        let sexpr = SExpr::try_from(input).unwrap();
        assert_eq!(&format!("{sexpr}"), expected);
    }

    #[rstest]
    #[case("(a (b)")]
    #[case("(")]
    #[case("(a \"unterminated)")]
    fn unterminated_input_fails(#[case] input: &str) {
        assert!(SExpr::try_from(input).is_err());
    }

    #[test]
    fn trailing_input_fails() {
        let err = SExpr::try_from("(a) (b)").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { .. }));
    }

    #[test]
    fn missing_open_paren_fails() {
        let err = SExpr::try_from("abc").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
