use std::fmt::Display;

use crate::error::ParseError;

mod lexer;
mod parser;

/// A node of the schematic source tree: either a bare-or-quoted atom or a
/// keyword-headed list. The head keyword is stored as the list label.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SExpr<'a> {
    List(&'a str, Box<[SExpr<'a>]>),
    Atom(&'a str, AtomKind),
}

/// Whether an atom was quoted in the source. Carried through for fidelity;
/// extraction treats both kinds the same.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AtomKind {
    Bare,
    Quoted,
}

impl<'a> Display for SExpr<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::List(label, children) => {
                write!(f, "({}", label)?;
                for child in children {
                    write!(f, " {}", child)?;
                }
                write!(f, ")")
            }
            SExpr::Atom(s, AtomKind::Quoted) => write!(f, "\"{}\"", s),
            SExpr::Atom(s, AtomKind::Bare) => write!(f, "{}", s),
        }
    }
}

impl<'a> SExpr<'a> {
    /// Text of this node if it is an atom.
    pub fn as_atom(&self) -> Option<&'a str> {
        match self {
            SExpr::Atom(s, _) => Some(s),
            SExpr::List(_, _) => None,
        }
    }

    /// First atom child of the list labeled `label`, as in `(label "value")`.
    pub fn value(&self, label: &str) -> Result<&'a str, ParseError> {
        let child = self.child(label)?;
        if let SExpr::List(_, children) = child {
            if !children.is_empty() {
                match children[0] {
                    SExpr::Atom(s, _) => return Ok(s),
                    SExpr::List(_, _) => {}
                }
            };
        }
        Err(ParseError::MissingValue())
    }

    /// Immediate children that are lists labeled `label`. Not recursive.
    pub fn children<'b, 'c>(&'b self, label: &'c str) -> LabeledChildIterator<'a, 'b, 'c> {
        let iter = match self {
            SExpr::Atom(_, _) => None,
            SExpr::List(_, children) => Some(children.iter()),
        };
        LabeledChildIterator { iter, label }
    }

    pub fn child<'b>(&self, label: &'b str) -> Result<&SExpr<'a>, ParseError> {
        let mut iter = self.children(label);
        iter.next()
            .ok_or(ParseError::MissingChild(label.to_owned()))
    }

    /// All lists headed by `keyword`, anywhere in the tree, in document
    /// order. A match is recursed into as well, so a keyword-headed list
    /// nested inside another match is reported separately, outer first.
    /// Callers wanting narrower scoping must filter themselves.
    pub fn find_all<'b>(&'b self, keyword: &str) -> Vec<&'b SExpr<'a>> {
        let mut results = Vec::new();
        self.collect_matches(keyword, &mut results);
        results
    }

    fn collect_matches<'b>(&'b self, keyword: &str, results: &mut Vec<&'b SExpr<'a>>) {
        if let SExpr::List(label, children) = self {
            if *label == keyword {
                results.push(self);
            }
            for child in children.iter() {
                child.collect_matches(keyword, results);
            }
        }
    }
}

#[derive(Debug)]
pub struct LabeledChildIterator<'a, 'b, 'c> {
    iter: Option<std::slice::Iter<'b, SExpr<'a>>>,
    label: &'c str,
}

impl<'a, 'b, 'c> Iterator for LabeledChildIterator<'a, 'b, 'c> {
    type Item = &'b SExpr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let iter = self.iter.as_mut()?;
        loop {
            let item = iter.next();
            match &item {
                None => return None,
                Some(SExpr::Atom(_, _)) => continue,
                Some(SExpr::List(label, _)) => {
                    if *label == self.label {
                        return item;
                    }
                }
            }
        }
    }
}

impl<'a> TryFrom<&'a String> for SExpr<'a> {
    type Error = ParseError;

    fn try_from(input: &'a String) -> Result<Self, Self::Error> {
        SExpr::try_from(input.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_data {
        ($fname:expr) => {
            std::fs::read_to_string(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/resources/test/",
                $fname
            ))
            .unwrap()
        };
    }

    #[test]
    fn sexpr_children_by_name_works() {
        let i = r#"(a (b "1") (c "2") (b "3"))"#;
        let root = SExpr::try_from(i).unwrap();

        let mut iter = root.children("b");
        assert!(iter.next().is_some());
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
    }

    #[test]
    fn value_reads_first_atom_child() {
        let i = r#"(symbol (lib_id "Device:R") (lib_id "Device:C"))"#;
        let root = SExpr::try_from(i).unwrap();
        assert_eq!(root.value("lib_id").unwrap(), "Device:R");
    }

    #[test]
    fn find_all_visits_in_document_order() {
        let i = r#"(root (pin (number "1")) (other (pin (number "2"))) (pin (number "3")))"#;
        let root = SExpr::try_from(i).unwrap();

        let pins = root.find_all("pin");
        let numbers: Vec<_> = pins.iter().map(|p| p.value("number").unwrap()).collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
    }

    #[test]
    fn find_all_keeps_nested_matches_outer_first() {
        let i = r#"(symbol (property "A" "1") (symbol (property "B" "2")))"#;
        let root = SExpr::try_from(i).unwrap();

        let symbols = root.find_all("symbol");
        assert_eq!(symbols.len(), 2);
        // outer match first, and it still contains the inner one
        assert_eq!(symbols[0], &root);
        assert_eq!(symbols[0].find_all("property").len(), 2);
        assert_eq!(symbols[1].find_all("property").len(), 1);
    }

    #[test]
    fn sexpr_can_parse_full_file() {
        let i = &test_data!("demo.kicad_sch");
        let _ = SExpr::try_from(i).unwrap();
    }
}
