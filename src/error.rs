use thiserror::Error;

type Span = std::ops::Range<usize>;

/// Schematic parse errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("SExpr {0} not found")]
    MissingChild(String),
    #[error("Value not found")]
    MissingValue(),
    #[error("Unexpected end of input at {at:?}")]
    UnexpectedEof { at: Span },
    #[error("Expected {expected} but found {found} at {at:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        at: Span,
    },
    #[error("Unknown token at {at:?}")]
    UnknownToken { at: Span },
    #[error("Trailing input after root expression at {at:?}")]
    TrailingInput { at: Span },
}

/// Serialization failure of an assembled model. Indicates a bug in the
/// extraction pipeline rather than bad input.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize schematic model: {0}")]
    Serialize(#[from] serde_json::Error),
}
