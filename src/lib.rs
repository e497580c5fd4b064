//! Extracts a structured design model from KiCad schematic files
//! (`.kicad_sch`).
//!
//! The schematic is parsed into an S-expression tree, component records and
//! footprint suggestions are collected from the placed symbols, and a
//! candidate netlist is synthesized from net labels and component pins. The
//! candidate netlist is deliberately over-complete and unmerged: each pin
//! gets its own placeholder net, and reconciling which pins share a physical
//! wire is left to a downstream net-inference step (see [`infer`]).
//!
//! ```no_run
//! let input = std::fs::read_to_string("board.kicad_sch").unwrap();
//! let model = kicad_sch_extract::extract_schematic(&input).unwrap();
//! let json = kicad_sch_extract::export::to_json(&model).unwrap();
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

mod error;
pub mod export;
pub mod extract;
pub mod infer;
pub mod sexpr;

pub use error::{ExportError, ParseError};
pub use sexpr::SExpr;

/// A placed component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Reference designator. Always contains a digit; digit-free references
    /// denote library templates and are filtered during extraction.
    #[serde(rename = "ref")]
    pub reference: String,
    pub value: String,
    pub footprint: String,
    pub lib_id: String,
}

/// One pin of one component instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRef {
    #[serde(rename = "ref")]
    pub reference: String,
    pub pin: String,
}

/// A named net connecting zero or more pins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    pub name: String,
    /// 1-based position of the net in its sequence
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub nodes: Vec<PinRef>,
}

/// The extracted design model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSchematic {
    pub components: Vec<Component>,
    pub nets: Vec<Net>,
    /// Suggested footprint per reference designator, in extraction order
    pub footprint_suggestions: IndexMap<String, String>,
}

/// Parses schematic text and extracts the full design model.
///
/// Fails only on malformed input; missing properties and pin numbers are
/// absorbed into defaults during extraction.
pub fn extract_schematic(input: &str) -> Result<ParsedSchematic, ParseError> {
    let root = SExpr::try_from(input)?;
    Ok(extract::extract(&root))
}
