//! Component extraction and candidate-net synthesis.
//!
//! Works directly on the borrowed [`SExpr`] tree and produces owned records;
//! nothing here keeps references into the tree. The whole pass is a one-way
//! transform in document order, so repeated runs over the same text produce
//! identical output.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;

use crate::sexpr::SExpr;
use crate::{Component, Net, ParsedSchematic, PinRef};

/// Footprint suggestion per reference prefix. First match wins, so longer
/// prefixes must come before their one-letter heads (`TP` before any future
/// `T` entry).
const FOOTPRINT_PREFIXES: &[(&str, &str)] = &[
    ("TP", "TestPoint:TestPoint_Pad_D1.0mm"),
    ("R", "Resistor_SMD:R_0603"),
    ("C", "Capacitor_SMD:C_0603"),
    ("U", "Package_SO:SOIC-8_3.9x4.9mm_P1.27mm"),
    (
        "J",
        "Connector_PinHeader_2.54mm:PinHeader_1x02_P2.54mm_Vertical",
    ),
];

const DEFAULT_FOOTPRINT: &str = "Resistor_SMD:R_0603";

fn suggest_footprint(reference: &str) -> &'static str {
    FOOTPRINT_PREFIXES
        .iter()
        .find(|(prefix, _)| reference.starts_with(prefix))
        .map(|(_, footprint)| *footprint)
        .unwrap_or(DEFAULT_FOOTPRINT)
}

/// A reference designator with a digit denotes a placed instance; digit-free
/// references (`R`, `U`) are library templates.
fn is_placed(reference: &str) -> bool {
    reference.chars().any(|c| c.is_ascii_digit())
}

/// Sequential net code allocator. Codes start at 1 and equal the net's
/// 1-based position in the final sequence.
struct NetCodes(u32);

impl NetCodes {
    fn new() -> Self {
        NetCodes(0)
    }

    fn next(&mut self) -> u32 {
        self.0 += 1;
        self.0
    }
}

/// Key/value pairs of every `property` list under `symbol`, first match per
/// key wins. The search is recursive, so properties of nested symbol units
/// fold into the same map; placed instances never nest further symbols, and
/// templates are filtered out by reference anyway.
pub fn properties_of<'a>(symbol: &SExpr<'a>) -> HashMap<&'a str, &'a str> {
    let mut props = HashMap::new();
    for prop in symbol.find_all("property") {
        let SExpr::List(_, children) = prop else {
            continue;
        };
        let key = children.first().and_then(|c| c.as_atom());
        let value = children.get(1).and_then(|c| c.as_atom());
        let (Some(key), Some(value)) = (key, value) else {
            continue;
        };
        props.entry(key).or_insert(value);
    }
    props
}

fn extract_components(root: &SExpr) -> (Vec<Component>, IndexMap<String, String>) {
    let mut components = Vec::new();
    let mut suggestions = IndexMap::new();

    for symbol in root.find_all("symbol") {
        let props = properties_of(symbol);
        let reference = props.get("Reference").copied().unwrap_or("");
        if !is_placed(reference) {
            debug!("skipping generic symbol {reference:?}");
            continue;
        }

        suggestions.insert(
            reference.to_owned(),
            suggest_footprint(reference).to_owned(),
        );
        components.push(Component {
            reference: reference.to_owned(),
            value: props.get("Value").copied().unwrap_or("").to_owned(),
            footprint: props.get("Footprint").copied().unwrap_or("").to_owned(),
            lib_id: symbol.value("lib_id").unwrap_or("").to_owned(),
        });
    }

    (components, suggestions)
}

/// Phase A: one empty net per text label, in document order. Label nets
/// carry no nodes; the inference step decides which pins they connect.
fn label_nets(root: &SExpr, codes: &mut NetCodes, nets: &mut Vec<Net>) {
    for label in root.find_all("label") {
        let SExpr::List(_, children) = label else {
            continue;
        };
        let Some(name) = children.first().and_then(|c| c.as_atom()) else {
            continue;
        };
        nets.push(Net {
            name: name.to_owned(),
            code: codes.next(),
            nodes: Vec::new(),
        });
    }
}

/// Phase B: one single-node placeholder net per pin of every placed symbol.
/// Pins without a `number` child are skipped.
fn pin_nets(root: &SExpr, codes: &mut NetCodes, nets: &mut Vec<Net>) {
    for symbol in root.find_all("symbol") {
        let props = properties_of(symbol);
        let reference = props.get("Reference").copied().unwrap_or("");
        if !is_placed(reference) {
            continue;
        }

        for pin in symbol.find_all("pin") {
            let Ok(number) = pin.value("number") else {
                debug!("skipping unnumbered pin of {reference}");
                continue;
            };
            nets.push(Net {
                name: format!("NET_{reference}_{number}"),
                code: codes.next(),
                nodes: vec![PinRef {
                    reference: reference.to_owned(),
                    pin: number.to_owned(),
                }],
            });
        }
    }
}

/// Runs the full extraction over a parsed schematic tree.
pub fn extract(root: &SExpr) -> ParsedSchematic {
    let (components, footprint_suggestions) = extract_components(root);

    let mut codes = NetCodes::new();
    let mut nets = Vec::new();
    label_nets(root, &mut codes, &mut nets);
    pin_nets(root, &mut codes, &mut nets);

    ParsedSchematic {
        components,
        nets,
        footprint_suggestions,
    }
}
