//! Interchange serialization of the extracted model.
//!
//! Field names and array ordering are fixed by the downstream consumers
//! (net inference and board generation); nothing is reordered or
//! deduplicated here.

use crate::{ExportError, ParsedSchematic};

/// Serializes the model as pretty-printed JSON.
///
/// Failure here means the in-memory model is malformed, which the extraction
/// contracts rule out; it is a programming error, not an input error.
pub fn to_json(model: &ParsedSchematic) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(model)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;
    use crate::SExpr;

    const INPUT: &str = r#"(kicad_sch
        (label "VDD" (at 0 0 0))
        (symbol (lib_id "Device:R")
            (property "Reference" "R1")
            (property "Value" "10k")
            (pin (number "1"))))"#;

    fn model() -> ParsedSchematic {
        let root = SExpr::try_from(INPUT).unwrap();
        extract::extract(&root)
    }

    #[test]
    fn uses_interchange_field_names() {
        let json = to_json(&model()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["components"][0]["ref"], "R1");
        assert_eq!(value["components"][0]["lib_id"], "Device:R");
        assert_eq!(value["nets"][0]["code"], 1);
        assert_eq!(value["nets"][1]["nodes"][0]["pin"], "1");
        assert_eq!(
            value["footprint_suggestions"]["R1"],
            "Resistor_SMD:R_0603"
        );
    }

    #[test]
    fn export_is_deterministic() {
        let first = to_json(&model()).unwrap();
        let second = to_json(&model()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn model_round_trips() {
        let json = to_json(&model()).unwrap();
        let parsed: ParsedSchematic = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, model());
    }
}
