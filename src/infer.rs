//! Net-inference collaborator boundary.
//!
//! The candidate netlist produced by extraction is raw material: label nets
//! carry no pins and every pin sits in its own placeholder net. An external
//! inference service can replace it with a refined net sequence. The service
//! is best-effort by contract — on any failure the candidate netlist is kept
//! unchanged, so the pipeline always yields a schema-conformant model.

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Net, ParsedSchematic};

/// Failures of the inference collaborator. All of them are recoverable by
/// falling back to the candidate netlist.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference API returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("inference reply is not a valid net list: {0}")]
    BadReply(#[from] serde_json::Error),
    #[error("inference reply contained no content")]
    EmptyReply,
}

/// A service that refines a candidate netlist into inferred electrical nets.
pub trait NetInference {
    fn infer_nets(&self, model: &ParsedSchematic) -> Result<Vec<Net>, InferenceError>;
}

/// Runs inference and degrades to the unchanged candidate nets on any
/// failure. The fallback is mandatory, not best-effort: callers always get a
/// usable net sequence.
pub fn resolve_nets<E: NetInference>(model: &ParsedSchematic, engine: &E) -> Vec<Net> {
    match engine.infer_nets(model) {
        Ok(nets) => nets,
        Err(err) => {
            warn!("net inference failed, keeping candidate netlist: {err}");
            model.nets.clone()
        }
    }
}

/// Configuration for the LLM-backed inference engine
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key for the LLM service
    pub api_key: String,
    /// Model name, e.g. "gpt-4.1-mini" or "gemini-2.5-flash"
    pub model: String,
    /// OpenAI-compatible chat-completions endpoint
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            model: "gpt-4.1-mini".to_string(),
            base_url: None,
            max_tokens: 2000,
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: String,
}

/// Net inference through an OpenAI-compatible chat-completions API.
pub struct LlmNetInference {
    config: LlmConfig,
    client: reqwest::blocking::Client,
}

impl LlmNetInference {
    pub fn new(config: LlmConfig) -> Result<Self, InferenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn with_defaults() -> Result<Self, InferenceError> {
        Self::new(LlmConfig::default())
    }

    fn build_prompt(&self, model: &ParsedSchematic) -> String {
        let labels: Vec<&str> = model
            .nets
            .iter()
            .filter(|net| net.nodes.is_empty() && !net.name.is_empty())
            .map(|net| net.name.as_str())
            .collect();

        let mut prompt = String::new();
        prompt.push_str(
            "You are an expert electrical engineer. Given schematic components and \
             signal labels, infer the electrical connections between components.\n\n",
        );
        prompt.push_str("Rules:\n");
        prompt.push_str("- Each net represents one electrical signal (VDD, GND, SIG_IN, ...).\n");
        prompt.push_str("- Each net lists the component pins it connects.\n");
        prompt.push_str(
            "- Use reasonable circuit logic: resistors sit between signals, test \
             points attach to signals.\n",
        );
        prompt.push_str("- Output only a JSON array, no explanations.\n\n");
        prompt.push_str("Reply format:\n");
        prompt.push_str("[\n");
        prompt.push_str("  {\"name\": \"VDD\", \"nodes\": [{\"ref\": \"U1\", \"pin\": \"8\"}]},\n");
        prompt.push_str("  {\"name\": \"GND\", \"nodes\": [{\"ref\": \"U1\", \"pin\": \"4\"}]}\n");
        prompt.push_str("]\n\n");
        prompt.push_str("Components:\n");
        for c in &model.components {
            prompt.push_str(&format!(
                "- {} value={} lib_id={}\n",
                c.reference, c.value, c.lib_id
            ));
        }
        prompt.push_str("\nLabels:\n");
        for label in &labels {
            prompt.push_str(&format!("- {label}\n"));
        }
        prompt
    }

    fn call_llm(&self, prompt: &str) -> Result<String, InferenceError> {
        let api_url = self
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string());

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()?;

        if !response.status().is_success() {
            return Err(InferenceError::Status {
                status: response.status(),
                body: response.text().unwrap_or_default(),
            });
        }

        let chat_response: ChatResponse = response.json()?;
        chat_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or(InferenceError::EmptyReply)
    }

    /// Parses the model's reply into nets. The reply may be wrapped in
    /// markdown code fences; everything outside the outermost JSON array is
    /// discarded. Codes are reassigned 1..n in arrival order.
    fn parse_reply(&self, reply: &str) -> Result<Vec<Net>, InferenceError> {
        let json = match (reply.find('['), reply.rfind(']')) {
            (Some(start), Some(end)) if start < end => &reply[start..=end],
            _ => reply,
        };
        let mut nets: Vec<Net> = serde_json::from_str(json)?;
        for (i, net) in nets.iter_mut().enumerate() {
            net.code = (i + 1) as u32;
        }
        Ok(nets)
    }
}

impl NetInference for LlmNetInference {
    fn infer_nets(&self, model: &ParsedSchematic) -> Result<Vec<Net>, InferenceError> {
        let prompt = self.build_prompt(model);
        let reply = self.call_llm(&prompt)?;
        self.parse_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract, SExpr};

    const INPUT: &str = r#"(kicad_sch
        (label "VDD" (at 0 0 0))
        (symbol (lib_id "Amplifier_Operational:TLV2372")
            (property "Reference" "U1")
            (pin (number "4"))
            (pin (number "8"))))"#;

    fn model() -> ParsedSchematic {
        let root = SExpr::try_from(INPUT).unwrap();
        extract::extract(&root)
    }

    struct Failing;

    impl NetInference for Failing {
        fn infer_nets(&self, _: &ParsedSchematic) -> Result<Vec<Net>, InferenceError> {
            Err(InferenceError::EmptyReply)
        }
    }

    struct Fixed(Vec<Net>);

    impl NetInference for Fixed {
        fn infer_nets(&self, _: &ParsedSchematic) -> Result<Vec<Net>, InferenceError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn failure_falls_back_to_candidate_nets() {
        let model = model();
        let nets = resolve_nets(&model, &Failing);
        assert_eq!(nets, model.nets);
    }

    #[test]
    fn success_replaces_candidate_nets() {
        let model = model();
        let inferred = vec![Net {
            name: "VDD".to_owned(),
            code: 1,
            nodes: vec![crate::PinRef {
                reference: "U1".to_owned(),
                pin: "8".to_owned(),
            }],
        }];
        let nets = resolve_nets(&model, &Fixed(inferred.clone()));
        assert_eq!(nets, inferred);
    }

    #[test]
    fn parse_reply_strips_code_fences() {
        let engine = LlmNetInference::new(LlmConfig {
            api_key: String::new(),
            ..LlmConfig::default()
        })
        .unwrap();
        let reply = "```json\n[\n  {\"name\": \"GND\", \"nodes\": [{\"ref\": \"U1\", \"pin\": \"4\"}]}\n]\n```";
        let nets = engine.parse_reply(reply).unwrap();
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].name, "GND");
        assert_eq!(nets[0].code, 1);
        assert_eq!(nets[0].nodes[0].reference, "U1");
    }

    #[test]
    fn parse_reply_rejects_garbage() {
        let engine = LlmNetInference::with_defaults().unwrap();
        assert!(engine.parse_reply("the nets are probably fine").is_err());
    }

    #[test]
    fn prompt_lists_components_and_labels() {
        let engine = LlmNetInference::with_defaults().unwrap();
        let prompt = engine.build_prompt(&model());
        assert!(prompt.contains("- U1 value= lib_id=Amplifier_Operational:TLV2372"));
        assert!(prompt.contains("- VDD"));
        // placeholder pin nets are not labels
        assert!(!prompt.contains("NET_U1_4"));
    }
}
