//! Response normalization.
//!
//! The backend may return clean structured fields, a chat-completion
//! envelope, a JSON object buried in prose, or fenced code blocks inside
//! a single text blob. Normalization is an ordered list of extraction
//! strategies, each a pure function from raw text to an optional result;
//! the first that succeeds wins. It never fails hard: the last resort is
//! showing the raw text as the diagram so the user sees *something*.

use archgenie_core::{CostEstimate, GenerationResult};
use regex::Regex;
use std::sync::OnceLock;

type Strategy = fn(&str) -> Option<GenerationResult>;

/// Extraction order. Structured fields beat envelope unwrapping beats
/// embedded JSON beats fence scanning.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("structured-fields", from_structured),
    ("chat-envelope", from_chat_envelope),
    ("embedded-json", from_embedded_json),
    ("fenced-blocks", from_fenced_blocks),
];

/// Normalize a raw response body into a generation result.
pub fn normalize(raw: &str) -> GenerationResult {
    for (name, strategy) in STRATEGIES {
        if let Some(result) = strategy(raw) {
            tracing::debug!(strategy = name, "normalized generation response");
            return result;
        }
    }
    tracing::debug!("no extraction strategy matched; using raw text as diagram");
    GenerationResult {
        diagram: raw.to_string(),
        ..Default::default()
    }
}

fn fence_wrapper_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^```[a-zA-Z0-9_-]*[ \t]*\n?(.*?)\n?```\s*$").unwrap()
    })
}

fn mermaid_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```mermaid[ \t]*\n(.*?)```").unwrap())
}

fn terraform_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```(?:terraform|hcl)[ \t]*\n(.*?)```").unwrap())
}

fn json_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```json[ \t]*\n(.*?)```").unwrap())
}

/// Remove a surrounding code fence if the whole value is wrapped in one.
/// The generator is told not to fence fields, but it sometimes does
/// anyway, so fields pulled out of JSON get stripped a second time.
fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    match fence_wrapper_re().captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

fn result_from_value(value: &serde_json::Value) -> Option<GenerationResult> {
    let diagram = value
        .get("diagram")
        .and_then(|v| v.as_str())
        .map(strip_fences)
        .unwrap_or_default();
    let terraform = value
        .get("terraform")
        .and_then(|v| v.as_str())
        .map(strip_fences)
        .unwrap_or_default();
    let diagram_svg = value
        .get("diagram_svg")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);
    let cost = value
        .get("cost")
        .cloned()
        .and_then(|v| serde_json::from_value::<CostEstimate>(v).ok());

    let result = GenerationResult {
        diagram,
        diagram_svg,
        terraform,
        cost,
    };
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Top-level structured fields, used directly.
fn from_structured(raw: &str) -> Option<GenerationResult> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    result_from_value(&value)
}

/// Chat-completion envelope: the interesting text lives at
/// `choices[0].message.content`, which then goes through the text
/// strategies itself.
fn from_chat_envelope(raw: &str) -> Option<GenerationResult> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let content = value
        .pointer("/choices/0/message/content")?
        .as_str()?
        .to_string();
    Some(
        from_embedded_json(&content)
            .or_else(|| from_fenced_blocks(&content))
            .unwrap_or_else(|| GenerationResult {
                diagram: content,
                ..Default::default()
            }),
    )
}

/// A JSON object embedded in a larger text payload.
fn from_embedded_json(raw: &str) -> Option<GenerationResult> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(&raw[start..=end]).ok()?;
    result_from_value(&value)
}

/// Labeled fenced blocks inside a text blob: first `mermaid` block as the
/// diagram, first `terraform`/`hcl` block as the code, and a `json` block
/// as a secondary carrier for both.
fn from_fenced_blocks(raw: &str) -> Option<GenerationResult> {
    let diagram = mermaid_fence_re()
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    let terraform = terraform_fence_re()
        .captures(raw)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();

    if !diagram.is_empty() || !terraform.is_empty() {
        return Some(GenerationResult {
            diagram,
            terraform,
            ..Default::default()
        });
    }

    let json_block = json_fence_re().captures(raw)?;
    from_embedded_json(json_block[1].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_fields_are_used_unchanged() {
        let raw = r#"{"diagram":"graph TD\nA-->B","terraform":"resource \"x\" {}"}"#;
        let result = normalize(raw);
        assert_eq!(result.diagram, "graph TD\nA-->B");
        assert_eq!(result.terraform, "resource \"x\" {}");
        assert!(result.cost.is_none());
    }

    #[test]
    fn structured_fields_with_cost() {
        let raw = r#"{"diagram":"graph TD\nA-->B","terraform":"resource \"x\" {}","cost":{"currency":"USD","total_estimate":12.5,"items":[]}}"#;
        let result = normalize(raw);
        let cost = result.cost.expect("cost should survive normalization");
        assert_eq!(cost.total_estimate, 12.5);
        assert_eq!(cost.currency, "USD");
        assert!(cost.items.is_empty());
    }

    #[test]
    fn fenced_structured_fields_are_double_stripped() {
        let raw = r#"{"diagram":"```mermaid\ngraph TD\nA-->B\n```","terraform":"```hcl\nresource \"x\" {}\n```"}"#;
        let result = normalize(raw);
        assert_eq!(result.diagram, "graph TD\nA-->B");
        assert_eq!(result.terraform, "resource \"x\" {}");
    }

    #[test]
    fn diagram_svg_field_is_carried_through() {
        let raw = r#"{"diagram_svg":"<svg></svg>","terraform":"resource \"x\" {}"}"#;
        let result = normalize(raw);
        assert_eq!(result.diagram_svg.as_deref(), Some("<svg></svg>"));
        assert_eq!(result.diagram, "");
    }

    #[test]
    fn chat_envelope_content_is_unwrapped() {
        let content = r#"{"diagram":"graph TD\nA-->B","terraform":"resource \"x\" {}"}"#;
        let raw = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string();
        let result = normalize(&raw);
        assert_eq!(result.diagram, "graph TD\nA-->B");
        assert_eq!(result.terraform, "resource \"x\" {}");
    }

    #[test]
    fn chat_envelope_with_fenced_content_extracts_both_blocks() {
        let content = "Here is the architecture:\n```mermaid\ngraph TD\nA-->B\n```\n```terraform\nresource \"x\" {}\n```";
        let raw = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string();
        let result = normalize(&raw);
        assert_eq!(result.diagram, "graph TD\nA-->B");
        assert_eq!(result.terraform, "resource \"x\" {}");
    }

    #[test]
    fn chat_envelope_with_plain_prose_falls_back_to_content_as_diagram() {
        let raw = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "just words"}}]
        })
        .to_string();
        assert_eq!(normalize(&raw).diagram, "just words");
    }

    #[test]
    fn fenced_blocks_in_text_blob_are_extracted_and_trimmed() {
        let raw = "Here you go:\n```mermaid\ngraph TD\nA-->B\n```\nand the code:\n```terraform\nresource \"x\" {}\n```\nEnjoy!";
        let result = normalize(raw);
        assert_eq!(result.diagram, "graph TD\nA-->B");
        assert_eq!(result.terraform, "resource \"x\" {}");
        assert!(!result.terraform.contains("```"));
    }

    #[test]
    fn hcl_label_counts_as_terraform() {
        let raw = "```hcl\nresource \"aws_instance\" \"web\" {}\n```";
        let result = normalize(raw);
        assert_eq!(result.terraform, "resource \"aws_instance\" \"web\" {}");
    }

    #[test]
    fn json_fence_is_a_secondary_carrier() {
        let raw = "```json\n{\"diagram\":\"graph TD\\nA-->B\",\"terraform\":\"\"}\n```";
        let result = normalize(raw);
        assert_eq!(result.diagram, "graph TD\nA-->B");
    }

    #[test]
    fn unparseable_text_falls_back_to_raw_diagram() {
        let raw = "sorry, I can only draw ducks";
        let result = normalize(raw);
        assert_eq!(result.diagram, raw);
        assert_eq!(result.terraform, "");
    }

    #[test]
    fn prose_with_embedded_json_object() {
        let raw = "Sure! {\"diagram\": \"graph TD\\nA-->B\", \"terraform\": \"resource \\\"x\\\" {}\"} hope that helps";
        let result = normalize(raw);
        assert_eq!(result.diagram, "graph TD\nA-->B");
        assert_eq!(result.terraform, "resource \"x\" {}");
    }
}
