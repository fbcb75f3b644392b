//! Conservative Mermaid repair pass.
//!
//! Heuristic by design: it fixes the handful of defects LLM output
//! actually exhibits (fence wrappers, missing headers, unquoted subgraph
//! titles, stray semicolons, unclosed subgraphs) and leaves everything
//! else byte-for-byte alone, so already-valid diagrams pass through
//! unchanged.

use regex::Regex;
use std::sync::OnceLock;

/// Diagram-type keywords Mermaid accepts as the first statement.
const HEADERS: &[&str] = &[
    "graph",
    "flowchart",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "stateDiagram-v2",
    "erDiagram",
    "journey",
    "gantt",
    "pie",
    "mindmap",
    "timeline",
    "gitGraph",
];

/// Header inserted when the text does not begin with a recognized
/// diagram type.
pub const DEFAULT_HEADER: &str = "graph TD";

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^```[a-zA-Z0-9_-]*[ \t]*\n?(.*?)\n?```\s*$").unwrap()
    })
}

fn node_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A bare node id, optionally with one label bracket form:
    // A    A[Web]    B(Round)    C{Decision}    D((Circle))
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+(\[[^\]]*\]|\(\([^)]*\)\)|\([^)]*\)|\{[^}]*\})?$").unwrap()
    })
}

/// Strip a surrounding ```lang fence if the whole text is wrapped in one.
pub fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(caps) = fence_re().captures(trimmed) {
        return caps[1].trim().to_string();
    }
    trimmed.to_string()
}

/// True when the first word of `line` is a recognized diagram header.
fn is_header(line: &str) -> bool {
    let first = line.split_whitespace().next().unwrap_or("");
    HEADERS.contains(&first)
}

/// Quote a free-form subgraph title. `subgraph AWS` is fine as-is;
/// `subgraph AWS Cloud` needs quotes; `subgraph id[Title]` and already
/// quoted titles are left alone.
fn quote_subgraph_title(line: &str) -> String {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, rest) = line.split_at(indent_len);
    let Some(title) = rest.strip_prefix("subgraph ") else {
        return line.to_string();
    };
    let title = title.trim();
    if title.is_empty()
        || title.starts_with('"')
        || title.contains('[')
        || title.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return line.to_string();
    }
    format!("{indent}subgraph \"{title}\"")
}

/// Drop a trailing `;` from pure node-declaration lines. Edge statements
/// keep whatever terminator they came with, so valid input is untouched.
fn normalize_terminator(line: &str) -> String {
    let trimmed = line.trim_end();
    let Some(body) = trimmed.strip_suffix(';') else {
        return line.to_string();
    };
    if node_decl_re().is_match(body.trim()) {
        body.to_string()
    } else {
        line.to_string()
    }
}

/// Apply the full repair pass. Never fails; worst case the input comes
/// back with only line endings normalized.
pub fn sanitize(input: &str) -> String {
    // Normalize line endings first so every later step sees plain \n.
    let text = input.replace("\r\n", "\n").replace('\r', "\n");
    let text = strip_fences(&text);

    let mut lines: Vec<String> = Vec::new();
    let mut opens: i32 = 0;
    let mut closes: i32 = 0;

    for raw in text.lines() {
        let mut line = quote_subgraph_title(raw);
        line = normalize_terminator(&line);
        let trimmed = line.trim();
        if trimmed == "subgraph" || trimmed.starts_with("subgraph ") {
            opens += 1;
        } else if trimmed == "end" {
            closes += 1;
        }
        lines.push(line);
    }

    // Insert the default header if the first non-empty line is not a
    // recognized diagram type.
    let needs_header = !lines
        .iter()
        .find(|l| !l.trim().is_empty())
        .map(|l| is_header(l.trim()))
        .unwrap_or(false);
    if needs_header {
        lines.insert(0, DEFAULT_HEADER.to_string());
    }

    // Balance subgraph/end pairs by appending the missing closers.
    for _ in 0..(opens - closes).max(0) {
        lines.push("end".to_string());
    }

    lines.join("\n")
}
