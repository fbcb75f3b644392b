//! Delegation to the external Mermaid rendering engine.
//!
//! Layout is not this crate's job. The sanitized diagram text is handed
//! to the Mermaid CLI (`mmdc`), and its failures are wrapped so the
//! caller can show the error message alongside the offending source
//! instead of crashing.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no Mermaid engine found — install @mermaid-js/mermaid-cli so `mmdc` is in PATH")]
    EngineNotFound,
    #[error("mermaid render failed: {message}")]
    Engine {
        message: String,
        /// The sanitized source that was handed to the engine, kept for
        /// display so a parse failure is debuggable.
        diagram_source: String,
    },
    #[error("render I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// The diagram text that triggered the failure, when the engine got
    /// far enough to see one.
    pub fn diagram_source(&self) -> Option<&str> {
        match self {
            RenderError::Engine { diagram_source, .. } => Some(diagram_source),
            _ => None,
        }
    }
}

/// Handle to the external engine binary.
pub struct Renderer {
    engine: PathBuf,
}

impl Renderer {
    /// Locate the engine in PATH.
    pub fn discover() -> Result<Self, RenderError> {
        ["mmdc", "mmdc.cmd"]
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Renderer::from_path)
            .ok_or(RenderError::EngineNotFound)
    }

    pub fn from_path(engine: PathBuf) -> Self {
        Renderer { engine }
    }

    /// Render sanitized diagram text to SVG markup.
    pub fn render_svg(&self, source: &str) -> Result<String, RenderError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("diagram.mmd");
        let output = dir.path().join("diagram.svg");
        std::fs::write(&input, source)?;
        self.run(source, &input, &output, None)?;
        Ok(std::fs::read_to_string(&output)?)
    }

    /// Rasterize diagram text to a PNG file at the given scale, against an
    /// opaque background.
    pub fn render_png(&self, source: &str, scale: f64, out: &Path) -> Result<(), RenderError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("diagram.mmd");
        std::fs::write(&input, source)?;
        self.run(source, &input, out, Some(scale))
    }

    fn run(
        &self,
        source: &str,
        input: &Path,
        output: &Path,
        scale: Option<f64>,
    ) -> Result<(), RenderError> {
        let mut cmd = Command::new(&self.engine);
        cmd.arg("-i").arg(input).arg("-o").arg(output).arg("--quiet");
        if let Some(scale) = scale {
            cmd.args(["--backgroundColor", "white"]);
            cmd.arg("--scale").arg(format!("{scale}"));
        }
        let out = cmd.stdin(Stdio::null()).output()?;
        if !out.status.success() {
            let mut message = String::from_utf8_lossy(&out.stderr).trim().to_string();
            if message.is_empty() {
                message = format!("{} exited with {}", self.engine.display(), out.status);
            }
            tracing::warn!("mermaid engine failed: {message}");
            return Err(RenderError::Engine {
                message,
                diagram_source: source.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Stand-in engine: a shell script so the spawn/capture path is
    /// exercised without a real Mermaid CLI on the machine.
    fn fake_engine(dir: &Path, script: &str) -> PathBuf {
        let path = dir.join("mmdc");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn render_svg_reads_engine_output() {
        let dir = tempfile::tempdir().unwrap();
        // Writes a fixed SVG to whatever path follows -o.
        let engine = fake_engine(
            dir.path(),
            r#"while [ "$1" != "-o" ]; do shift; done; printf '<svg/>' > "$2""#,
        );
        let svg = Renderer::from_path(engine)
            .render_svg("graph TD\nA-->B")
            .unwrap();
        assert_eq!(svg, "<svg/>");
    }

    #[test]
    fn engine_failure_carries_message_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), r#"echo 'Parse error on line 2' >&2; exit 1"#);
        let err = Renderer::from_path(engine)
            .render_svg("graph TD\nA--?B")
            .unwrap_err();
        match err {
            RenderError::Engine {
                message,
                diagram_source,
            } => {
                assert!(message.contains("Parse error"));
                assert_eq!(diagram_source, "graph TD\nA--?B");
            }
            other => panic!("expected Engine error, got {other:?}"),
        }
    }
}
