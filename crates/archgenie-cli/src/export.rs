//! Export actions over the last-rendered artifact.
//!
//! Three independent, stateless operations: copy the code text to the
//! system clipboard, save the code text, save the image as SVG or as a
//! rasterized PNG. Each takes the artifact as an explicit parameter and
//! is a warned no-op when none exists yet.

use archgenie_core::Artifact;
use archgenie_mermaid::{RenderError, Renderer};
use color_eyre::eyre::{eyre, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

pub const DEFAULT_TEXT_FILE: &str = "terraform.tf";
pub const DEFAULT_SVG_FILE: &str = "diagram.svg";
pub const DEFAULT_PNG_FILE: &str = "diagram.png";

/// Display zoom. `fit` leaves scaling to the viewer; a numeric factor is
/// remembered so PNG export rasterizes at the same scale the user was
/// looking at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zoom {
    Fit,
    Factor(f64),
}

impl Zoom {
    pub fn png_scale(&self) -> f64 {
        match self {
            Zoom::Fit => 1.0,
            Zoom::Factor(f) => *f,
        }
    }
}

impl FromStr for Zoom {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        if s.eq_ignore_ascii_case("fit") {
            return Ok(Zoom::Fit);
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() && f > 0.0 => Ok(Zoom::Factor(f)),
            _ => Err(format!(
                "invalid zoom {s:?} (expected \"fit\" or a positive factor like 1.5)"
            )),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// Copied to the clipboard via the named tool.
    Copied(String),
    /// Nothing to export yet; the user was warned and nothing was written.
    NoArtifact,
    /// Export skipped with a user-visible reason.
    Skipped(String),
}

fn no_artifact(what: &str) -> ExportOutcome {
    eprintln!("Nothing to export yet — generate a diagram before requesting {what}.");
    ExportOutcome::NoArtifact
}

/// Save the code text to a file.
pub fn export_text(artifact: Option<&Artifact>, path: &Path) -> Result<ExportOutcome> {
    let Some(artifact) = artifact else {
        return Ok(no_artifact("the code text"));
    };
    std::fs::write(path, &artifact.terraform)?;
    Ok(ExportOutcome::Written(path.to_path_buf()))
}

/// Save the rendered vector image to a file.
pub fn export_svg(artifact: Option<&Artifact>, path: &Path) -> Result<ExportOutcome> {
    let Some(artifact) = artifact else {
        return Ok(no_artifact("the SVG"));
    };
    let Some(svg) = &artifact.svg else {
        return Ok(ExportOutcome::Skipped(
            "the current artifact has no rendered image".to_string(),
        ));
    };
    std::fs::write(path, svg)?;
    Ok(ExportOutcome::Written(path.to_path_buf()))
}

/// Rasterize the diagram to PNG at the zoom-adjusted scale.
pub fn export_png(artifact: Option<&Artifact>, zoom: Zoom, path: &Path) -> Result<ExportOutcome> {
    let Some(artifact) = artifact else {
        return Ok(no_artifact("the PNG"));
    };
    if artifact.diagram_source.trim().is_empty() {
        return Ok(ExportOutcome::Skipped(
            "PNG export needs diagram source; this generation only returned a pre-rendered SVG"
                .to_string(),
        ));
    }
    let renderer = match Renderer::discover() {
        Ok(r) => r,
        Err(e) => return Ok(ExportOutcome::Skipped(e.to_string())),
    };
    match renderer.render_png(&artifact.diagram_source, zoom.png_scale(), path) {
        Ok(()) => Ok(ExportOutcome::Written(path.to_path_buf())),
        Err(RenderError::Engine { message, .. }) => Ok(ExportOutcome::Skipped(message)),
        Err(e) => Err(e.into()),
    }
}

// Clipboard tools in probe order, with the args each needs to read from
// stdin into the system clipboard.
const CLIPBOARD_TOOLS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

fn clipboard_tool() -> Option<(PathBuf, &'static [&'static str])> {
    CLIPBOARD_TOOLS
        .iter()
        .find_map(|(name, args)| which::which(name).ok().map(|path| (path, *args)))
}

/// Copy the code text to the system clipboard.
pub fn copy_code(artifact: Option<&Artifact>) -> Result<ExportOutcome> {
    let Some(artifact) = artifact else {
        return Ok(no_artifact("a clipboard copy"));
    };
    let Some((tool, args)) = clipboard_tool() else {
        return Ok(ExportOutcome::Skipped(
            "no clipboard tool found (pbcopy, wl-copy, xclip, or xsel)".to_string(),
        ));
    };
    let mut child = Command::new(&tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .spawn()?;
    {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| eyre!("clipboard tool has no stdin"))?;
        stdin.write_all(artifact.terraform.as_bytes())?;
    }
    let status = child.wait()?;
    if !status.success() {
        return Ok(ExportOutcome::Skipped(format!(
            "{} exited with {status}",
            tool.display()
        )));
    }
    let name = tool
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| tool.display().to_string());
    Ok(ExportOutcome::Copied(name))
}
