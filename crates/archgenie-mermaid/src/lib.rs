//! Mermaid text handling for ArchGenie.
//!
//! The upstream generator returns diagram text that is close to, but not
//! guaranteed to be, valid Mermaid. This crate applies a conservative
//! repair pass before rendering and delegates the actual layout work to
//! the external Mermaid CLI engine.

pub mod render;
pub mod sanitize;

pub use render::{RenderError, Renderer};
pub use sanitize::sanitize;
