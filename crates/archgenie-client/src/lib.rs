//! HTTP client for the ArchGenie backend.
//!
//! One generation action is one walk of a provider's endpoint fallback
//! chain; the successful body then goes through the normalization
//! strategies in [`parse`]. The backend owns all LLM and pricing logic —
//! this side only speaks the HTTP contract and cleans up what comes back.

pub mod endpoints;
pub mod parse;

pub use endpoints::{Client, ClientError, EstimateRequest, Provider};
pub use parse::normalize;
