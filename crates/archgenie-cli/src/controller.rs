//! Generation lifecycle state.
//!
//! The controller owns the single current artifact. Requests are tagged
//! with a monotonically increasing generation token when they start;
//! a completion only applies while its token is still the latest, so a
//! late response from a superseded request is discarded instead of
//! silently overwriting the newer one.

use archgenie_core::{Artifact, CostEstimate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Requesting,
    Rendered,
    Errored,
}

#[derive(Debug)]
pub struct Controller {
    status: Status,
    latest: u64,
    current: Option<Artifact>,
}

impl Default for Controller {
    fn default() -> Self {
        Controller {
            status: Status::Idle,
            latest: 0,
            current: None,
        }
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The current artifact, if a generation has completed.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.current.as_ref()
    }

    /// Start a generation action. Returns the sequence token the caller
    /// must hand back on completion.
    pub fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.status = Status::Requesting;
        tracing::debug!(generation = self.latest, "generation started");
        self.latest
    }

    /// Apply a completed generation. `rendered` records whether the
    /// diagram engine produced an image; the artifact is kept either way
    /// so the code text stays exportable after a render failure.
    /// Returns false (and changes nothing) when `token` is stale.
    pub fn complete(
        &mut self,
        token: u64,
        diagram_source: String,
        svg: Option<String>,
        terraform: String,
        cost: Option<CostEstimate>,
        rendered: bool,
    ) -> bool {
        if token != self.latest {
            tracing::warn!(
                token,
                latest = self.latest,
                "discarding completion of superseded generation"
            );
            return false;
        }
        self.current = Some(Artifact {
            diagram_source,
            svg,
            terraform,
            cost,
            generation: token,
        });
        self.status = if rendered {
            Status::Rendered
        } else {
            Status::Errored
        };
        true
    }

    /// Record a request-level failure. The previous artifact (if any)
    /// stays current. Returns false when `token` is stale.
    pub fn fail(&mut self, token: u64) -> bool {
        if token != self.latest {
            tracing::warn!(
                token,
                latest = self.latest,
                "discarding failure of superseded generation"
            );
            return false;
        }
        self.status = Status::Errored;
        true
    }
}
