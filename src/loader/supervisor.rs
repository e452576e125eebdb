use std::sync::Arc;

use crate::common::ModuleError;

use super::ReloadPolicy;

/// What the top-level catcher does with a failure that escaped a route
/// render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderVerdict {
    /// Stale-deploy signature: reload the page behind the neutral
    /// "loading the updated version" placeholder, never an error screen.
    Reload,
    /// A genuine failure: show the minimal fallback carrying the message
    /// and raw details rather than a blank page.
    Fallback { message: String, details: String },
}

/// Render-time counterpart of [`super::load_route_module`]: classifies
/// failures that surface while producing a response rather than while
/// importing, and reacts with the same reload side effect.
pub struct RenderSupervisor {
    policy: Arc<ReloadPolicy>,
}

impl RenderSupervisor {
    pub fn new(policy: Arc<ReloadPolicy>) -> Self {
        Self { policy }
    }

    pub fn absorb(&self, err: &ModuleError) -> RenderVerdict {
        if self.policy.is_stale_artifact(err) {
            log::warn!("Stale artifact surfaced at render time, reloading: {err}");
            self.policy.reloader().request_reload();
            RenderVerdict::Reload
        } else {
            log::error!("Unrecoverable render failure: {err}");
            RenderVerdict::Fallback {
                message: "Oops! Something went wrong".to_string(),
                details: err.to_string(),
            }
        }
    }
}
