pub use stale::{is_stale_artifact_error, STALE_MESSAGE_MARKERS};
pub use supervisor::{RenderSupervisor, RenderVerdict};

mod stale;
mod supervisor;

use std::future::{self, Future};
use std::sync::Arc;

use crate::common::ModuleError;

/// Side-effect handle for a full page reload. The site implementation
/// flushes the deploy caches and wakes every request racing a load; tests
/// substitute a counter.
pub trait Reload: Send + Sync {
    fn request_reload(&self);
}

type StalePredicate = dyn Fn(&ModuleError) -> bool + Send + Sync;

/// How a failed load is classified and what a stale classification fires.
pub struct ReloadPolicy {
    reloader: Arc<dyn Reload>,
    is_stale: Box<StalePredicate>,
}

impl ReloadPolicy {
    /// Policy with the default stale classifier.
    pub fn new(reloader: Arc<dyn Reload>) -> Self {
        Self {
            reloader,
            is_stale: Box::new(is_stale_artifact_error),
        }
    }

    /// Swap the classifier, e.g. for a build pipeline that reports stale
    /// artifacts through typed errors instead of message text.
    pub fn with_classifier<F>(reloader: Arc<dyn Reload>, is_stale: F) -> Self
    where
        F: Fn(&ModuleError) -> bool + Send + Sync + 'static,
    {
        Self {
            reloader,
            is_stale: Box::new(is_stale),
        }
    }

    pub fn is_stale_artifact(&self, err: &ModuleError) -> bool {
        (self.is_stale)(err)
    }

    pub fn reloader(&self) -> &Arc<dyn Reload> {
        &self.reloader
    }
}

/// Fetch a route's module through `importer`.
///
/// Three outcomes:
/// - the importer resolves: the module is returned unchanged;
/// - the importer fails with a stale-artifact error: the reload handle is
///   fired exactly once and the returned future never settles;
/// - the importer fails any other way: the error propagates unchanged.
///
/// The non-settling arm is intentional. A reload supersedes the render in
/// flight, and a future that settled first would flash broken content
/// before the refreshed page arrives. Callers observe the reload through
/// the reload handle's own channel, never through this future.
pub async fn load_route_module<M, F, Fut>(
    importer: F,
    policy: &ReloadPolicy,
) -> Result<M, ModuleError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<M, ModuleError>>,
{
    match importer().await {
        Ok(module) => Ok(module),
        Err(err) if policy.is_stale_artifact(&err) => {
            log::warn!("Stale build artifact, requesting full reload: {err}");
            policy.reloader.request_reload();
            future::pending().await
        }
        Err(err) => Err(err),
    }
}
