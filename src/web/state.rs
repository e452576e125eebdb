use std::sync::Arc;

use tokio::sync::watch;

use crate::bundles::BundleStore;
use crate::gate::AccessGate;
use crate::loader::{Reload, ReloadPolicy, RenderSupervisor};
use crate::web::security::RateLimiter;

/// Reload handle for the deployed site: flushes the bundle store and
/// wakes every request currently racing a module load.
pub struct SiteReloader {
    bundles: Arc<BundleStore>,
    epoch: watch::Sender<u64>,
}

impl SiteReloader {
    pub fn new(bundles: Arc<BundleStore>) -> Self {
        let (epoch, _) = watch::channel(0);
        Self { bundles, epoch }
    }

    /// Receiver used by handlers to observe reloads. Subscribe before
    /// starting a load, or the signal can be missed.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.epoch.subscribe()
    }

    pub fn reload_count(&self) -> u64 {
        *self.epoch.borrow()
    }
}

impl Reload for SiteReloader {
    fn request_reload(&self) {
        self.bundles.mark_stale();
        self.epoch.send_modify(|epoch| *epoch += 1);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub bundles: Arc<BundleStore>,
    pub reloader: Arc<SiteReloader>,
    pub reload_policy: Arc<ReloadPolicy>,
    pub supervisor: Arc<RenderSupervisor>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(gate: AccessGate, bundles: BundleStore) -> Self {
        let gate = Arc::new(gate);
        let bundles = Arc::new(bundles);
        let reloader = Arc::new(SiteReloader::new(bundles.clone()));
        let reload_policy = Arc::new(ReloadPolicy::new(reloader.clone() as Arc<dyn Reload>));
        let supervisor = Arc::new(RenderSupervisor::new(reload_policy.clone()));

        Self {
            gate,
            bundles,
            reloader,
            reload_policy,
            supervisor,
            rate_limiter: Arc::new(RateLimiter::new()),
        }
    }
}
