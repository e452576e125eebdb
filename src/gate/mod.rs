pub use geo::{GeoInfo, GeoLookup, IpapiClient};
pub use session::{MemorySession, SessionStore, OVERRIDE_GRANTED, OVERRIDE_KEY};

mod geo;
mod session;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

/// Access code accepted when `VERDANT_ACCESS_CODE` is not set.
pub const DEFAULT_ACCESS_CODE: &str = "verdant-direct-2026";

/// Lifecycle of one access evaluation.
///
/// A decision is born `Checking` and settles exactly once, to `Granted` or
/// `Blocked`. `Blocked` can still move to `Granted` through the access
/// code; `Granted` is terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPhase {
    Checking,
    Blocked,
    Granted,
}

#[derive(Debug, Clone)]
pub struct AccessDecision {
    pub phase: AccessPhase,
    pub country_code: Option<String>,
    pub error: Option<String>,
}

impl AccessDecision {
    /// The initial, unsettled state of every evaluation.
    pub fn checking() -> Self {
        Self {
            phase: AccessPhase::Checking,
            country_code: None,
            error: None,
        }
    }

    fn granted(country_code: Option<String>) -> Self {
        Self {
            phase: AccessPhase::Granted,
            country_code,
            error: None,
        }
    }

    fn blocked(country_code: Option<String>) -> Self {
        Self {
            phase: AccessPhase::Blocked,
            country_code,
            error: None,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.phase == AccessPhase::Granted
    }

    pub fn is_blocked(&self) -> bool {
        self.phase == AccessPhase::Blocked
    }
}

/// Policy knobs for the gate. The timeout bounds the geolocation lookup;
/// on expiry the gate fails open.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    pub restricted_code: String,
    pub restricted_name: String,
    pub access_code: String,
    pub lookup_timeout: Duration,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            restricted_code: "CN".to_string(),
            restricted_name: "China".to_string(),
            access_code: DEFAULT_ACCESS_CODE.to_string(),
            lookup_timeout: Duration::from_secs(5),
        }
    }
}

impl GatePolicy {
    fn matches_restricted(&self, info: &GeoInfo) -> bool {
        info.country_code.as_deref() == Some(self.restricted_code.as_str())
            || info.country.as_deref() == Some(self.restricted_name.as_str())
    }
}

/// The access gate: decides once per session whether a visitor sees the
/// site, based on a geolocation lookup with a fail-open fallback and a
/// session-persisted access-code override.
pub struct AccessGate {
    geo: Arc<dyn GeoLookup>,
    policy: GatePolicy,
}

impl AccessGate {
    pub fn new(geo: Arc<dyn GeoLookup>, policy: GatePolicy) -> Self {
        Self { geo, policy }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Decide whether this visitor may see the site.
    ///
    /// A present session override grants immediately, with no lookup.
    /// Otherwise one lookup is made, bounded by the policy timeout; only a
    /// successful answer naming the restricted region blocks. Every
    /// failure mode (connect error, bad status, malformed body, timeout)
    /// grants: availability wins over the restriction when the dependency
    /// is unreachable. No retries.
    pub async fn evaluate_access(
        &self,
        session: &dyn SessionStore,
        ip: Option<IpAddr>,
    ) -> AccessDecision {
        if session.override_present() {
            return AccessDecision::granted(None);
        }

        let lookup = self.geo.country_of(ip);
        match tokio::time::timeout(self.policy.lookup_timeout, lookup).await {
            Ok(Ok(info)) => {
                if self.policy.matches_restricted(&info) {
                    AccessDecision::blocked(info.country_code)
                } else {
                    AccessDecision::granted(info.country_code)
                }
            }
            Ok(Err(err)) => {
                log::debug!("Geo lookup failed, allowing access: {err}");
                AccessDecision::granted(None)
            }
            Err(_) => {
                log::debug!(
                    "Geo lookup timed out after {:?}, allowing access",
                    self.policy.lookup_timeout
                );
                AccessDecision::granted(None)
            }
        }
    }

    /// Compare a candidate against the shared access code.
    ///
    /// Exact, case-sensitive string equality. A match writes the override
    /// flag to the session so the gate is skipped for the remainder of
    /// the browser session; a mismatch leaves the session untouched and
    /// carries a retryable error message.
    pub fn submit_password(
        &self,
        session: &mut dyn SessionStore,
        candidate: &str,
    ) -> AccessDecision {
        if candidate == self.policy.access_code {
            session.grant_override();
            AccessDecision::granted(None)
        } else {
            AccessDecision {
                phase: AccessPhase::Blocked,
                country_code: None,
                error: Some("That access code was not recognized.".to_string()),
            }
        }
    }
}
