use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use verdantpack::common::GeoError;
use verdantpack::gate::{AccessGate, GatePolicy, GeoInfo, GeoLookup};
use verdantpack::loader::Reload;

pub const TEST_ACCESS_CODE: &str = "evergreen-7741";

/// What the scripted lookup should answer with.
#[derive(Clone)]
pub enum GeoScript {
    Country {
        code: Option<&'static str>,
        name: Option<&'static str>,
    },
    Status(u16),
    Malformed,
    /// Never answers; exercises the gate timeout.
    Hang,
}

/// Programmable geolocation stub that counts lookups.
pub struct ScriptedGeo {
    script: Mutex<GeoScript>,
    calls: AtomicUsize,
}

impl ScriptedGeo {
    pub fn new(script: GeoScript) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoLookup for ScriptedGeo {
    async fn country_of(&self, _ip: Option<IpAddr>) -> Result<GeoInfo, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().expect("script lock").clone();
        match script {
            GeoScript::Country { code, name } => Ok(GeoInfo {
                country_code: code.map(str::to_string),
                country: name.map(str::to_string),
            }),
            GeoScript::Status(status) => Err(GeoError::Status(status)),
            GeoScript::Malformed => Err(GeoError::MalformedResponse),
            GeoScript::Hang => std::future::pending().await,
        }
    }
}

pub fn test_policy() -> GatePolicy {
    GatePolicy {
        restricted_code: "CN".to_string(),
        restricted_name: "China".to_string(),
        access_code: TEST_ACCESS_CODE.to_string(),
        lookup_timeout: Duration::from_millis(200),
    }
}

pub fn gate_with(geo: Arc<ScriptedGeo>) -> AccessGate {
    AccessGate::new(geo, test_policy())
}

/// Reload handle that only counts.
#[derive(Default)]
pub struct CountingReloader {
    count: AtomicUsize,
}

impl CountingReloader {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl Reload for CountingReloader {
    fn request_reload(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
