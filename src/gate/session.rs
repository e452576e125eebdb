/// Storage key of the session override flag.
pub const OVERRIDE_KEY: &str = "vp_access";

/// Value stored under [`OVERRIDE_KEY`] once the access code has been
/// accepted. Anything else is treated as absent.
pub const OVERRIDE_GRANTED: &str = "granted";

/// A browser session as the gate sees it: one boolean-like override flag,
/// written on a correct access-code submission and read at the start of
/// every evaluation.
pub trait SessionStore {
    fn override_present(&self) -> bool;
    fn grant_override(&mut self);
}

/// Session detached from any HTTP exchange.
#[derive(Debug, Default)]
pub struct MemorySession {
    granted: bool,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn override_present(&self) -> bool {
        self.granted
    }

    fn grant_override(&mut self) {
        self.granted = true;
    }
}
