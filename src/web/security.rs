use actix_web::{cookie::Cookie, HttpRequest};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

pub const CSRF_COOKIE: &str = "vp_csrf";

/// CSRF token for the access-code form, double-submit style: the hidden
/// form field must equal the cookie set alongside the form.
pub struct CsrfToken;

impl CsrfToken {
    pub fn generate() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn validate(req: &HttpRequest, form_token: &str) -> bool {
        if let Some(cookie) = req.cookie(CSRF_COOKIE) {
            let stored = cookie.value();
            !stored.is_empty() && stored == form_token
        } else {
            false
        }
    }

    pub fn create_cookie(token: &str) -> Cookie<'static> {
        Cookie::build(CSRF_COOKIE, token.to_string())
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(actix_web::cookie::SameSite::Strict)
            .finish()
    }
}

/// Simple in-memory rate limiter, keyed by caller-chosen strings.
pub struct RateLimiter {
    requests: Mutex<HashMap<String, Vec<SystemTime>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Check if a request should be allowed.
    /// Returns true if allowed, false if the rate limit is exceeded.
    pub fn check_rate_limit(&self, key: &str, max_requests: usize, window: Duration) -> bool {
        let now = SystemTime::now();
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let entry = requests.entry(key.to_string()).or_default();

        // Drop attempts that fell out of the window
        entry.retain(|&time| {
            now.duration_since(time).unwrap_or(Duration::from_secs(0)) < window
        });

        if entry.len() >= max_requests {
            return false;
        }

        entry.push(now);

        // Remove empty entries to keep the map bounded
        requests.retain(|_, times| !times.is_empty());

        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
