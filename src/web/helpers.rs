use std::net::{IpAddr, SocketAddr};

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use askama::Template;

use crate::gate::{SessionStore, OVERRIDE_GRANTED, OVERRIDE_KEY};

pub fn render<T: Template>(t: T) -> HttpResponse {
    render_with_status(StatusCode::OK, t)
}

pub fn render_with_status<T: Template>(status: StatusCode, t: T) -> HttpResponse {
    match t.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) => HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body(format!("Template error: {e}")),
    }
}

/// Parse the address actix's connection info reports, stripping a port
/// when one is present.
pub fn parse_client_ip(addr: &str) -> Option<IpAddr> {
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return Some(ip);
    }
    addr.parse::<SocketAddr>().ok().map(|sock| sock.ip())
}

pub fn override_present(req: &HttpRequest) -> bool {
    req.cookie(OVERRIDE_KEY)
        .is_some_and(|c| c.value() == OVERRIDE_GRANTED)
}

/// Session-scoped override cookie. No Max-Age: it dies with the browser
/// session, so the gate is re-evaluated on the next visit.
pub fn override_cookie() -> Cookie<'static> {
    Cookie::build(OVERRIDE_KEY, OVERRIDE_GRANTED)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .finish()
}

/// Only site-local redirect targets survive; anything else falls back to
/// the root.
pub fn sanitize_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

/// A request-scoped view of the browser session. Reads come from the
/// request's cookie jar; a grant is picked up by the handler, which
/// attaches the override cookie to its response.
pub struct CookieSession {
    present: bool,
    granted: bool,
}

impl CookieSession {
    pub fn from_request(req: &HttpRequest) -> Self {
        Self {
            present: override_present(req),
            granted: false,
        }
    }
}

impl SessionStore for CookieSession {
    fn override_present(&self) -> bool {
        self.present || self.granted
    }

    fn grant_override(&mut self) {
        self.granted = true;
    }
}
