use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpResponse,
};
use askama::Template;
use futures_util::future::{ok, Ready};
use std::collections::HashMap;
use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};

use crate::gate::{AccessGate, MemorySession, OVERRIDE_GRANTED, OVERRIDE_KEY};
use crate::web::helpers::parse_client_ip;
use crate::web::security::CsrfToken;
use crate::web::templates::BlockedTemplate;

/// Security headers middleware
pub struct SecurityHeaders;

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SecurityHeadersMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SecurityHeadersMiddleware { service })
    }
}

pub struct SecurityHeadersMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;

            let headers = res.headers_mut();

            // Prevent clickjacking
            headers.insert(
                actix_web::http::header::HeaderName::from_static("x-frame-options"),
                actix_web::http::header::HeaderValue::from_static("DENY"),
            );

            // Prevent MIME sniffing
            headers.insert(
                actix_web::http::header::HeaderName::from_static("x-content-type-options"),
                actix_web::http::header::HeaderValue::from_static("nosniff"),
            );

            // Content Security Policy
            headers.insert(
                actix_web::http::header::HeaderName::from_static("content-security-policy"),
                actix_web::http::header::HeaderValue::from_static(
                    "default-src 'self'; style-src 'self'; img-src 'self' data:; frame-ancestors 'none'",
                ),
            );

            // Referrer Policy
            headers.insert(
                actix_web::http::header::HeaderName::from_static("referrer-policy"),
                actix_web::http::header::HeaderValue::from_static(
                    "strict-origin-when-cross-origin",
                ),
            );

            Ok(res)
        })
    }
}

const GEO_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Remembers a visitor's geo verdict briefly, keeping the lookup at
/// roughly once per session without persisting a grant anywhere.
pub struct GeoDecisionCache {
    entries: Mutex<HashMap<IpAddr, (SystemTime, bool)>>,
    ttl: Duration,
}

impl GeoDecisionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, ip: IpAddr) -> Option<bool> {
        let now = SystemTime::now();
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.retain(|_, entry| {
            now.duration_since(entry.0).unwrap_or(Duration::from_secs(0)) < self.ttl
        });
        entries.get(&ip).map(|entry| entry.1)
    }

    pub fn put(&self, ip: IpAddr, blocked: bool) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(ip, (SystemTime::now(), blocked));
    }
}

fn is_exempt(path: &str) -> bool {
    path == "/access" || path == "/healthz" || path == "/favicon.ico" || path.starts_with("/static/")
}

/// Gate wrapped around every page route: a request either carries the
/// session override, passes the geo check, or is answered with the block
/// screen. No route handler runs for a blocked session.
pub struct AccessGateEnforcer {
    gate: Arc<AccessGate>,
    cache: Arc<GeoDecisionCache>,
}

impl AccessGateEnforcer {
    pub fn new(gate: Arc<AccessGate>) -> Self {
        Self {
            gate,
            cache: Arc::new(GeoDecisionCache::new(GEO_CACHE_TTL)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGateEnforcer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AccessGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AccessGateMiddleware {
            service: Rc::new(service),
            gate: self.gate.clone(),
            cache: self.cache.clone(),
        })
    }
}

pub struct AccessGateMiddleware<S> {
    service: Rc<S>,
    gate: Arc<AccessGate>,
    cache: Arc<GeoDecisionCache>,
}

impl<S, B> Service<ServiceRequest> for AccessGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gate = self.gate.clone();
        let cache = self.cache.clone();

        Box::pin(async move {
            if is_exempt(req.path()) {
                return Ok(service.call(req).await?.map_into_left_body());
            }

            let session_granted = req
                .cookie(OVERRIDE_KEY)
                .is_some_and(|c| c.value() == OVERRIDE_GRANTED);
            if session_granted {
                return Ok(service.call(req).await?.map_into_left_body());
            }

            let ip = {
                let info = req.connection_info();
                info.realip_remote_addr().and_then(parse_client_ip)
            };

            let blocked = match ip.and_then(|ip| cache.get(ip)) {
                Some(cached) => cached,
                None => {
                    let decision = gate.evaluate_access(&MemorySession::new(), ip).await;
                    let blocked = decision.is_blocked();
                    if blocked {
                        log::info!(
                            "Blocking visitor from restricted region ({})",
                            decision.country_code.as_deref().unwrap_or("unknown")
                        );
                    }
                    if let Some(ip) = ip {
                        cache.put(ip, blocked);
                    }
                    blocked
                }
            };

            if !blocked {
                return Ok(service.call(req).await?.map_into_left_body());
            }

            let token = CsrfToken::generate();
            let page = BlockedTemplate {
                error: None,
                csrf_token: token.clone(),
                next: req.path().to_string(),
            };
            let response = match page.render() {
                Ok(body) => HttpResponse::Forbidden()
                    .content_type("text/html; charset=utf-8")
                    .cookie(CsrfToken::create_cookie(&token))
                    .body(body),
                Err(e) => HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body(format!("Template error: {e}")),
            };

            let (request, _payload) = req.into_parts();
            Ok(ServiceResponse::new(request, response).map_into_right_body())
        })
    }
}
