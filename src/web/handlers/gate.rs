use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use askama::Template;
use std::time::Duration;

use crate::web::forms::{AccessForm, AccessQuery};
use crate::web::helpers::{override_cookie, override_present, sanitize_next, CookieSession};
use crate::web::security::CsrfToken;
use crate::web::state::AppState;
use crate::web::templates::BlockedTemplate;

const ATTEMPT_LIMIT: usize = 5;
const ATTEMPT_WINDOW: Duration = Duration::from_secs(300);

fn blocked_page(status: StatusCode, error: Option<String>, next: String) -> HttpResponse {
    let token = CsrfToken::generate();
    let page = BlockedTemplate {
        error,
        csrf_token: token.clone(),
        next,
    };
    match page.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .cookie(CsrfToken::create_cookie(&token))
            .body(body),
        Err(e) => HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body(format!("Template error: {e}")),
    }
}

#[get("/access")]
pub async fn access_form(req: HttpRequest, query: web::Query<AccessQuery>) -> impl Responder {
    let next = sanitize_next(query.next.as_deref());
    if override_present(&req) {
        return HttpResponse::SeeOther()
            .insert_header(("Location", next))
            .finish();
    }
    blocked_page(StatusCode::OK, None, next)
}

#[post("/access")]
pub async fn access_submit(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<AccessForm>,
) -> impl Responder {
    let next = sanitize_next(form.next.as_deref());

    // Rate limiting
    let client = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    if !state.rate_limiter.check_rate_limit(
        &format!("access:{}", client),
        ATTEMPT_LIMIT,
        ATTEMPT_WINDOW,
    ) {
        return blocked_page(
            StatusCode::TOO_MANY_REQUESTS,
            Some("Too many attempts. Please try again in a few minutes.".to_string()),
            next,
        );
    }

    if !CsrfToken::validate(&req, &form.csrf_token) {
        return blocked_page(
            StatusCode::FORBIDDEN,
            Some("The form expired. Please try again.".to_string()),
            next,
        );
    }

    let mut session = CookieSession::from_request(&req);
    let decision = state.gate.submit_password(&mut session, &form.access_code);

    if decision.is_granted() {
        HttpResponse::SeeOther()
            .cookie(override_cookie())
            .insert_header(("Location", next))
            .finish()
    } else {
        blocked_page(StatusCode::FORBIDDEN, decision.error, next)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(access_form).service(access_submit);
}
