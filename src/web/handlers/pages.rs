use actix_web::http::StatusCode;
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use askama::Template;

use crate::loader::{load_route_module, RenderVerdict};
use crate::web::helpers::{render, render_with_status};
use crate::web::state::AppState;
use crate::web::templates::{
    ErrorFallbackTemplate, NotFoundTemplate, PublicIndexTemplate, PublicPageTemplate,
    ReloadingTemplate,
};

#[get("/")]
pub async fn home(state: web::Data<AppState>) -> impl Responder {
    let manifest = state.bundles.manifest();
    render(PublicIndexTemplate {
        version: manifest.version.clone(),
        routes: state.bundles.route_summaries(),
    })
}

#[get("/healthz")]
pub async fn healthz() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("ok")
}

/// Catch-all landing page, registered last. Every bundle fetch goes
/// through the resilient loader, racing the reload epoch: a stale deploy
/// answers with the refresh placeholder instead of an error render.
#[get("/{slug:.+}")]
pub async fn landing_page(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let slug = path.into_inner();
    if !state.bundles.contains(&slug) {
        return render_with_status(StatusCode::NOT_FOUND, NotFoundTemplate);
    }

    // Subscribe before the load starts, or the reload can be missed.
    let mut reloads = state.reloader.watch();

    tokio::select! {
        loaded = load_route_module(|| state.bundles.fetch(&slug), &state.reload_policy) => {
            match loaded {
                Ok(bundle) => render(PublicPageTemplate {
                    title: bundle.title.clone(),
                    description: bundle.description.clone(),
                    html: bundle.html.clone(),
                }),
                Err(err) => match state.supervisor.absorb(&err) {
                    RenderVerdict::Reload => reloading(req.path()),
                    RenderVerdict::Fallback { message, details } => render_with_status(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorFallbackTemplate { message, details },
                    ),
                },
            }
        }
        _ = reloads.changed() => reloading(req.path()),
    }
}

/// The "loading the updated version" placeholder: refreshes the same URL
/// once the browser retries, which picks up the new deploy.
fn reloading(path: &str) -> HttpResponse {
    let page = ReloadingTemplate {
        next: path.to_string(),
    };
    match page.render() {
        Ok(body) => HttpResponse::ServiceUnavailable()
            .content_type("text/html; charset=utf-8")
            .insert_header(("Retry-After", "1"))
            .body(body),
        Err(e) => HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body(format!("Template error: {e}")),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home).service(healthz);
}
