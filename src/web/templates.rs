use askama::Template;

use crate::bundles::RouteSummary;

#[derive(Template)]
#[template(path = "public/index.html")]
pub struct PublicIndexTemplate {
    pub version: String,
    pub routes: Vec<RouteSummary>,
}

#[derive(Template)]
#[template(path = "public/page.html")]
pub struct PublicPageTemplate {
    pub title: String,
    pub description: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "public/not_found.html")]
pub struct NotFoundTemplate;

#[derive(Template)]
#[template(path = "gate/blocked.html")]
pub struct BlockedTemplate {
    pub error: Option<String>,
    pub csrf_token: String,
    pub next: String,
}

#[derive(Template)]
#[template(path = "system/reloading.html")]
pub struct ReloadingTemplate {
    pub next: String,
}

#[derive(Template)]
#[template(path = "system/error.html")]
pub struct ErrorFallbackTemplate {
    pub message: String,
    pub details: String,
}
