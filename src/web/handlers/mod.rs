pub mod gate;
pub mod pages;

use actix_web::web;

/// Configure all routes EXCEPT the catch-all page route.
/// The catch-all must be registered last to avoid matching before specific routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    pages::configure(cfg);
    gate::configure(cfg);
}

/// Configure the catch-all page route. This MUST be called last.
pub fn configure_catch_all(cfg: &mut web::ServiceConfig) {
    cfg.service(pages::landing_page);
}
