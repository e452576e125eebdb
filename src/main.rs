use actix_files::Files;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::sync::Arc;

use verdantpack::bundles::BundleStore;
use verdantpack::config::SiteConfig;
use verdantpack::gate::{AccessGate, IpapiClient};
use verdantpack::web;
use verdantpack::web::middleware::{AccessGateEnforcer, SecurityHeaders};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = SiteConfig::from_env()
        .expect("Invalid configuration (check the VERDANT_* environment variables)");
    let bundles = BundleStore::open(&config.content_dir)
        .expect("Failed to read the deploy manifest (set CONTENT_DIR to the deployed content directory)");
    let geo = IpapiClient::new(config.geo_base_url.as_str(), config.gate.lookup_timeout)
        .expect("Failed to build the geolocation client");
    let gate = AccessGate::new(Arc::new(geo), config.gate.clone());

    let state = web::AppState::new(gate, bundles);
    log::info!(
        "Serving deploy {} on {}",
        state.bundles.manifest().version,
        config.bind_addr
    );

    let data = Data::new(state.clone());
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(AccessGateEnforcer::new(state.gate.clone()))
            .wrap(SecurityHeaders)
            .configure(web::handlers::configure)
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .configure(web::handlers::configure_catch_all)
    })
    .bind(config.bind_addr.clone())?
    .run()
    .await
}
