use actix_web::{middleware, web, App, HttpServer};
use log::{info, warn};

use comic_shelf::api;
use comic_shelf::app_state::AppState;
use comic_shelf::config::AppConfig;
use comic_shelf::origin::middleware::origin_gate;

fn init_logging(config: &AppConfig) {
    if let Err(e) = log4rs::init_file(&config.logging.config_file, Default::default()) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        warn!("Could not load {} ({}), logging to stderr", config.logging.config_file, e);
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let mut config = AppConfig::load()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    init_logging(&config);
    match &config.source {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => warn!("No configuration file found, using defaults"),
    }
    config.apply_env();

    let bind = (config.server.host.clone(), config.server.port);
    let workers = config.server.workers;
    let state = web::Data::new(AppState::from_config(config));

    info!("Starting server on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::from_fn(origin_gate))
            .wrap(middleware::Logger::default())
            .configure(api::configure)
    })
    .workers(workers)
    .bind(bind)?
    .run()
    .await
}
