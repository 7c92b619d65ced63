//! DDoS Catalogue API
//!
//! This is the main entry point for the DDoS catalogue service.
//! It initializes the application components and starts the web server.

mod api;
mod config;
mod core;
mod models;
mod utils;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::api::ApiState;
use crate::core::AttackService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    info!("Starting DDoS Catalogue API...");

    // Load configuration
    let config = config::load_config().expect("Failed to load configuration");
    let config = Arc::new(config);

    // Initialize the Postgres connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");

    // Create API state
    let state = web::Data::new(ApiState {
        service: AttackService::new(pool),
        config: config.clone(),
    });

    info!(
        "Listening on {}:{} ({})",
        config.server.host, config.server.port, config.environment
    );

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::config)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
