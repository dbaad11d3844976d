use std::time::Instant;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use todoforge::auth::AuthMiddleware;
use todoforge::config::Config;
use todoforge::db;
use todoforge::error::AppError;
use todoforge::routes;
use todoforge::routes::health::ServerStart;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = db::init_pool(&config)
        .await
        .expect("Failed to connect to database");
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    let started_at = Instant::now();
    let bind_addr = (config.server_host.clone(), config.server_port);
    log::info!("Starting TodoForge server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(ServerStart(started_at)))
            // malformed bodies, query strings, and path params all render
            // through the same structured {"error": ...} shape
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::Validation(format!("Invalid JSON body: {}", err)).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::Validation(format!("Invalid query parameter: {}", err)).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                AppError::Validation(format!("Invalid path parameter: {}", err)).into()
            }))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
