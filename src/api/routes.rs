// src/api/routes.rs
use actix_web::web;
use super::error::json_error_handler;
use super::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/", web::get().to(handlers::root))
        .route("/health", web::get().to(handlers::health_check))
        .route("/evaluate", web::post().to(handlers::evaluate))
        .route("/ab-test", web::post().to(handlers::ab_test));
}
