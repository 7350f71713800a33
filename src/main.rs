use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use agent_eval::api::{configure_routes, AppState};
use agent_eval::{banner, config};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    banner::print_banner();

    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  Warning: Could not load .env file: {}", e);
        eprintln!("   Make sure GEMINI_API_KEY is set in your environment");
    }

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let app_config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::other(e));
        }
    };

    let bind = (app_config.host.clone(), app_config.port);
    log::info!(
        "Default model: {}, comparison lineup: {:?}",
        app_config.settings.default_model,
        app_config
            .settings
            .comparison_models
            .iter()
            .map(|m| m.id.as_str())
            .collect::<Vec<_>>()
    );

    let state = AppState::new(app_config);

    println!("🚀 Starting server on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(configure_routes)
    })
    .bind(bind)?
    .run()
    .await
}
