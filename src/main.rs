use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use taskboard::{auth::AuthMiddleware, config::Config, db, error, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();

    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    log::info!("Starting taskboard server at {}", config.server_url());

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
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
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
