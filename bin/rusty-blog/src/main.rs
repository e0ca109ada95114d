//! # Rusty-Blog Binary
//!
//! The entry point that assembles the application based on compile-time features.

use actix_files::Files;
use actix_web::{web, App, HttpServer};
use rb_api::{configure_routes, handlers, middleware};
use rusty_blog::settings::Settings;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().expect("Failed to load configuration");
    std::fs::create_dir_all(&settings.media_root)?;

    let state = web::Data::new(
        rusty_blog::build_state(&settings)
            .await
            .expect("Failed to initialise storage"),
    );

    let media_url = settings.media_url.clone();
    let media_root = settings.media_root.clone();
    let static_root = settings.static_root.clone();

    log::info!("Rusty-Blog starting on http://{}:{}", settings.bind_addr, settings.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            // Innermost, so the drawn 404 still passes the header middleware.
            .wrap(middleware::not_found_page())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::security_headers())
            .wrap(middleware::cors_policy())
            .service(Files::new(&media_url, &media_root))
            .service(Files::new("/static", &static_root))
            .configure(configure_routes)
            .default_service(web::to(handlers::not_found))
    })
    .bind((settings.bind_addr.as_str(), settings.port))?
    .run()
    .await
}
