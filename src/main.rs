// src/main.rs
use actix_web::{App, HttpServer, middleware::Logger, web};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cinehub::{build_cache, config, configure, db, seed};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    tracing::info!("Starting CineHub");

    let config = config::Config::from_env().expect("Failed to load config from environment");

    let pool = db::connect(&config)
        .await
        .expect("Failed to connect to Postgres");
    db::migrate(&pool).await.expect("Failed to run migrations");

    if let Some(path) = &config.seed_file {
        seed::load(&pool, path).await.expect("Failed to load seed file");
    }

    let cache = build_cache(&config);
    let bind = (config.host.clone(), config.port);
    tracing::info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await
}
