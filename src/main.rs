use std::io;

use dotenvy::dotenv;
use order_management::config::AppConfig;
use order_management::{build_server, create_pool, run_migrations, HttpProductCatalog};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let pool = create_pool(&config.database_url).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;
    log::info!("Database connected");

    let catalog = HttpProductCatalog::new(
        &config.product_service_url,
        config.product_service_timeout,
    )
    .map_err(io::Error::other)?;
    log::info!(
        "Validating products against {} (timeout {:?})",
        config.product_service_url,
        config.product_service_timeout
    );

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(pool, catalog, &config.host, config.port)?.await
}
