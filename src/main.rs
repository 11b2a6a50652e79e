use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};

use taskdesk::config::{Config, Environment};
use taskdesk::error::expose_internal_details;
use taskdesk::routes;
use taskdesk::state::AppState;
use taskdesk::store::{MemoryStore, PgStore, SharedStore};

fn to_io_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io_error)?;
    expose_internal_details(config.environment == Environment::Development);

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            log::info!("using Postgres store");
            Arc::new(PgStore::connect(url).await.map_err(to_io_error)?)
        }
        None => {
            log::warn!("DATABASE_URL not set, data is kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::from_config(store, &config).map_err(to_io_error)?;

    if let Some(admin) = &config.bootstrap_admin {
        if state.auth.ensure_admin(admin).await.map_err(to_io_error)? {
            log::info!("created bootstrap admin {}", admin.email);
        }
    }

    log::info!("Starting TaskDesk server at {}", config.server_url());

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
