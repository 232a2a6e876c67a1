use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod model;
mod policy;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::policy::access_control::AccessControlPolicy;
use crate::policy::attendance_window::AttendanceWindowPolicy;
use crate::policy::clock::SystemClock;
use crate::store::mysql::MySqlStore;
use crate::utils::attendance_cache::CachedAttendanceStore;
use crate::utils::change_feed::{ChangeFeed, run_invalidation_listener};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Team dashboard is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let requests = MySqlStore::new(pool.clone());
    let attendance = Arc::new(CachedAttendanceStore::new(
        MySqlStore::new(pool),
        config.attendance_cache_ttl,
    ));

    let feed = ChangeFeed::new(config.change_feed_capacity);
    actix_web::rt::spawn(run_invalidation_listener(feed.subscribe(), attendance.clone()));

    let window_policy = AttendanceWindowPolicy::new(config.window, Arc::new(SystemClock));
    let access_policy = AccessControlPolicy::new(config.unresolved_role);
    info!(
        offset = %config.window.reference_offset,
        late_window_start = %config.window.late_window_start,
        late_window_end = %config.window.late_window_end,
        evening_cutoff = %config.window.evening_cutoff,
        unresolved_role = ?config.unresolved_role,
        "Policies configured"
    );

    let server_addr = config.server_addr.clone();
    let attendance = Data::from(attendance);
    let requests = Data::new(requests);
    let feed = Data::new(feed);
    let window_policy = Data::new(window_policy);
    let access_policy = Data::new(access_policy);
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(attendance.clone())
            .app_data(requests.clone())
            .app_data(feed.clone())
            .app_data(window_policy.clone())
            .app_data(access_policy.clone())
            .app_data(config_data.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
