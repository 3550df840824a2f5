use actix_web::{App, HttpServer, web};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::{Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod config;
mod db;
mod notify;
mod payment;
mod shutdown;

use crate::api::{
    health::health_config, job::JobService, job::handlers::job_config,
    notification::notification_config, transaction::transaction_config, user::user_config,
    validation,
};
use crate::auth::AuthKeys;
use crate::notify::{Dispatcher, PushClient};
use crate::payment::SimulatedGateway;
use crate::shutdown::ShutdownCoordinator;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from environment
    let cfg = config::Config::from_env().expect("Failed to load configuration");

    // Create logs directory if it doesn't exist
    std::fs::create_dir_all(&cfg.log_dir).expect("Failed to create logs directory");

    // File-based logging with daily rotation plus console output.
    // Files land as logs/info.<date>.log and logs/error.<date>.log.
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let info_file = tracing_appender::rolling::daily(&cfg.log_dir, "info.log");
    let error_file = tracing_appender::rolling::daily(&cfg.log_dir, "error.log");

    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_file)
        .with_ansi(false)
        .with_filter(LevelFilter::INFO);

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_file)
        .with_ansi(false)
        .with_filter(LevelFilter::ERROR);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(info_layer)
        .with(error_layer)
        .init();

    // Get database connection pool
    let pool = db::connection::get_connection(&cfg.database_url, cfg.max_db_connections)
        .await
        .expect("Failed to connect to database");

    info!("Starting gigmarket application");
    info!("  - Bind address: {}", cfg.bind_addr);
    info!("  - Max payload size: {} bytes", cfg.max_payload_size);
    info!("  - Max database connections: {}", cfg.max_db_connections);
    info!("  - Payment timeout: {}s", cfg.payment_timeout_secs);

    // Run migrations on startup
    db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // Process-wide capabilities, built once and injected
    let push_client = Arc::new(PushClient::from_config(cfg.push_enabled));
    let gateway = Arc::new(SimulatedGateway::new());
    let auth_keys = web::Data::new(AuthKeys::new(&cfg.jwt_secret));
    let payment_timeout = Duration::from_secs(cfg.payment_timeout_secs);

    let server_pool = pool.clone();
    let max_payload_size = cfg.max_payload_size;

    let server = HttpServer::new(move || {
        let dispatcher = Dispatcher::new(server_pool.clone(), push_client.clone());
        let job_service = web::Data::new(JobService::new(
            server_pool.clone(),
            dispatcher,
            gateway.clone(),
            payment_timeout,
        ));

        let payload_config = web::PayloadConfig::default().limit(max_payload_size);

        App::new()
            .app_data(web::Data::new(server_pool.clone())) // Share DB pool across workers
            .app_data(job_service)
            .app_data(auth_keys.clone())
            .app_data(payload_config)
            .app_data(validation::json_config()) // Global validation config
            .configure(health_config)
            .configure(job_config)
            .configure(notification_config)
            .configure(transaction_config)
            .configure(user_config)
    });

    info!("Server starting on http://{}", cfg.bind_addr);

    let server = server.bind(cfg.bind_addr.as_str())?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let coordinator = ShutdownCoordinator::new(server_handle, server_task, pool);
    coordinator.wait_for_shutdown().await
}
