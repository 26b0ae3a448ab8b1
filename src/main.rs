//! Pushbench - Worker Entry Point

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use bollard::Docker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pushbench::{
    config::Config,
    consumer::TaskConsumer,
    db,
    processor::SubmissionProcessor,
    services::GitHubService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.worker.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting pushbench worker '{}'", config.worker.name);

    // Initialize database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database).await?;

    // Run database migrations
    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    // Initialize Redis connection
    tracing::info!("Connecting to Redis...");
    let redis_client = redis::Client::open(config.queue.redis_url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;

    // Initialize Docker client
    tracing::info!("Connecting to Docker...");
    let docker = Docker::connect_with_socket_defaults()?;

    // Verify Docker connection
    let docker_info = docker.version().await?;
    tracing::info!(
        "Connected to Docker version: {}",
        docker_info.version.unwrap_or_default()
    );

    // Hosting platform client
    let github = GitHubService::new(&config.github)?;

    // Create shutdown signal
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    // Setup signal handlers
    tokio::spawn(async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        tracing::info!("Shutdown signal received, finishing current task...");
        shutdown_clone.store(true, Ordering::SeqCst);
    });

    // Create and initialize the consumer
    let processor = SubmissionProcessor::new(config.clone(), db_pool, github, docker);
    let mut consumer = TaskConsumer::new(
        config.queue.clone(),
        config.worker.name.clone(),
        redis_conn,
        processor,
        shutdown,
    );
    consumer.initialize().await?;

    tracing::info!(stream = %config.queue.stream, "Worker ready, waiting for tasks");

    // Run the consume loop
    consumer.run().await?;

    tracing::info!("Worker shutdown complete");
    Ok(())
}
