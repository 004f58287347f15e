use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{debug, info, warn};

use game_core::DailyQuota;
use game_persistence::connection::connect_and_migrate;
use game_persistence::repositories::{ReportRepository, UserRepository, WordRepository};
use game_server::{auth::AuthService, config::Config, create_routes, game_manager::GameManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting guessword server...");

    let config = Config::new()?;
    if config.uses_dev_secret() {
        warn!("JWT_SECRET is not set; using the development secret");
    }

    // Initialize database connection and run migrations
    let db = connect_and_migrate(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;

    let user_repository = Arc::new(UserRepository::new(db.clone()));
    let word_repository = Arc::new(WordRepository::new(db.clone()));
    let report_repository = Arc::new(ReportRepository::new(db.clone()));

    let word_count = word_repository.count().await?;
    if word_count == 0 {
        warn!("Word repository is empty; run `word-admin seed-words` before starting games");
    } else {
        info!(word_count, "Word repository ready");
    }

    let auth_service = Arc::new(AuthService::new(
        user_repository.clone(),
        &config.jwt_secret,
        chrono::Duration::minutes(config.token_ttl_minutes),
    ));
    let game_manager = Arc::new(GameManager::new(
        db,
        DailyQuota::new(config.max_games_per_day),
    ));

    let routes = create_routes(
        game_manager.clone(),
        auth_service,
        user_repository,
        word_repository,
        report_repository,
    );

    // Start maintenance task
    let maintenance_game_manager = game_manager.clone();
    let maintenance_interval = Duration::from_secs(config.maintenance_interval_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(maintenance_interval);
        loop {
            interval.tick().await;
            let pruned = maintenance_game_manager.prune_locks();
            if pruned > 0 {
                debug!(pruned, "Pruned idle game locks");
            }
        }
    });

    info!("Server starting on {}:{}", config.host, config.port);

    let ip: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST {}", config.host))?;

    let (addr, server) =
        warp::serve(routes).try_bind_with_graceful_shutdown((ip, config.port), shutdown_signal())?;

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    warn!("Failed to listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = terminate => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
