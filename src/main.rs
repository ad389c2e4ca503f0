use std::net::TcpListener;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use taskboard::auth::revocation;
use taskboard::configuration::get_configuration;
use taskboard::startup::run;
use taskboard::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Structured logging first, so config errors are captured too
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error"
            ));
        }
    };

    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error"
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    // Periodic registry cleanup: drop revocation entries for tokens that
    // have expired naturally, and reset watermarks older than the
    // refresh TTL. Stale entries are harmless, so failures only warn.
    let sweep_pool = pool.clone();
    let refresh_ttl = configuration.jwt.refresh_token_expiry;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(3600));
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now();

            match revocation::sweep_expired(&sweep_pool, now).await {
                Ok(removed) if removed > 0 => {
                    tracing::info!(removed = removed, "Swept expired revocation entries");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Revocation sweep failed: {}", e),
            }

            let stale_before = now - chrono::Duration::seconds(refresh_ttl);
            if let Err(e) = revocation::sweep_stale_resets(&sweep_pool, stale_before).await {
                tracing::warn!("Credential reset sweep failed: {}", e);
            }
        }
    });

    let address = format!("127.0.0.1:{}", configuration.application.port);
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let jwt_config = configuration.jwt.clone();

    let server = run(listener, pool, jwt_config)?;
    tracing::info!("Server started successfully");

    let _ = server.await;

    Ok(())
}
