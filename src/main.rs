//! FarmPower service-booking server.
//!
//! Reads configuration, picks the `PostgreSQL` or in-memory repository, starts
//! the notification worker, and serves the HTTP API until Ctrl-C.

use anyhow::Context;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use farmpower_bookings::{
    booking::{
        adapters::{
            memory::{InMemoryBookingRepository, InMemoryDirectory},
            outbox::{ChannelOutbox, LoggingDispatcher, OutboxWorker},
            postgres::{PostgresBookingRepository, apply_migrations, mirror_tractors},
        },
        domain::Tractor,
        ports::BookingRepository,
        services::{BookingOperations, BookingService, BookingServiceConfig},
    },
    config::{AppConfig, DatabaseConfig},
    http, telemetry,
};
use mockable::DefaultClock;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("loading configuration")?;
    telemetry::init(config.log.json);

    let directory = Arc::new(InMemoryDirectory::new());
    for user in &config.directory.users {
        directory.insert_user((*user).into());
    }
    let tractors: Vec<Tractor> = config
        .directory
        .tractors
        .iter()
        .map(|seed| (*seed).into())
        .collect();
    for tractor in &tractors {
        directory.insert_tractor(*tractor);
    }
    info!(
        users = config.directory.users.len(),
        tractors = tractors.len(),
        "directory seeded"
    );

    let (outbox, queue) = ChannelOutbox::bounded(config.bookings.notification_queue_capacity);
    let worker = tokio::spawn(OutboxWorker::new(queue, Arc::new(LoggingDispatcher)).run());

    let service_config = config.bookings.service_config();
    let service = match &config.database.url {
        Some(url) => {
            let repository = connect_postgres(url, &config.database, tractors).await?;
            info!("using PostgreSQL booking repository");
            build_service(repository, directory, outbox, service_config)
        }
        None => {
            warn!("no database configured; bookings are kept in memory");
            build_service(
                InMemoryBookingRepository::new(),
                directory,
                outbox,
                service_config,
            )
        }
    };

    let address = config.server.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "service booking API listening");

    axum::serve(listener, http::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(delivered)) => info!(delivered, "notification worker drained"),
        Ok(Err(err)) => warn!(error = %err, "notification worker failed"),
        Err(_) => warn!("notification worker did not drain in time"),
    }
    Ok(())
}

fn build_service<R>(
    repository: R,
    directory: Arc<InMemoryDirectory>,
    outbox: ChannelOutbox,
    config: BookingServiceConfig,
) -> Arc<dyn BookingOperations>
where
    R: BookingRepository + 'static,
{
    Arc::new(
        BookingService::new(
            Arc::new(repository),
            directory,
            Arc::new(outbox),
            Arc::new(DefaultClock),
        )
        .with_config(config),
    )
}

async fn connect_postgres(
    url: &str,
    settings: &DatabaseConfig,
    tractors: Vec<Tractor>,
) -> anyhow::Result<PostgresBookingRepository> {
    let manager = ConnectionManager::<PgConnection>::new(url);
    let max_connections = settings.max_connections;
    let run_migrations = settings.run_migrations;

    let pool = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let pool = Pool::builder()
            .max_size(max_connections)
            .build(manager)
            .context("building PostgreSQL pool")?;
        let mut connection = pool.get().context("acquiring PostgreSQL connection")?;
        if run_migrations {
            apply_migrations(&mut connection).context("applying migrations")?;
        }
        mirror_tractors(&mut connection, &tractors).context("mirroring tractors")?;
        drop(connection);
        Ok(pool)
    })
    .await
    .context("joining PostgreSQL setup")??;

    Ok(PostgresBookingRepository::new(pool))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
