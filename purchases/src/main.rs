//! Consume purchase and donation events from Kafka and store them in Postgres.
use common_kafka::kafka_consumer::SingleTopicConsumer;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use purchases::config::Config;
use purchases::consumer::ConsumerLoop;
use purchases::error::StartupError;
use purchases::store::PgStore;

fn setup_tracing(local: bool) {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    if let Ok(directive) = "rdkafka=warn".parse() {
        filter = filter.add_directive(directive);
    }

    let log_layer = if local {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_filter(filter)
            .boxed()
    };
    tracing_subscriber::registry().with(log_layer).init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler we simply run until the process is killed
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    let store = PgStore::connect(&config.postgres_address, config.max_pg_connections).await?;
    info!("Postgres connected");

    store.init_schema().await?;

    let consumer = SingleTopicConsumer::new(&config.kafka, &config.consumer, &config.queue_name)?;
    info!(
        topic = consumer.topic(),
        group_id = config.consumer.kafka_consumer_group,
        "Kafka connected and consuming messages"
    );

    ConsumerLoop::new(store)
        .run(consumer.stream(), shutdown_signal())
        .await;

    if let Err(e) = consumer.commit() {
        warn!(error = %e, "Failed to commit stored offsets on shutdown");
    }

    Ok(())
}

// Startup failures are logged and the process still exits cleanly.
#[tokio::main]
async fn main() {
    let config = match Config::init_with_defaults() {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(true);
            error!(error = %StartupError::from(e), "Failed to load configuration");
            return;
        }
    };

    setup_tracing(config.is_local());
    info!("Configuration loaded");

    match run(config).await {
        Ok(()) => info!("Purchases consumer shut down"),
        Err(e) => error!(error = %e, "Purchases consumer failed to start"),
    }
}
