use rdkafka::error::KafkaError;
use thiserror::Error;

use crate::store::StoreError;
use crate::types::RecordKind;

/// Errors that abort the processing of a single message. The consumer loop
/// logs them and moves on to the next delivery.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to decode {kind} message: {source}")]
    Decode {
        kind: RecordKind,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that prevent the service from starting to consume.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] envconfig::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to create kafka consumer: {0}")]
    Kafka(#[from] KafkaError),
}
