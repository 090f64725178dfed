use std::time::Duration;

use futures::Stream;
use rdkafka::{
    consumer::{CommitMode, Consumer, StreamConsumer},
    error::KafkaError,
    Message,
};
use tracing::{debug, error, info};

use crate::config::{consumer_client_config, ConsumerConfig, KafkaConfig};

/// A consumer subscribed to exactly one topic, handing out raw payloads.
pub struct SingleTopicConsumer {
    consumer: StreamConsumer,
    topic: String,
}

/// One message received from the subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
    pub payload: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum RecvErr {
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),
    #[error("Received empty payload at partition {partition} offset {offset}")]
    Empty { partition: i32, offset: i64 },
}

impl SingleTopicConsumer {
    pub fn new(
        common_config: &KafkaConfig,
        consumer_config: &ConsumerConfig,
        topic: &str,
    ) -> Result<Self, KafkaError> {
        let client_config = consumer_client_config(common_config, consumer_config);
        debug!("rdkafka configuration: {:?}", client_config);

        let consumer: StreamConsumer = client_config.create()?;

        // Neither create nor subscribe talk to the brokers, so "ping" them by
        // requesting the topic metadata
        let timeout = Duration::from_millis(common_config.kafka_metadata_timeout_ms);
        match consumer.fetch_metadata(Some(topic), timeout) {
            Ok(metadata) => {
                info!(
                    "Successfully connected to Kafka brokers. Found {} brokers.",
                    metadata.brokers().len()
                );
            }
            Err(error) => {
                error!("Failed to fetch metadata from Kafka brokers: {:?}", error);
                return Err(error);
            }
        }

        consumer.subscribe(&[topic])?;

        Ok(Self {
            consumer,
            topic: topic.to_owned(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next message. Its offset is stored as soon as it arrives,
    /// so the delivery is acknowledged whatever happens to it afterwards.
    pub async fn recv(&self) -> Result<Delivery, RecvErr> {
        let message = self.consumer.recv().await?;
        let partition = message.partition();
        let offset = message.offset();

        self.consumer.store_offset_from_message(&message)?;

        let Some(payload) = message.payload() else {
            return Err(RecvErr::Empty { partition, offset });
        };

        Ok(Delivery {
            partition,
            offset,
            payload: payload.to_vec(),
        })
    }

    /// Synchronously commit every stored offset, e.g. before shutting down.
    pub fn commit(&self) -> Result<(), KafkaError> {
        self.consumer.commit_consumer_state(CommitMode::Sync)
    }

    /// The subscription as an endless stream of deliveries.
    pub fn stream(&self) -> impl Stream<Item = Result<Delivery, RecvErr>> + '_ {
        futures::stream::unfold(self, |consumer| async move {
            Some((consumer.recv().await, consumer))
        })
    }
}
