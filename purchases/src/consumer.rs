use std::future::Future;

use common_kafka::kafka_consumer::{Delivery, RecvErr};
use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use crate::classify::{Payload, Record};
use crate::error::ProcessError;
use crate::store::RecordSink;
use crate::types::RecordKind;

/// What happened to a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Saved(RecordKind),
    Invalid(RecordKind),
    Unknown,
    Malformed,
}

/// Drives every delivery through classify, decode, validate and persist,
/// one message at a time.
pub struct ConsumerLoop<S> {
    sink: S,
}

impl<S: RecordSink> ConsumerLoop<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume until the subscription ends or `shutdown` resolves. Failures are
    /// logged per message and never stop the loop.
    pub async fn run<D, F>(&self, deliveries: D, shutdown: F)
    where
        D: Stream<Item = Result<Delivery, RecvErr>>,
        F: Future<Output = ()>,
    {
        tokio::pin!(deliveries);
        tokio::pin!(shutdown);

        info!("Starting consumer loop");

        loop {
            let next = tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping consumer loop");
                    break;
                }
                next = deliveries.next() => next,
            };

            let Some(delivery) = next else {
                info!("Subscription closed, stopping consumer loop");
                break;
            };

            match delivery {
                Ok(delivery) => {
                    if let Err(e) = self.process_message(&delivery.payload).await {
                        error!(
                            partition = delivery.partition,
                            offset = delivery.offset,
                            error = %e,
                            "Message processing error"
                        );
                    }
                }
                Err(RecvErr::Empty { partition, offset }) => {
                    warn!(partition, offset, "Received empty message");
                }
                Err(RecvErr::Kafka(e)) => {
                    error!(error = %e, "Failed to receive message");
                }
            }
        }
    }

    pub async fn process_message(&self, body: &[u8]) -> Result<Outcome, ProcessError> {
        let payload = match Payload::parse(body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    error = %e,
                    body = %String::from_utf8_lossy(body),
                    "Received malformed message"
                );
                return Ok(Outcome::Malformed);
            }
        };

        let Some(kind) = payload.classify() else {
            warn!(
                body = %String::from_utf8_lossy(body),
                "Received message with unknown type"
            );
            return Ok(Outcome::Unknown);
        };

        let record = payload
            .decode(kind)
            .map_err(|source| ProcessError::Decode { kind, source })?;

        if !record.is_valid() {
            warn!(
                kind = %kind,
                invalid_fields = ?record.invalid_fields(),
                record = ?record,
                "Received invalid message"
            );
            return Ok(Outcome::Invalid(kind));
        }

        match &record {
            Record::Purchase(purchase) => {
                self.sink.insert_purchase(purchase).await?;
                info!(purchase_message = ?purchase, "Saved ticket purchase");
            }
            Record::Donation(donation) => {
                self.sink.insert_donation(donation).await?;
                info!(donation_message = ?donation, "Saved donation");
            }
        }

        Ok(Outcome::Saved(kind))
    }
}
