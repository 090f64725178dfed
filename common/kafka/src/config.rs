use envconfig::Envconfig;
use rdkafka::ClientConfig;

#[derive(Envconfig, Clone)]
pub struct KafkaConfig {
    #[envconfig(default = "localhost:9092")]
    pub kafka_hosts: String,

    #[envconfig(default = "false")]
    pub kafka_tls: bool,

    #[envconfig(default = "false")]
    pub verify_ssl_certificate: bool,

    // How long startup waits for the brokers to answer a metadata request
    #[envconfig(default = "15000")]
    pub kafka_metadata_timeout_ms: u64,
}

#[derive(Envconfig, Clone)]
pub struct ConsumerConfig {
    pub kafka_consumer_group: String,

    // We default to "earliest" for this, but if you're bringing up a new service, you probably want "latest"
    #[envconfig(default = "earliest")]
    pub kafka_consumer_offset_reset: String, // earliest, latest

    #[envconfig(default = "5000")]
    pub kafka_consumer_auto_commit_interval_ms: i32,
}

impl ConsumerConfig {
    /// Because the consumer config is so application specific, we
    /// can't set good defaults in the derive macro, so we expose a way
    /// for users to set them here before init'ing their main config struct
    pub fn set_defaults(consumer_group: &str) {
        if std::env::var("KAFKA_CONSUMER_GROUP").is_err() {
            std::env::set_var("KAFKA_CONSUMER_GROUP", consumer_group);
        };
    }
}

/// Build the librdkafka client configuration for a consumer. Automatic offset
/// storing is disabled, the consumer stores each offset on receipt, and stored
/// offsets are always committed in the background.
pub fn consumer_client_config(common: &KafkaConfig, consumer: &ConsumerConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", &common.kafka_hosts)
        .set("statistics.interval.ms", "10000")
        .set("group.id", &consumer.kafka_consumer_group)
        .set("auto.offset.reset", &consumer.kafka_consumer_offset_reset)
        .set("enable.auto.offset.store", "false")
        .set("enable.auto.commit", "true")
        .set(
            "auto.commit.interval.ms",
            consumer.kafka_consumer_auto_commit_interval_ms.to_string(),
        );

    if common.kafka_tls {
        client_config.set("security.protocol", "ssl").set(
            "enable.ssl.certificate.verification",
            common.verify_ssl_certificate.to_string(),
        );
    };

    client_config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consumer_config() -> ConsumerConfig {
        ConsumerConfig {
            kafka_consumer_group: "purchases".to_string(),
            kafka_consumer_offset_reset: "earliest".to_string(),
            kafka_consumer_auto_commit_interval_ms: 1000,
        }
    }

    #[test]
    fn test_consumer_client_config() {
        let common = KafkaConfig {
            kafka_hosts: "kafka:9092".to_string(),
            kafka_tls: false,
            verify_ssl_certificate: false,
            kafka_metadata_timeout_ms: 1000,
        };

        let config = consumer_client_config(&common, &consumer_config());

        assert_eq!(config.get("bootstrap.servers"), Some("kafka:9092"));
        assert_eq!(config.get("group.id"), Some("purchases"));
        assert_eq!(config.get("auto.offset.reset"), Some("earliest"));
        assert_eq!(config.get("enable.auto.offset.store"), Some("false"));
        assert_eq!(config.get("enable.auto.commit"), Some("true"));
        assert_eq!(config.get("auto.commit.interval.ms"), Some("1000"));
        assert_eq!(config.get("security.protocol"), None);
    }

    #[test]
    fn test_consumer_client_config_tls() {
        let common = KafkaConfig {
            kafka_hosts: "kafka:9093".to_string(),
            kafka_tls: true,
            verify_ssl_certificate: true,
            kafka_metadata_timeout_ms: 1000,
        };

        let config = consumer_client_config(&common, &consumer_config());

        assert_eq!(config.get("security.protocol"), Some("ssl"));
        assert_eq!(
            config.get("enable.ssl.certificate.verification"),
            Some("true")
        );
    }
}
