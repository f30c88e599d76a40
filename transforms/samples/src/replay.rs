//! Replays JSON-lines Kafka records through the configured transforms and
//! applies the results to a [`MemoryStore`].

use crate::apply::apply;
use crate::extract::build_message;
use crate::logging::LoggerConfig;
use crate::record::{KafkaMessage, KafkaRecord};
use aerospike_connect_inbound::config::{InboundConfig, TopicConfig};
use aerospike_connect_inbound::error::{ConfigError, RegistryError};
use aerospike_connect_inbound::reader::memory::MemoryStore;
use aerospike_connect_inbound::registry::{TransformHandle, TransformRegistry};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Settings file of the replay binary: the inbound topic settings plus a
/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ReplayConfig {
    #[serde(default)]
    pub logging: LoggerConfig,
    #[serde(flatten)]
    pub inbound: InboundConfig,
}

impl ReplayConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file(file_path: &str) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(file_path).map_err(|e| ConfigError::Read {
            file: file_path.to_string(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("transform task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub messages: usize,
    /// Lines that were not a valid record.
    pub malformed: usize,
    /// Records for a topic with no configuration.
    pub unrouted: usize,
    pub transform_errors: usize,
    pub skipped: usize,
    pub applied: usize,
    pub ignored: usize,
    pub failed: usize,
}

struct Route {
    topic: TopicConfig,
    handle: Arc<TransformHandle<KafkaMessage>>,
}

fn build_routes(
    config: &InboundConfig,
    registry: &TransformRegistry<KafkaMessage>,
    store: &Arc<MemoryStore>,
) -> Result<HashMap<String, Route>, RegistryError> {
    let mut routes = HashMap::new();
    for (name, topic) in &config.topics {
        let handle = registry.instantiate(name, topic.transform.clone(), store.clone())?;
        log::info!(
            "Topic [{topic}] uses transform [{class}]",
            topic = name,
            class = handle.class_name()
        );
        routes.insert(
            name.clone(),
            Route {
                topic: topic.clone(),
                handle: Arc::new(handle),
            },
        );
    }
    Ok(routes)
}

/// Runs every record in `input` through its topic's transform. Transform
/// failures and failed writes are counted, not fatal.
pub async fn replay<R>(
    config: &InboundConfig,
    registry: &TransformRegistry<KafkaMessage>,
    input: R,
    store: Arc<MemoryStore>,
) -> Result<ReplaySummary, ReplayError>
where
    R: AsyncBufRead + Unpin,
{
    let routes = build_routes(config, registry, &store)?;
    let mut summary = ReplaySummary::default();
    let mut lines = input.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let record: KafkaRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(err) => {
                log::warn!("Skipping line {line}: {err}", line = line_no, err = err);
                summary.malformed += 1;
                continue;
            }
        };
        summary.messages += 1;
        let Some(route) = routes.get(&record.topic) else {
            log::warn!("No transform configured for topic [{topic}]", topic = record.topic);
            summary.unrouted += 1;
            continue;
        };

        let message = build_message(record, &route.topic);
        let handle = route.handle.clone();
        let result = tokio::task::spawn_blocking(move || {
            let result = handle.transform(&message);
            (message, result)
        })
        .await?;
        let ops = match result {
            (_, Ok(ops)) => ops,
            (message, Err(err)) => {
                log::error!(
                    "Transform failed for [{topic}] at offset [{offset}]: {err}",
                    topic = message.message().topic,
                    offset = message.message().offset,
                    err = err
                );
                summary.transform_errors += 1;
                continue;
            }
        };

        for op in &ops {
            if op.is_skip() {
                summary.skipped += 1;
                continue;
            }
            for outcome in apply(&store, op) {
                if outcome.code.is_ok() {
                    summary.applied += 1;
                } else if outcome.ignored {
                    summary.ignored += 1;
                } else {
                    summary.failed += 1;
                }
            }
        }
    }

    log::info!(
        "Replayed {messages} messages: {applied} applied, {ignored} ignored, {failed} failed, {skipped} skipped",
        messages = summary.messages,
        applied = summary.applied,
        ignored = summary.ignored,
        failed = summary.failed,
        skipped = summary.skipped
    );
    Ok(summary)
}
