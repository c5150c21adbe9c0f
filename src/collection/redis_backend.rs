//! Redis-backed template collection.
//!
//! Documents live in a single hash: each field is a template id and each value
//! is the JSON document (`{"subject": ..., "html": ..., "text": ..., "amp": ...}`).
//! Writers announce changes by publishing any message on the configured
//! channel; the whole hash is then re-read and delivered as a new snapshot.

use std::collections::HashMap;

use futures::StreamExt;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::{Snapshot, SnapshotStream, TemplateCollection, TemplateDocument};
use crate::config::RedisConfig;

/// Template collection stored in a Redis hash
pub struct RedisCollection {
    config: RedisConfig,
}

impl RedisCollection {
    pub fn new(config: RedisConfig) -> Self {
        Self { config }
    }
}

impl TemplateCollection for RedisCollection {
    fn subscribe(&self) -> SnapshotStream {
        let config = self.config.clone();
        let delay = config.reconnect_delay();

        let snapshots = async_stream::stream! {
            let client = match redis::Client::open(config.url.as_str()) {
                Ok(client) => client,
                Err(e) => {
                    tracing::error!(error = %e, "Invalid Redis URL, template collection unavailable");
                    return;
                }
            };

            loop {
                // Subscribe before the initial load so no change is missed in between
                let mut pubsub = match client.get_async_pubsub().await {
                    Ok(pubsub) => pubsub,
                    Err(e) => {
                        tracing::error!(error = %e, "Redis pub/sub connection failed, reconnecting in {}s", delay.as_secs());
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                };
                if let Err(e) = pubsub.subscribe(&config.channel).await {
                    tracing::error!(error = %e, channel = %config.channel, "Failed to subscribe to template changes");
                    tokio::time::sleep(delay).await;
                    continue;
                }

                let mut conn = match client.get_multiplexed_async_connection().await {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::error!(error = %e, "Redis connection failed, reconnecting in {}s", delay.as_secs());
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                };

                match load_snapshot(&mut conn, &config.templates_key).await {
                    Ok(snapshot) => {
                        tracing::info!(
                            key = %config.templates_key,
                            channel = %config.channel,
                            documents = snapshot.len(),
                            "Template collection subscription established"
                        );
                        yield snapshot;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, key = %config.templates_key, "Failed to load templates");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                }

                let mut changes = Box::pin(pubsub.into_on_message());
                while changes.next().await.is_some() {
                    match load_snapshot(&mut conn, &config.templates_key).await {
                        Ok(snapshot) => {
                            yield snapshot;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to reload templates after change");
                            break;
                        }
                    }
                }

                tracing::warn!("Template change stream ended, reconnecting in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        };

        snapshots.boxed()
    }
}

async fn load_snapshot(
    conn: &mut MultiplexedConnection,
    key: &str,
) -> redis::RedisResult<Snapshot> {
    let entries: HashMap<String, String> = conn.hgetall(key).await?;
    Ok(snapshot_from_hash(entries))
}

/// Decode hash entries into a snapshot, skipping values that are not valid documents
pub fn snapshot_from_hash<I>(entries: I) -> Snapshot
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut docs: Vec<TemplateDocument> = entries
        .into_iter()
        .filter_map(|(id, raw)| match serde_json::from_str::<TemplateDocument>(&raw) {
            Ok(mut doc) => {
                doc.id = id;
                Some(doc)
            }
            Err(e) => {
                tracing::warn!(template = %id, error = %e, "Skipping malformed template document");
                None
            }
        })
        .collect();

    docs.sort_by(|a, b| a.id.cmp(&b.id));
    Snapshot::new(docs)
}
