use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::order::DomainEvent;

/// One synchronous publish attempt per call. Implementations must not retry;
/// redelivery belongs to the broker.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<()>;
}

/// Serialize `event` as JSON and publish it under its own topic and key.
pub async fn publish_event<E>(publisher: &dyn EventPublisher, event: &E) -> Result<()>
where
    E: DomainEvent + Serialize + Sync,
{
    let payload = serde_json::to_string(event)
        .with_context(|| format!("failed to encode {} event", event.topic()))?;

    publisher.publish(event.topic(), &event.key(), &payload).await
}
