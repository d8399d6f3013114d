use std::future::Future;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    Message,
};

use tokio::task::JoinHandle;

use crate::domain::order::OrderCreated;

/// Subscribes to `order.created` and logs every order it sees.
pub struct OrderEventsConsumer {
    consumer: StreamConsumer,
}

impl OrderEventsConsumer {
    pub fn new(brokers: &str, group_id: &str) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .create()
            .context("failed to create order events consumer")?;

        consumer
            .subscribe(&[OrderCreated::TOPIC])
            .context("failed to subscribe to order.created")?;

        tracing::info!(brokers = %brokers, group_id = %group_id, "Order events consumer subscribed");
        Ok(Self { consumer })
    }

    /// Consume until `shutdown` resolves.
    pub async fn run<S>(self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut messages = self.consumer.stream();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Order events consumer stopping");
                    break;
                }
                received = messages.next() => match received {
                    None => break,
                    Some(Ok(message)) => {
                        let Some(payload) = message.payload() else {
                            tracing::warn!(offset = message.offset(), "Skipping empty order event");
                            continue;
                        };

                        match decode_order_created(payload) {
                            Ok(event) => tracing::info!(
                                order_id = %event.id,
                                user_id = %event.user_id,
                                total = %event.total,
                                items = event.items.len(),
                                partition = message.partition(),
                                offset = message.offset(),
                                "Received order.created"
                            ),
                            Err(e) => tracing::error!(
                                error = %e,
                                offset = message.offset(),
                                "Skipping undecodable order event"
                            ),
                        }
                    }
                    Some(Err(e)) => tracing::error!(error = %e, "Order events consumer error"),
                },
            }
        }
    }
}

pub fn decode_order_created(payload: &[u8]) -> Result<OrderCreated> {
    serde_json::from_slice(payload).context("invalid order.created payload")
}

/// Resolves when `signal` does. A signal listener that fails to install is
/// logged and counts as a shutdown request.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal, stopping consumer");
    }
}

/// Wait for the consumer task; returns false if it panicked or was cancelled.
pub async fn join_consumer(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Order events consumer task failed");
            false
        }
    }
}
