//! Push-channel subscriber management

use crate::traits::Broadcaster;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use types::BroadcastEvent;
use uuid::Uuid;

/// Unbounded per-subscriber channels; subscribers whose receiver is gone are dropped
/// on the next broadcast
#[derive(Default)]
pub struct SubscriberHub {
    subscribers: RwLock<HashMap<Uuid, mpsc::UnboundedSender<Value>>>,
}

impl SubscriberHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self) -> (Uuid, mpsc::UnboundedReceiver<Value>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        let mut subscribers = self.subscribers.write().await;
        subscribers.insert(id, tx);
        info!(subscriber = %id, total = subscribers.len(), "Subscriber added");
        (id, rx)
    }

    pub async fn unsubscribe(&self, id: Uuid) {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.remove(&id).is_some() {
            info!(subscriber = %id, total = subscribers.len(), "Subscriber removed");
        }
    }
}

#[async_trait]
impl Broadcaster for SubscriberHub {
    async fn broadcast(&self, event: &BroadcastEvent) {
        let message = event.to_json();
        let subscribers = self.subscribers.read().await;
        let dead: Vec<Uuid> = subscribers
            .iter()
            .filter(|(_, tx)| tx.send(message.clone()).is_err())
            .map(|(id, _)| *id)
            .collect();
        drop(subscribers);

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().await;
            for id in dead {
                subscribers.remove(&id);
                debug!(subscriber = %id, "Dropped disconnected subscriber");
            }
        }
    }

    async fn subscriber_count(&self) -> usize {
        self.subscribers.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::EventType;

    #[tokio::test]
    async fn test_subscribe_and_unsubscribe() {
        let hub = SubscriberHub::new();
        assert_eq!(hub.subscriber_count().await, 0);

        let (id, _rx) = hub.subscribe().await;
        assert_eq!(hub.subscriber_count().await, 1);

        hub.unsubscribe(id).await;
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers_and_drops_dead() {
        let hub = SubscriberHub::new();
        let (_, mut live) = hub.subscribe().await;
        let (_, dead) = hub.subscribe().await;
        drop(dead);

        hub.broadcast(&BroadcastEvent::test("hello")).await;

        let received = live.recv().await.unwrap();
        assert_eq!(received["type"], "test");
        assert_eq!(received["data"]["message"], "hello");
        assert_eq!(hub.subscriber_count().await, 1);

        let event: BroadcastEvent = serde_json::from_value(received).unwrap();
        assert_eq!(event.event_type, EventType::Test);
    }
}
