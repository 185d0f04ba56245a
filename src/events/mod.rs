//! Live event fan-out.
//!
//! Services publish [`StoreEvent`]s on an [`EventBus`]; every open SSE
//! connection receives one JSON frame per event. The in-process bus keeps a
//! bounded channel per connection: a slow client loses events instead of
//! stalling publishers, and a disconnected client is dropped from the list as
//! soon as its stream is dropped.

pub mod sse;

use futures::Stream;
use metrics::{counter, gauge};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::pin::Pin;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub use sse::event_stream_response;

/// Logical channel an event belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Order,
    Product,
    Contact,
    Page,
    Assistant,
}

/// Envelope sent to clients: `{ channel, type, ...payload }`
#[derive(Clone, Debug, Serialize)]
pub struct StoreEvent {
    pub channel: Channel,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl StoreEvent {
    pub fn new(channel: Channel, kind: impl Into<String>, payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        Self {
            channel,
            kind: kind.into(),
            payload,
        }
    }

    pub fn order_created(order: &impl Serialize) -> Self {
        Self::new(Channel::Order, "order_created", json!({ "order": order }))
    }

    pub fn order_updated(order: &impl Serialize) -> Self {
        Self::new(Channel::Order, "order_updated", json!({ "order": order }))
    }

    pub fn payment_failed(order_id: uuid::Uuid, reason: &str) -> Self {
        Self::new(
            Channel::Order,
            "payment_failed",
            json!({ "orderId": order_id, "reason": reason }),
        )
    }

    pub fn product_updated(product: &impl Serialize) -> Self {
        Self::new(Channel::Product, "product_updated", json!({ "product": product }))
    }

    pub fn review_created(review: &impl Serialize, product_id: uuid::Uuid, product_name: &str) -> Self {
        Self::new(
            Channel::Product,
            "review_created",
            json!({ "review": review, "productId": product_id, "productName": product_name }),
        )
    }

    pub fn new_message(message: &impl Serialize) -> Self {
        Self::new(Channel::Contact, "new_message", json!({ "message": message }))
    }

    pub fn message_replied(message: &impl Serialize) -> Self {
        Self::new(Channel::Contact, "message_replied", json!({ "message": message }))
    }

    pub fn page_content_updated(page: &str, content: &impl Serialize) -> Self {
        Self::new(
            Channel::Page,
            "page_content_updated",
            json!({ "page": page, "content": content }),
        )
    }

    /// Push notification for the chat widget
    pub fn assistant(kind: &str, message: &str) -> Self {
        Self::new(
            Channel::Assistant,
            kind,
            json!({ "message": message, "timestamp": chrono::Utc::now().to_rfc3339() }),
        )
    }

    /// Adds one top-level field to the envelope
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }
}

/// Stream of serialized events for one subscriber
pub type EventStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Publish/subscribe seam. The in-process bus serves single-instance
/// deployments; a broker-backed implementation can replace it without
/// touching publishers.
pub trait EventBus: Send + Sync {
    /// Deliver `event` to every current subscriber.
    fn publish(&self, event: &StoreEvent);

    /// Register a subscriber. Dropping the stream unsubscribes.
    fn subscribe(&self) -> EventStream;

    fn connection_count(&self) -> usize;
}

struct Client {
    id: u64,
    tx: mpsc::Sender<String>,
}

#[derive(Default)]
struct Registry {
    clients: Mutex<Vec<Client>>,
}

impl Registry {
    fn remove(&self, id: u64) {
        let remaining = {
            let mut clients = self
                .clients
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            clients.retain(|c| c.id != id);
            clients.len()
        };
        gauge!("saria_sse.connections", remaining as f64);
        debug!(client_id = id, remaining, "sse client disconnected");
    }
}

/// Connection list held in process memory
pub struct InProcessEventBus {
    registry: Arc<Registry>,
    next_id: AtomicU64,
    buffer: usize,
}

impl InProcessEventBus {
    pub fn new(buffer: usize) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    fn clients(&self) -> std::sync::MutexGuard<'_, Vec<Client>> {
        self.registry
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventBus for InProcessEventBus {
    fn publish(&self, event: &StoreEvent) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, kind = %event.kind, "failed to serialize event");
                return;
            }
        };

        let mut clients = self.clients();
        clients.retain(|client| match client.tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                counter!("saria_sse.dropped_events", 1);
                debug!(client_id = client.id, kind = %event.kind, "sse client lagging, event dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        debug!(kind = %event.kind, receivers = clients.len(), "event published");
    }

    fn subscribe(&self) -> EventStream {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.buffer);

        let count = {
            let mut clients = self.clients();
            clients.push(Client { id, tx });
            clients.len()
        };
        gauge!("saria_sse.connections", count as f64);
        debug!(client_id = id, connections = count, "sse client connected");

        Box::pin(Subscription {
            id,
            rx,
            registry: Arc::clone(&self.registry),
        })
    }

    fn connection_count(&self) -> usize {
        self.clients().len()
    }
}

/// Receiving half of a connection; unregisters itself on drop.
struct Subscription {
    id: u64,
    rx: mpsc::Receiver<String>,
    registry: Arc<Registry>,
}

impl Stream for Subscription {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
