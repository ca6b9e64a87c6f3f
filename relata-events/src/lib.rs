//! Typed lifecycle notifications for aggregate persistence.
//!
//! The engine publishes an event before and after every save and delete.
//! Publishing is fire-and-forget by default: a failing subscriber is logged
//! and swallowed unless the template is configured with
//! [`EventFailurePolicy::Fatal`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use relata_core::SqlValue;

/// A persistence lifecycle notification.
///
/// `entity` is the aggregate root's logical name, `table` the physical
/// table the notification refers to. For whole-aggregate notifications
/// `table` is the root table; with [`DeleteEventMode::PerPath`] delete
/// notifications additionally fire once per path table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AggregateEvent {
    BeforeSave {
        entity: String,
        table: String,
        /// `None` when the save will insert a fresh aggregate and the id is
        /// not yet generated.
        id: Option<SqlValue>,
    },
    AfterSave {
        entity: String,
        table: String,
        id: SqlValue,
    },
    BeforeDelete {
        entity: String,
        table: String,
        id: SqlValue,
    },
    AfterDelete {
        entity: String,
        table: String,
        id: SqlValue,
    },
}

impl AggregateEvent {
    pub fn entity(&self) -> &str {
        match self {
            AggregateEvent::BeforeSave { entity, .. }
            | AggregateEvent::AfterSave { entity, .. }
            | AggregateEvent::BeforeDelete { entity, .. }
            | AggregateEvent::AfterDelete { entity, .. } => entity,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            AggregateEvent::BeforeSave { table, .. }
            | AggregateEvent::AfterSave { table, .. }
            | AggregateEvent::BeforeDelete { table, .. }
            | AggregateEvent::AfterDelete { table, .. } => table,
        }
    }
}

/// Error returned by a failing subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct EventError(String);

impl EventError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event handler failed: {}", self.0)
    }
}

impl std::error::Error for EventError {}

/// Whether a failing event subscriber aborts the surrounding operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EventFailurePolicy {
    /// Log the failure and carry on (the default).
    #[default]
    Ignore,
    /// Propagate the failure; the surrounding save/delete fails.
    Fatal,
}

/// How many delete notifications an aggregate delete produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeleteEventMode {
    /// One before/after pair for the whole aggregate (the default).
    #[default]
    PerAggregate,
    /// One before/after pair per path table, deepest first, plus the pair
    /// for the root table.
    PerPath,
}

/// Sink for lifecycle events.
pub trait EventPublisher: Send + Sync {
    fn publish(
        &self,
        event: AggregateEvent,
    ) -> impl Future<Output = Result<(), EventError>> + Send;
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(
        &self,
        _event: AggregateEvent,
    ) -> impl Future<Output = Result<(), EventError>> + Send {
        async { Ok(()) }
    }
}

type Handler = Arc<
    dyn Fn(Arc<AggregateEvent>) -> Pin<Box<dyn Future<Output = Result<(), EventError>> + Send>>
        + Send
        + Sync,
>;

/// In-process lifecycle bus.
///
/// Subscribers receive every published event, in subscription order, on the
/// publishing task. Dispatch is sequential rather than spawned: lifecycle
/// ordering (before-save strictly precedes the first write) is part of the
/// engine's contract. All subscribers run even when an earlier one fails;
/// the first failure is returned.
///
/// `LocalEventBus` is `Clone` and can be shared across threads.
#[derive(Clone, Default)]
pub struct LocalEventBus {
    handlers: Arc<RwLock<Vec<Handler>>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for every lifecycle event.
    pub async fn subscribe<F, Fut>(&self, handler: F)
    where
        F: Fn(Arc<AggregateEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), EventError>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |event| Box::pin(handler(event)));
        self.handlers.write().await.push(handler);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.handlers.read().await.len()
    }
}

impl EventPublisher for LocalEventBus {
    fn publish(
        &self,
        event: AggregateEvent,
    ) -> impl Future<Output = Result<(), EventError>> + Send {
        let handlers = self.handlers.clone();
        async move {
            let event = Arc::new(event);
            let handlers = handlers.read().await;
            let mut first_error = None;
            for handler in handlers.iter() {
                if let Err(err) = handler(event.clone()).await {
                    tracing::warn!(error = %err, "event subscriber failed");
                    first_error.get_or_insert(err);
                }
            }
            match first_error {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn before_save(entity: &str) -> AggregateEvent {
        AggregateEvent::BeforeSave {
            entity: entity.to_string(),
            table: entity.to_lowercase(),
            id: None,
        }
    }

    #[tokio::test]
    async fn test_publish_and_subscribe() {
        let bus = LocalEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        bus.subscribe(move |_: Arc<AggregateEvent>| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        bus.publish(before_save("ListParent")).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscribers_run_in_order() {
        let bus = LocalEventBus::new();
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            bus.subscribe(move |_| {
                let order = order.clone();
                async move {
                    order.lock().await.push(i);
                    Ok(())
                }
            })
            .await;
        }

        bus.publish(before_save("Chain4")).await.unwrap();
        assert_eq!(*order.lock().await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_subscribers() {
        let bus = LocalEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe(|_| async { Err(EventError::new("boom")) }).await;

        let c = counter.clone();
        bus.subscribe(move |_| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        let err = bus.publish(before_save("Chain4")).await.unwrap_err();
        assert_eq!(err.message(), "boom");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = LocalEventBus::new();
        bus.publish(before_save("Chain4")).await.unwrap();
    }

    #[tokio::test]
    async fn test_noop_publisher() {
        NoopPublisher.publish(before_save("Chain4")).await.unwrap();
    }

    #[tokio::test]
    async fn test_clone_shares_subscribers() {
        let bus = LocalEventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        bus.subscribe(move |_| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        let clone = bus.clone();
        clone.publish(before_save("Chain4")).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_accessors() {
        let event = AggregateEvent::AfterDelete {
            entity: "Chain4".to_string(),
            table: "chain4".to_string(),
            id: SqlValue::Int(7),
        };
        assert_eq!(event.entity(), "Chain4");
        assert_eq!(event.table(), "chain4");
    }

    #[test]
    fn test_events_serialize() {
        let event = AggregateEvent::BeforeSave {
            entity: "ListParent".to_string(),
            table: "list_parent".to_string(),
            id: Some(SqlValue::Int(1)),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: AggregateEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
