//! Registry of service-call-routed observers.
//!
//! Handlers are stored under monotonically increasing [`HandlerId`]s and are
//! notified in ascending id order. Subscription changes and notification share
//! a single lock, so they never interleave.
//!
//! # Examples
//!
//! ```
//! use context_settings::{HandlerRegistry, ServiceCallRoutedEvent};
//!
//! let registry = HandlerRegistry::new();
//! let id = registry.subscribe(|event| println!("routed {}", event));
//! assert!(id.is_valid());
//!
//! registry.raise(&ServiceCallRoutedEvent::new(1, "GET", "/profile"));
//! registry.remove_handler(id);
//! assert!(registry.is_empty());
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, trace};

use crate::ServiceCallRoutedEvent;

/// Type alias for a service-call-routed observer.
///
/// Handlers are invoked while the registry lock is held. A handler must NOT
/// add, remove or raise on the same registry, as this will deadlock.
pub type RoutedHandler = dyn Fn(&ServiceCallRoutedEvent) + Send + Sync + 'static;

/// Token identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(i64);

impl HandlerId {
    /// Returned when a subscription request is rejected.
    pub const INVALID: HandlerId = HandlerId(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<HandlerId> for i64 {
    fn from(id: HandlerId) -> Self {
        id.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct HandlerTable {
    next_id: i64,
    handlers: BTreeMap<i64, Arc<RoutedHandler>>,
}

/// Thread-safe map from [`HandlerId`] to observer.
#[derive(Default)]
pub struct HandlerRegistry {
    table: Mutex<HandlerTable>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock poisoning is recovered: the table is only mutated by insert/remove,
    /// which leave it consistent even if a panic unwinds through the guard.
    fn lock(&self) -> MutexGuard<'_, HandlerTable> {
        self.table.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Register a handler.
    ///
    /// Returns [`HandlerId::INVALID`] and stores nothing when `handler` is `None`.
    /// Otherwise the handler is stored under the next id; ids are never reused.
    pub fn add_handler(&self, handler: Option<Arc<RoutedHandler>>) -> HandlerId {
        let mut table = self.lock();

        let Some(handler) = handler else {
            debug!("rejected empty service call routed handler");
            return HandlerId::INVALID;
        };

        let id = table.next_id;
        table.next_id += 1;
        table.handlers.insert(id, handler);

        trace!(handler_id = id, "added service call routed handler");
        HandlerId(id)
    }

    /// Register a closure. Shorthand for `add_handler(Some(Arc::new(handler)))`.
    pub fn subscribe(
        &self,
        handler: impl Fn(&ServiceCallRoutedEvent) + Send + Sync + 'static,
    ) -> HandlerId {
        self.add_handler(Some(Arc::new(handler)))
    }

    /// Remove a handler. Unknown or already removed ids are ignored.
    pub fn remove_handler(&self, id: HandlerId) {
        let removed = self.lock().handlers.remove(&id.0).is_some();
        trace!(
            handler_id = id.0,
            removed,
            "removed service call routed handler"
        );
    }

    /// Invoke every handler, in ascending id order, with `event`.
    ///
    /// A panicking handler is logged and skipped; the remaining handlers still run
    /// and the panic does not reach the caller.
    pub fn raise(&self, event: &ServiceCallRoutedEvent) {
        let table = self.lock();

        for (&id, handler) in table.handlers.iter() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler(event))) {
                error!(
                    handler_id = id,
                    call_id = event.call_id,
                    "raise_service_call_routed_event failed: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.lock().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.lock();
        f.debug_struct("HandlerRegistry")
            .field("next_id", &table.next_id)
            .field("handlers", &table.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
