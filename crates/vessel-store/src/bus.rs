//! Subscriber registry and fan-out.
//!
//! Two kinds of subscriber: any-change listeners, which hear every
//! notification, and path listeners, which hear a notification only when
//! the operation touched the container at their dotted path (`""` is the
//! root). Delivery is synchronous and in registration order.

use std::fmt;

use tracing::trace;

use vessel_types::{Patch, Path, Value};

use crate::event::{EventKind, Notification};

/// A subscriber callback.
pub type Listener = Box<dyn FnMut(&Notification<'_>) + Send>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

enum Scope {
    All,
    Path(String),
}

struct Subscriber {
    id: SubscriptionId,
    scope: Scope,
    listener: Listener,
}

/// Registry of listeners held by a store.
#[derive(Default)]
pub struct SubscriptionBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl SubscriptionBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every notification.
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.register(Scope::All, listener)
    }

    /// Register a listener for notifications touching the container at the
    /// dotted `path`.
    pub fn subscribe_path(&mut self, path: impl Into<String>, listener: Listener) -> SubscriptionId {
        self.register(Scope::Path(path.into()), listener)
    }

    fn register(&mut self, scope: Scope, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            scope,
            listener,
        });
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|sub| sub.id != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `notification` to every any-change listener.
    pub fn notify_all(&mut self, notification: &Notification<'_>) {
        for sub in &mut self.subscribers {
            if matches!(sub.scope, Scope::All) {
                (sub.listener)(notification);
            }
        }
    }

    /// Deliver `notification` to the path listeners of each touched path,
    /// path by path.
    pub fn notify_paths(&mut self, notification: &Notification<'_>, touched: &[Path]) {
        for path in touched {
            let dotted = path.to_dotted();
            let scoped = notification.at(&dotted);
            for sub in &mut self.subscribers {
                if matches!(&sub.scope, Scope::Path(p) if *p == dotted) {
                    (sub.listener)(&scoped);
                }
            }
        }
    }

    /// Notify any-change listeners, then path listeners.
    pub fn publish(&mut self, kind: EventKind, state: &Value, patches: &[Patch], touched: &[Path]) {
        let notification = Notification::new(kind, state, patches);
        trace!(%kind, listeners = self.subscribers.len(), touched = touched.len(), "publishing");
        self.notify_all(&notification);
        self.notify_paths(&notification, touched);
    }
}

impl fmt::Debug for SubscriptionBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
