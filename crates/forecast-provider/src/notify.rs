//! Change notification.
//!
//! The provider publishes to a [`ChangeNotifier`] after each successful
//! mutation. [`ChangeBus`] is the in-process implementation: observers
//! register on a URI and are called synchronously on the publishing thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::uri::ResourceUri;

/// Receives "state under this URI changed" signals.
pub trait ChangeNotifier: Send + Sync {
    fn notify_change(&self, uri: &ResourceUri);
}

/// Callback invoked with the URI that changed.
pub type ObserverFn = Arc<dyn Fn(&ResourceUri) + Send + Sync>;

/// Handle returned by [`ChangeBus::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Observer {
    id: ObserverId,
    uri: ResourceUri,
    notify_for_descendants: bool,
    callback: ObserverFn,
}

impl Observer {
    /// A change reaches observers on the changed URI, on anything beneath it,
    /// and on its ancestors that asked for descendant changes.
    fn wants(&self, changed: &ResourceUri) -> bool {
        changed.contains(&self.uri) || (self.notify_for_descendants && self.uri.contains(changed))
    }
}

/// In-process observer registry.
#[derive(Default)]
pub struct ChangeBus {
    observers: RwLock<Vec<Observer>>,
    next_id: AtomicU64,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for changes affecting `uri`.
    pub fn register<F>(&self, uri: ResourceUri, notify_for_descendants: bool, callback: F) -> ObserverId
    where
        F: Fn(&ResourceUri) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!("Registering observer {:?} on {}", id, uri);
        self.observers.write().push(Observer {
            id,
            uri,
            notify_for_descendants,
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|o| o.id != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}

impl ChangeNotifier for ChangeBus {
    fn notify_change(&self, uri: &ResourceUri) {
        // Collect first so callbacks may register or unregister.
        let targets: Vec<ObserverFn> = self
            .observers
            .read()
            .iter()
            .filter(|o| o.wants(uri))
            .map(|o| o.callback.clone())
            .collect();

        tracing::debug!("Change on {} reaches {} observers", uri, targets.len());
        for callback in targets {
            callback(uri);
        }
    }
}

/// Notifier that drops every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn notify_change(&self, _uri: &ResourceUri) {}
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn uri(raw: &str) -> ResourceUri {
        ResourceUri::parse(raw).unwrap()
    }

    fn counter(bus: &ChangeBus, on: &str, descendants: bool) -> (ObserverId, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let id = bus.register(uri(on), descendants, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (id, hits)
    }

    #[test]
    fn test_exact_match() {
        let bus = ChangeBus::new();
        let (_, hits) = counter(&bus, "content://a/weather", false);
        bus.notify_change(&uri("content://a/weather"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collection_change_reaches_item_observer() {
        let bus = ChangeBus::new();
        let (_, hits) = counter(&bus, "content://a/weather/id/4", false);
        bus.notify_change(&uri("content://a/weather"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_item_change_needs_descendants_flag() {
        let bus = ChangeBus::new();
        let (_, narrow) = counter(&bus, "content://a/weather", false);
        let (_, wide) = counter(&bus, "content://a/weather", true);
        bus.notify_change(&uri("content://a/weather/id/4"));
        assert_eq!(narrow.load(Ordering::SeqCst), 0);
        assert_eq!(wide.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unrelated_uri_is_ignored() {
        let bus = ChangeBus::new();
        let (_, hits) = counter(&bus, "content://a/weather/oslo", true);
        bus.notify_change(&uri("content://a/weather/bergen/1"));
        bus.notify_change(&uri("content://b/weather"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unregister() {
        let bus = ChangeBus::new();
        let (id, hits) = counter(&bus, "content://a/weather", false);
        assert!(bus.unregister(id));
        assert!(!bus.unregister(id));
        assert_eq!(bus.observer_count(), 0);
        bus.notify_change(&uri("content://a/weather"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
