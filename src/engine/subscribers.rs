//! Subscriber callback registries.
//!
//! Callbacks fire on the drain worker's task; a panicking callback is
//! isolated so it can never take the worker down with it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::RwLock;

use crate::crash::IsolationGuard;
use crate::observability::metrics;

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// A set of subscriber callbacks for one notification kind.
pub struct CallbackSet<T> {
    name: &'static str,
    callbacks: RwLock<Vec<Callback<T>>>,
}

impl<T> CallbackSet<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            callbacks: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) {
        let mut callbacks = self.callbacks.write().unwrap_or_else(|e| e.into_inner());
        callbacks.push(Box::new(callback));
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    /// Invoke every callback with `item`, isolating panics per callback.
    pub fn dispatch(&self, item: &T) {
        let callbacks = self.callbacks.read().unwrap_or_else(|e| e.into_inner());
        for callback in callbacks.iter() {
            let caught = catch_unwind(AssertUnwindSafe(|| {
                let _isolated = IsolationGuard::new();
                callback(item)
            }));
            if caught.is_err() {
                metrics::record_subscriber_panic(self.name);
                tracing::warn!(subscribers = self.name, "subscriber callback panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_dispatch_reaches_every_subscriber() {
        let set: CallbackSet<u32> = CallbackSet::new("test");
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            set.subscribe(move |v| {
                hits.fetch_add(*v as usize, Ordering::SeqCst);
            });
        }
        set.dispatch(&5);
        assert_eq!(hits.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn test_panicking_subscriber_does_not_stop_others() {
        let set: CallbackSet<u32> = CallbackSet::new("test");
        let hits = Arc::new(AtomicUsize::new(0));
        set.subscribe(|_| panic!("bad subscriber"));
        let h = hits.clone();
        set.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        set.dispatch(&1);
        set.dispatch(&1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_empty_set() {
        let set: CallbackSet<u32> = CallbackSet::new("test");
        assert!(set.is_empty());
        set.dispatch(&1);
    }
}
