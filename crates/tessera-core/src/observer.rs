//! Push-based change notification.
//!
//! The compute facade stays synchronous: after a mutating operation
//! completes it builds a [`ChangeEvent`] and hands it to every registered
//! [`ChangeObserver`] in subscription order. Debouncing, coalescing or
//! re-dispatching to another thread is the observer's business.

use indexmap::IndexMap;

use crate::id::{ObserverId, Offset};

/// A mutation that has just completed against an arena-backed context.
#[derive(Clone, Debug, PartialEq)]
pub enum ChangeEvent {
    /// A block was carved out of the arena.
    Allocated {
        /// Start of the new block.
        offset: Offset,
        /// Size of the block in bytes (word-aligned).
        size_bytes: usize,
    },
    /// A block was returned to the free list.
    Released {
        /// Start of the released block.
        offset: Offset,
    },
    /// Caller data was written into a block.
    Written {
        /// Start of the written region.
        offset: Offset,
        /// Number of `f64` elements written.
        len: usize,
    },
    /// A kernel ran to completion.
    Computed {
        /// ABI name of the kernel (e.g. `"vec_dot"`).
        kernel: &'static str,
        /// Region the kernel wrote, if any. Pure reductions write nothing.
        output: Option<Offset>,
    },
    /// The backing buffer was reallocated to a larger capacity.
    Grown {
        /// Arena generation after the growth.
        generation: u64,
        /// New capacity in bytes.
        capacity: usize,
    },
    /// All allocations were discarded.
    Reset,
}

/// Receives [`ChangeEvent`]s from a context.
///
/// Observers run on the thread that performed the mutation, before the
/// mutating call returns. They must not block.
pub trait ChangeObserver: Send {
    /// Called once per completed mutation.
    fn on_change(&mut self, event: &ChangeEvent);
}

impl<F> ChangeObserver for F
where
    F: FnMut(&ChangeEvent) + Send,
{
    fn on_change(&mut self, event: &ChangeEvent) {
        self(event)
    }
}

/// Ordered collection of subscribed observers.
#[derive(Default)]
pub struct ObserverSet {
    next_id: u64,
    observers: IndexMap<ObserverId, Box<dyn ChangeObserver>>,
}

impl ObserverSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Returns the id needed to unsubscribe it.
    pub fn subscribe(&mut self, observer: Box<dyn ChangeObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.insert(id, observer);
        id
    }

    /// Remove an observer. Returns `false` if the id was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        // shift_remove keeps the remaining observers in subscription order.
        self.observers.shift_remove(&id).is_some()
    }

    /// Deliver `event` to every observer in subscription order.
    pub fn notify(&mut self, event: &ChangeEvent) {
        for observer in self.observers.values_mut() {
            observer.on_change(event);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<ChangeEvent>>>, Box<dyn ChangeObserver>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let observer: Box<dyn ChangeObserver> =
            Box::new(move |e: &ChangeEvent| sink.lock().unwrap().push(e.clone()));
        (log, observer)
    }

    #[test]
    fn notify_reaches_all_observers() {
        let mut set = ObserverSet::new();
        let (a, obs_a) = recorder();
        let (b, obs_b) = recorder();
        set.subscribe(obs_a);
        set.subscribe(obs_b);

        set.notify(&ChangeEvent::Reset);

        assert_eq!(a.lock().unwrap().as_slice(), &[ChangeEvent::Reset]);
        assert_eq!(b.lock().unwrap().as_slice(), &[ChangeEvent::Reset]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut set = ObserverSet::new();
        let (log, obs) = recorder();
        let id = set.subscribe(obs);
        assert!(set.unsubscribe(id));
        assert!(!set.unsubscribe(id));
        assert!(set.is_empty());

        set.notify(&ChangeEvent::Reset);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let mut set = ObserverSet::new();
        let (_, a) = recorder();
        let (_, b) = recorder();
        let ia = set.subscribe(a);
        let ib = set.subscribe(b);
        assert_ne!(ia, ib);
        assert_eq!(set.len(), 2);
    }
}
