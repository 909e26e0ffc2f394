//! Test utilities and recording observers for Tessera development.
//!
//! Provides a [`RecordingObserver`] that captures every [`ChangeEvent`]
//! it receives while remaining inspectable after it has been boxed and
//! handed to a compute context, plus the numeric fixtures in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use tessera_core::{ChangeEvent, ChangeObserver};

/// Observer that appends every event to a shared log.
///
/// Clone it before subscribing: the clone handed to the context records,
/// the one kept by the test reads.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events received so far.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of events received so far.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all recorded events.
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Names of the kernels reported by `Computed` events, in order.
    pub fn computed_kernels(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ChangeEvent::Computed { kernel, .. } => Some(*kernel),
                _ => None,
            })
            .collect()
    }
}

impl ChangeObserver for RecordingObserver {
    fn on_change(&mut self, event: &ChangeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
