//! Sketch instance registry
//!
//! Tracks every instance created during the current run so the supervisor
//! can tear them all down uniformly. Instances are appended from the
//! execution thread as the script constructs them and are only ever
//! removed in bulk at teardown.

use std::sync::{Arc, Mutex};

use crate::host::Sketch;

/// Thread-safe registry of live sketch instances
#[derive(Clone, Default)]
pub struct InstanceRegistry {
    inner: Arc<Mutex<Vec<Arc<dyn Sketch>>>>,
}

impl InstanceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly constructed instance. Callable from any thread.
    pub fn register(&self, instance: Arc<dyn Sketch>) {
        debug!("registering sketch instance '{}'", instance.name());
        self.inner.lock().unwrap().push(instance);
    }

    /// Number of registered instances
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Check if no instances are registered
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Close and dispose every registered instance, then clear the
    /// registry. For each instance the window is closed first, then the
    /// disposer runs. A failure on either step is logged and the batch
    /// continues with the remaining instances.
    ///
    /// Returns the number of instances processed.
    pub fn dispose_all(&self) -> usize {
        // take a stable snapshot and release the lock before calling out,
        // so a straggling execution thread can still register (into the
        // now-empty registry) without deadlocking against disposal
        let instances: Vec<Arc<dyn Sketch>> = {
            let mut inner = self.inner.lock().unwrap();
            inner.drain(..).collect()
        };

        let count = instances.len();
        for instance in instances {
            if let Err(e) = instance.frame().close() {
                warn!("failed to close frame of '{}': {}", instance.name(), e);
            }
            if let Err(e) = instance.dispose() {
                warn!("failed to dispose '{}': {}", instance.name(), e);
            }
        }
        count
    }
}
