//! Environment snapshot, diff, and restore
//!
//! The script-visible global namespace is reachable only through the
//! [`Environment`] trait; nothing else in the crate touches raw bindings.
//! [`EnvironmentSnapshot`] brackets each supervised run: a baseline is
//! captured once at process start, and after every run the bindings added
//! since that original baseline are removed so the next run starts clean.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Access to the script-visible global namespace.
///
/// Implemented by script runtimes (or by [`SharedEnvironment`] for hosts
/// that record their definitions in-process). Removal of an identifier
/// that no longer exists must be tolerated silently; the namespace is
/// externally mutable and cleanup is best-effort.
pub trait Environment: Send + Sync {
    /// Current set of top-level binding identifiers
    fn constants(&self) -> BTreeSet<String>;

    /// Current set of loaded-module identifiers
    fn loaded_modules(&self) -> BTreeSet<String>;

    /// Undefine a top-level binding (no-op if absent)
    fn remove_constant(&self, name: &str);

    /// Mark a module as unloaded so it can be loaded fresh (no-op if absent)
    fn unload_module(&self, name: &str);

    /// Advisory garbage-collection hint, issued once per teardown
    fn collect_garbage(&self) {}
}

/// Immutable snapshot of the namespace at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Baseline {
    /// Top-level binding identifiers
    pub constants: BTreeSet<String>,
    /// Loaded-module identifiers
    pub modules: BTreeSet<String>,
}

impl Baseline {
    /// Total number of identifiers in the snapshot
    pub fn len(&self) -> usize {
        self.constants.len() + self.modules.len()
    }

    /// Check if the snapshot holds no identifiers
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty() && self.modules.is_empty()
    }
}

/// Identifiers present now but absent from a baseline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedBindings {
    /// Bindings defined since the baseline
    pub constants: BTreeSet<String>,
    /// Modules loaded since the baseline
    pub modules: BTreeSet<String>,
}

impl AddedBindings {
    /// Total number of added identifiers
    pub fn len(&self) -> usize {
        self.constants.len() + self.modules.len()
    }

    /// Check if nothing was added
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty() && self.modules.is_empty()
    }
}

/// Capture/diff/restore service over an [`Environment`]
pub struct EnvironmentSnapshot {
    env: Arc<dyn Environment>,
}

impl EnvironmentSnapshot {
    /// Create a snapshot service for the given environment
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self { env }
    }

    /// Capture the current namespace. Side-effect-free.
    pub fn capture(&self) -> Baseline {
        Baseline {
            constants: self.env.constants(),
            modules: self.env.loaded_modules(),
        }
    }

    /// Identifiers present now but absent from `baseline`
    pub fn diff(&self, baseline: &Baseline) -> AddedBindings {
        let current = self.capture();
        AddedBindings {
            constants: current
                .constants
                .difference(&baseline.constants)
                .cloned()
                .collect(),
            modules: current
                .modules
                .difference(&baseline.modules)
                .cloned()
                .collect(),
        }
    }

    /// Remove every identifier in `added` from the live environment.
    ///
    /// Safe to call with an empty set. Never removes anything present in
    /// the baseline the added set was diffed against, since the diff only
    /// contains identifiers absent from it.
    pub fn restore(&self, added: &AddedBindings) {
        if added.is_empty() {
            return;
        }
        debug!(
            "restoring environment: removing {} binding(s), {} module(s)",
            added.constants.len(),
            added.modules.len()
        );
        for name in &added.constants {
            self.env.remove_constant(name);
        }
        for name in &added.modules {
            self.env.unload_module(name);
        }
    }
}

#[derive(Debug, Default)]
struct NamespaceState {
    constants: BTreeSet<String>,
    modules: BTreeSet<String>,
}

/// Mutex-guarded in-process namespace.
///
/// Hosts record the constants they define and the modules they load here;
/// the supervisor diffs and restores through the [`Environment`] impl.
#[derive(Clone, Default)]
pub struct SharedEnvironment {
    inner: Arc<Mutex<NamespaceState>>,
}

impl SharedEnvironment {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a top-level binding definition
    pub fn define_constant(&self, name: impl Into<String>) {
        self.inner.lock().unwrap().constants.insert(name.into());
    }

    /// Record a module load
    pub fn load_module(&self, name: impl Into<String>) {
        self.inner.lock().unwrap().modules.insert(name.into());
    }
}

impl Environment for SharedEnvironment {
    fn constants(&self) -> BTreeSet<String> {
        self.inner.lock().unwrap().constants.clone()
    }

    fn loaded_modules(&self) -> BTreeSet<String> {
        self.inner.lock().unwrap().modules.clone()
    }

    fn remove_constant(&self, name: &str) {
        if !self.inner.lock().unwrap().constants.remove(name) {
            debug!("binding '{}' already absent, skipping", name);
        }
    }

    fn unload_module(&self, name: &str) {
        if !self.inner.lock().unwrap().modules.remove(name) {
            debug!("module '{}' already absent, skipping", name);
        }
    }
}
