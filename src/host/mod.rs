//! Script host seams
//!
//! These traits define the interface to the script runtime — launching the
//! sketch, the instances it creates, and their window frames — allowing
//! for clean abstraction and easier testing. The supervisor never talks to
//! a runtime directly; it hands the host a [`SketchContext`] and reacts to
//! what the host registers and requests through it.

pub mod process;

pub use process::InterpreterHost;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::commands::CommandQueue;
use crate::error::Result;
use crate::registry::InstanceRegistry;

/// Window/frame capability of a sketch instance
pub trait SketchFrame: Send + Sync {
    /// Request the frame be moved to the given position
    fn set_location(&self, x: i32, y: i32);

    /// Currently observed frame position
    fn location(&self) -> (i32, i32);

    /// Request the always-on-top state
    fn set_always_on_top(&self, on_top: bool);

    /// Currently observed always-on-top state
    fn is_always_on_top(&self) -> bool;

    /// Close the frame's window
    fn close(&self) -> Result<()>;
}

/// An opaque stateful instance created by the running sketch.
///
/// Instances require explicit disposal; the registry owns that
/// responsibility at teardown, not the script.
pub trait Sketch: Send + Sync {
    /// Display name, used in logs
    fn name(&self) -> &str;

    /// The instance's window frame
    fn frame(&self) -> &dyn SketchFrame;

    /// Release the instance's resources
    fn dispose(&self) -> Result<()>;
}

/// A script runtime capable of executing a sketch file.
///
/// `execute` runs on the dedicated execution thread and may block for the
/// lifetime of the sketch (its own event loop). An `Err` return is a
/// script fault: it is reported at the thread boundary and never
/// propagates into the supervisor.
pub trait SketchHost: Send + Sync {
    /// Run the sketch to completion
    fn execute(&self, script: &Path, ctx: &SketchContext) -> Result<()>;
}

/// Cooperative cancellation signal for one run.
///
/// Raised by the supervisor when the run is about to be torn down. Hosts
/// are not required to observe it; a host that keeps running is abandoned
/// along with its thread.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    raised: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Create an unraised flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that the run is being torn down
    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    /// Check whether teardown has been requested
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Per-run handle bundle passed to [`SketchHost::execute`].
///
/// The registry and command queue are the only structures shared between
/// the execution thread and the supervisor thread; both are internally
/// locked.
#[derive(Clone)]
pub struct SketchContext {
    /// Registry the host appends created instances to
    pub registry: InstanceRegistry,
    /// Queue the running sketch issues commands through
    pub commands: CommandQueue,
    /// Raised by the supervisor once the run should stop
    pub shutdown: ShutdownFlag,
}

impl SketchContext {
    /// Create a context with a fresh shutdown flag
    pub fn new(registry: InstanceRegistry, commands: CommandQueue) -> Self {
        Self {
            registry,
            commands,
            shutdown: ShutdownFlag::new(),
        }
    }
}
