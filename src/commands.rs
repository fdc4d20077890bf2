//! Inter-thread command protocol
//!
//! A running sketch asks the supervisor to act on an instance by pushing a
//! [`SketchCommand`] onto the shared [`CommandQueue`]. The supervisor
//! drains the queue once per poll tick: a command whose effect is not yet
//! observed stays queued and is retried next tick; a `Reload` terminates
//! the poll loop immediately, leaving any remaining commands to be wiped
//! at teardown.

use std::fmt;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::host::Sketch;

/// What a command asks the supervisor to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Move the target's frame to the given position
    Reposition { x: i32, y: i32 },
    /// Keep the target's frame above all other windows
    PinOnTop,
    /// Restart the current run
    Reload,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Reposition { x, y } => write!(f, "reposition({}, {})", x, y),
            CommandKind::PinOnTop => write!(f, "pin-on-top"),
            CommandKind::Reload => write!(f, "reload"),
        }
    }
}

/// A request issued by a running sketch, targeting an instance
#[derive(Clone)]
pub struct SketchCommand {
    /// Unique identifier, for logging
    pub id: Uuid,
    /// Requested action
    pub kind: CommandKind,
    /// Target instance
    pub sketch: Arc<dyn Sketch>,
}

impl SketchCommand {
    /// Create a command targeting `sketch`
    pub fn new(kind: CommandKind, sketch: Arc<dyn Sketch>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            sketch,
        }
    }
}

impl fmt::Debug for SketchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SketchCommand")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("sketch", &self.sketch.name())
            .finish()
    }
}

/// Outcome of applying a command on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Effect observed; remove from the queue
    Completed,
    /// Effect not yet observed; retry next tick
    Pending,
}

/// Thread-safe, unordered collection of pending commands.
///
/// Pushed to from the execution thread, drained by the supervisor thread;
/// all mutation is mutually exclusive with the drain traversal.
#[derive(Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<Vec<SketchCommand>>>,
}

impl CommandQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command. Callable from any thread.
    pub fn push(&self, command: SketchCommand) {
        debug!("command issued: {} ({})", command.kind, command.id);
        self.inner.lock().unwrap().push(command);
    }

    /// Number of pending commands
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Check if no commands are pending
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Drop all pending commands
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }

    /// Apply `apply` to each pending command, removing those it reports
    /// [`Disposition::Completed`] and retaining the rest.
    ///
    /// A `Reload` command is consumed by the queue itself: traversal stops
    /// immediately and `true` is returned so the caller can terminate its
    /// poll loop. Commands after the reload stay queued untouched until
    /// the teardown [`clear`](Self::clear).
    pub fn drain_and_apply<F>(&self, mut apply: F) -> bool
    where
        F: FnMut(&SketchCommand) -> Disposition,
    {
        let mut pending = self.inner.lock().unwrap();
        let mut index = 0;
        while index < pending.len() {
            if pending[index].kind == CommandKind::Reload {
                let command = pending.remove(index);
                debug!("reload requested ({})", command.id);
                return true;
            }
            match apply(&pending[index]) {
                Disposition::Completed => {
                    debug!("command completed: {}", pending[index].kind);
                    pending.remove(index);
                }
                Disposition::Pending => index += 1,
            }
        }
        false
    }
}

/// Apply a command against its target's frame and report whether the
/// requested effect is now observed.
pub fn apply_to_frame(command: &SketchCommand) -> Disposition {
    let frame = command.sketch.frame();
    match command.kind {
        CommandKind::Reposition { x, y } => {
            frame.set_location(x, y);
            if frame.location() == (x, y) {
                Disposition::Completed
            } else {
                Disposition::Pending
            }
        }
        CommandKind::PinOnTop => {
            frame.set_always_on_top(true);
            if frame.is_always_on_top() {
                Disposition::Completed
            } else {
                Disposition::Pending
            }
        }
        // consumed by the queue before application
        CommandKind::Reload => Disposition::Completed,
    }
}
