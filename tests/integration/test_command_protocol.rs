//! Integration tests for the sketch command protocol
//!
//! Commands issued by a running sketch are applied once per poll tick and
//! retried until their effect is observed on the target's frame.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use resketch::{
    CommandKind, Config, ExecutionSupervisor, ReloadTrigger, Result, SharedEnvironment,
    Sketch, SketchCommand, SketchContext, SketchFrame, SketchHost,
};
use tempfile::tempdir;

/// Frame that only honors a reposition request after a few attempts,
/// mimicking a window manager that takes time to settle.
struct LaggyFrame {
    set_location_calls: AtomicUsize,
    settle_after: usize,
    location: Mutex<(i32, i32)>,
    set_on_top_calls: AtomicUsize,
    on_top: AtomicBool,
}

impl LaggyFrame {
    fn new(settle_after: usize) -> Self {
        Self {
            set_location_calls: AtomicUsize::new(0),
            settle_after,
            location: Mutex::new((0, 0)),
            set_on_top_calls: AtomicUsize::new(0),
            on_top: AtomicBool::new(false),
        }
    }
}

impl SketchFrame for LaggyFrame {
    fn set_location(&self, x: i32, y: i32) {
        let calls = self.set_location_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if calls >= self.settle_after {
            *self.location.lock().unwrap() = (x, y);
        }
    }

    fn location(&self) -> (i32, i32) {
        *self.location.lock().unwrap()
    }

    fn set_always_on_top(&self, on_top: bool) {
        self.set_on_top_calls.fetch_add(1, Ordering::SeqCst);
        self.on_top.store(on_top, Ordering::SeqCst);
    }

    fn is_always_on_top(&self) -> bool {
        self.on_top.load(Ordering::SeqCst)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct LaggySketch {
    frame: LaggyFrame,
}

impl LaggySketch {
    fn settling_after(calls: usize) -> Arc<Self> {
        Arc::new(Self {
            frame: LaggyFrame::new(calls),
        })
    }
}

impl Sketch for LaggySketch {
    fn name(&self) -> &str {
        "laggy"
    }

    fn frame(&self) -> &dyn SketchFrame {
        &self.frame
    }

    fn dispose(&self) -> Result<()> {
        Ok(())
    }
}

/// Host that registers a pre-built sketch and issues the given commands
struct CommandingHost {
    sketch: Arc<LaggySketch>,
    kinds: Vec<CommandKind>,
}

impl SketchHost for CommandingHost {
    fn execute(&self, _script: &Path, ctx: &SketchContext) -> Result<()> {
        ctx.registry.register(self.sketch.clone());
        for kind in &self.kinds {
            ctx.commands
                .push(SketchCommand::new(*kind, self.sketch.clone()));
        }
        Ok(())
    }
}

fn supervisor_with(
    host: Arc<CommandingHost>,
) -> (tempfile::TempDir, ExecutionSupervisor) {
    let dir = tempdir().unwrap();
    let script = dir.path().join("sketch.rb");
    std::fs::write(&script, "class MySketch; end\n").unwrap();

    let mut config = Config::default();
    config.watch.interval_ms = 15;

    let supervisor =
        ExecutionSupervisor::new(&script, host, Arc::new(SharedEnvironment::new()), &config)
            .unwrap();
    (dir, supervisor)
}

#[test]
fn test_pin_on_top_applied_once_then_removed() {
    let sketch = LaggySketch::settling_after(1);
    let host = Arc::new(CommandingHost {
        sketch: sketch.clone(),
        kinds: vec![CommandKind::PinOnTop, CommandKind::Reload],
    });
    let (_dir, mut supervisor) = supervisor_with(host);

    let trigger = supervisor.run_once().unwrap();
    assert_eq!(trigger, ReloadTrigger::Command);
    assert!(sketch.frame.is_always_on_top());
    // completed on first observation, never reapplied
    assert_eq!(sketch.frame.set_on_top_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_reposition_retried_until_observed() {
    let sketch = LaggySketch::settling_after(3);
    let host = Arc::new(CommandingHost {
        sketch: sketch.clone(),
        kinds: vec![CommandKind::Reposition { x: 32, y: 48 }],
    });
    let (_dir, mut supervisor) = supervisor_with(host);

    // end the run from outside once the frame has settled
    let queue = supervisor.commands().clone();
    let watcher_sketch = sketch.clone();
    let closer = thread::spawn(move || loop {
        if watcher_sketch.frame.location() == (32, 48) {
            queue.push(SketchCommand::new(
                CommandKind::Reload,
                watcher_sketch.clone(),
            ));
            break;
        }
        thread::sleep(Duration::from_millis(5));
    });

    let trigger = supervisor.run_once().unwrap();
    closer.join().unwrap();

    assert_eq!(trigger, ReloadTrigger::Command);
    assert_eq!(sketch.frame.location(), (32, 48));
    // the command was retried across ticks until the frame settled
    assert!(sketch.frame.set_location_calls.load(Ordering::SeqCst) >= 3);
}

#[test]
fn test_queue_empty_after_teardown() {
    let sketch = LaggySketch::settling_after(1);
    let host = Arc::new(CommandingHost {
        sketch: sketch.clone(),
        kinds: vec![
            CommandKind::Reposition { x: 7, y: 9 },
            CommandKind::PinOnTop,
            CommandKind::Reload,
        ],
    });
    let (_dir, mut supervisor) = supervisor_with(host);

    supervisor.run_once().unwrap();
    assert!(supervisor.commands().is_empty());
    assert!(supervisor.registry().is_empty());
}
