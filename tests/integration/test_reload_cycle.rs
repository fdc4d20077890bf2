//! Integration tests for the file-watch reload cycle
//!
//! Drives a real supervisor over a real temporary directory: edit the
//! sketch source, observe teardown, environment restore, and respawn.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use resketch::{
    Config, Environment, ExecutionSupervisor, ReloadTrigger, Result, SharedEnvironment,
    Sketch, SketchContext, SketchFrame, SketchHost,
};
use tempfile::tempdir;

// generous gap between run start and the triggering edit, so the test
// holds even on filesystems with coarse mtime granularity
const EDIT_DELAY: Duration = Duration::from_millis(1200);

#[derive(Default)]
struct RecordingFrame {
    closed: AtomicBool,
    location: Mutex<(i32, i32)>,
    on_top: AtomicBool,
}

impl SketchFrame for RecordingFrame {
    fn set_location(&self, x: i32, y: i32) {
        *self.location.lock().unwrap() = (x, y);
    }

    fn location(&self) -> (i32, i32) {
        *self.location.lock().unwrap()
    }

    fn set_always_on_top(&self, on_top: bool) {
        self.on_top.store(on_top, Ordering::SeqCst);
    }

    fn is_always_on_top(&self) -> bool {
        self.on_top.load(Ordering::SeqCst)
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSketch {
    frame: RecordingFrame,
    disposed: AtomicBool,
}

impl Sketch for RecordingSketch {
    fn name(&self) -> &str {
        "recording"
    }

    fn frame(&self) -> &dyn SketchFrame {
        &self.frame
    }

    fn dispose(&self) -> Result<()> {
        self.disposed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Host standing in for a script runtime: pollutes the environment and
/// registers one instance per run, keeping each run's instance around
/// for the test to inspect.
struct RecordingHost {
    environment: SharedEnvironment,
    executions: AtomicUsize,
    instances: Mutex<Vec<Arc<RecordingSketch>>>,
}

impl RecordingHost {
    fn new(environment: SharedEnvironment) -> Self {
        Self {
            environment,
            executions: AtomicUsize::new(0),
            instances: Mutex::new(Vec::new()),
        }
    }
}

impl SketchHost for RecordingHost {
    fn execute(&self, _script: &Path, ctx: &SketchContext) -> Result<()> {
        let run = self.executions.fetch_add(1, Ordering::SeqCst);
        self.environment.define_constant(format!("SketchRun{}", run));
        self.environment.load_module("sketch_support");

        let sketch = Arc::new(RecordingSketch::default());
        ctx.registry.register(sketch.clone());
        self.instances.lock().unwrap().push(sketch);
        Ok(())
    }
}

fn sketch_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let script = dir.path().join("sketch.rb");
    fs::write(&script, "class MySketch < SketchBase; end\n").unwrap();
    (dir, script)
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.watch.interval_ms = 25;
    config
}

fn edit_after_delay(path: &Path, content: &'static str) -> thread::JoinHandle<()> {
    let path = path.to_path_buf();
    thread::spawn(move || {
        thread::sleep(EDIT_DELAY);
        fs::write(&path, content).unwrap();
    })
}

#[test]
fn test_file_edit_triggers_reload() {
    let (_dir, script) = sketch_dir();
    let environment = SharedEnvironment::new();
    let host = Arc::new(RecordingHost::new(environment.clone()));

    let mut supervisor = ExecutionSupervisor::new(
        &script,
        host.clone(),
        Arc::new(environment),
        &fast_config(),
    )
    .unwrap();

    let editor = edit_after_delay(&script, "class MySketch; end # edited\n");
    let trigger = supervisor.run_once().unwrap();
    editor.join().unwrap();

    assert_eq!(trigger, ReloadTrigger::FileChanged);
    assert_eq!(host.executions.load(Ordering::SeqCst), 1);

    // teardown closed the window first, then disposed the instance
    let instances = host.instances.lock().unwrap();
    assert!(instances[0].frame.closed.load(Ordering::SeqCst));
    assert!(instances[0].disposed.load(Ordering::SeqCst));
    assert!(supervisor.registry().is_empty());
}

#[test]
fn test_environment_clean_after_each_cycle() {
    let (_dir, script) = sketch_dir();
    let environment = SharedEnvironment::new();
    environment.define_constant("SketchBase");
    environment.load_module("core");

    let host = Arc::new(RecordingHost::new(environment.clone()));
    let mut supervisor = ExecutionSupervisor::new(
        &script,
        host.clone(),
        Arc::new(environment.clone()),
        &fast_config(),
    )
    .unwrap();

    for cycle in 0..2 {
        let editor = edit_after_delay(&script, "class MySketch; end # again\n");
        supervisor.run_once().unwrap();
        editor.join().unwrap();

        // everything the run added is gone; the baseline is intact
        let constants = environment.constants();
        assert!(
            constants.contains("SketchBase"),
            "cycle {}: baseline binding was removed",
            cycle
        );
        assert_eq!(constants.len(), 1);
        assert_eq!(environment.loaded_modules(), ["core".to_string()].into());
    }

    assert_eq!(host.executions.load(Ordering::SeqCst), 2);
    assert_eq!(supervisor.runs_started(), 2);
}

#[test]
fn test_new_run_uses_fresh_reference_time() {
    let (_dir, script) = sketch_dir();
    let environment = SharedEnvironment::new();
    let host = Arc::new(RecordingHost::new(environment.clone()));

    let mut supervisor = ExecutionSupervisor::new(
        &script,
        host.clone(),
        Arc::new(environment),
        &fast_config(),
    )
    .unwrap();

    let editor = edit_after_delay(&script, "class MySketch; end # first edit\n");
    supervisor.run_once().unwrap();
    editor.join().unwrap();

    // the first edit is older than the second run's reference time, so
    // the second run must wait for a fresh edit rather than retrigger
    let second_editor = edit_after_delay(&script, "class MySketch; end # second edit\n");
    let trigger = supervisor.run_once().unwrap();
    second_editor.join().unwrap();

    assert_eq!(trigger, ReloadTrigger::FileChanged);
    assert_eq!(host.executions.load(Ordering::SeqCst), 2);
}

#[test]
fn test_helper_file_edit_also_triggers() {
    let (dir, script) = sketch_dir();
    let helper = dir.path().join("helper.rb");
    fs::write(&helper, "module Helper; end\n").unwrap();

    let environment = SharedEnvironment::new();
    let host = Arc::new(RecordingHost::new(environment.clone()));
    let mut supervisor = ExecutionSupervisor::new(
        &script,
        host,
        Arc::new(environment),
        &fast_config(),
    )
    .unwrap();

    let editor = edit_after_delay(&helper, "module Helper; VERSION = 2; end\n");
    let trigger = supervisor.run_once().unwrap();
    editor.join().unwrap();

    assert_eq!(trigger, ReloadTrigger::FileChanged);
}
