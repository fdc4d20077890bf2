//! Integration tests for script-fault isolation
//!
//! A sketch that fails or panics on the execution thread leaves a dead
//! thread and a live supervisor: the poll loop keeps watching for file
//! changes and the next edit recovers normally.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use resketch::{
    Config, Error, ExecutionSupervisor, ReloadTrigger, Result, SharedEnvironment,
    SketchContext, SketchHost,
};
use tempfile::tempdir;

const EDIT_DELAY: Duration = Duration::from_millis(1200);

/// Host whose every run fails immediately
struct FailingHost {
    executions: AtomicUsize,
}

impl SketchHost for FailingHost {
    fn execute(&self, _script: &Path, _ctx: &SketchContext) -> Result<()> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        Err(Error::SketchFailed {
            reason: "undefined method 'draw'".to_string(),
        })
    }
}

/// Host whose every run panics
struct PanickingHost;

impl SketchHost for PanickingHost {
    fn execute(&self, _script: &Path, _ctx: &SketchContext) -> Result<()> {
        panic!("sketch runtime exploded");
    }
}

fn sketch_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let script = dir.path().join("sketch.rb");
    fs::write(&script, "raise 'boom'\n").unwrap();
    (dir, script)
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.watch.interval_ms = 25;
    config
}

fn edit_after_delay(path: &Path) -> thread::JoinHandle<()> {
    let path = path.to_path_buf();
    thread::spawn(move || {
        thread::sleep(EDIT_DELAY);
        fs::write(&path, "raise 'boom' # edited\n").unwrap();
    })
}

#[test]
fn test_failing_script_does_not_stop_polling() {
    let (_dir, script) = sketch_dir();
    let host = Arc::new(FailingHost {
        executions: AtomicUsize::new(0),
    });

    let mut supervisor = ExecutionSupervisor::new(
        &script,
        host.clone(),
        Arc::new(SharedEnvironment::new()),
        &fast_config(),
    )
    .unwrap();

    // the script dies instantly, but only the file edit ends the run
    let editor = edit_after_delay(&script);
    let trigger = supervisor.run_once().unwrap();
    editor.join().unwrap();

    assert_eq!(trigger, ReloadTrigger::FileChanged);
    assert_eq!(host.executions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_supervisor_recovers_across_crashing_runs() {
    let (_dir, script) = sketch_dir();
    let host = Arc::new(FailingHost {
        executions: AtomicUsize::new(0),
    });

    let mut supervisor = ExecutionSupervisor::new(
        &script,
        host.clone(),
        Arc::new(SharedEnvironment::new()),
        &fast_config(),
    )
    .unwrap();

    for _ in 0..2 {
        let editor = edit_after_delay(&script);
        supervisor.run_once().unwrap();
        editor.join().unwrap();
    }

    assert_eq!(host.executions.load(Ordering::SeqCst), 2);
    assert_eq!(supervisor.runs_started(), 2);
}

#[test]
fn test_panicking_script_does_not_stop_polling() {
    let (_dir, script) = sketch_dir();

    let mut supervisor = ExecutionSupervisor::new(
        &script,
        Arc::new(PanickingHost),
        Arc::new(SharedEnvironment::new()),
        &fast_config(),
    )
    .unwrap();

    let editor = edit_after_delay(&script);
    let trigger = supervisor.run_once().unwrap();
    editor.join().unwrap();

    assert_eq!(trigger, ReloadTrigger::FileChanged);
}
