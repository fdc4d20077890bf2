//! Child-process interpreter host
//!
//! Runs the sketch under an external interpreter as a child process. The
//! child is registered with the run's instance registry as a disposable
//! instance, so the normal teardown path kills it; the host also observes
//! the run's shutdown flag while waiting so a reload that races disposal
//! still stops the child promptly.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::config::HostConfig;
use crate::error::{Error, Result};
use crate::host::{Sketch, SketchContext, SketchFrame, SketchHost};

/// How often the host checks the child and the shutdown flag
const CHILD_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Interpreters for well-known sketch script extensions
fn interpreter_for(script: &Path) -> Result<PathBuf> {
    let extension = script
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    let program = match extension {
        "rb" => "ruby",
        "py" => "python3",
        "js" => "node",
        "lua" => "lua",
        _ => {
            return Err(Error::InterpreterNotFound {
                extension: extension.to_string(),
            })
        }
    };

    Ok(PathBuf::from(program))
}

/// Host that executes sketches via an external interpreter process
pub struct InterpreterHost {
    program: PathBuf,
    args: Vec<String>,
    inherit_env: bool,
    extra_env: HashMap<String, String>,
}

impl InterpreterHost {
    /// Build a host for `script` from the host configuration.
    ///
    /// The configured interpreter takes precedence; with none configured
    /// the interpreter is derived from the script's extension, and an
    /// unknown extension is a fatal startup error.
    pub fn from_config(script: &Path, config: &HostConfig) -> Result<Self> {
        let program = if config.interpreter.is_empty() {
            interpreter_for(script)?
        } else {
            PathBuf::from(&config.interpreter)
        };

        Ok(Self {
            program,
            args: config.args.clone(),
            inherit_env: config.inherit_env,
            extra_env: config.environment.clone(),
        })
    }

    /// The interpreter executable this host runs
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl SketchHost for InterpreterHost {
    fn execute(&self, script: &Path, ctx: &SketchContext) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(script);
        if !self.inherit_env {
            command.env_clear();
        }
        command.envs(&self.extra_env);

        let child = command.spawn().map_err(|e| Error::HostSpawnFailed {
            command: self.program.display().to_string(),
            reason: e.to_string(),
        })?;

        let sketch = Arc::new(ProcessSketch::new(child, script));
        info!(
            "sketch process started: {} {} (pid {})",
            self.program.display(),
            script.display(),
            sketch.pid()
        );
        ctx.registry.register(sketch.clone());

        loop {
            if let Some(status) = sketch.try_wait()? {
                // a child killed by teardown exits non-zero; that is
                // cancellation, not a script fault
                if sketch.is_cancelled() {
                    return Ok(());
                }
                return if status.success() {
                    Ok(())
                } else {
                    Err(Error::SketchFailed {
                        reason: status.to_string(),
                    })
                };
            }
            if ctx.shutdown.is_raised() {
                sketch.mark_cancelled();
                sketch.dispose()?;
                return Ok(());
            }
            thread::sleep(CHILD_POLL_INTERVAL);
        }
    }
}

/// The child process, viewed as a sketch instance
pub struct ProcessSketch {
    name: String,
    pid: u32,
    child: Arc<Mutex<Child>>,
    cancelled: Arc<AtomicBool>,
    frame: HeadlessFrame,
}

impl ProcessSketch {
    fn new(child: Child, script: &Path) -> Self {
        let name = script
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.display().to_string());
        let pid = child.id();
        let child = Arc::new(Mutex::new(child));
        let cancelled = Arc::new(AtomicBool::new(false));

        Self {
            name,
            pid,
            child: child.clone(),
            cancelled: cancelled.clone(),
            frame: HeadlessFrame::new(child, cancelled),
        }
    }

    /// OS process id of the child
    pub fn pid(&self) -> u32 {
        self.pid
    }

    fn try_wait(&self) -> Result<Option<std::process::ExitStatus>> {
        self.child.lock().unwrap().try_wait().map_err(Error::Io)
    }

    fn mark_cancelled(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Sketch for ProcessSketch {
    fn name(&self) -> &str {
        &self.name
    }

    fn frame(&self) -> &dyn SketchFrame {
        &self.frame
    }

    fn dispose(&self) -> Result<()> {
        self.mark_cancelled();
        let mut child = self.child.lock().unwrap();
        // kill fails once the child has been reaped; that is fine
        let _ = child.kill();
        child.wait().map_err(|e| Error::DisposeFailed {
            reason: e.to_string(),
        })?;
        debug!("sketch process '{}' (pid {}) reaped", self.name, self.pid);
        Ok(())
    }
}

/// Frame stand-in for a windowless child process.
///
/// Position and always-on-top requests are recorded and read back as the
/// observed state, so frame commands targeting a process sketch converge
/// on their first application instead of pending forever.
struct HeadlessFrame {
    child: Arc<Mutex<Child>>,
    cancelled: Arc<AtomicBool>,
    location: Mutex<(i32, i32)>,
    on_top: AtomicBool,
}

impl HeadlessFrame {
    fn new(child: Arc<Mutex<Child>>, cancelled: Arc<AtomicBool>) -> Self {
        Self {
            child,
            cancelled,
            location: Mutex::new((0, 0)),
            on_top: AtomicBool::new(false),
        }
    }
}

impl SketchFrame for HeadlessFrame {
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
        // mark before killing so the waiting host never mistakes the
        // teardown kill for a script fault
        self.cancelled.store(true, Ordering::SeqCst);
        let mut child = self.child.lock().unwrap();
        match child.try_wait() {
            Ok(Some(_)) => Ok(()),
            _ => child.kill().map_err(|e| Error::DisposeFailed {
                reason: e.to_string(),
            }),
        }
    }
}
