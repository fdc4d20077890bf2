//! Run supervision and the reload loop
//!
//! [`ExecutionSupervisor`] owns the whole lifecycle: spawn the sketch on
//! its execution thread, poll the watch target and command queue on a
//! fixed interval, and on a trigger tear the run down, restore the
//! environment to the original baseline, and respawn. The loop has no
//! terminal state; the only designed exit is a fatal precondition failure
//! before the first spawn.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use crate::commands::{self, CommandQueue};
use crate::config::Config;
use crate::environment::{Baseline, Environment, EnvironmentSnapshot};
use crate::error::{Error, Result};
use crate::host::{SketchContext, SketchHost};
use crate::registry::InstanceRegistry;
use crate::watch::WatchTarget;

/// Phase of the supervision loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Between runs
    #[default]
    Idle,
    /// Launching the execution thread
    Spawning,
    /// Polling for a trigger
    Running,
    /// A trigger fired; teardown is imminent
    ReloadPending,
    /// Disposing instances and restoring the environment
    TearingDown,
}

/// What ended a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadTrigger {
    /// A watched source file was modified
    FileChanged,
    /// The sketch issued a reload command
    Command,
}

/// One supervised execution of the sketch
struct Run {
    seq: u64,
    started_at: DateTime<Utc>,
    /// Watch reference: only files modified strictly after this trigger
    reference_time: SystemTime,
    thread: thread::JoinHandle<()>,
    shutdown: crate::host::ShutdownFlag,
}

/// Orchestrates spawn, poll, teardown, and respawn
pub struct ExecutionSupervisor {
    script: PathBuf,
    host: Arc<dyn SketchHost>,
    environment: Arc<dyn Environment>,
    snapshot: EnvironmentSnapshot,
    registry: InstanceRegistry,
    commands: CommandQueue,
    watch: WatchTarget,
    interval: Duration,
    baseline: Baseline,
    state: RunState,
    runs_started: u64,
}

impl std::fmt::Debug for ExecutionSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionSupervisor")
            .field("script", &self.script)
            .field("watch", &self.watch)
            .field("interval", &self.interval)
            .field("state", &self.state)
            .field("runs_started", &self.runs_started)
            .finish_non_exhaustive()
    }
}

impl ExecutionSupervisor {
    /// Create a supervisor for `script`.
    ///
    /// The original environment baseline is captured here, once; every
    /// later restore diffs against it. Fails fast if the script is
    /// missing.
    pub fn new(
        script: impl Into<PathBuf>,
        host: Arc<dyn SketchHost>,
        environment: Arc<dyn Environment>,
        config: &Config,
    ) -> Result<Self> {
        let script = script.into();
        if !script.is_file() {
            return Err(Error::SketchNotFound { path: script });
        }

        let watch = WatchTarget::for_script(&script, &config.watch.extensions);
        let snapshot = EnvironmentSnapshot::new(environment.clone());
        let baseline = snapshot.capture();
        debug!(
            "captured environment baseline: {} identifier(s)",
            baseline.len()
        );

        Ok(Self {
            script,
            host,
            environment,
            snapshot,
            registry: InstanceRegistry::new(),
            commands: CommandQueue::new(),
            watch,
            interval: config.poll_interval(),
            baseline,
            state: RunState::Idle,
            runs_started: 0,
        })
    }

    /// Registry shared with the execution thread
    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Command queue shared with the execution thread
    pub fn commands(&self) -> &CommandQueue {
        &self.commands
    }

    /// Current loop phase
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Number of runs spawned so far
    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    /// Supervise forever. Each iteration is one run; the loop only ends
    /// if spawning the execution thread itself fails.
    pub fn supervise(&mut self) -> Result<()> {
        loop {
            self.run_once()?;
        }
    }

    /// Execute exactly one spawn → poll-until-trigger → teardown cycle
    /// and report what triggered the reload.
    pub fn run_once(&mut self) -> Result<ReloadTrigger> {
        self.state = RunState::Spawning;
        let run = self.spawn_run()?;
        info!("****** sketch run {} started ({}) ******", run.seq, run.started_at);

        self.state = RunState::Running;
        let trigger = self.poll_until_trigger(&run);

        self.state = RunState::ReloadPending;
        run.shutdown.raise();

        self.state = RunState::TearingDown;
        self.teardown();

        if !run.thread.is_finished() {
            debug!(
                "execution thread of run {} still busy; abandoning it",
                run.seq
            );
        }

        self.state = RunState::Idle;
        Ok(trigger)
    }

    fn spawn_run(&mut self) -> Result<Run> {
        self.runs_started += 1;
        let seq = self.runs_started;

        let ctx = SketchContext::new(self.registry.clone(), self.commands.clone());
        let shutdown = ctx.shutdown.clone();
        let host = self.host.clone();
        let script = self.script.clone();

        // reference taken before the spawn so an edit racing the launch
        // still counts as newer than this run
        let reference_time = SystemTime::now();

        let thread = thread::Builder::new()
            .name(format!("sketch-exec-{}", seq))
            .spawn(move || {
                // the thread boundary is a hard isolation wall: a script
                // fault is reported here and goes no further
                if let Err(e) = host.execute(&script, &ctx) {
                    error!("sketch run {} raised: {}", seq, e);
                }
            })
            .map_err(|e| Error::ExecThreadSpawnFailed {
                reason: e.to_string(),
            })?;

        Ok(Run {
            seq,
            started_at: Utc::now(),
            reference_time,
            thread,
            shutdown,
        })
    }

    fn poll_until_trigger(&self, run: &Run) -> ReloadTrigger {
        loop {
            if self.commands.drain_and_apply(commands::apply_to_frame) {
                info!("run {}: reload command received", run.seq);
                return ReloadTrigger::Command;
            }

            if self.watch.has_changed_since(run.reference_time) {
                info!(
                    "run {}: source change under {}",
                    run.seq,
                    self.watch.root().display()
                );
                return ReloadTrigger::FileChanged;
            }

            thread::sleep(self.interval);
        }
    }

    fn teardown(&mut self) {
        let disposed = self.registry.dispose_all();
        if disposed > 0 {
            debug!("disposed {} sketch instance(s)", disposed);
        }

        self.commands.clear();

        let added = self.snapshot.diff(&self.baseline);
        self.snapshot.restore(&added);

        self.environment.collect_garbage();
    }
}
