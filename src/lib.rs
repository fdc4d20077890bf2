//! resketch - a live-reload supervisor for interactive sketch scripts
//!
//! This library provides the core functionality for resketch: it runs a
//! sketch script on a managed execution thread, watches the script's
//! directory for source changes, restarts the script on a change or an
//! explicit reload request, and resets the script-visible namespace
//! between runs so every run starts from a clean baseline.
//!
//! ## Features
//!
//! - **Live Reload:** Save the file, the sketch restarts within one poll tick
//! - **Environment Reset:** Bindings and modules added by a run are removed before the next
//! - **Command Protocol:** Running sketches can reposition, pin-on-top, or reload themselves
//! - **Crash Isolation:** A crashing sketch never takes the supervisor down
//! - **Pluggable Hosts:** Script runtimes integrate behind small trait seams
//! - **Configuration:** TOML/JSON configuration files
//!
//! ## Module Organization
//!
//! - [`supervisor`] - The spawn/poll/teardown loop
//! - [`watch`] - Directory polling for modified source files
//! - [`commands`] - The inter-thread command queue and protocol
//! - [`registry`] - Instance tracking and bulk disposal
//! - [`environment`] - Namespace snapshot, diff, and restore
//! - [`host`] - Runtime trait seams and the child-process interpreter host
//! - [`config`] - Configuration loading and validation
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Architecture
//!
//! Two threads of control per run:
//!
//! - **Supervisor Thread:** Polls the watch target and command queue on a
//!   fixed interval; its only suspension point is the inter-tick sleep.
//! - **Execution Thread:** Runs the sketch (typically the sketch's own
//!   event loop). Never joined; a fault here is logged at the thread
//!   boundary and the supervisor keeps polling.
//!
//! The command queue and instance registry are the only structures shared
//! between the two threads; both are internally locked.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use resketch::{Config, ExecutionSupervisor, InterpreterHost, SharedEnvironment};
//!
//! # fn main() -> resketch::Result<()> {
//! let config = Config::default();
//! let host = Arc::new(InterpreterHost::from_config("sketch.rb".as_ref(), &config.host)?);
//! let environment = Arc::new(SharedEnvironment::new());
//!
//! let mut supervisor = ExecutionSupervisor::new("sketch.rb", host, environment, &config)?;
//! supervisor.supervise()
//! # }
//! ```

#[macro_use]
extern crate tracing;

pub mod commands;
pub mod config;
pub mod environment;
pub mod error;
pub mod host;
pub mod registry;
pub mod supervisor;
pub mod watch;

// Re-exports for core functionality
pub use commands::{apply_to_frame, CommandKind, CommandQueue, Disposition, SketchCommand};
pub use config::{Config, ConfigLoader, HostConfig, WatchConfig};
pub use environment::{
    AddedBindings, Baseline, Environment, EnvironmentSnapshot, SharedEnvironment,
};
pub use error::{Error, Result};
pub use host::{
    InterpreterHost, Sketch, SketchContext, SketchFrame, SketchHost, ShutdownFlag,
};
pub use registry::InstanceRegistry;
pub use supervisor::{ExecutionSupervisor, ReloadTrigger, RunState};
pub use watch::WatchTarget;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
