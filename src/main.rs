//! resketch - live-reload supervisor for interactive sketch scripts
//!
//! Runs a sketch script under supervision: edits to any source file in
//! the sketch's directory restart it with a clean environment.

use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use resketch::config::loader::CONFIG_ENV_VAR;
use resketch::{Config, ConfigLoader, ExecutionSupervisor, InterpreterHost, SharedEnvironment};

/// Parsed command line
#[derive(Debug, Default)]
struct AppArgs {
    /// Sketch file to supervise
    sketch: Option<PathBuf>,
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Poll interval override in milliseconds
    interval_ms: Option<u64>,
    /// Interpreter override
    interpreter: Option<String>,
    /// Enable debug mode
    debug: bool,
}

impl AppArgs {
    /// Parse command line arguments
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        app_args.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        return Err("Missing config file path".to_string());
                    }
                }
                "--interval" | "-i" => {
                    if i + 1 < args.len() {
                        app_args.interval_ms = args[i + 1].parse().ok();
                        i += 1;
                    } else {
                        return Err("Missing interval value".to_string());
                    }
                }
                "--interpreter" => {
                    if i + 1 < args.len() {
                        app_args.interpreter = Some(args[i + 1].clone());
                        i += 1;
                    } else {
                        return Err("Missing interpreter path".to_string());
                    }
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--help" | "-?" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-v" => {
                    println!("resketch v{}", env!("CARGO_PKG_VERSION"));
                    process::exit(0);
                }
                arg if arg.starts_with('-') => {
                    return Err(format!("Unknown option: {}", arg));
                }
                _ => {
                    if app_args.sketch.is_some() {
                        return Err(format!("Unexpected argument: {}", args[i]));
                    }
                    app_args.sketch = Some(PathBuf::from(&args[i]));
                }
            }
            i += 1;
        }

        Ok(app_args)
    }
}

/// Print help information
fn print_help() {
    println!("resketch - live-reload supervisor for interactive sketch scripts");
    println!();
    println!("USAGE:");
    println!("    resketch [OPTIONS] <sketchfile>");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>       Path to configuration file");
    println!("    -i, --interval <MS>       Poll interval in milliseconds");
    println!("        --interpreter <PATH>  Interpreter to run the sketch with");
    println!("    -d, --debug               Enable debug mode");
    println!("    -?, --help                Print this help message");
    println!("    -v, --version             Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    resketch looks for configuration files in the following order:");
    println!("    1. Path specified with --config");
    println!("    2. $RESKETCH_CONFIG");
    println!("    3. $XDG_CONFIG_HOME/resketch/config.toml");
    println!("    4. ~/.resketch/config.toml");
    println!("    5. ./resketch.toml");
    println!("    6. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    RESKETCH_CONFIG    Path to configuration file");
    println!("    RESKETCH_DEBUG     Enable debug mode (1 or true)");
    println!("    RUST_LOG           Set logging level (error, warn, info, debug, trace)");
}

fn main() {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("resketch: {}", e);
        print_help();
        process::exit(1);
    });

    // Initialize logging based on debug flag
    let log_level = if args.debug
        || env::var("RESKETCH_DEBUG").is_ok_and(|v| v == "1" || v.to_lowercase() == "true")
    {
        "debug"
    } else {
        "info"
    };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_target(false)
        .compact()
        .init();

    let sketch = match args.sketch.clone() {
        Some(path) => path,
        None => {
            eprintln!("resketch: missing sketch file argument");
            print_help();
            process::exit(1);
        }
    };

    if !sketch.is_file() {
        error!("Sketch file not found -- '{}'", sketch.display());
        process::exit(1);
    }

    let config = load_configuration(&args);
    if let Err(e) = config.validate() {
        error!("{}", e);
        process::exit(1);
    }

    if let Err(e) = run(sketch, config) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(sketch: PathBuf, config: Config) -> resketch::Result<()> {
    let host = Arc::new(InterpreterHost::from_config(&sketch, &config.host)?);
    let environment = Arc::new(SharedEnvironment::new());

    let mut supervisor =
        ExecutionSupervisor::new(&sketch, host.clone(), environment, &config)?;

    info!(
        "supervising {} with {} (poll interval {}ms)",
        sketch.display(),
        host.program().display(),
        config.watch.interval_ms
    );

    supervisor.supervise()
}

/// Load configuration from file or use defaults, then apply command-line
/// overrides
fn load_configuration(args: &AppArgs) -> Config {
    let config_path = args
        .config_path
        .clone()
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    let mut config = if let Some(path) = &config_path {
        debug!("loading config from: {}", path.display());
        match ConfigLoader::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to load config from {}: {}", path.display(), e);
                info!("falling back to default configuration");
                Config::default()
            }
        }
    } else {
        match ConfigLoader::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("failed to load configuration: {}", e);
                Config::default()
            }
        }
    };

    if let Some(interval_ms) = args.interval_ms {
        config.watch.interval_ms = interval_ms;
    }
    if let Some(interpreter) = &args.interpreter {
        config.host.interpreter = interpreter.clone();
    }

    config
}
