//! Entry point for the **wizarddes** CLI.
//!
//! Binds the configured [`WindowSystem`] backend, checks that it answers, and
//! then runs a single query, a batch, or one of the status listings.

use clap::{ArgGroup, CommandFactory, Parser};
use log::{error, info};
use std::path::{Path, PathBuf};
use wizarddes::apps::AppRegistry;
use wizarddes::backend::wmctrl::WmctrlWs;
use wizarddes::batch::{read_batch_file, run_batch, split_batch};
use wizarddes::config::{config_dir, Backend, Config};
use wizarddes::executor::{BatchContext, QueryExecutor};
use wizarddes::render::{desktops_table, windows_table};
use wizarddes::traits::WindowSystem;

/// Scripted window and desktop automation for EWMH window managers.
#[derive(Parser, Debug)]
#[command(name = "wizarddes", version, about)]
#[command(group(
    ArgGroup::new("action")
        .args(["query", "batch", "file", "list_windows", "list_desktops"])
))]
struct Cli {
    /// Query to execute, e.g. `ALL BY CONTAINS(Firefox) -> MV_TO(*)`.
    query: Option<String>,

    /// Several queries separated by the batch delimiter (`;` by default).
    #[arg(short, long, value_name = "QUERIES")]
    batch: Option<String>,

    /// Read queries from a file, one per line.
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Config file [default: $XDG_CONFIG_HOME/wizarddes/config.json].
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// App-runner registry used by CREATE.
    #[arg(long, value_name = "PATH")]
    apps: Option<PathBuf>,

    /// Window system backend; overrides the config file.
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Print all managed windows.
    #[arg(short, long)]
    list_windows: bool,

    /// Print all desktops.
    #[arg(short = 'd', long)]
    list_desktops: bool,

    /// Log at debug level (`RUST_LOG` still takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn has_action(&self) -> bool {
        self.query.is_some()
            || self.batch.is_some()
            || self.file.is_some()
            || self.list_windows
            || self.list_desktops
    }
}

//  Setup

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Load the config named on the command line, or the default one.
///
/// An explicitly named file must load; a missing default file falls back to
/// compiled-in defaults.
fn load_config(explicit: Option<&Path>) -> Config {
    if let Some(path) = explicit {
        return match Config::load(path) {
            Ok(cfg) => {
                info!("loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        };
    }
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn load_apps(cli: &Cli, config: &Config) -> AppRegistry {
    let path = cli
        .apps
        .clone()
        .or_else(|| config.apps_file.clone())
        .unwrap_or_else(|| config_dir().join("apps"));
    match AppRegistry::load(&path) {
        Ok(apps) => apps,
        Err(e) => {
            error!("failed to load app registry {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

//  Main

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.has_action() {
        // Best effort; the exit code already tells the caller what happened.
        let _ = Cli::command().print_help();
        std::process::exit(2);
    }

    let config = load_config(cli.config.as_deref());
    let apps = load_apps(&cli, &config);

    let code = match cli.backend.unwrap_or(config.backend) {
        Backend::Wmctrl => run(WmctrlWs::new(), &cli, &config, &apps),
        Backend::Ewmh => run_ewmh(&cli, &config, &apps),
    };
    std::process::exit(code);
}

#[cfg(feature = "ewmh")]
fn run_ewmh(cli: &Cli, config: &Config, apps: &AppRegistry) -> i32 {
    match wizarddes::backend::ewmh::EwmhWs::connect() {
        Ok(ws) => run(ws, cli, config, apps),
        Err(e) => {
            error!("failed to connect to the X server: {}", e);
            1
        }
    }
}

#[cfg(not(feature = "ewmh"))]
fn run_ewmh(_cli: &Cli, _config: &Config, _apps: &AppRegistry) -> i32 {
    error!("the ewmh backend requires the `ewmh` feature");
    1
}

/// Run the requested action against `ws` and return the process exit code.
fn run<W: WindowSystem>(ws: W, cli: &Cli, config: &Config, apps: &AppRegistry) -> i32 {
    let desktops = match ws.list_desktops() {
        Ok(d) => {
            info!("found {} desktop(s)", d.len());
            d
        }
        Err(e) => {
            error!("failed to query desktops: {}", e);
            return 1;
        }
    };

    if cli.list_desktops {
        println!("{}", desktops_table(&desktops));
        return 0;
    }

    if cli.list_windows {
        return match ws.list_windows() {
            Ok(windows) => {
                println!("{}", windows_table(&windows));
                0
            }
            Err(e) => {
                error!("failed to query windows: {}", e);
                1
            }
        };
    }

    let executor = QueryExecutor::new(&ws, apps, &config.execution);

    if let Some(query) = &cli.query {
        return match executor.execute(query, &mut BatchContext::default()) {
            Ok(_) => 0,
            Err(e) => {
                eprintln!("{}: {}", e.label(), e);
                1
            }
        };
    }

    let queries = if let Some(text) = &cli.batch {
        match split_batch(text, config.batch_delimiter) {
            Ok(q) => q,
            Err(e) => {
                eprintln!("{}: {}", e.label(), e);
                return 1;
            }
        }
    } else if let Some(path) = &cli.file {
        match read_batch_file(path) {
            Ok(q) => q,
            Err(e) => {
                error!("failed to read {}: {}", path.display(), e);
                return 1;
            }
        }
    } else {
        return 0;
    };

    if run_batch(&executor, &queries).all_succeeded() {
        0
    } else {
        1
    }
}
