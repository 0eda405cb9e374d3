//! [`WindowSystem`] implementation backed by the `wmctrl` CLI.
//!
//! Every call spawns one short-lived `wmctrl` process.  Listings are parsed
//! from its tabular text output; lines that do not match the expected shape
//! are skipped with a warning.

use crate::traits::WindowSystem;
use crate::window::{Desktop, Window, WindowId};
use log::{debug, warn};
use regex::Regex;
use std::process::Command;
use std::sync::LazyLock;

/// `<id> <desktop> <pid> <client> <title>`, as printed by `wmctrl -l -p`.
static WINDOW_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<id>0x[0-9A-Fa-f]{8})\s+(?P<desktop>-?\d+)\s+(?P<pid>\d+)\s+(?P<client>\S+)(?:\s(?P<title>.*))?$")
        .expect("static regex")
});

/// `<id> <active> DG: <geometry> VP: <viewport> WA: <origin> <size> <title>`,
/// as printed by `wmctrl -d`.
static DESKTOP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<id>\d+)\s+(?P<active>[-*])\s+DG:\s+(?P<geometry>\S+)\s+VP:\s+(?P<viewport>\S+)\s+WA:\s+(?P<wa_origin>\S+)\s+(?P<wa_size>\S+)\s*(?P<title>.*)$",
    )
    .expect("static regex")
});

/// `wmctrl`-backed window system.
#[derive(Debug)]
pub struct WmctrlWs {
    program: String,
}

/// Errors that can occur when running `wmctrl`.
#[derive(Debug, thiserror::Error)]
#[error("wmctrl error: {0}")]
pub struct WmctrlError(String);

impl Default for WmctrlWs {
    fn default() -> Self {
        Self::new()
    }
}

impl WmctrlWs {
    /// Run the `wmctrl` found on `$PATH`.
    pub fn new() -> Self {
        Self::with_program("wmctrl")
    }

    /// Use a different executable, e.g. an absolute path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `wmctrl` with `args` and return its stdout.
    fn run(&self, args: &[&str]) -> Result<String, WmctrlError> {
        debug!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| WmctrlError(format!("can't execute `{}`: {}", self.program, e)))?;
        if !output.status.success() {
            return Err(WmctrlError(format!(
                "`{} {}` failed with {}: {}",
                self.program,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse the output of `wmctrl -l -p`.
pub fn parse_windows(output: &str) -> Vec<Window> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let parsed = WINDOW_LINE.captures(line).and_then(|c| {
                Some(Window {
                    id: c["id"].parse::<WindowId>().ok()?,
                    desktop: c["desktop"].parse().ok()?,
                    pid: c["pid"].parse().ok().filter(|p: &u32| *p != 0),
                    client: c["client"].to_string(),
                    title: c.name("title").map_or("", |m| m.as_str()).trim().to_string(),
                })
            });
            if parsed.is_none() {
                warn!("skipping unparsable window line: {:?}", line);
            }
            parsed
        })
        .collect()
}

/// Parse the output of `wmctrl -d`.
pub fn parse_desktops(output: &str) -> Vec<Desktop> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let parsed = DESKTOP_LINE.captures(line).and_then(|c| {
                Some(Desktop {
                    id: c["id"].parse().ok()?,
                    active: &c["active"] == "*",
                    geometry: c["geometry"].to_string(),
                    viewport: c["viewport"].to_string(),
                    work_area: format!("{} {}", &c["wa_origin"], &c["wa_size"]),
                    title: c["title"].trim().to_string(),
                })
            });
            if parsed.is_none() {
                warn!("skipping unparsable desktop line: {:?}", line);
            }
            parsed
        })
        .collect()
}

impl WindowSystem for WmctrlWs {
    type Error = WmctrlError;

    fn list_windows(&self) -> Result<Vec<Window>, Self::Error> {
        Ok(parse_windows(&self.run(&["-l", "-p"])?))
    }

    fn list_desktops(&self) -> Result<Vec<Desktop>, Self::Error> {
        Ok(parse_desktops(&self.run(&["-d"])?))
    }

    fn move_to(&self, window: WindowId, desktop: usize) -> Result<(), Self::Error> {
        self.run(&["-i", "-r", &window.to_string(), "-t", &desktop.to_string()])
            .map(drop)
    }

    fn close(&self, window: WindowId) -> Result<(), Self::Error> {
        self.run(&["-i", "-c", &window.to_string()]).map(drop)
    }

    fn switch_desktop(&self, desktop: usize) -> Result<(), Self::Error> {
        self.run(&["-s", &desktop.to_string()]).map(drop)
    }

    fn activate(&self, window: WindowId) -> Result<(), Self::Error> {
        // `-a` switches to the window's desktop, raises and focuses it.
        self.run(&["-i", "-a", &window.to_string()]).map(drop)
    }
}
