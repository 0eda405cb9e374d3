//! Window and desktop types shared by every component.
//!
//! [`Window`] and [`Desktop`] are snapshots pulled from a
//! [`WindowSystem`](crate::traits::WindowSystem); nothing here caches them.
//! [`WindowId`] is the natural key of a window and only ever parses from the
//! fixed `0x` + 8 hex digits shape that `wmctrl` prints.

use std::fmt;
use std::str::FromStr;

/// An X window id.
///
/// Displays as `0x` followed by eight lowercase hex digits, e.g.
/// `0x03a00007`.  Parsing is case-insensitive but strict about the shape:
/// `0x3a00007` (seven digits) is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u32);

/// Error returned when a string is not a well-formed window id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a valid window id: {0:?} (expected 0x followed by 8 hex digits)")]
pub struct InvalidWindowId(pub String);

impl FromStr for WindowId {
    type Err = InvalidWindowId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidWindowId(s.to_string());
        let digits = s.strip_prefix("0x").ok_or_else(invalid)?;
        if digits.len() != 8 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        u32::from_str_radix(digits, 16).map(WindowId).map_err(|_| invalid())
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// A top-level client window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub id: WindowId,
    /// Desktop the window lives on; `-1` for sticky windows shown on every
    /// desktop.
    pub desktop: i32,
    /// Owning process, when the client advertises `_NET_WM_PID`.
    pub pid: Option<u32>,
    /// Client machine name.
    pub client: String,
    pub title: String,
}

impl Window {
    /// Whether the window is shown on `desktop`.  Sticky windows are not
    /// considered part of any single desktop.
    pub fn is_on_desktop(&self, desktop: usize) -> bool {
        usize::try_from(self.desktop).is_ok_and(|d| d == desktop)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>2} {:>6} {} {}",
            self.id,
            self.desktop,
            self.pid.unwrap_or(0),
            self.client,
            self.title
        )
    }
}

/// A virtual desktop.
///
/// Desktop ids are 0-based and contiguous, so the number of desktops is
/// simply the length of the list returned by the window system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desktop {
    pub id: usize,
    /// Whether this is the currently shown desktop.
    pub active: bool,
    /// Desktop geometry, e.g. `1920x1080`.
    pub geometry: String,
    /// Viewport origin, e.g. `0,0`, or `N/A`.
    pub viewport: String,
    /// Work area, e.g. `0,0 1920x1050`.
    pub work_area: String,
    pub title: String,
}

/// Return the id of the active desktop in `desktops`, if any is marked
/// active.
pub fn active_desktop(desktops: &[Desktop]) -> Option<usize> {
    desktops.iter().find(|d| d.active).map(|d| d.id)
}
