//! Spreads a set of windows across desktops (`MV_SEPARATE`).

use crate::error::QueryError;
use crate::interval::Interval;
use crate::traits::WindowSystem;
use crate::window::Window;
use log::{debug, info};
use std::time::Duration;

/// Assigns windows to desktops, bound to the desktop count of the snapshot
/// taken when the query started.
#[derive(Debug, Clone)]
pub struct DesktopDistributor {
    desktop_count: usize,
    delay: Duration,
}

impl DesktopDistributor {
    /// `delay` is slept after every move so the window manager can apply
    /// it before the next one is issued.
    pub fn new(desktop_count: usize, delay: Duration) -> Self {
        Self {
            desktop_count,
            delay,
        }
    }

    /// Pair `windows` with the desktops of `interval`, in order, and move
    /// each window to its desktop.
    ///
    /// When the interval yields fewer desktops than there are windows, only
    /// the first windows are moved.  Every paired desktop id is checked
    /// against the desktop count before the first move is issued.
    ///
    /// Returns the `(window, desktop)` assignments that were applied.
    pub fn distribute<W: WindowSystem>(
        &self,
        ws: &W,
        windows: &[Window],
        interval: &Interval,
    ) -> Result<Vec<(Window, usize)>, QueryError> {
        let desktops = interval.desktops(windows.len());
        if desktops.is_empty() {
            return Err(QueryError::WrongQueryParameter(format!(
                "interval {:?} resolves to no desktops",
                interval
            )));
        }

        let assignments: Vec<(Window, usize)> = windows
            .iter()
            .cloned()
            .zip(desktops.iter().copied())
            .collect();

        if let Some((_, bad)) = assignments.iter().find(|(_, d)| *d >= self.desktop_count) {
            return Err(QueryError::WrongQueryParameter(format!(
                "desktop {} is not available, there are {} desktops",
                bad, self.desktop_count
            )));
        }
        if assignments.len() < windows.len() {
            info!(
                "interval covers {} of {} windows, the rest stay where they are",
                assignments.len(),
                windows.len()
            );
        }

        for (window, desktop) in &assignments {
            debug!("move {} to desktop {}", window.id, desktop);
            ws.move_to(window.id, *desktop).map_err(QueryError::backend)?;
            std::thread::sleep(self.delay);
        }
        Ok(assignments)
    }
}
