//! The seam between the query engine and whatever actually talks to the
//! window manager.
//!
//! Every concrete backend (the `wmctrl` CLI, the native EWMH client, a test
//! double, …) implements [`WindowSystem`].  The
//! [`QueryExecutor`](crate::executor::QueryExecutor) only depends on this
//! abstraction and is bound to one implementation at construction.

use crate::window::{Desktop, Window, WindowId};

/// Abstraction over an EWMH-compliant window manager.
///
/// The mutating calls may take effect asynchronously: a backend returning
/// `Ok(())` only means the request was delivered.  Callers that read state
/// right after a mutation should leave the window manager a moment to catch
/// up (see [`ExecutionConfig::mutation_delay_ms`](crate::config::ExecutionConfig::mutation_delay_ms)).
pub trait WindowSystem {
    /// The error type produced by this backend.
    type Error: std::error::Error + Send + 'static;

    /// Return every managed top-level window, in stacking/client-list order.
    fn list_windows(&self) -> Result<Vec<Window>, Self::Error>;

    /// Return every desktop.  The list is indexed by desktop id.
    fn list_desktops(&self) -> Result<Vec<Desktop>, Self::Error>;

    /// Move `window` to `desktop`.
    fn move_to(&self, window: WindowId, desktop: usize) -> Result<(), Self::Error>;

    /// Ask `window` to close gracefully.
    fn close(&self, window: WindowId) -> Result<(), Self::Error>;

    /// Make `desktop` the current desktop.
    fn switch_desktop(&self, desktop: usize) -> Result<(), Self::Error>;

    /// Switch to the desktop of `window`, raise it and give it focus.
    fn activate(&self, window: WindowId) -> Result<(), Self::Error>;
}
