//! Test doubles shared by the unit tests of several modules.

use crate::traits::WindowSystem;
use crate::window::{Desktop, Window, WindowId};
use std::cell::RefCell;

/// A mutating call recorded by [`MockWindowSystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsCall {
    MoveTo(WindowId, usize),
    Close(WindowId),
    Switch(usize),
    Activate(WindowId),
}

#[derive(Debug, thiserror::Error)]
#[error("mock backend failure")]
pub struct MockError;

/// An in-memory window system that records every mutating call and applies
/// it to its own snapshot, so later reads observe earlier writes.
#[derive(Debug)]
pub struct MockWindowSystem {
    windows: RefCell<Vec<Window>>,
    desktops: RefCell<Vec<Desktop>>,
    calls: RefCell<Vec<WsCall>>,
    /// When set, every mutating call fails.
    pub fail_mutations: bool,
}

impl MockWindowSystem {
    /// Build a mock with `windows` and `desktop_count` desktops, the first
    /// one active.
    pub fn new(windows: Vec<Window>, desktop_count: usize) -> Self {
        let desktops = (0..desktop_count)
            .map(|id| Desktop {
                id,
                active: id == 0,
                geometry: "1920x1080".into(),
                viewport: "0,0".into(),
                work_area: "0,0 1920x1050".into(),
                title: format!("Workspace {}", id + 1),
            })
            .collect();
        Self {
            windows: RefCell::new(windows),
            desktops: RefCell::new(desktops),
            calls: RefCell::new(Vec::new()),
            fail_mutations: false,
        }
    }

    /// Every mutating call so far, in order.
    pub fn calls(&self) -> Vec<WsCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: WsCall) -> Result<(), MockError> {
        if self.fail_mutations {
            return Err(MockError);
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

impl WindowSystem for MockWindowSystem {
    type Error = MockError;

    fn list_windows(&self) -> Result<Vec<Window>, MockError> {
        Ok(self.windows.borrow().clone())
    }

    fn list_desktops(&self) -> Result<Vec<Desktop>, MockError> {
        Ok(self.desktops.borrow().clone())
    }

    fn move_to(&self, window: WindowId, desktop: usize) -> Result<(), MockError> {
        self.record(WsCall::MoveTo(window, desktop))?;
        for w in self.windows.borrow_mut().iter_mut().filter(|w| w.id == window) {
            w.desktop = desktop as i32;
        }
        Ok(())
    }

    fn close(&self, window: WindowId) -> Result<(), MockError> {
        self.record(WsCall::Close(window))?;
        self.windows.borrow_mut().retain(|w| w.id != window);
        Ok(())
    }

    fn switch_desktop(&self, desktop: usize) -> Result<(), MockError> {
        self.record(WsCall::Switch(desktop))?;
        for d in self.desktops.borrow_mut().iter_mut() {
            d.active = d.id == desktop;
        }
        Ok(())
    }

    fn activate(&self, window: WindowId) -> Result<(), MockError> {
        self.record(WsCall::Activate(window))
    }
}

/// Shorthand for a window with the given id, desktop and title.
pub fn window(id: u32, desktop: i32, title: &str) -> Window {
    Window {
        id: WindowId(id),
        desktop,
        pid: Some(1000 + id),
        client: "host".into(),
        title: title.into(),
    }
}
