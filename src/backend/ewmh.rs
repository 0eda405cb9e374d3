//! [`WindowSystem`] implementation that speaks EWMH to the X server.
//!
//! Reads go through root and client window properties (`_NET_CLIENT_LIST`,
//! `_NET_WM_DESKTOP`, …); writes are client messages sent to the root window
//! with the pager source indication, exactly as a pager would request them.
//! No child processes are spawned.

use crate::traits::WindowSystem;
use crate::window::{Desktop, Window, WindowId};
use log::{debug, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageEvent, ConnectionExt as _, EventMask, Window as XWindow,
};
use x11rb::rust_connection::RustConnection;

/// Source indication for client messages: "request from a pager".
const SOURCE_PAGER: u32 = 2;

x11rb::atom_manager! {
    /// The EWMH atoms we read or send.
    pub Atoms: AtomsCookie {
        _NET_CLIENT_LIST,
        _NET_WM_DESKTOP,
        _NET_WM_PID,
        _NET_WM_NAME,
        _NET_NUMBER_OF_DESKTOPS,
        _NET_CURRENT_DESKTOP,
        _NET_DESKTOP_GEOMETRY,
        _NET_DESKTOP_VIEWPORT,
        _NET_WORKAREA,
        _NET_DESKTOP_NAMES,
        _NET_CLOSE_WINDOW,
        _NET_ACTIVE_WINDOW,
    }
}

/// EWMH-backed window system holding one X connection.
pub struct EwmhWs {
    conn: RustConnection,
    root: XWindow,
    atoms: Atoms,
}

/// Errors that can occur when talking to the X server.
#[derive(Debug, thiserror::Error)]
pub enum EwmhError {
    /// The connection itself failed or the server misbehaves.
    #[error("x11 error: {0}")]
    Connection(String),
    /// The server rejected one request, e.g. for a window that is gone.
    #[error("x11 request failed: {0}")]
    Request(String),
}

impl From<ConnectError> for EwmhError {
    fn from(e: ConnectError) -> Self {
        EwmhError::Connection(format!("connect: {}", e))
    }
}

impl From<ConnectionError> for EwmhError {
    fn from(e: ConnectionError) -> Self {
        EwmhError::Connection(e.to_string())
    }
}

impl From<ReplyError> for EwmhError {
    fn from(e: ReplyError) -> Self {
        match e {
            ReplyError::X11Error(_) => EwmhError::Request(e.to_string()),
            _ => EwmhError::Connection(e.to_string()),
        }
    }
}

impl EwmhWs {
    /// Connect to the display named by `$DISPLAY`.
    pub fn connect() -> Result<Self, EwmhError> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| EwmhError::Connection(format!("no screen {}", screen_num)))?;
        let atoms = Atoms::new(&conn)?.reply()?;
        debug!("connected to X11 screen {}, root 0x{:x}", screen_num, root);
        Ok(Self { conn, root, atoms })
    }

    fn property32(&self, window: XWindow, property: Atom) -> Result<Vec<u32>, EwmhError> {
        let reply = self
            .conn
            .get_property(false, window, property, AtomEnum::ANY, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value32().map(|v| v.collect()).unwrap_or_default())
    }

    fn property_bytes(&self, window: XWindow, property: Atom) -> Result<Vec<u8>, EwmhError> {
        let reply = self
            .conn
            .get_property(false, window, property, AtomEnum::ANY, 0, u32::MAX)?
            .reply()?;
        Ok(reply.value)
    }

    fn property_string(&self, window: XWindow, property: Atom) -> Result<Option<String>, EwmhError> {
        let bytes = self.property_bytes(window, property)?;
        let text = String::from_utf8_lossy(&bytes);
        let text = text.trim_end_matches('\0');
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    fn read_window(&self, window: XWindow) -> Result<Window, EwmhError> {
        let desktop = self
            .property32(window, self.atoms._NET_WM_DESKTOP)?
            .first()
            // 0xFFFFFFFF marks a sticky window and maps to -1.
            .map_or(-1, |d| *d as i32);
        let pid = self.property32(window, self.atoms._NET_WM_PID)?.first().copied();
        let client = self
            .property_string(window, AtomEnum::WM_CLIENT_MACHINE.into())?
            .unwrap_or_else(|| "N/A".into());
        let title = match self.property_string(window, self.atoms._NET_WM_NAME)? {
            Some(title) => title,
            None => self
                .property_string(window, AtomEnum::WM_NAME.into())?
                .unwrap_or_default(),
        };
        Ok(Window {
            id: WindowId(window),
            desktop,
            pid,
            client,
            title,
        })
    }

    fn send(&self, window: XWindow, message: Atom, data: [u32; 5]) -> Result<(), EwmhError> {
        let event = ClientMessageEvent::new(32, window, message, data);
        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?;
        self.conn.flush()?;
        Ok(())
    }
}

/// Split a `_NET_DESKTOP_NAMES` value into names.
fn split_names(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .split('\0')
        .map(str::to_string)
        .collect()
}

/// Collect the windows that could be read.  A window destroyed after the
/// client list was fetched fails its property reads with a request error and
/// is skipped; connection errors still abort the listing.
fn skip_vanished(
    reads: impl Iterator<Item = (XWindow, Result<Window, EwmhError>)>,
) -> Result<Vec<Window>, EwmhError> {
    let mut windows = Vec::new();
    for (id, read) in reads {
        match read {
            Ok(w) => windows.push(w),
            Err(EwmhError::Request(e)) => {
                warn!("skipping window 0x{:08x} that went away: {}", id, e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(windows)
}

/// Root-window desktop properties, gathered before building [`Desktop`]s.
#[derive(Debug, Default)]
struct DesktopProps {
    count: usize,
    current: Option<usize>,
    geometry: Vec<u32>,
    viewports: Vec<u32>,
    workareas: Vec<u32>,
    names: Vec<String>,
}

impl DesktopProps {
    fn into_desktops(self) -> Vec<Desktop> {
        let geometry = match self.geometry.as_slice() {
            [w, h, ..] => format!("{}x{}", w, h),
            _ => "N/A".into(),
        };
        (0..self.count)
            .map(|id| {
                let viewport = match self.viewports.get(id * 2..id * 2 + 2) {
                    Some([x, y]) => format!("{},{}", x, y),
                    _ => "N/A".into(),
                };
                let work_area = match self.workareas.get(id * 4..id * 4 + 4) {
                    Some([x, y, w, h]) => format!("{},{} {}x{}", x, y, w, h),
                    _ => "N/A".into(),
                };
                Desktop {
                    id,
                    active: self.current == Some(id),
                    geometry: geometry.clone(),
                    viewport,
                    work_area,
                    title: self.names.get(id).cloned().unwrap_or_default(),
                }
            })
            .collect()
    }
}

impl WindowSystem for EwmhWs {
    type Error = EwmhError;

    fn list_windows(&self) -> Result<Vec<Window>, Self::Error> {
        let clients = self.property32(self.root, self.atoms._NET_CLIENT_LIST)?;
        skip_vanished(clients.into_iter().map(|w| (w, self.read_window(w))))
    }

    fn list_desktops(&self) -> Result<Vec<Desktop>, Self::Error> {
        let first = |values: Vec<u32>| values.first().map(|v| *v as usize);
        let props = DesktopProps {
            count: first(self.property32(self.root, self.atoms._NET_NUMBER_OF_DESKTOPS)?)
                .ok_or_else(|| {
                    EwmhError::Request("window manager does not set _NET_NUMBER_OF_DESKTOPS".into())
                })?,
            current: first(self.property32(self.root, self.atoms._NET_CURRENT_DESKTOP)?),
            geometry: self.property32(self.root, self.atoms._NET_DESKTOP_GEOMETRY)?,
            viewports: self.property32(self.root, self.atoms._NET_DESKTOP_VIEWPORT)?,
            workareas: self.property32(self.root, self.atoms._NET_WORKAREA)?,
            names: split_names(&self.property_bytes(self.root, self.atoms._NET_DESKTOP_NAMES)?),
        };
        Ok(props.into_desktops())
    }

    fn move_to(&self, window: WindowId, desktop: usize) -> Result<(), Self::Error> {
        debug!("_NET_WM_DESKTOP {} -> {}", window, desktop);
        self.send(
            window.0,
            self.atoms._NET_WM_DESKTOP,
            [desktop as u32, SOURCE_PAGER, 0, 0, 0],
        )
    }

    fn close(&self, window: WindowId) -> Result<(), Self::Error> {
        debug!("_NET_CLOSE_WINDOW {}", window);
        self.send(
            window.0,
            self.atoms._NET_CLOSE_WINDOW,
            [x11rb::CURRENT_TIME, SOURCE_PAGER, 0, 0, 0],
        )
    }

    fn switch_desktop(&self, desktop: usize) -> Result<(), Self::Error> {
        debug!("_NET_CURRENT_DESKTOP -> {}", desktop);
        self.send(
            self.root,
            self.atoms._NET_CURRENT_DESKTOP,
            [desktop as u32, x11rb::CURRENT_TIME, 0, 0, 0],
        )
    }

    fn activate(&self, window: WindowId) -> Result<(), Self::Error> {
        let target = self.read_window(window.0)?;
        if let Ok(desktop) = usize::try_from(target.desktop) {
            self.switch_desktop(desktop)?;
        }
        debug!("_NET_ACTIVE_WINDOW {}", window);
        self.send(
            window.0,
            self.atoms._NET_ACTIVE_WINDOW,
            [SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_names_are_nul_separated() {
        assert_eq!(split_names(b"One\0Two\0"), ["One", "Two", ""]);
        assert_eq!(split_names(b""), [""]);
    }

    fn client(id: u32, title: &str) -> Window {
        Window {
            id: WindowId(id),
            desktop: 0,
            pid: None,
            client: "host".into(),
            title: title.into(),
        }
    }

    #[test]
    fn vanished_windows_are_skipped() {
        let reads = vec![
            (1, Ok(client(1, "kept"))),
            (2, Err(EwmhError::Request("BadWindow".into()))),
            (3, Ok(client(3, "also kept"))),
        ];
        let windows = skip_vanished(reads.into_iter()).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].id, WindowId(1));
        assert_eq!(windows[1].id, WindowId(3));
    }

    #[test]
    fn connection_failure_aborts_the_listing() {
        let reads = vec![
            (1, Ok(client(1, "kept"))),
            (2, Err(EwmhError::Connection("broken pipe".into()))),
        ];
        assert!(matches!(
            skip_vanished(reads.into_iter()),
            Err(EwmhError::Connection(_))
        ));
    }

    #[test]
    fn builds_desktops_from_root_properties() {
        let props = DesktopProps {
            count: 2,
            current: Some(1),
            geometry: vec![1920, 1080],
            viewports: vec![0, 0, 0, 0],
            workareas: vec![0, 27, 1920, 1053, 0, 27, 1920, 1053],
            names: vec!["web".into(), "code".into()],
        };
        let desktops = props.into_desktops();
        assert_eq!(desktops.len(), 2);
        assert!(!desktops[0].active);
        assert!(desktops[1].active);
        assert_eq!(desktops[0].geometry, "1920x1080");
        assert_eq!(desktops[1].viewport, "0,0");
        assert_eq!(desktops[1].work_area, "0,27 1920x1053");
        assert_eq!(desktops[1].title, "code");
    }

    #[test]
    fn missing_optional_properties_fall_back() {
        let props = DesktopProps {
            count: 3,
            viewports: vec![0, 0],
            ..DesktopProps::default()
        };
        let desktops = props.into_desktops();
        assert_eq!(desktops.len(), 3);
        assert_eq!(desktops[0].viewport, "0,0");
        assert_eq!(desktops[1].viewport, "N/A");
        assert_eq!(desktops[2].work_area, "N/A");
        assert_eq!(desktops[2].geometry, "N/A");
        assert_eq!(desktops[2].title, "");
        assert!(desktops.iter().all(|d| !d.active));
    }
}
