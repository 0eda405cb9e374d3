//! Status tables for windows and desktops.

use crate::window::{Desktop, Window};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct WindowRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Desktop")]
    desktop: i32,
    #[tabled(rename = "PID")]
    pid: String,
    #[tabled(rename = "Client")]
    client: String,
    #[tabled(rename = "Title")]
    title: String,
}

#[derive(Tabled)]
struct DesktopRow {
    #[tabled(rename = "ID")]
    id: usize,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Geometry")]
    geometry: String,
    #[tabled(rename = "Viewport")]
    viewport: String,
    #[tabled(rename = "Work area")]
    work_area: String,
    #[tabled(rename = "Title")]
    title: String,
}

/// Render `windows` as a table.
pub fn windows_table(windows: &[Window]) -> String {
    let rows = windows.iter().map(|w| WindowRow {
        id: w.id.to_string(),
        desktop: w.desktop,
        pid: w.pid.map_or_else(|| "-".to_string(), |p| p.to_string()),
        client: w.client.clone(),
        title: w.title.clone(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Render `desktops` as a table.
pub fn desktops_table(desktops: &[Desktop]) -> String {
    let rows = desktops.iter().map(|d| DesktopRow {
        id: d.id,
        active: if d.active { "*".into() } else { "-".into() },
        geometry: d.geometry.clone(),
        viewport: d.viewport.clone(),
        work_area: d.work_area.clone(),
        title: d.title.clone(),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{window, MockWindowSystem};
    use crate::traits::WindowSystem;

    #[test]
    fn window_table_lists_every_window() {
        let table = windows_table(&[window(0xdead_beef, 1, "Firefox"), window(2, -1, "panel")]);
        assert!(table.contains("0xdeadbeef"));
        assert!(table.contains("Firefox"));
        assert!(table.contains("panel"));
        assert!(table.contains("Title"));
    }

    #[test]
    fn desktop_table_marks_active_desktop() {
        let ws = MockWindowSystem::new(vec![], 2);
        let table = desktops_table(&ws.list_desktops().unwrap());
        assert!(table.contains("Workspace 1"));
        assert!(table.contains("Workspace 2"));
        assert!(table.contains('*'));
    }
}
