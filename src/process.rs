//! Tracking of a launched application and the processes it forks.
//!
//! GUI applications are frequently started through wrapper scripts that
//! fork the real program and exit, so the window we are waiting for may be
//! owned by a grandchild.  [`ProcessTree`] follows every descendant of the
//! spawned child it has seen while the parent links were still intact.

use log::debug;
use std::collections::BTreeSet;
use std::process::Child;
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

/// Lower bound for polling so a zero interval does not spin.
const MIN_POLL: Duration = Duration::from_millis(10);

/// A spawned child plus every descendant discovered so far.
pub struct ProcessTree {
    child: Child,
    pids: BTreeSet<u32>,
    sys: System,
}

impl ProcessTree {
    pub fn new(child: Child) -> Self {
        let pids = BTreeSet::from([child.id()]);
        Self {
            child,
            pids,
            sys: System::new(),
        }
    }

    /// Every pid known to belong to the launched application.
    pub fn pids(&self) -> &BTreeSet<u32> {
        &self.pids
    }

    /// Re-read the process table and adopt descendants of known pids.
    pub fn refresh(&mut self) {
        self.sys.refresh_processes(ProcessesToUpdate::All, true);
        loop {
            let found: Vec<u32> = self
                .sys
                .processes()
                .iter()
                .filter(|(pid, _)| !self.pids.contains(&pid.as_u32()))
                .filter(|(_, p)| p.parent().is_some_and(|pp| self.pids.contains(&pp.as_u32())))
                .map(|(pid, _)| pid.as_u32())
                .collect();
            if found.is_empty() {
                break;
            }
            debug!("adopted descendant pid(s) {:?}", found);
            self.pids.extend(found);
        }
    }

    /// Block until the spawned child exits or `timeout` elapses, adopting
    /// descendants along the way.  Returns whether the child exited.
    pub fn wait_for_exit(&mut self, timeout: Duration, poll: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.refresh();
            if !self.child_running() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(poll.max(MIN_POLL));
        }
    }

    /// Whether any process of the tree is still alive.  Uses the process
    /// table as of the last [`refresh`](Self::refresh).
    pub fn any_alive(&mut self) -> bool {
        if self.child_running() {
            return true;
        }
        let child_pid = self.child.id();
        self.pids.iter().filter(|pid| **pid != child_pid).any(|pid| {
            self.sys
                .process(Pid::from_u32(*pid))
                .is_some_and(|p| p.status() != ProcessStatus::Zombie)
        })
    }

    fn child_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }
}
