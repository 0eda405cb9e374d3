//! The query state machine.
//!
//! A [`Query::Pipeline`] is walked left to right.  Each [`Step`] is handed to
//! the handler for its [`TokenKind`], which takes the current
//! [`ExecutionState`] and returns the next one:
//!
//! * range selectors (`ALL`, `FIRST`, `LAST`) record a reduction that is
//!   applied after filtering;
//! * filters (`ID`, `REGEX`, `CONTAINS`, `FULL`, `DESK`) validate their value
//!   and append a predicate to the filter chain;
//! * `->` resolves the target list: it pulls the live window list (or reuses
//!   the window produced by `CREATE`), applies every filter in order, then
//!   the range selector;
//! * actions consume the target list and mutate the window system.
//!
//! A [`Query::Unary`] command runs immediately and ends the query.

use crate::apps::AppRegistry;
use crate::config::ExecutionConfig;
use crate::distributor::DesktopDistributor;
use crate::error::QueryError;
use crate::interval::Interval;
use crate::process::ProcessTree;
use crate::query::{Query, Step};
use crate::render;
use crate::token::{Action, Creator, FilterKind, Selector, TokenKind, Unary, WILDCARD};
use crate::traits::WindowSystem;
use crate::window::{active_desktop, Desktop, Window, WindowId};
use log::{debug, info, warn};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

/// Decisions shared by the queries of one batch.
///
/// Created once per batch and threaded through every query in it; unrelated
/// invocations never share a context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchContext {
    /// Desktop chosen by the first `MV_TO(*)` of the batch.  Later wildcard
    /// moves reuse it.
    pub move_to_desktop: Option<usize>,
}

/// A predicate over windows, appended to the filter chain by `BY ...`.
#[derive(Debug, Clone)]
pub enum WindowFilter {
    Id(WindowId),
    /// Anchored at the start of the title.
    Regex(Regex),
    Contains(String),
    Full(String),
    Desk(usize),
}

impl WindowFilter {
    pub fn matches(&self, w: &Window) -> bool {
        match self {
            WindowFilter::Id(id) => w.id == *id,
            WindowFilter::Regex(re) => re.is_match(&w.title),
            WindowFilter::Contains(s) => w.title.contains(s.as_str()),
            WindowFilter::Full(s) => w.title == *s,
            WindowFilter::Desk(d) => w.is_on_desktop(*d),
        }
    }
}

impl fmt::Display for WindowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowFilter::Id(id) => write!(f, "ID({})", id),
            WindowFilter::Regex(re) => write!(f, "REGEX({})", re.as_str()),
            WindowFilter::Contains(s) => write!(f, "CONTAINS({})", s),
            WindowFilter::Full(s) => write!(f, "FULL({})", s),
            WindowFilter::Desk(d) => write!(f, "DESK({})", d),
        }
    }
}

impl Selector {
    /// Reduce an already filtered, non-empty window list.
    pub fn apply(self, mut windows: Vec<Window>) -> Vec<Window> {
        match self {
            Selector::All => windows,
            Selector::First => {
                windows.truncate(1);
                windows
            }
            Selector::Last => windows.pop().into_iter().collect(),
        }
    }
}

/// Everything a pipeline accumulates while it is walked.
#[derive(Debug, Clone)]
pub struct ExecutionState {
    /// Filters declared since the last `->`, in order.
    pub filters: Vec<WindowFilter>,
    /// Reduction applied after filtering.
    pub range: Option<Selector>,
    /// Windows resolved by `->` or produced by `CREATE`.
    pub targets: Option<Vec<Window>>,
    /// Desktops as of the start of the query.
    pub desktops: Vec<Desktop>,
    pub distributor: DesktopDistributor,
    /// Set by `FORCE_CREATE`; nothing may be resolved afterwards.
    pub detached_launch: bool,
}

impl ExecutionState {
    fn new(desktops: Vec<Desktop>, settings: &ExecutionConfig) -> Self {
        let distributor = DesktopDistributor::new(desktops.len(), settings.mutation_delay());
        Self {
            filters: Vec::new(),
            range: None,
            targets: None,
            desktops,
            distributor,
            detached_launch: false,
        }
    }

    fn targets(&self, token: &str) -> Result<&[Window], QueryError> {
        if self.detached_launch {
            return Err(QueryError::ExecuteQuery(format!(
                "`{}` cannot follow FORCE_CREATE, it produces no window",
                token
            )));
        }
        self.targets.as_deref().ok_or_else(|| {
            QueryError::ExecuteQuery(format!(
                "`{}` has no windows to act on, query not composed correctly (missing `->`?)",
                token
            ))
        })
    }
}

/// Runs compiled queries against a [`WindowSystem`].
pub struct QueryExecutor<'a, W: WindowSystem> {
    ws: &'a W,
    apps: &'a AppRegistry,
    settings: &'a ExecutionConfig,
}

impl<'a, W: WindowSystem> QueryExecutor<'a, W> {
    pub fn new(ws: &'a W, apps: &'a AppRegistry, settings: &'a ExecutionConfig) -> Self {
        Self { ws, apps, settings }
    }

    /// Parse and run one query string.
    ///
    /// Returns the final target list (empty for unary commands and for
    /// queries that never resolved one).
    pub fn execute(
        &self,
        expression: &str,
        context: &mut BatchContext,
    ) -> Result<Vec<Window>, QueryError> {
        info!("query: {}", expression);
        let query = Query::parse(expression)?;
        self.execute_query(&query, context)
    }

    /// Run a compiled query.
    pub fn execute_query(
        &self,
        query: &Query,
        context: &mut BatchContext,
    ) -> Result<Vec<Window>, QueryError> {
        match query {
            Query::Unary { command, value } => {
                self.execute_unary(*command, value)?;
                Ok(Vec::new())
            }
            Query::Pipeline(steps) => {
                let desktops = self.ws.list_desktops().map_err(QueryError::backend)?;
                let mut state = ExecutionState::new(desktops, self.settings);
                for step in steps {
                    debug!("process {}", step);
                    state = self.apply(step, state, context)?;
                }
                if !state.filters.is_empty() {
                    warn!("filters declared after the last `->` were never applied");
                }
                Ok(state.targets.unwrap_or_default())
            }
        }
    }

    fn apply(
        &self,
        step: &Step,
        state: ExecutionState,
        context: &mut BatchContext,
    ) -> Result<ExecutionState, QueryError> {
        match step.kind {
            TokenKind::Selector(selector) => Ok(self.select_range(selector, state)),
            TokenKind::Filter(kind) => self.add_filter(kind, step.value()?, state),
            TokenKind::Operator => self.resolve_targets(state),
            TokenKind::Action(action) => self.act(action, step, state, context),
            TokenKind::Creator(creator) => self.create(creator, step.value()?, state),
            TokenKind::Connective => Ok(state),
            TokenKind::Unary(_) | TokenKind::Value => Err(QueryError::ExecuteQuery(format!(
                "can't execute query, unexpected token `{}`: query not composed correctly",
                step.token
            ))),
        }
    }

    //  Unary

    fn execute_unary(&self, command: Unary, value: &str) -> Result<(), QueryError> {
        match command {
            Unary::Switch => {
                let desktops = self.ws.list_desktops().map_err(QueryError::backend)?;
                let desktop = desktop_id(value, &desktops, "SWITCH")?;
                info!("switch to desktop {}", desktop);
                self.ws.switch_desktop(desktop).map_err(QueryError::backend)
            }
        }
    }

    //  Selection

    fn select_range(&self, selector: Selector, mut state: ExecutionState) -> ExecutionState {
        debug!("range selector {:?}", selector);
        state.range = Some(selector);
        state
    }

    fn add_filter(
        &self,
        kind: FilterKind,
        value: &str,
        mut state: ExecutionState,
    ) -> Result<ExecutionState, QueryError> {
        let filter = match kind {
            FilterKind::Id => WindowFilter::Id(value.parse().map_err(|_| {
                QueryError::WrongQueryParameter(format!(
                    "not valid window id {} in `BY ID()` filter",
                    value
                ))
            })?),
            FilterKind::Regex => {
                let re = Regex::new(&format!("^(?:{})", value)).map_err(|e| {
                    QueryError::WrongQueryParameter(format!("invalid regex {:?}: {}", value, e))
                })?;
                WindowFilter::Regex(re)
            }
            FilterKind::Contains => WindowFilter::Contains(value.to_string()),
            FilterKind::Full => WindowFilter::Full(value.to_string()),
            FilterKind::Desk if value == WILDCARD => {
                WindowFilter::Desk(active_desktop(&state.desktops).ok_or_else(|| {
                    QueryError::WrongQueryParameter("no active desktop for `DESK(*)`".into())
                })?)
            }
            FilterKind::Desk => WindowFilter::Desk(desktop_id(value, &state.desktops, "DESK")?),
        };
        debug!("add filter {}", filter);
        state.filters.push(filter);
        Ok(state)
    }

    fn resolve_targets(&self, mut state: ExecutionState) -> Result<ExecutionState, QueryError> {
        if state.detached_launch {
            return Err(QueryError::ExecuteQuery(
                "`->` cannot follow FORCE_CREATE, it produces no window".into(),
            ));
        }
        let mut windows = match state.targets.take() {
            Some(targets) => targets,
            None => self.ws.list_windows().map_err(QueryError::backend)?,
        };
        if windows.is_empty() {
            return Err(QueryError::EmptyQueryResult("there are no windows to select".into()));
        }
        for filter in state.filters.drain(..) {
            windows.retain(|w| filter.matches(w));
            if windows.is_empty() {
                return Err(QueryError::EmptyQueryResult(format!(
                    "zero results for filter {}",
                    filter
                )));
            }
        }
        if let Some(selector) = state.range.take() {
            windows = selector.apply(windows);
        }
        info!("selected {} window(s)", windows.len());
        state.targets = Some(windows);
        Ok(state)
    }

    //  Actions

    fn act(
        &self,
        action: Action,
        step: &Step,
        mut state: ExecutionState,
        context: &mut BatchContext,
    ) -> Result<ExecutionState, QueryError> {
        match action {
            Action::Close => {
                for w in state.targets(&step.token)? {
                    info!("close {} {:?}", w.id, w.title);
                    self.ws.close(w.id).map_err(QueryError::backend)?;
                    std::thread::sleep(self.settings.mutation_delay());
                }
            }
            Action::MvTo => {
                state.targets(&step.token)?;
                let desktop = self.move_destination(step.value()?, &state.desktops, context)?;
                for w in state.targets.iter_mut().flatten() {
                    info!("move {} to desktop {}", w.id, desktop);
                    self.ws.move_to(w.id, desktop).map_err(QueryError::backend)?;
                    w.desktop = desktop as i32;
                    std::thread::sleep(self.settings.mutation_delay());
                }
            }
            Action::MvSeparate => {
                let interval = Interval::parse(step.value()?)?;
                let applied = state.distributor.distribute(
                    self.ws,
                    state.targets(&step.token)?,
                    &interval,
                )?;
                for (w, (_, desktop)) in state.targets.iter_mut().flatten().zip(applied) {
                    w.desktop = desktop as i32;
                }
            }
            Action::Active => {
                let targets = state.targets(&step.token)?;
                let [target] = targets else {
                    return Err(QueryError::ExecuteQuery(format!(
                        "`ACTIVE` needs exactly one window, the query selected {}",
                        targets.len()
                    )));
                };
                info!("activate {} {:?}", target.id, target.title);
                self.ws.activate(target.id).map_err(QueryError::backend)?;
            }
            Action::Wait => {
                let secs = self.wait_seconds(step.value()?)?;
                info!("wait {}s", secs);
                std::thread::sleep(Duration::from_secs(secs));
            }
            Action::Print => {
                println!("{}", render::windows_table(state.targets(&step.token)?));
            }
        }
        Ok(state)
    }

    /// Resolve the `MV_TO` destination.  `*` reuses the batch's earlier
    /// choice, or picks the last desktop and remembers it.
    fn move_destination(
        &self,
        value: &str,
        desktops: &[Desktop],
        context: &mut BatchContext,
    ) -> Result<usize, QueryError> {
        if value != WILDCARD {
            return desktop_id(value, desktops, "MV_TO");
        }
        if let Some(desktop) = context.move_to_desktop {
            if desktop < desktops.len() {
                debug!("MV_TO(*) reuses desktop {} from the batch", desktop);
                return Ok(desktop);
            }
            warn!("remembered desktop {} no longer exists", desktop);
        }
        let last = desktops
            .len()
            .checked_sub(1)
            .ok_or_else(|| QueryError::WrongQueryParameter("there are no desktops".into()))?;
        context.move_to_desktop = Some(last);
        Ok(last)
    }

    fn wait_seconds(&self, value: &str) -> Result<u64, QueryError> {
        if value == WILDCARD {
            return Ok(self.settings.wait_default_secs);
        }
        let secs: i64 = value.trim().parse().map_err(|_| {
            QueryError::WrongQueryParameter(format!("`WAIT` expects seconds or `*`, got {:?}", value))
        })?;
        Ok(u64::try_from(secs).unwrap_or(self.settings.wait_default_secs))
    }

    //  Creation

    fn create(
        &self,
        creator: Creator,
        alias: &str,
        mut state: ExecutionState,
    ) -> Result<ExecutionState, QueryError> {
        let command = self.apps.resolve(alias).ok_or_else(|| {
            QueryError::WrongQueryParameter(format!("unknown app alias `{}`", alias))
        })?;
        let launch_failed = |e: std::io::Error| {
            QueryError::ExecuteQuery(format!("failed to launch `{}`: {}", command, e))
        };

        match creator {
            Creator::ForceCreate => {
                let child = AppRegistry::spawn(command).map_err(launch_failed)?;
                info!("launched `{}` (pid {}) without waiting", alias, child.id());
                state.targets = None;
                state.detached_launch = true;
                Ok(state)
            }
            Creator::Create => {
                let before: HashSet<WindowId> = self
                    .ws
                    .list_windows()
                    .map_err(QueryError::backend)?
                    .into_iter()
                    .map(|w| w.id)
                    .collect();
                let child = AppRegistry::spawn(command).map_err(launch_failed)?;
                info!("launched `{}` (pid {}), waiting for its window", alias, child.id());
                let window = self.wait_for_window(alias, ProcessTree::new(child), &before)?;
                info!("`{}` opened {} {:?}", alias, window.id, window.title);
                state.targets = Some(vec![window]);
                Ok(state)
            }
        }
    }

    /// Poll the window list until a window owned by the launched process
    /// tree appears that was not there before.  Bounded by the liveness of
    /// the tree and, if configured, by `create_detect_timeout_ms`.
    fn wait_for_window(
        &self,
        alias: &str,
        mut tree: ProcessTree,
        before: &HashSet<WindowId>,
    ) -> Result<Window, QueryError> {
        let poll = Duration::from_millis(self.settings.create_poll_ms);
        tree.wait_for_exit(Duration::from_millis(self.settings.create_timeout_ms), poll);

        let detect_limit = self.settings.create_detect_timeout_ms.map(Duration::from_millis);
        let started = Instant::now();
        loop {
            tree.refresh();
            let windows = self.ws.list_windows().map_err(QueryError::backend)?;
            if let Some(w) = find_new_window(before, windows, tree.pids()) {
                return Ok(w);
            }
            if !tree.any_alive() {
                return Err(QueryError::ExecuteQuery(format!(
                    "`{}` exited without opening a window",
                    alias
                )));
            }
            if detect_limit.is_some_and(|limit| started.elapsed() >= limit) {
                return Err(QueryError::ExecuteQuery(format!(
                    "`{}` did not open a window within {:?}",
                    alias,
                    detect_limit.unwrap_or_default()
                )));
            }
            std::thread::sleep(poll.max(Duration::from_millis(10)));
        }
    }
}

/// Parse and range-check a desktop id.
fn desktop_id(value: &str, desktops: &[Desktop], token: &str) -> Result<usize, QueryError> {
    let invalid = || {
        QueryError::WrongQueryParameter(format!(
            "not valid desktop id {} in `{}`, there are {} desktops",
            value,
            token,
            desktops.len()
        ))
    };
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let id: usize = value.parse().map_err(|_| invalid())?;
    if id >= desktops.len() {
        return Err(invalid());
    }
    Ok(id)
}

/// First window in `windows` that is not in `before` and is owned by one of
/// `pids`.
pub fn find_new_window(
    before: &HashSet<WindowId>,
    windows: Vec<Window>,
    pids: &BTreeSet<u32>,
) -> Option<Window> {
    windows
        .into_iter()
        .find(|w| !before.contains(&w.id) && w.pid.is_some_and(|p| pids.contains(&p)))
}
