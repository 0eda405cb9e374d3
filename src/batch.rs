//! Running several queries as one batch.
//!
//! All queries of a batch share one [`BatchContext`], so a decision made by
//! an earlier query (the desktop picked by `MV_TO(*)`) carries over to later
//! ones.  A failing query is reported and the batch moves on.

use crate::error::QueryError;
use crate::executor::{BatchContext, QueryExecutor};
use crate::tokenizer::split_outside_parens;
use crate::traits::WindowSystem;
use log::{error, info};
use std::path::Path;

/// Outcome counts of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Split a delimiter-separated list of queries.  Delimiters inside
/// parentheses belong to a value and do not split.
pub fn split_batch(text: &str, delimiter: char) -> Result<Vec<String>, QueryError> {
    Ok(split_outside_parens(text, |c| c == delimiter)?
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect())
}

/// Read one query per line from `path`, skipping blank lines and `#`
/// comments.
pub fn read_batch_file(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Run `queries` in order with a shared context.
///
/// Each failure is printed to stderr as `<Label>: <message>` and does not
/// stop the batch.
pub fn run_batch<W, I, S>(executor: &QueryExecutor<'_, W>, queries: I) -> BatchReport
where
    W: WindowSystem,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut context = BatchContext::default();
    let mut report = BatchReport::default();
    for query in queries {
        let query = query.as_ref();
        match executor.execute(query, &mut context) {
            Ok(_) => report.succeeded += 1,
            Err(e) => {
                error!("query {:?} failed: {}", query, e);
                eprintln!("{}: {}", e.label(), e);
                report.failed += 1;
            }
        }
    }
    info!(
        "batch finished: {} succeeded, {} failed",
        report.succeeded, report.failed
    );
    report
}
