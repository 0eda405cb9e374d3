//! **wizarddes** — a small query language for window and desktop automation.
//!
//! A query selects windows by filters and pipes them into actions:
//!
//! ```text
//! ALL BY CONTAINS(Firefox) -> MV_TO(*)
//! CREATE(term) -> ACTIVE
//! SWITCH(2)
//! ```
//!
//! # Architecture
//!
//! * [`tokenizer`] and [`token`] turn the text into classified tokens.
//! * [`query`] checks the token sequence and compiles it into steps before
//!   anything touches the desktop.
//! * [`executor::QueryExecutor`] runs the steps against a
//!   [`traits::WindowSystem`], which abstracts listing and manipulating
//!   windows so the query logic is not coupled to any X11 transport.
//! * [`interval`] and [`distributor`] implement `MV_SEPARATE`.
//!
//! Concrete window systems live in [`backend`].

pub mod apps;
pub mod backend;
pub mod batch;
pub mod config;
pub mod distributor;
pub mod error;
pub mod executor;
pub mod interval;
pub mod process;
pub mod query;
pub mod render;
pub mod token;
pub mod tokenizer;
pub mod traits;
pub mod window;

#[cfg(test)]
mod testing;
