//! Concrete window systems.
//!
//! Both backends implement [`WindowSystem`](crate::traits::WindowSystem):
//! [`wmctrl`] shells out to the `wmctrl` CLI, [`ewmh`] (behind the `ewmh`
//! feature) talks to the X server directly.
//!
//! Nothing outside this module should reference either transport directly.

#[cfg(feature = "ewmh")]
pub mod ewmh;
pub mod wmctrl;
