//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Init (guard.rs):
//!     ensure_inited → InitGuard::run → spawned body, once → shared outcome
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_shutdown resolves → App::stop
//! ```
//!
//! # Design Decisions
//! - Initialization is the only guarded step; start and stop may repeat
//! - Signal handling lives at the boundary (the binary), not in App

pub mod guard;
pub mod signals;

pub use guard::{InitGuard, InitState};
