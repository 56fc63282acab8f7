//! Lifecycle hook subsystem.
//!
//! # Data Flow
//! ```text
//! intercept(host, method, body)
//!     → table.rs lookup will_<method>   (fresh on every call)
//!     → await will hook                 (abort on failure)
//!     → await body                      (abort on failure)
//!     → table.rs lookup did_<method>
//!     → await did hook                  (failure still propagates)
//!     → body's value
//! ```
//!
//! # Design Decisions
//! - Hooks live in a registered table instead of being discovered by name
//! - Every hook and body is a future; synchronous ones are wrapped in a
//!   ready future so sequencing has a single shape
//! - Whether a `did` failure is tagged separately from a body failure is a
//!   configuration choice ([`HookErrorMode`])

pub mod interceptor;
pub mod point;
pub mod table;

pub use interceptor::{HookErrorMode, Interceptor};
pub use point::{HookPoint, Method, Stage, UnknownHookPoint};
pub use table::{sync_hook, HookFn, HookFuture, HookTable};
