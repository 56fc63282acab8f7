//! In-process application runtime.
//!
//! Units register with an [`App`], which runs them through a fixed
//! init / start / stop lifecycle wrapped in optional `will_*` / `did_*`
//! hooks, and routes path-shaped events (`user/:id/profile`) to handlers.

pub mod app;
pub mod config;
pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod units;

pub use app::{App, AppBuilder};
pub use config::{Mode, Settings};
pub use error::{Error, Result};
pub use hooks::{HookErrorMode, HookPoint, Method, Stage};
pub use lifecycle::InitState;
pub use routing::{EventRouter, Handler, Params, PathTree, RouteId};
pub use units::{MethodUnit, Unit, UnitContext, UnitRegistry, ValueUnit};
