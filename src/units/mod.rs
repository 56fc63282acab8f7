//! Application units.
//!
//! # Data Flow
//! ```text
//! AppBuilder::unit / App::add_unit
//!     → UnitRegistry (name → Arc<dyn Unit>, alias → name)
//!
//! App::ensure_inited
//!     → UnitRegistry::init_all → Unit::init(UnitContext) per unit, in order
//!
//! App::dispatch("mailer.send", args)
//!     → Command { unit: "mailer", method: "send" }
//!     → UnitRegistry::resolve → Unit::call
//! ```

mod command;
mod registry;
mod unit;

pub use command::Command;
pub use registry::UnitRegistry;
pub use unit::{MethodUnit, Unit, UnitContext, ValueUnit};
