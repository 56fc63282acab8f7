//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → Log output (stdout, pretty or JSON), installed by the binary
//!     → Whatever metrics recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder itself
//! - Every log line carries structured fields, not formatted prose
//! - Metric updates are cheap no-ops when no recorder is installed

pub mod logging;
pub mod metrics;
