//! Event routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     on(path, handler)
//!     → tree.rs (path shape → RouteId, nodes created on demand)
//!     → router.rs (append handler to the RouteId's list)
//!
//! Emission:
//!     emit(path, args)
//!     → tree.rs (concrete path → RouteId + bound params)
//!     → router.rs (handlers in registration order)
//!     → handler(args..., params)
//!
//! Teardown:
//!     off(path, handler)
//!     → last handler gone → tree.rs prunes the branch
//! ```
//!
//! # Design Decisions
//! - RouteId is the only dispatch key; raw path strings never index handlers
//! - Literal segments win over parameter segments at the same depth
//! - Lookup recurses once per segment; backtracking out of dead-end literal
//!   branches can visit every node under the matched prefix

pub mod handler;
pub mod path;
pub mod router;
pub mod tree;

pub use handler::Handler;
pub use path::{Params, Segment, DEFAULT_SIGIL};
pub use router::{Delivery, EventRouter};
pub use tree::{Match, PathTree, RouteId};
