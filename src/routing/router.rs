//! Multi-listener event dispatch over the path tree.
//!
//! # Responsibilities
//! - Keep an ordered handler list per route id
//! - Register and unregister handlers, alone or under many prefixes
//! - Resolve an emitted path and fan out to its handlers
//!
//! # Design Decisions
//! - Registration order is dispatch order; duplicates are allowed
//! - A route whose last handler is removed leaves the tree
//! - Emitting to a path nobody listens on is a silent no-op

use std::collections::HashMap;

use serde_json::Value;

use crate::observability::metrics;
use crate::routing::handler::Handler;
use crate::routing::path::Params;
use crate::routing::tree::{PathTree, RouteId};

/// Handlers resolved for one emitted path.
#[derive(Debug, Default)]
pub struct Delivery {
    pub route: Option<RouteId>,
    pub handlers: Vec<Handler>,
    pub params: Params,
}

impl Delivery {
    /// Invokes every handler in registration order.
    pub fn run(&self, args: &[Value]) -> usize {
        for handler in &self.handlers {
            handler.call(args, &self.params);
        }
        metrics::record_handlers_invoked(self.handlers.len());
        self.handlers.len()
    }
}

/// Routes emitted paths to registered handlers.
#[derive(Debug, Default)]
pub struct EventRouter {
    tree: PathTree,
    handlers: HashMap<RouteId, Vec<Handler>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a router whose parameter segments start with `sigil`.
    pub fn with_sigil(sigil: char) -> Self {
        Self {
            tree: PathTree::with_sigil(sigil),
            handlers: HashMap::new(),
        }
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    /// Appends `handler` to the handlers of `path`.
    pub fn on(&mut self, path: &str, handler: Handler) -> RouteId {
        let id = self.tree.add(path);
        self.handlers.entry(id).or_default().push(handler);
        id
    }

    /// Registers `handler` under `prefix + suffix` for every prefix.
    pub fn on_prefixed<I, S>(&mut self, prefixes: I, suffix: &str, handler: Handler) -> Vec<RouteId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        prefixes
            .into_iter()
            .map(|prefix| self.on(&format!("{}{}", prefix.as_ref(), suffix), handler.clone()))
            .collect()
    }

    /// Removes the first registration of `handler` on `path`.
    ///
    /// Returns false when nothing was removed.
    pub fn off(&mut self, path: &str, handler: &Handler) -> bool {
        let Some(id) = self.tree.id(path) else {
            return false;
        };
        let Some(set) = self.handlers.get_mut(&id) else {
            return false;
        };
        let Some(pos) = set.iter().position(|h| h.same(handler)) else {
            return false;
        };
        set.remove(pos);

        if set.is_empty() {
            self.handlers.remove(&id);
            self.tree.remove(path);
        }
        true
    }

    /// Removes `handler` from `prefix + suffix` for every prefix.
    pub fn off_prefixed<I, S>(&mut self, prefixes: I, suffix: &str, handler: &Handler) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        prefixes
            .into_iter()
            .filter(|prefix| self.off(&format!("{}{}", prefix.as_ref(), suffix), handler))
            .count()
    }

    /// Resolves `path` to the handlers that would run for it.
    pub fn resolve(&self, path: &str) -> Delivery {
        let matched = self.tree.get(path);
        let Some(id) = matched.id else {
            tracing::trace!(path, "No subscriber for event");
            metrics::record_emit(false);
            return Delivery::default();
        };
        metrics::record_emit(true);
        Delivery {
            route: Some(id),
            handlers: self.handlers.get(&id).cloned().unwrap_or_default(),
            params: matched.params,
        }
    }

    /// Invokes the handlers of `path` with `args`, returning how many ran.
    pub fn emit(&self, path: &str, args: &[Value]) -> usize {
        self.resolve(path).run(args)
    }

    /// Number of handlers registered for the shape of `path`.
    pub fn listener_count(&self, path: &str) -> usize {
        self.tree
            .id(path)
            .and_then(|id| self.handlers.get(&id))
            .map_or(0, Vec::len)
    }
}
