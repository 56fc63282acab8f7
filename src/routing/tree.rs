//! Path tree: maps path shapes to stable route ids.
//!
//! # Responsibilities
//! - Insert path shapes, creating nodes along the branch on demand
//! - Resolve concrete paths to a route id, binding parameter values
//! - Remove shapes and prune branches left without routes
//!
//! # Design Decisions
//! - Arena storage: nodes are addressed by index, pruned slots go to a
//!   free list and are recycled
//! - Every slot carries a generation bumped on free, so a [`RouteId`] minted
//!   for one shape never names a different shape after recycling
//! - Literal children are tried before the parameter child; lookup backtracks
//!   into the parameter branch when the literal branch dead-ends
//! - One parameter child per node; when registrations disagree on its name
//!   the latest registration wins

use std::collections::HashMap;
use std::fmt;

use crate::routing::path::{segments, Params, Segment, DEFAULT_SIGIL};

const ROOT: usize = 0;

/// Opaque handle for a registered path shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId {
    slot: u32,
    generation: u32,
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route#{}.{}", self.slot, self.generation)
    }
}

/// Result of resolving a concrete path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    /// Route registered for the path, if any.
    pub id: Option<RouteId>,
    /// Parameter values bound along the way. Empty when `id` is `None`.
    pub params: Params,
}

/// How a node hangs off its parent.
#[derive(Debug, Clone)]
enum Edge {
    Literal(String),
    Param,
}

#[derive(Debug, Default)]
struct Node {
    parent: Option<usize>,
    edge: Option<Edge>,
    literals: HashMap<String, usize>,
    param: Option<usize>,
    /// Name bound by this node when it is a parameter child.
    param_name: String,
    route: Option<RouteId>,
    generation: u32,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.literals.is_empty() && self.param.is_none()
    }
}

/// Trie of path segments.
#[derive(Debug)]
pub struct PathTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    sigil: char,
    routes: usize,
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTree {
    /// Creates an empty tree using the default `:` sigil.
    pub fn new() -> Self {
        Self::with_sigil(DEFAULT_SIGIL)
    }

    /// Creates an empty tree whose parameter segments start with `sigil`.
    pub fn with_sigil(sigil: char) -> Self {
        Self {
            nodes: vec![Node::default()],
            free: Vec::new(),
            sigil,
            routes: 0,
        }
    }

    pub fn sigil(&self) -> char {
        self.sigil
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Registers the shape of `path`, returning its id.
    ///
    /// Adding a shape that is already registered returns the existing id.
    pub fn add(&mut self, path: &str) -> RouteId {
        let mut idx = ROOT;
        for segment in segments(path, self.sigil) {
            idx = match segment {
                Segment::Literal(token) => match self.nodes[idx].literals.get(token) {
                    Some(&child) => child,
                    None => {
                        let child = self.alloc(idx, Edge::Literal(token.to_string()));
                        self.nodes[idx].literals.insert(token.to_string(), child);
                        child
                    }
                },
                Segment::Param(name) => {
                    let child = match self.nodes[idx].param {
                        Some(child) => child,
                        None => {
                            let child = self.alloc(idx, Edge::Param);
                            self.nodes[idx].param = Some(child);
                            child
                        }
                    };
                    let node = &mut self.nodes[child];
                    if node.param_name != name {
                        if !node.param_name.is_empty() {
                            tracing::debug!(
                                path,
                                previous = %node.param_name,
                                name,
                                "Parameter renamed by later registration"
                            );
                        }
                        node.param_name = name.to_string();
                    }
                    child
                }
            };
        }

        let node = &mut self.nodes[idx];
        match node.route {
            Some(id) => id,
            None => {
                let id = RouteId {
                    slot: idx as u32,
                    generation: node.generation,
                };
                node.route = Some(id);
                self.routes += 1;
                tracing::debug!(path, route = %id, "Route added");
                id
            }
        }
    }

    /// Resolves a concrete path, binding parameter values.
    ///
    /// Every token of `path` is treated as a value, sigils included.
    pub fn get(&self, path: &str) -> Match {
        let tokens: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        match self.lookup(ROOT, &tokens, &mut params) {
            Some(id) => Match {
                id: Some(id),
                params,
            },
            None => Match::default(),
        }
    }

    /// Returns the id registered for the shape of `path` without binding.
    pub fn id(&self, path: &str) -> Option<RouteId> {
        self.find_shape(path).and_then(|idx| self.nodes[idx].route)
    }

    /// Unregisters the shape of `path` and prunes the emptied branch.
    ///
    /// Unknown paths are ignored.
    pub fn remove(&mut self, path: &str) {
        let Some(idx) = self.find_shape(path) else {
            return;
        };
        let Some(id) = self.nodes[idx].route.take() else {
            return;
        };
        self.routes -= 1;
        tracing::debug!(path, route = %id, "Route removed");
        self.prune(idx);
    }

    fn find_shape(&self, path: &str) -> Option<usize> {
        let mut idx = ROOT;
        for segment in segments(path, self.sigil) {
            let node = &self.nodes[idx];
            idx = match segment {
                Segment::Literal(token) => *node.literals.get(token)?,
                Segment::Param(_) => node.param?,
            };
        }
        Some(idx)
    }

    /// Depth-first walk, literal child first. Worst case visits every node
    /// below `idx` when literal branches dead-end late.
    fn lookup(&self, idx: usize, tokens: &[&str], params: &mut Params) -> Option<RouteId> {
        let node = &self.nodes[idx];
        let Some((head, rest)) = tokens.split_first() else {
            return node.route;
        };

        if let Some(&child) = node.literals.get(*head) {
            if let Some(id) = self.lookup(child, rest, params) {
                return Some(id);
            }
        }

        if let Some(child) = node.param {
            params.push(self.nodes[child].param_name.as_str(), *head);
            if let Some(id) = self.lookup(child, rest, params) {
                return Some(id);
            }
            params.pop();
        }

        None
    }

    fn alloc(&mut self, parent: usize, edge: Edge) -> usize {
        let node = Node {
            parent: Some(parent),
            edge: Some(edge),
            ..Node::default()
        };
        match self.free.pop() {
            Some(idx) => {
                let generation = self.nodes[idx].generation;
                self.nodes[idx] = Node { generation, ..node };
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Walks upward from `idx`, freeing nodes with no route and no children.
    fn prune(&mut self, mut idx: usize) {
        while idx != ROOT {
            let node = &self.nodes[idx];
            if node.route.is_some() || !node.is_leaf() {
                break;
            }
            let Some(parent) = node.parent else {
                break;
            };
            match node.edge.clone() {
                Some(Edge::Literal(token)) => {
                    self.nodes[parent].literals.remove(&token);
                }
                Some(Edge::Param) => self.nodes[parent].param = None,
                None => {}
            }
            self.release(idx);
            idx = parent;
        }
    }

    fn release(&mut self, idx: usize) {
        let node = &mut self.nodes[idx];
        let generation = node.generation.wrapping_add(1);
        *node = Node {
            generation,
            ..Node::default()
        };
        self.free.push(idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut tree = PathTree::new();
        let a = tree.add("app/started");
        let b = tree.add("app/started");
        assert_eq!(a, b);
        assert_eq!(tree.get("app/started").id, Some(a));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_params_bound_on_get() {
        let mut tree = PathTree::new();
        let id = tree.add("user/:id/profile");

        let m = tree.get("user/42/profile");
        assert_eq!(m.id, Some(id));
        assert_eq!(m.params.get("id"), Some("42"));

        let miss = tree.get("user/42");
        assert_eq!(miss.id, None);
        assert!(miss.params.is_empty());
    }

    #[test]
    fn test_literal_precedes_param() {
        let mut tree = PathTree::new();
        let me = tree.add("user/me");
        let any = tree.add("user/:id");

        assert_eq!(tree.get("user/me").id, Some(me));
        assert!(tree.get("user/me").params.is_empty());
        assert_eq!(tree.get("user/7").id, Some(any));
    }

    #[test]
    fn test_backtracks_into_param_branch() {
        let mut tree = PathTree::new();
        tree.add("user/me/settings");
        let detail = tree.add("user/:id/detail");

        let m = tree.get("user/me/detail");
        assert_eq!(m.id, Some(detail));
        assert_eq!(m.params.get("id"), Some("me"));
    }

    #[test]
    fn test_deep_backtrack_discards_abandoned_params() {
        let mut tree = PathTree::new();
        tree.add("a/b/c/x");
        tree.add("a/:p/c/x");
        let deep = tree.add("a/:p/:q/y");

        let m = tree.get("a/b/c/y");
        assert_eq!(m.id, Some(deep));
        assert_eq!(m.params.get("p"), Some("b"));
        assert_eq!(m.params.get("q"), Some("c"));
        assert_eq!(m.params.len(), 2);

        let miss = tree.get("a/b/c/z");
        assert!(miss.id.is_none());
        assert!(miss.params.is_empty());
    }

    #[test]
    fn test_id_is_by_shape() {
        let mut tree = PathTree::new();
        let id = tree.add("user/:id");
        assert_eq!(tree.id("user/:id"), Some(id));
        assert_eq!(tree.id("user/:other"), Some(id));
        assert_eq!(tree.id("user/7"), None);
        assert_eq!(tree.id("user"), None);
    }

    #[test]
    fn test_last_param_name_wins() {
        let mut tree = PathTree::new();
        let a = tree.add("room/:id/join");
        let b = tree.add("room/:name/leave");
        assert_ne!(a, b);
        assert_eq!(tree.get("room/x/join").params.get("name"), Some("x"));
        assert_eq!(tree.get("room/x/join").params.get("id"), None);
    }

    #[test]
    fn test_remove_prunes_branch() {
        let mut tree = PathTree::new();
        tree.add("a/b/c");
        assert_eq!(tree.node_count(), 4);

        tree.remove("a/b/c");
        assert_eq!(tree.id("a/b/c"), None);
        assert_eq!(tree.node_count(), 1);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_keeps_shared_prefix() {
        let mut tree = PathTree::new();
        let ab = tree.add("a/b");
        tree.add("a/b/c");

        tree.remove("a/b/c");
        assert_eq!(tree.id("a/b"), Some(ab));
        assert_eq!(tree.node_count(), 3);

        tree.add("a/b/c");
        tree.remove("a/b");
        assert_eq!(tree.id("a/b"), None);
        assert!(tree.get("a/b/c").id.is_some());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut tree = PathTree::new();
        tree.add("a/b");
        tree.remove("a/x");
        tree.remove("a");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn test_recycled_slots_get_new_ids() {
        let mut tree = PathTree::new();
        let old = tree.add("one");
        tree.remove("one");
        let new = tree.add("two");

        assert_eq!(tree.node_count(), 2);
        assert_ne!(old, new);
        assert_eq!(tree.get("one").id, None);
    }

    #[test]
    fn test_root_path() {
        let mut tree = PathTree::new();
        let root = tree.add("/");
        assert_eq!(tree.get("").id, Some(root));
        tree.remove("");
        assert_eq!(tree.get("/").id, None);
        assert_eq!(tree.node_count(), 1);
    }
}
