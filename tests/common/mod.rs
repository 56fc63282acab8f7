//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use app_runtime::{AppBuilder, Handler, Mode, Params};
use serde_json::Value;

/// Ordered log shared between hooks, handlers and assertions.
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// A handler that records `label` each time it runs.
    pub fn handler(&self, label: &str) -> Handler {
        let this = self.clone();
        let label = label.to_string();
        Handler::new(move |_, _| this.push(label.clone()))
    }
}

/// Captures every invocation's arguments and parameters.
#[derive(Clone, Default)]
pub struct Calls {
    calls: Arc<Mutex<Vec<(Vec<Value>, Params)>>>,
}

impl Calls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&self) -> Handler {
        let calls = self.calls.clone();
        Handler::new(move |args, params| {
            calls.lock().unwrap().push((args.to_vec(), params.clone()));
        })
    }

    pub fn all(&self) -> Vec<(Vec<Value>, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Shared counter.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A builder in test mode.
pub fn test_app() -> AppBuilder {
    AppBuilder::new().mode(Mode::Test)
}
