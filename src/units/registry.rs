//! Named unit storage.
//!
//! # Responsibilities
//! - Store units by name and resolve them, following aliases
//! - Initialize every registered unit exactly once, in registration order
//!
//! # Design Decisions
//! - Lookups are lock-free reads (DashMap); registration order is kept
//!   separately since the map has none
//! - Aliases always point at a canonical name, never at another alias
//! - No map guard is held across an await

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;

use crate::app::App;
use crate::error::{Error, Result};
use crate::units::unit::{Unit, UnitContext};

/// Units registered with an application.
#[derive(Default)]
pub struct UnitRegistry {
    units: DashMap<String, Arc<dyn Unit>>,
    aliases: DashMap<String, String>,
    order: RwLock<Vec<String>>,
    inited: AtomicBool,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `unit` under `name`, replacing any unit of that name.
    pub fn add(&self, name: impl Into<String>, unit: impl Unit) {
        self.add_arc(name, Arc::new(unit));
    }

    pub fn add_arc(&self, name: impl Into<String>, unit: Arc<dyn Unit>) {
        let name = name.into();
        if self.units.insert(name.clone(), unit).is_some() {
            tracing::debug!(unit = %name, "Unit replaced");
        } else {
            self.order
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(name.clone());
            tracing::debug!(unit = %name, "Unit registered");
        }
        self.aliases.remove(&name);
    }

    /// Registers every `(name, unit)` pair of `bag`.
    pub fn add_all<I, S>(&self, bag: I)
    where
        I: IntoIterator<Item = (S, Arc<dyn Unit>)>,
        S: Into<String>,
    {
        for (name, unit) in bag {
            self.add_arc(name, unit);
        }
    }

    /// Returns the unit named `name`, following aliases.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Unit>> {
        self.get(name)
            .ok_or_else(|| Error::UnitNotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Unit>> {
        if let Some(unit) = self.units.get(name) {
            return Some(unit.value().clone());
        }
        let target = self.aliases.get(name)?.value().clone();
        self.units.get(&target).map(|unit| unit.value().clone())
    }

    /// Makes `name` another name for the unit `target` resolves to.
    pub fn alias(&self, name: impl Into<String>, target: &str) -> Result<()> {
        let name = name.into();
        let canonical = self.canonical(target)?;
        if name == canonical {
            return Ok(());
        }
        tracing::debug!(alias = %name, target = %canonical, "Unit alias set");
        self.aliases.insert(name, canonical);
        Ok(())
    }

    fn canonical(&self, name: &str) -> Result<String> {
        if self.units.contains_key(name) {
            return Ok(name.to_string());
        }
        self.aliases
            .get(name)
            .map(|target| target.value().clone())
            .ok_or_else(|| Error::UnitNotFound(name.to_string()))
    }

    /// Runs every unit's `init` once, in registration order.
    ///
    /// Units registered while this runs are initialized too. Stops at the
    /// first failure.
    pub async fn init_all(&self, app: &App) -> Result<()> {
        let mut next = 0;
        loop {
            let name = {
                let order = self.order.read().unwrap_or_else(PoisonError::into_inner);
                match order.get(next) {
                    Some(name) => name.clone(),
                    None => break,
                }
            };
            next += 1;

            let Some(unit) = self.units.get(&name).map(|u| u.value().clone()) else {
                continue;
            };
            tracing::debug!(unit = %name, "Initializing unit");
            unit.init(UnitContext { app, name: &name }).await?;
        }

        self.inited.store(true, Ordering::Release);
        tracing::debug!(count = next, "Units initialized");
        Ok(())
    }

    /// Calls `f` with each unit in registration order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Arc<dyn Unit>),
    {
        for name in self.names() {
            if let Some(unit) = self.units.get(&name).map(|u| u.value().clone()) {
                f(&name, &unit);
            }
        }
    }

    /// Unit names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.order
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `(alias, target)` pairs, sorted by alias.
    pub fn aliases(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self
            .aliases
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        pairs.sort();
        pairs
    }

    /// True once `init_all` has completed.
    pub fn is_inited(&self) -> bool {
        self.inited.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl std::fmt::Debug for UnitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitRegistry")
            .field("units", &self.names())
            .field("aliases", &self.aliases())
            .field("inited", &self.is_inited())
            .finish()
    }
}
