//! Per-type rule set registry
//!
//! Gives every protected type one stable, shared [`RuleSet`]. Entries are
//! keyed by the full rule set type, so `RuleSet<User, Post>` and
//! `RuleSet<User, Comment>` live side by side.

use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::{debug, warn};

use super::RuleSet;

type Entry = Arc<dyn Any + Send + Sync>;

/// Thread-safe registry of rule sets
///
/// # Examples
///
/// ```
/// use protector::policy::{PolicyRegistry, RuleSet};
///
/// struct Admin;
/// struct Invoice;
///
/// let registry = PolicyRegistry::new();
/// registry.register(RuleSet::<Admin, Invoice>::with_fields(["total"]));
///
/// let rules = registry.get::<Admin, Invoice, ()>().unwrap();
/// assert_eq!(rules.field_names().unwrap(), ["total"]);
/// ```
#[derive(Default)]
pub struct PolicyRegistry {
    rule_sets: DashMap<TypeId, Entry>,
}

impl PolicyRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rule_set` for its entity type, replacing any previous one
    pub fn register<A, E, R>(&self, rule_set: RuleSet<A, E, R>) -> Arc<RuleSet<A, E, R>>
    where
        A: 'static,
        E: 'static,
        R: 'static,
    {
        let shared = Arc::new(rule_set);
        let key = TypeId::of::<RuleSet<A, E, R>>();

        if self.rule_sets.insert(key, shared.clone() as Entry).is_some() {
            warn!(
                rule_set = std::any::type_name::<RuleSet<A, E, R>>(),
                "Replaced previously registered rule set"
            );
        } else {
            debug!(
                rule_set = std::any::type_name::<RuleSet<A, E, R>>(),
                rules = shared.len(),
                "Registered rule set"
            );
        }

        shared
    }

    /// Returns the rule set registered for this type combination
    pub fn get<A, E, R>(&self) -> Option<Arc<RuleSet<A, E, R>>>
    where
        A: 'static,
        E: 'static,
        R: 'static,
    {
        let entry = self
            .rule_sets
            .get(&TypeId::of::<RuleSet<A, E, R>>())
            .map(|entry| Arc::clone(entry.value()))?;

        entry.downcast::<RuleSet<A, E, R>>().ok()
    }

    /// Returns the registered rule set, building it with `init` on first use
    ///
    /// `init` runs outside the registry's locks, so it may consult the
    /// registry itself. When two threads race, the first insert wins and
    /// both receive the same instance.
    pub fn get_or_register_with<A, E, R, F>(&self, init: F) -> Arc<RuleSet<A, E, R>>
    where
        A: 'static,
        E: 'static,
        R: 'static,
        F: FnOnce() -> RuleSet<A, E, R>,
    {
        if let Some(existing) = self.get::<A, E, R>() {
            return existing;
        }

        let built = Arc::new(init());
        let stored = self
            .rule_sets
            .entry(TypeId::of::<RuleSet<A, E, R>>())
            .or_insert_with(|| built.clone() as Entry)
            .value()
            .clone();

        match stored.downcast::<RuleSet<A, E, R>>() {
            Ok(rule_set) => rule_set,
            Err(_) => {
                warn!(
                    rule_set = std::any::type_name::<RuleSet<A, E, R>>(),
                    "Registry entry has an unexpected type, using the freshly built rule set"
                );
                built
            }
        }
    }

    /// Whether a rule set is registered for this type combination
    pub fn contains<A, E, R>(&self) -> bool
    where
        A: 'static,
        E: 'static,
        R: 'static,
    {
        self.rule_sets.contains_key(&TypeId::of::<RuleSet<A, E, R>>())
    }

    /// Number of registered rule sets
    pub fn len(&self) -> usize {
        self.rule_sets.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.rule_sets.is_empty()
    }
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("rule_sets", &self.rule_sets.len())
            .finish()
    }
}
