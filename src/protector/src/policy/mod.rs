//! Rule sets: ordered policy closures attached to a protected type
//!
//! A [`RuleSet`] owns the rules declared for one protected type and the
//! type's field universe. Rules are only ever appended; once a rule set is
//! shared it is treated as read-only, which makes concurrent evaluation
//! lock-free.
//!
//! # Example
//!
//! ```
//! use protector::policy::RuleSet;
//!
//! struct User { admin: bool }
//! struct Post { author: String }
//!
//! let mut rules: RuleSet<User, Post> = RuleSet::with_fields(["title", "body", "author"]);
//! rules.protect(|dsl, user, _post| {
//!     dsl.can("read", ["title", "body"])?;
//!     if user.admin {
//!         dsl.can_all("update")?;
//!     }
//!     Ok(())
//! });
//!
//! let post = Post { author: "alice".into() };
//! let boundary = rules.evaluate(&User { admin: false }, &post).unwrap();
//! assert!(boundary.can_field("read", "title"));
//! assert!(!boundary.updatable());
//! ```

pub mod action;
pub mod fields;
pub mod registry;
pub mod rule;

pub use fields::{FieldProvider, FieldUniverse};
pub use registry::PolicyRegistry;
pub use rule::Rule;

use crate::boundary::Boundary;
use crate::config::{self, ProtectorConfig};
use crate::engine::{Dsl, Evaluator};
use crate::error::Result;

/// Ordered rules and field universe of a protected type
///
/// `A` is the actor type, `E` the protected entity type and `R` the type of
/// the relation produced by `scope`.
pub struct RuleSet<A, E, R = ()> {
    rules: Vec<Rule<A, E, R>>,
    fields: FieldUniverse,
    config: Option<ProtectorConfig>,
}

impl<A, E, R> RuleSet<A, E, R> {
    /// Create a rule set whose field names come from `provider`
    ///
    /// The provider is not called until a wildcard grant needs it.
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        Self::from_universe(FieldUniverse::new(provider))
    }

    /// Create a rule set over a fixed list of field names
    pub fn with_fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_universe(FieldUniverse::fixed(names))
    }

    /// Create a rule set over an existing universe
    pub fn from_universe(fields: FieldUniverse) -> Self {
        Self {
            rules: Vec::new(),
            fields,
            config: None,
        }
    }

    /// Start a rule set for a derived type
    ///
    /// The new set begins with all of `parent`'s rules, in order, and the
    /// parent's field provider (resolved again for the child). Rules added
    /// afterwards run after the inherited ones.
    pub fn inheriting(parent: &Self) -> Self {
        Self {
            rules: parent.rules.clone(),
            fields: parent.fields.unresolved_copy(),
            config: parent.config,
        }
    }

    /// Pin a configuration for this rule set instead of the global one
    pub fn with_config(mut self, config: ProtectorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Configuration used when evaluating this rule set
    pub fn config(&self) -> ProtectorConfig {
        self.config.unwrap_or_else(config::global)
    }

    /// Append a rule
    pub fn add_rule(&mut self, rule: Rule<A, E, R>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Append a rule over actor and entity
    pub fn protect<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Dsl<'_, R>, &A, &E) -> Result<()> + Send + Sync + 'static,
    {
        self.add_rule(Rule::binary(f))
    }

    /// Append a rule over the actor only
    pub fn protect_actor<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Dsl<'_, R>, &A) -> Result<()> + Send + Sync + 'static,
    {
        self.add_rule(Rule::unary(f))
    }

    /// Append a rule that applies to everyone
    pub fn protect_all<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Dsl<'_, R>) -> Result<()> + Send + Sync + 'static,
    {
        self.add_rule(Rule::nullary(f))
    }

    /// Rules in registration order
    pub fn rules(&self) -> &[Rule<A, E, R>] {
        &self.rules
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule was registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Field universe of the protected type
    pub fn fields(&self) -> &FieldUniverse {
        &self.fields
    }

    /// Field names, resolved and memoized on first call
    pub fn field_names(&self) -> Result<&[String]> {
        self.fields.names()
    }

    /// Evaluate every rule for `actor` and `entity`
    pub fn evaluate(&self, actor: &A, entity: &E) -> Result<Boundary<R>> {
        Evaluator::new(self).evaluate(actor, entity)
    }
}

impl<A, E, R> std::fmt::Debug for RuleSet<A, E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .field("fields", &self.fields)
            .field("config", &self.config)
            .finish()
    }
}
