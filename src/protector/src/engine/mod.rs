//! Rule evaluation engine
//!
//! Runs every rule of a [`RuleSet`] against one (actor, entity) pair and
//! freezes the result into a [`Boundary`].
//!
//! # Architecture
//!
//! ```text
//! (actor, entity) → Evaluator → rule₁ … ruleₙ → Dsl (accumulator) → Boundary
//!                                   ↑                   ↑
//!                            arity dispatch       field universe
//! ```

pub mod dsl;

pub use dsl::Dsl;

use crate::boundary::Boundary;
use crate::config::ProtectorConfig;
use crate::error::Result;
use crate::policy::RuleSet;

use std::time::Instant;
use tracing::{debug, trace, warn};

/// Evaluates a rule set into boundaries
///
/// Holds no mutable state: one evaluator may serve any number of
/// evaluations, and every call produces a fresh [`Boundary`].
#[derive(Debug)]
pub struct Evaluator<'r, A, E, R = ()> {
    rule_set: &'r RuleSet<A, E, R>,
    config: ProtectorConfig,
}

impl<'r, A, E, R> Evaluator<'r, A, E, R> {
    /// Create an evaluator using the rule set's effective configuration
    pub fn new(rule_set: &'r RuleSet<A, E, R>) -> Self {
        Self {
            rule_set,
            config: rule_set.config(),
        }
    }

    /// Override the configuration for evaluations through this evaluator
    pub fn with_config(mut self, config: ProtectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Configuration in effect
    pub fn config(&self) -> &ProtectorConfig {
        &self.config
    }

    /// Run every rule for `actor` and `entity`, in registration order
    ///
    /// # Errors
    ///
    /// The first error raised by a rule (including a failing field provider
    /// during a wildcard grant) aborts the evaluation and is returned as is.
    pub fn evaluate(&self, actor: &A, entity: &E) -> Result<Boundary<R>> {
        let started = Instant::now();
        debug!(
            rules = self.rule_set.len(),
            paranoid = self.config.paranoid,
            "Evaluating rule set"
        );

        let mut dsl = Dsl::new(self.rule_set.fields());
        for (index, rule) in self.rule_set.rules().iter().enumerate() {
            trace!(rule = index, arity = rule.arity(), "Running rule");
            if let Err(err) = rule.invoke(&mut dsl, actor, entity) {
                warn!(rule = index, error = %err, "Rule failed, aborting evaluation");
                return Err(err);
            }
        }

        let (access, relation, scope_was_set) = dsl.finish();
        let scoped = scope_was_set || self.config.paranoid;
        let boundary = Boundary::new(access, relation, scoped);

        debug!(
            actions = boundary.access().len(),
            scoped,
            explicit_scope = scope_was_set,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Rule set evaluated"
        );

        Ok(boundary)
    }
}

/// Evaluate `rule_set` for `actor` and `entity`
pub fn evaluate<A, E, R>(
    rule_set: &RuleSet<A, E, R>,
    actor: &A,
    entity: &E,
) -> Result<Boundary<R>> {
    Evaluator::new(rule_set).evaluate(actor, entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtectorError;
    use crate::policy::Rule;

    #[derive(Debug)]
    struct Member {
        id: u32,
        moderator: bool,
    }

    #[derive(Debug)]
    struct Topic {
        owner_id: u32,
    }

    fn topic_rules() -> RuleSet<Member, Topic, String> {
        let mut rules: RuleSet<Member, Topic, String> =
            RuleSet::with_fields(["title", "body", "owner_id", "locked"]);
        rules
            .protect_all(|dsl| {
                dsl.can("read", ["title", "body"])?;
                Ok(())
            })
            .protect_actor(|dsl, member| {
                if member.moderator {
                    dsl.can_all("update")?.can_all("destroy")?;
                } else {
                    dsl.scope(|| "visible_topics".to_string());
                }
                Ok(())
            })
            .protect(|dsl, member, topic| {
                if topic.owner_id == member.id {
                    dsl.can("update", ["title", "body"])?;
                }
                Ok(())
            });
        rules.with_config(ProtectorConfig::default())
    }

    #[test]
    fn test_arity_dispatch_passes_context_prefix() {
        let rules = topic_rules();
        let owner = Member { id: 1, moderator: false };
        let topic = Topic { owner_id: 1 };

        let boundary = Evaluator::new(&rules).evaluate(&owner, &topic).unwrap();
        assert!(boundary.can_field("update", "title"));
        assert!(!boundary.can_field("update", "locked"));
        assert!(!boundary.destroyable());
        assert_eq!(boundary.relation().map(String::as_str), Some("visible_topics"));
        assert!(boundary.is_scoped());
    }

    #[test]
    fn test_moderator_is_not_scoped() {
        let rules = topic_rules();
        let moderator = Member { id: 2, moderator: true };

        let boundary = evaluate(&rules, &moderator, &Topic { owner_id: 1 }).unwrap();
        assert!(boundary.updatable());
        assert!(boundary.destroyable());
        assert!(boundary.relation().is_none());
        assert!(!boundary.is_scoped());

        let paranoid = Evaluator::new(&rules)
            .with_config(ProtectorConfig::new().with_paranoid(true))
            .evaluate(&moderator, &Topic { owner_id: 1 })
            .unwrap();
        assert!(paranoid.is_scoped());
        assert!(paranoid.relation().is_none());
    }

    #[test]
    fn test_rule_error_aborts_evaluation() {
        let mut rules: RuleSet<(), (), ()> = RuleSet::with_fields(["a"]);
        rules
            .add_rule(Rule::nullary(|_| Err(anyhow::anyhow!("policy backend down").into())))
            .add_rule(Rule::nullary(|_| panic!("must not run after a failing rule")));

        let err = rules.evaluate(&(), &()).unwrap_err();
        assert!(matches!(err, ProtectorError::Internal(_)));
    }

    #[test]
    fn test_each_evaluation_is_fresh() {
        let rules = topic_rules();
        let owner = Member { id: 1, moderator: false };
        let stranger = Member { id: 9, moderator: false };
        let topic = Topic { owner_id: 1 };

        let first = rules.evaluate(&owner, &topic).unwrap();
        let second = rules.evaluate(&stranger, &topic).unwrap();

        assert!(first.updatable());
        assert!(!second.updatable());
        assert!(first.updatable());
    }
}
