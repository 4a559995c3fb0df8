//! Restriction context
//!
//! A protected instance may carry a *subject*: the actor it is currently
//! restricted under. Rules consult [`Restriction::is_actively_restricted`]
//! to decide whether defensive logic applies, and [`insecure`] suppresses
//! that answer for nested lookups.
//!
//! # Example
//!
//! ```
//! use protector::restriction::{insecure, Restriction};
//!
//! let mut restriction: Restriction<Option<&str>> = Restriction::new();
//! assert!(restriction.subject().is_err());
//!
//! restriction.restrict(None);
//! assert_eq!(restriction.subject().unwrap(), &None);
//! assert!(restriction.is_actively_restricted());
//!
//! insecure::run_insecurely(|| assert!(!restriction.is_actively_restricted()));
//! ```

pub mod insecure;


pub use insecure::{run_insecurely, InsecureGuard};

use crate::boundary::Boundary;
use crate::error::{ProtectorError, Result};
use crate::policy::RuleSet;

/// Attachment state of a protected instance
///
/// `Restricted` may hold a "null" actor (for instance `None` when the actor
/// type is an `Option`), which is distinct from never being restricted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestrictionState<A> {
    /// No subject was ever attached, or it was detached
    Unrestricted,
    /// A subject is attached
    Restricted(A),
}

impl<A> Default for RestrictionState<A> {
    fn default() -> Self {
        RestrictionState::Unrestricted
    }
}

/// Per-instance restriction holder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction<A> {
    state: RestrictionState<A>,
}

impl<A> Default for Restriction<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Restriction<A> {
    /// Create an unrestricted holder
    pub fn new() -> Self {
        Self {
            state: RestrictionState::Unrestricted,
        }
    }

    /// Attach `actor` as the subject, replacing any previous one
    pub fn restrict(&mut self, actor: A) -> &mut Self {
        self.state = RestrictionState::Restricted(actor);
        self
    }

    /// Detach the subject. Idempotent.
    pub fn unrestrict(&mut self) -> &mut Self {
        self.state = RestrictionState::Unrestricted;
        self
    }

    /// The attached subject
    ///
    /// Fails with [`ProtectorError::Unrestricted`] when nothing is attached,
    /// whether or not insecure mode is active.
    pub fn subject(&self) -> Result<&A> {
        match &self.state {
            RestrictionState::Restricted(actor) => Ok(actor),
            RestrictionState::Unrestricted => Err(ProtectorError::Unrestricted),
        }
    }

    /// Whether a subject is attached, ignoring insecure mode
    pub fn is_restricted(&self) -> bool {
        matches!(self.state, RestrictionState::Restricted(_))
    }

    /// Whether a subject is attached and insecure mode is off on this thread
    pub fn is_actively_restricted(&self) -> bool {
        self.is_restricted() && !insecure::is_insecure()
    }

    /// Raw attachment state
    pub fn state(&self) -> &RestrictionState<A> {
        &self.state
    }
}

/// A host entity that can be restricted under an actor
///
/// Implementors only expose their [`Restriction`]; everything else has a
/// default implementation.
pub trait Protected: Sized {
    /// Actor type the entity is restricted under
    type Actor;

    /// Restriction holder of this instance
    fn restriction(&self) -> &Restriction<Self::Actor>;

    /// Mutable restriction holder of this instance
    fn restriction_mut(&mut self) -> &mut Restriction<Self::Actor>;

    /// Attach `actor` as subject
    fn restrict(&mut self, actor: Self::Actor) -> &mut Self {
        self.restriction_mut().restrict(actor);
        self
    }

    /// Consuming variant of [`Protected::restrict`]
    fn restricted_to(mut self, actor: Self::Actor) -> Self {
        self.restriction_mut().restrict(actor);
        self
    }

    /// Detach the subject
    fn unrestrict(&mut self) -> &mut Self {
        self.restriction_mut().unrestrict();
        self
    }

    /// The attached subject, or [`ProtectorError::Unrestricted`]
    fn subject(&self) -> Result<&Self::Actor> {
        self.restriction().subject()
    }

    /// Whether a subject is attached
    fn is_restricted(&self) -> bool {
        self.restriction().is_restricted()
    }

    /// Whether a subject is attached and insecure mode is off
    fn is_actively_restricted(&self) -> bool {
        self.restriction().is_actively_restricted()
    }

    /// Evaluate `rules` for this instance under its attached subject
    fn boundary<R>(&self, rules: &RuleSet<Self::Actor, Self, R>) -> Result<Boundary<R>> {
        let subject = self.subject()?;
        rules.evaluate(subject, self)
    }
}
