//! Rule closures with declared arity

use crate::engine::Dsl;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Rule that ignores both actor and entity
pub type NullaryFn<R> = dyn for<'d> Fn(&mut Dsl<'d, R>) -> Result<()> + Send + Sync;

/// Rule that looks at the actor only
pub type UnaryFn<A, R> = dyn for<'d> Fn(&mut Dsl<'d, R>, &A) -> Result<()> + Send + Sync;

/// Rule that looks at the actor and the entity
pub type BinaryFn<A, E, R> = dyn for<'d> Fn(&mut Dsl<'d, R>, &A, &E) -> Result<()> + Send + Sync;

/// A unit of policy logic
///
/// The variant records how many of `(actor, entity)` the closure takes; the
/// evaluator passes exactly that prefix.
pub enum Rule<A, E, R = ()> {
    Nullary(Arc<NullaryFn<R>>),
    Unary(Arc<UnaryFn<A, R>>),
    Binary(Arc<BinaryFn<A, E, R>>),
}

impl<A, E, R> Rule<A, E, R> {
    /// Rule taking no context
    pub fn nullary<F>(f: F) -> Self
    where
        F: Fn(&mut Dsl<'_, R>) -> Result<()> + Send + Sync + 'static,
    {
        Rule::Nullary(Arc::new(f))
    }

    /// Rule taking the actor
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(&mut Dsl<'_, R>, &A) -> Result<()> + Send + Sync + 'static,
    {
        Rule::Unary(Arc::new(f))
    }

    /// Rule taking the actor and the entity
    pub fn binary<F>(f: F) -> Self
    where
        F: Fn(&mut Dsl<'_, R>, &A, &E) -> Result<()> + Send + Sync + 'static,
    {
        Rule::Binary(Arc::new(f))
    }

    /// Number of context values the rule receives
    pub fn arity(&self) -> usize {
        match self {
            Rule::Nullary(_) => 0,
            Rule::Unary(_) => 1,
            Rule::Binary(_) => 2,
        }
    }

    pub(crate) fn invoke(&self, dsl: &mut Dsl<'_, R>, actor: &A, entity: &E) -> Result<()> {
        match self {
            Rule::Nullary(f) => f(dsl),
            Rule::Unary(f) => f(dsl, actor),
            Rule::Binary(f) => f(dsl, actor, entity),
        }
    }
}

impl<A, E, R> Clone for Rule<A, E, R> {
    fn clone(&self) -> Self {
        match self {
            Rule::Nullary(f) => Rule::Nullary(Arc::clone(f)),
            Rule::Unary(f) => Rule::Unary(Arc::clone(f)),
            Rule::Binary(f) => Rule::Binary(Arc::clone(f)),
        }
    }
}

impl<A, E, R> fmt::Debug for Rule<A, E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("arity", &self.arity()).finish()
    }
}
