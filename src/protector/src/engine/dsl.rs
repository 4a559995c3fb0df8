//! Rule DSL: the accumulation context rules write into

use crate::boundary::condition::{Conditions, PermissionCondition};
use crate::boundary::{Access, FieldPermissions};
use crate::error::{ProtectorError, Result};
use crate::policy::action;
use crate::policy::FieldUniverse;
use tracing::trace;

/// Mutable accumulator handed to every rule during one evaluation
///
/// Grants and revocations apply in call order. Nothing here is visible to
/// callers until the evaluator freezes it into a
/// [`Boundary`](crate::boundary::Boundary).
pub struct Dsl<'a, R> {
    fields: &'a FieldUniverse,
    access: Access,
    relation: Option<R>,
    scope_was_set: bool,
}

impl<'a, R> Dsl<'a, R> {
    pub(crate) fn new(fields: &'a FieldUniverse) -> Self {
        Self {
            fields,
            access: Access::new(),
            relation: None,
            scope_was_set: false,
        }
    }

    /// Grant `action` on `fields`
    ///
    /// An empty field list grants every field of the universe known at the
    /// time of the call.
    pub fn can<I, S>(&mut self, action: &str, fields: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.can_with(action, fields, Conditions::new())
    }

    /// Grant `action` on every field of the universe
    pub fn can_all(&mut self, action: &str) -> Result<&mut Self> {
        self.can_with(action, Vec::<String>::new(), Conditions::new())
    }

    /// Grant `action` on `fields` unconditionally and on each conditioned
    /// field under its condition
    ///
    /// A field named in both places takes the condition. When both lists
    /// are empty this is a wildcard grant.
    pub fn can_with<I, S>(
        &mut self,
        action: &str,
        fields: I,
        conditions: Conditions,
    ) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let action = action::normalize(action)?;
        let names: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut granted = FieldPermissions::new();

        if names.is_empty() && conditions.is_empty() {
            for name in self.fields.names()? {
                granted.insert(name.clone(), PermissionCondition::Unconditional);
            }
            trace!(action, fields = granted.len(), "Wildcard grant");
        } else {
            for name in names {
                ensure_field_name(&name)?;
                granted.insert(name, PermissionCondition::Unconditional);
            }
            for (name, value) in conditions.into_entries() {
                ensure_field_name(&name)?;
                let condition = value.into_condition(&name)?;
                granted.insert(name, condition);
            }
            trace!(action, fields = granted.len(), "Field grant");
        }

        self.access.entry(action.to_string()).or_default().extend(granted);
        Ok(self)
    }

    /// Revoke `fields` from `action`, or the whole action when `fields` is
    /// empty. Revoking what was never granted does nothing.
    pub fn cannot<I, S>(&mut self, action: &str, fields: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let action = action::normalize(action)?;
        let names: Vec<String> = fields.into_iter().map(Into::into).collect();

        if names.is_empty() {
            if self.access.shift_remove(action).is_some() {
                trace!(action, "Revoked action");
            }
            return Ok(self);
        }

        if let Some(permissions) = self.access.get_mut(action) {
            for name in &names {
                permissions.shift_remove(name.as_str());
            }
            trace!(action, fields = names.len(), "Revoked fields");
        }

        Ok(self)
    }

    /// Revoke the whole action
    pub fn cannot_all(&mut self, action: &str) -> Result<&mut Self> {
        self.cannot(action, Vec::<String>::new())
    }

    /// Set the relation callers should scope data to
    ///
    /// The last call wins.
    pub fn scope<F>(&mut self, relation: F) -> &mut Self
    where
        F: FnOnce() -> R,
    {
        self.relation = Some(relation());
        self.scope_was_set = true;
        trace!("Scope set");
        self
    }

    /// Field universe of the protected type
    pub fn field_names(&self) -> Result<&'a [String]> {
        self.fields.names()
    }

    /// Whether the accumulated grants currently include `action`
    pub fn is_granted(&self, action: &str) -> bool {
        self.access
            .get(action::resolve(action))
            .is_some_and(|permissions| !permissions.is_empty())
    }

    /// Hand the accumulated state over to the evaluator
    pub(crate) fn finish(self) -> (Access, Option<R>, bool) {
        (self.access, self.relation, self.scope_was_set)
    }
}

fn ensure_field_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ProtectorError::InvalidCondition {
            field: name.to_string(),
            reason: "field name cannot be empty".to_string(),
        });
    }
    Ok(())
}
