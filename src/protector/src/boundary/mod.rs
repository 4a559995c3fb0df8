//! Evaluation results
//!
//! A [`Boundary`] is the frozen outcome of evaluating a rule set for one
//! (actor, entity) pair: which actions are allowed, on which fields, under
//! which conditions, and which relation the data is scoped to.

pub mod condition;


pub use condition::{ConditionKind, ConditionValue, Conditions, PermissionCondition};

use crate::policy::action;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

/// Granted fields of one action, with their conditions
pub type FieldPermissions = IndexMap<String, PermissionCondition>;

/// Granted actions, keyed by resolved action name
pub type Access = IndexMap<String, FieldPermissions>;

/// Proposed field values for create/update checks, in caller order
pub type FieldValues = IndexMap<String, Value>;

/// Immutable permission snapshot
///
/// Every granted action has at least one field. An action that is absent is
/// wholly denied.
#[derive(Debug, Clone)]
pub struct Boundary<R = ()> {
    access: Access,
    relation: Option<R>,
    scoped: bool,
}

impl<R> Boundary<R> {
    pub(crate) fn new(mut access: Access, relation: Option<R>, scoped: bool) -> Self {
        access.retain(|_, fields| !fields.is_empty());
        Self {
            access,
            relation,
            scoped,
        }
    }

    /// Granted actions and fields
    pub fn access(&self) -> &Access {
        &self.access
    }

    /// Relation set by the last `scope` call, if any
    pub fn relation(&self) -> Option<&R> {
        self.relation.as_ref()
    }

    /// Take the relation out of the boundary
    pub fn into_relation(self) -> Option<R> {
        self.relation
    }

    /// Whether callers must restrict data to [`Boundary::relation`]
    ///
    /// True when a rule called `scope`, or when paranoid mode was on.
    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    /// Whether any field of `action` is granted
    pub fn can(&self, action: &str) -> bool {
        self.permissions(action)
            .is_some_and(|fields| !fields.is_empty())
    }

    /// Whether `field` is granted for `action`, whatever its condition
    pub fn can_field(&self, action: &str, field: &str) -> bool {
        self.permissions(action)
            .is_some_and(|fields| fields.contains_key(field))
    }

    /// Whether `field` may be read
    pub fn readable(&self, field: &str) -> bool {
        self.can_field(action::READ, field)
    }

    /// Whether the entity may be destroyed
    pub fn destroyable(&self) -> bool {
        self.can(action::DESTROY)
    }

    /// Whether any field may be updated
    pub fn updatable(&self) -> bool {
        self.can(action::UPDATE)
    }

    /// Whether every proposed value may be written by an update
    pub fn updatable_with<'v, I, K>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = (&'v K, &'v Value)>,
        K: AsRef<str> + ?Sized + 'v,
    {
        self.modifiable(action::UPDATE, values)
    }

    /// Whether an entity may be created
    pub fn creatable(&self) -> bool {
        self.can(action::CREATE)
    }

    /// Whether every proposed value may be written on create
    pub fn creatable_with<'v, I, K>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = (&'v K, &'v Value)>,
        K: AsRef<str> + ?Sized + 'v,
    {
        self.modifiable(action::CREATE, values)
    }

    /// First proposed field, in input order, an update may not write
    pub fn first_unupdatable_field<'v, I, K>(&self, values: I) -> Option<&'v str>
    where
        I: IntoIterator<Item = (&'v K, &'v Value)>,
        K: AsRef<str> + ?Sized + 'v,
    {
        self.first_unmodifiable_field(action::UPDATE, values)
    }

    /// First proposed field, in input order, a create may not write
    pub fn first_uncreatable_field<'v, I, K>(&self, values: I) -> Option<&'v str>
    where
        I: IntoIterator<Item = (&'v K, &'v Value)>,
        K: AsRef<str> + ?Sized + 'v,
    {
        self.first_unmodifiable_field(action::CREATE, values)
    }

    /// Condition stored for `field` under `action`
    pub fn condition(&self, action: &str, field: &str) -> Option<&PermissionCondition> {
        self.permissions(action)?.get(field)
    }

    /// Granted fields of `action`, in grant order
    pub fn permitted_fields(&self, action: &str) -> Vec<&str> {
        self.permissions(action)
            .map(|fields| fields.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Copy of `values` without the fields that may not be read
    pub fn filter_readable<'v, I, K>(&self, values: I) -> FieldValues
    where
        I: IntoIterator<Item = (&'v K, &'v Value)>,
        K: AsRef<str> + ?Sized + 'v,
    {
        values
            .into_iter()
            .map(|(field, value)| (AsRef::<str>::as_ref(field), value))
            .filter(|(field, _)| self.readable(field))
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect()
    }

    /// Serializable summary of the granted actions
    pub fn describe(&self) -> Vec<ActionSummary> {
        self.access
            .iter()
            .map(|(action, fields)| ActionSummary {
                action: action.clone(),
                fields: fields
                    .iter()
                    .map(|(field, condition)| FieldSummary {
                        field: field.clone(),
                        condition: condition.kind(),
                    })
                    .collect(),
            })
            .collect()
    }

    fn permissions(&self, action: &str) -> Option<&FieldPermissions> {
        self.access.get(action::resolve(action))
    }

    fn modifiable<'v, I, K>(&self, action: &str, values: I) -> bool
    where
        I: IntoIterator<Item = (&'v K, &'v Value)>,
        K: AsRef<str> + ?Sized + 'v,
    {
        let Some(fields) = self.permissions(action) else {
            return false;
        };

        values
            .into_iter()
            .all(|(field, value)| field_permits(fields, action, AsRef::<str>::as_ref(field), value))
    }

    fn first_unmodifiable_field<'v, I, K>(&self, action: &str, values: I) -> Option<&'v str>
    where
        I: IntoIterator<Item = (&'v K, &'v Value)>,
        K: AsRef<str> + ?Sized + 'v,
    {
        let fields = self.permissions(action);

        values
            .into_iter()
            .map(|(field, value)| (AsRef::<str>::as_ref(field), value))
            .find(|(field, value)| {
                !fields.is_some_and(|fields| field_permits(fields, action, field, value))
            })
            .map(|(field, _)| field)
    }
}

fn field_permits(fields: &FieldPermissions, action: &str, field: &str, value: &Value) -> bool {
    let permitted = fields
        .get(field)
        .is_some_and(|condition| condition.permits(value));
    trace!(action, field, permitted, "Checked proposed value");
    permitted
}

/// Summary of one granted action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSummary {
    /// Resolved action name
    pub action: String,

    /// Granted fields in grant order
    pub fields: Vec<FieldSummary>,
}

/// Summary of one granted field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSummary {
    /// Field name
    pub field: String,

    /// Shape of the attached condition
    pub condition: ConditionKind,
}
