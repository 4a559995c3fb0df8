//! # Protector
//!
//! Field- and action-granular access control for application entities.
//!
//! ## Features
//!
//! - **Ordered rule sets** declared per protected type
//! - **Field-level grants** with per-field conditions (value, range, predicate)
//! - **Selective revocation** of fields or whole actions
//! - **Wildcard grants** expanded over a lazily resolved field universe
//! - **Data scoping** through an opaque, rule-provided relation
//! - **Restriction context** with nestable insecure mode to stop recursive checks
//! - **Paranoid mode** treating unscoped data as restricted
//!
//! ## Example
//!
//! ```rust
//! use protector::{Conditions, RuleSet};
//! use serde_json::json;
//!
//! struct User { id: u64, admin: bool }
//! struct Post { author_id: u64 }
//!
//! let mut rules: RuleSet<User, Post, &'static str> =
//!     RuleSet::with_fields(["title", "body", "status", "author_id"]);
//!
//! rules.protect(|dsl, user, post| {
//!     dsl.can("read", ["title", "body"])?;
//!     if user.admin {
//!         dsl.can_all("update")?.can_all("destroy")?;
//!     } else if post.author_id == user.id {
//!         dsl.can_with(
//!             "update",
//!             ["title", "body"],
//!             Conditions::new().equals("status", "draft"),
//!         )?;
//!     } else {
//!         dsl.scope(|| "published");
//!     }
//!     Ok(())
//! });
//!
//! let author = User { id: 1, admin: false };
//! let boundary = rules.evaluate(&author, &Post { author_id: 1 })?;
//!
//! let mut change = protector::FieldValues::new();
//! change.insert("status".into(), json!("published"));
//! assert!(!boundary.updatable_with(&change));
//! assert_eq!(boundary.first_unupdatable_field(&change), Some("status"));
//! assert!(!boundary.destroyable());
//! # Ok::<(), protector::ProtectorError>(())
//! ```

pub mod boundary;
pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod restriction;

// Re-export commonly used types
pub use boundary::{
    Access, ActionSummary, Boundary, ConditionKind, ConditionValue, Conditions, FieldPermissions,
    FieldSummary, FieldValues, PermissionCondition,
};
pub use config::ProtectorConfig;
pub use engine::{evaluate, Dsl, Evaluator};
pub use error::{ProtectorError, Result};
pub use policy::{FieldUniverse, PolicyRegistry, Rule, RuleSet};
pub use restriction::{run_insecurely, InsecureGuard, Protected, Restriction, RestrictionState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
