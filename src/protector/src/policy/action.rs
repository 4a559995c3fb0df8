//! Action names and the alias table

use crate::error::{ProtectorError, Result};
use tracing::warn;

/// Read access to fields
pub const READ: &str = "read";

/// Update of existing fields
pub const UPDATE: &str = "update";

/// Creation with the given fields
pub const CREATE: &str = "create";

/// Destruction of the whole entity
pub const DESTROY: &str = "destroy";

/// Deprecated spelling of [`READ`]
pub const VIEW: &str = "view";

/// Deprecated action names and their replacements
const ALIASES: &[(&str, &str)] = &[(VIEW, READ)];

/// Resolve an action name through the alias table
///
/// Custom actions pass through unchanged.
pub fn resolve(action: &str) -> &str {
    if let Some(&(alias, target)) = ALIASES.iter().find(|(alias, _)| *alias == action) {
        warn!(
            alias,
            action = target,
            "Action '{}' is deprecated, use '{}' instead",
            alias,
            target
        );
        return target;
    }
    action
}

/// Resolve and validate an action name used in a grant or revocation
pub(crate) fn normalize(action: &str) -> Result<&str> {
    if action.trim().is_empty() {
        return Err(ProtectorError::InvalidAction(
            "action name cannot be empty".to_string(),
        ));
    }
    Ok(resolve(action))
}
