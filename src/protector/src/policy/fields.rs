//! Lazily resolved field universe of a protected type

use crate::error::{ProtectorError, Result};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Deferred source of field names (typically schema introspection)
pub type FieldProvider = dyn Fn() -> anyhow::Result<Vec<String>> + Send + Sync;

/// Ordered field names known for a protected type
///
/// The provider runs on first use. A successful result is kept for the
/// lifetime of the universe; a failure is returned to the caller and the
/// provider is tried again on the next lookup.
pub struct FieldUniverse {
    provider: Arc<FieldProvider>,
    resolved: OnceCell<Vec<String>>,
}

impl FieldUniverse {
    /// Create a universe backed by `provider`
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        Self {
            provider: Arc::new(provider),
            resolved: OnceCell::new(),
        }
    }

    /// Create an already-resolved universe
    pub fn fixed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let shared = names.clone();

        Self {
            provider: Arc::new(move || Ok(shared.clone())),
            resolved: OnceCell::with_value(names),
        }
    }

    /// Universe without any field
    pub fn empty() -> Self {
        Self::fixed(Vec::<String>::new())
    }

    /// Field names, resolving them on first call
    pub fn names(&self) -> Result<&[String]> {
        self.resolved
            .get_or_try_init(|| {
                let names = (self.provider)().map_err(ProtectorError::MissingFieldUniverse)?;
                debug!(fields = names.len(), "Resolved field universe");
                Ok::<_, ProtectorError>(names)
            })
            .map(Vec::as_slice)
    }

    /// Whether the provider already produced a result
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Same provider with an empty cache
    pub(crate) fn unresolved_copy(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            resolved: OnceCell::new(),
        }
    }
}

impl fmt::Debug for FieldUniverse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldUniverse")
            .field("resolved", &self.resolved.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_provider_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let universe = FieldUniverse::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["title".to_string(), "body".to_string()])
        });

        assert!(!universe.is_resolved());
        assert_eq!(universe.names().unwrap(), ["title", "body"]);
        assert_eq!(universe.names().unwrap(), ["title", "body"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(universe.is_resolved());
    }

    #[test]
    fn test_failure_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let universe = FieldUniverse::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("schema not loaded");
            }
            Ok(vec!["id".to_string()])
        });

        let err = universe.names().unwrap_err();
        assert!(matches!(err, ProtectorError::MissingFieldUniverse(_)));
        assert!(err.to_string().contains("schema not loaded"));

        assert_eq!(universe.names().unwrap(), ["id"]);
    }

    #[test]
    fn test_unresolved_copy_shares_provider() {
        let universe = FieldUniverse::fixed(["a", "b"]);
        assert!(universe.is_resolved());

        let copy = universe.unresolved_copy();
        assert!(!copy.is_resolved());
        assert_eq!(copy.names().unwrap(), ["a", "b"]);
    }
}
