//! Insecure mode: scoped suppression of restriction checks
//!
//! Every thread carries its own nesting counter. While the counter is above
//! zero, [`Restriction::is_actively_restricted`](super::Restriction::is_actively_restricted)
//! reports `false` for every instance on that thread. The counter is only
//! ever moved through [`InsecureGuard`], so it is released on every exit
//! path, unwinding included.

use std::cell::Cell;
use std::marker::PhantomData;
use tracing::trace;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// RAII handle holding one level of insecure mode
///
/// The guard is `!Send`: the counter it released belongs to the thread that
/// acquired it.
#[derive(Debug)]
#[must_use = "insecure mode ends as soon as the guard is dropped"]
pub struct InsecureGuard {
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for InsecureGuard {
    fn drop(&mut self) {
        // The thread-local may already be gone during thread teardown.
        let _ = DEPTH.try_with(|depth| {
            let next = depth.get().saturating_sub(1);
            depth.set(next);
            trace!(depth = next, "Left insecure block");
        });
    }
}

/// Enter one level of insecure mode on the current thread
pub fn enter() -> InsecureGuard {
    DEPTH.with(|depth| {
        let next = depth.get() + 1;
        depth.set(next);
        trace!(depth = next, "Entered insecure block");
    });

    InsecureGuard {
        _thread_bound: PhantomData,
    }
}

/// Run `f` with restriction checks suppressed on the current thread
///
/// Blocks nest: the suppression lasts until the outermost block returns.
///
/// # Examples
///
/// ```
/// use protector::restriction::insecure;
///
/// let depth = insecure::run_insecurely(|| {
///     insecure::run_insecurely(insecure::depth)
/// });
/// assert_eq!(depth, 2);
/// assert!(!insecure::is_insecure());
/// ```
pub fn run_insecurely<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    let _guard = enter();
    f()
}

/// Whether insecure mode is active on the current thread
pub fn is_insecure() -> bool {
    depth() > 0
}

/// Current nesting depth of insecure blocks on this thread
pub fn depth() -> usize {
    DEPTH.with(Cell::get)
}
