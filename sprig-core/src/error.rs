//! Error types.
//!
//! The reactive layer never fails hard: the two conditions below are
//! reported as diagnostics and the operation degrades to a no-op. Strict
//! callers can observe them through the `try_*` variants.

use thiserror::Error;

use crate::value::Key;

/// A non-fatal condition raised by the reactive wrapper layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A non-composite value was passed where an object or array is required.
    #[error("cannot wrap {found}: target must be an object or array")]
    InvalidTarget { found: &'static str },

    /// A write was attempted through a read-only wrapper.
    #[error("set on key `{key}` failed: target is readonly")]
    ReadonlyWrite { key: Key },
}
