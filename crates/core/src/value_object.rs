//! Value object trait: equality by value, not identity.

/// Marker trait for analysis outputs.
///
/// Every result produced by the analyzers is a value object: it is built once
/// per call, never mutated afterwards, and two results with the same fields
/// are interchangeable. Requiring `Send + Sync` lets callers hand results to
/// other threads (dashboards, chat handlers) without wrapping them.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Margin {
///     percent: f64,
/// }
///
/// impl ValueObject for Margin {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug + Send + Sync {}
