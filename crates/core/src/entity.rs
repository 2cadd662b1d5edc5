//! Entity trait: records whose identity is assigned by storage.

/// Minimal interface shared by persisted records.
pub trait Entity {
    /// Whether storage has assigned an identifier yet.
    fn is_saved(&self) -> bool;
}
