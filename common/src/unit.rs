//! Marker types for typed [`DateTimeOf`] values.
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Moment an entity was created.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Moment an entity was last modified.
#[derive(Clone, Copy, Debug)]
pub struct Modification;
