//! Error types for the `toolgate-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

use toolgate_types::{CellPos, ItemId};

/// Errors that can occur while building catalogs or mutating the map.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A definition with the same name is already registered.
    #[error("duplicate {kind} definition: {name}")]
    DuplicateDef {
        /// The definition table (stat, thing, material, job, work giver).
        kind: &'static str,
        /// The colliding name.
        name: String,
    },

    /// A definition referenced by name does not exist.
    #[error("unknown {kind} definition: {name}")]
    UnknownDef {
        /// The definition table that was searched.
        kind: &'static str,
        /// The missing name.
        name: String,
    },

    /// A definition table ran out of `u32` handles.
    #[error("too many {kind} definitions")]
    TooManyDefs {
        /// The full definition table.
        kind: &'static str,
    },

    /// A cell lies outside the map bounds.
    #[error("cell {0} is outside the map")]
    OutOfBounds(CellPos),

    /// An item was placed twice.
    #[error("item {0} is already on the map")]
    DuplicateItem(ItemId),

    /// An item was not found on the map.
    #[error("item {0} is not on the map")]
    ItemNotFound(ItemId),
}
