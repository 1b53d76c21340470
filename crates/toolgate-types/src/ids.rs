//! Type-safe identifier wrappers.
//!
//! Runtime instances (agents, items, queued jobs) carry UUID v7 identifiers
//! so they sort by creation time. Definitions loaded from the catalog (stats,
//! things, materials, jobs, work givers) use stable `u32` handles instead:
//! handles survive a catalog reload and are safe to use as cache keys.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a newtype wrapper around a catalog handle (`u32`).
macro_rules! define_handle {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Return the raw handle value.
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Return the handle as a `usize` index into catalog storage.
            pub fn index(self) -> usize {
                usize::try_from(self.0).unwrap_or(usize::MAX)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent (colonist, animal, mechanoid).
    AgentId
}

define_id! {
    /// Unique identifier for a physical item instance.
    ItemId
}

define_id! {
    /// Unique identifier for a job placed on an agent's queue.
    JobId
}

define_handle! {
    /// Handle of a stat definition (e.g. digging speed).
    StatId, "stat"
}

define_handle! {
    /// Handle of a thing definition (tool, raw material stack, ...).
    ThingDefId, "thing"
}

define_handle! {
    /// Handle of a material definition (steel, wood, granite, ...).
    MaterialId, "material"
}

define_handle! {
    /// Handle of a job definition (the concrete unit of work an agent runs).
    JobDefId, "job"
}

define_handle! {
    /// Handle of a work giver (the scanner-side producer of jobs).
    WorkGiverId, "giver"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        let a = ItemId::new();
        let b = ItemId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn handles_display_with_prefix() {
        assert_eq!(StatId(3).to_string(), "stat#3");
        assert_eq!(WorkGiverId(0).to_string(), "giver#0");
        assert_eq!(JobDefId(12).index(), 12);
    }
}
