// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(RowId);
entity_id!(SearchRequestId);

/// Hands out row ids from a counter that only moves forward, so an id
/// held by a stale event can never name a newer row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowIdAllocator {
    next: u64,
}

impl RowIdAllocator {
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    pub fn allocate(&mut self) -> RowId {
        let id = RowId::new(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    #[cfg(test)]
    pub(crate) const fn peek(&self) -> RowId {
        RowId::new(self.next)
    }
}
