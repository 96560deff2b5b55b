//! Strongly-typed ID wrappers for all entity types
//!
//! Using newtype wrappers prevents accidentally passing a bucket ID where a
//! plan ID is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $display_prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse an ID from a full UUID string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Check whether a user-supplied identifier refers to this ID
            ///
            /// Accepts the full UUID, the short display form ("bkt-1a2b3c4d")
            /// or a bare UUID prefix of at least 4 characters.
            pub fn matches_identifier(&self, identifier: &str) -> bool {
                let identifier = identifier.trim().to_lowercase();
                let stripped = identifier
                    .strip_prefix($display_prefix)
                    .unwrap_or(&identifier);
                if stripped.len() < 4 {
                    return false;
                }
                self.0.to_string().starts_with(stripped)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, &self.0.to_string()[..8])
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if let Ok(uuid) = Uuid::parse_str(s) {
                    return Ok(Self(uuid));
                }
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(DepositId, "dep-");
define_id!(BucketId, "bkt-");
define_id!(SplitPlanId, "plan-");
define_id!(SplitActionId, "act-");
