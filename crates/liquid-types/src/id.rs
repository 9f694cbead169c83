use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a new time-ordered identifier (UUID v7).
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// Create from an existing UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Parse the hyphenated (or simple) UUID form.
            pub fn parse(s: &str) -> Result<Self, TypeError> {
                uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| TypeError::InvalidId(format!("{s:?}: {e}")))
            }

            /// The underlying UUID.
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }

            /// Short representation (first 8 characters of the UUID).
            pub fn short_id(&self) -> String {
                self.0.to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short_id())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Identifier of a [`LiquidObject`](crate::LiquidObject).
    ///
    /// Assigned once at creation and never reused. UUID v7 carries 74 random
    /// bits per millisecond, so collisions within a replica are not a practical
    /// concern. The `Display` form doubles as the persisted record name.
    ObjectId
}

uuid_id! {
    /// Identifier of a relationship edge, shared by both endpoints' copies.
    RelationshipId
}

uuid_id! {
    /// Identifier of a single change-log entry.
    ChangeId
}

uuid_id! {
    /// Identity of one running replica (one open store instance).
    ReplicaId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn parse_roundtrip() {
        let id = ObjectId::new();
        let parsed = ObjectId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        let via_from_str: ObjectId = id.to_string().parse().unwrap();
        assert_eq!(id, via_from_str);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = ObjectId::parse("not-a-uuid").unwrap_err();
        assert!(matches!(err, TypeError::InvalidId(_)));
    }

    #[test]
    fn short_id_is_8_chars() {
        assert_eq!(RelationshipId::new().short_id().len(), 8);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ObjectId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn debug_names_the_kind() {
        let id = ReplicaId::new();
        assert!(format!("{id:?}").starts_with("ReplicaId("));
    }
}
