use serde::{Deserialize, Serialize};

use crate::id::{ChangeId, ObjectId, ReplicaId};
use crate::temporal::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
}

impl ChangeOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Where a change-log entry was first recorded.
///
/// `seq` is the originating replica's local sequence number (1-based,
/// gap-free within one replica), so `(replica, seq)` names an entry uniquely
/// across every replica that later imports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    pub replica: ReplicaId,
    pub seq: u64,
}

/// One mutation event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    pub id: ChangeId,
    pub operation: ChangeOperation,
    pub object_id: ObjectId,
    pub timestamp: Timestamp,
    pub version: u64,
    pub author: String,
    /// Absent on entries produced by peers that do not track provenance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Provenance>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_wire_names() {
        for op in [
            ChangeOperation::Create,
            ChangeOperation::Update,
            ChangeOperation::Delete,
        ] {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
    }

    #[test]
    fn entry_without_origin_deserializes() {
        let json = serde_json::json!({
            "id": ChangeId::new(),
            "operation": "update",
            "objectId": ObjectId::new(),
            "timestamp": "2024-01-01T00:00:00Z",
            "version": 3,
            "author": "system",
        });
        let entry: ChangeLogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.operation, ChangeOperation::Update);
        assert!(entry.origin.is_none());
    }
}
