use std::ops::Deref;

use liquid_types::{ChangeLogEntry, LiquidObject, ReplicaId, Timestamp};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SyncError, SyncResult};
use crate::merge::MergeOutcome;

/// A replica's exported state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBundle {
    pub objects: Vec<RemoteObject>,
    #[serde(default)]
    pub change_log: Vec<ChangeLogEntry>,
    pub timestamp: Timestamp,
    /// The exporting replica, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ReplicaId>,
}

impl SyncBundle {
    pub fn new(objects: Vec<LiquidObject>, change_log: Vec<ChangeLogEntry>) -> Self {
        Self {
            objects: objects.into_iter().map(RemoteObject::from).collect(),
            change_log,
            timestamp: Timestamp::now(),
            origin: None,
        }
    }

    pub fn from_replica(mut self, replica: ReplicaId) -> Self {
        self.origin = Some(replica);
        self
    }

    pub fn to_json(&self) -> SyncResult<String> {
        serde_json::to_string(self).map_err(|e| SyncError::Encode(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> SyncResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SyncError::Encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> SyncResult<Self> {
        serde_json::from_str(json).map_err(|e| SyncError::Decode(e.to_string()))
    }

    pub fn from_slice(bytes: &[u8]) -> SyncResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::Decode(e.to_string()))
    }
}

/// Which relationship slots a received object actually spelled out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationshipSlots {
    pub links: bool,
    pub references: bool,
    pub parents: bool,
    pub children: bool,
}

impl RelationshipSlots {
    pub const ALL: Self = Self {
        links: true,
        references: true,
        parents: true,
        children: true,
    };

    pub const NONE: Self = Self {
        links: false,
        references: false,
        parents: false,
        children: false,
    };

    fn present_in(object: &serde_json::Value) -> Self {
        let Some(slots) = object.get("relationships").and_then(|r| r.as_object()) else {
            return Self::NONE;
        };
        Self {
            links: slots.contains_key("links"),
            references: slots.contains_key("references"),
            parents: slots.contains_key("parents"),
            children: slots.contains_key("children"),
        }
    }
}

/// An object as received from a peer.
///
/// Missing relationship slots decode as empty lists on `object`; `slots`
/// remembers which ones were really sent so a merge leaves the others
/// alone. Serializes exactly like the wrapped object.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteObject {
    pub object: LiquidObject,
    pub slots: RelationshipSlots,
}

impl From<LiquidObject> for RemoteObject {
    fn from(object: LiquidObject) -> Self {
        Self {
            object,
            slots: RelationshipSlots::ALL,
        }
    }
}

impl Deref for RemoteObject {
    type Target = LiquidObject;

    fn deref(&self) -> &LiquidObject {
        &self.object
    }
}

impl Serialize for RemoteObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.object.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RemoteObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let slots = RelationshipSlots::present_in(&raw);
        let object = serde_json::from_value(raw).map_err(D::Error::custom)?;
        Ok(Self { object, slots })
    }
}

/// Tally of one import.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub adopted: usize,
    pub remote_applied: usize,
    pub local_retained: usize,
    pub changes_appended: usize,
    pub changes_skipped: usize,
}

impl ImportReport {
    pub fn count(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Adopted => self.adopted += 1,
            MergeOutcome::RemoteApplied => self.remote_applied += 1,
            MergeOutcome::LocalRetained => self.local_retained += 1,
        }
    }

    pub fn objects_seen(&self) -> usize {
        self.adopted + self.remote_applied + self.local_retained
    }
}
