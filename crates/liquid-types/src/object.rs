use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::id::{ObjectId, RelationshipId};
use crate::temporal::Timestamp;
use crate::value::Properties;

/// Author recorded when a mutation does not name one.
pub const DEFAULT_AUTHOR: &str = "system";

/// The store's sole entity kind.
///
/// An object is identified by an immutable [`ObjectId`], classified by a
/// free-form `kind` string (serialized as `type`), and carries an open
/// property bag. Its metadata tracks creation, the last mutation, a version
/// counter, an author, and a union-only tag set. Every create and update
/// appends one [`HistoryEntry`]; soft deletion only sets the tombstone fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiquidObject {
    pub id: ObjectId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Properties,
    pub metadata: ObjectMetadata,
    #[serde(default)]
    pub relationships: Relationships,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMetadata {
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub version: u64,
    pub author: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

/// Relationship slots embedded in an object.
///
/// `parents` and `children` are reserved and never written by the store,
/// but they survive persistence and merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default)]
    pub links: Vec<Relationship>,
    #[serde(default)]
    pub references: Vec<Relationship>,
    #[serde(default)]
    pub parents: Vec<ObjectId>,
    #[serde(default)]
    pub children: Vec<ObjectId>,
}

impl Relationships {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
            && self.references.is_empty()
            && self.parents.is_empty()
            && self.children.is_empty()
    }
}

/// A typed, directed edge between two objects.
///
/// Not stored on its own: the source keeps a copy in `links`, the target a
/// copy in `references` tagged [`Direction::Incoming`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    pub source_id: ObjectId,
    pub target_id: ObjectId,
    #[serde(rename = "type")]
    pub kind: String,
    pub metadata: RelationshipMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl Relationship {
    pub fn new(
        source_id: ObjectId,
        target_id: ObjectId,
        kind: impl Into<String>,
        mut extra: Properties,
    ) -> Self {
        extra.remove("createdAt");
        Self {
            id: RelationshipId::new(),
            source_id,
            target_id,
            kind: kind.into(),
            metadata: RelationshipMetadata {
                created_at: Timestamp::now(),
                extra,
            },
            direction: None,
        }
    }

    /// The copy stored on the target's `references`.
    pub fn as_incoming(&self) -> Self {
        Self {
            direction: Some(Direction::Incoming),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMetadata {
    pub created_at: Timestamp,
    /// Caller-supplied fields, flattened next to `createdAt`.
    #[serde(flatten)]
    pub extra: Properties,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Create,
    Update,
}

/// One audit record per create or update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub version: u64,
    pub timestamp: Timestamp,
    pub action: HistoryAction,
    /// The mutation's input: full properties on create, the update patch otherwise.
    pub changes: Properties,
    /// Property snapshot taken before an update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_values: Option<Properties>,
    pub author: String,
}

/// Caller-supplied metadata for `create` and `update`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationMeta {
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl MutationMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

impl LiquidObject {
    /// Build a fresh object at version 1 with a single "create" history entry.
    pub fn new(
        kind: impl Into<String>,
        properties: Properties,
        meta: &MutationMeta,
        default_author: &str,
    ) -> Self {
        let now = Timestamp::now();
        let author = meta
            .author
            .clone()
            .unwrap_or_else(|| default_author.to_string());
        let tags = meta.tags.iter().flatten().cloned().collect();
        let history = vec![HistoryEntry {
            version: 1,
            timestamp: now,
            action: HistoryAction::Create,
            changes: properties.clone(),
            old_values: None,
            author: author.clone(),
        }];
        Self {
            id: ObjectId::new(),
            kind: kind.into(),
            properties,
            metadata: ObjectMetadata {
                created_at: now,
                updated_at: now,
                version: 1,
                author,
                tags,
                deleted: None,
                deleted_at: None,
            },
            relationships: Relationships::default(),
            history,
        }
    }

    pub fn version(&self) -> u64 {
        self.metadata.version
    }

    pub fn is_deleted(&self) -> bool {
        self.metadata.deleted.unwrap_or(false)
    }

    /// Returns `true` if every tag in `tags` is present on this object.
    pub fn has_all_tags<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter()
            .all(|t| self.metadata.tags.contains(t.as_ref()))
    }

    /// Apply a shallow property update.
    ///
    /// Keys in `updates` overwrite, other keys are untouched. Advances
    /// `updatedAt`, bumps `version` by one, overwrites the author and unions
    /// the tags when supplied, and appends an "update" history entry holding
    /// the patch and the pre-update snapshot.
    pub fn apply_update(&mut self, updates: Properties, meta: &MutationMeta) {
        let old_values = self.properties.clone();
        for (key, value) in &updates {
            self.properties.insert(key.clone(), value.clone());
        }

        let now = Timestamp::after(&self.metadata.updated_at);
        self.metadata.updated_at = now;
        self.metadata.version += 1;
        if let Some(author) = &meta.author {
            self.metadata.author = author.clone();
        }
        if let Some(tags) = &meta.tags {
            self.metadata.tags.extend(tags.iter().cloned());
        }

        self.history.push(HistoryEntry {
            version: self.metadata.version,
            timestamp: now,
            action: HistoryAction::Update,
            changes: updates,
            old_values: Some(old_values),
            author: self.metadata.author.clone(),
        });
    }

    /// A relationship change is recorded as a property update that rewrites
    /// the current properties unchanged.
    pub fn touch(&mut self) {
        let unchanged = self.properties.clone();
        self.apply_update(unchanged, &MutationMeta::default());
    }

    /// Set the tombstone. Leaves `version` and `history` alone.
    pub fn mark_deleted(&mut self) {
        let now = Timestamp::now();
        self.metadata.deleted = Some(true);
        self.metadata.deleted_at = Some(now);
    }
}
