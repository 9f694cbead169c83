use liquid_types::{ChangeOperation, Direction, LiquidObject, ObjectId, Properties, Relationship};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{LiquidError, LiquidResult};
use crate::store::{require_finite, LiquidStore};

/// One neighbour of an object, as seen from that object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelatedObject {
    /// The object at the other end.
    pub object: LiquidObject,
    /// The stored copy of the edge: a link for `Outgoing`, a reference for
    /// `Incoming`.
    pub relationship: Relationship,
    pub direction: Direction,
}

impl LiquidStore {
    /// Link `source` to `target` with a typed relationship.
    ///
    /// The source gets the relationship in `links`, the target an incoming
    /// copy in `references`, and each endpoint is bumped as if by a
    /// property update that changes nothing. Both endpoints are prepared
    /// first, then persisted source before target, and only then installed.
    ///
    /// If the target cannot be written the source record is restored and
    /// the write error is returned with nothing changed. If that restore
    /// fails too, the source side is kept (in memory and on disk) and
    /// [`LiquidError::PartialRelationship`] is returned.
    pub fn add_relationship(
        &self,
        source: &ObjectId,
        target: &ObjectId,
        kind: impl Into<String>,
        extra: Properties,
    ) -> LiquidResult<Relationship> {
        require_finite(&extra)?;
        let mut state = self.write_state();
        let source_before = state.require(source)?.clone();
        let target_before = state.require(target)?.clone();

        let relationship = Relationship::new(*source, *target, kind, extra);
        let mut source_next = source_before.clone();
        source_next.relationships.links.push(relationship.clone());
        source_next.touch();

        if source == target {
            let after_link = source_next.clone();
            source_next
                .relationships
                .references
                .push(relationship.as_incoming());
            source_next.touch();
            self.persistence().save(&source_next)?;
            Self::install(&mut state, after_link, ChangeOperation::Update);
            Self::install(&mut state, source_next, ChangeOperation::Update);
            debug!(id = %source, rel = %relationship.id, "added self relationship");
            return Ok(relationship);
        }

        let mut target_next = target_before;
        target_next
            .relationships
            .references
            .push(relationship.as_incoming());
        target_next.touch();

        self.persistence().save(&source_next)?;
        if let Err(err) = self.persistence().save(&target_next) {
            return match self.persistence().save(&source_before) {
                Ok(()) => {
                    warn!(
                        %source,
                        %target,
                        error = %err,
                        "relationship target write failed; source restored"
                    );
                    Err(err.into())
                }
                Err(restore_err) => {
                    warn!(
                        %source,
                        %target,
                        error = %err,
                        restore_error = %restore_err,
                        "relationship partially applied"
                    );
                    Self::install(&mut state, source_next, ChangeOperation::Update);
                    Err(LiquidError::PartialRelationship {
                        relationship: relationship.id,
                        committed: *source,
                        failed: *target,
                        reason: err.to_string(),
                    })
                }
            };
        }

        Self::install(&mut state, source_next, ChangeOperation::Update);
        Self::install(&mut state, target_next, ChangeOperation::Update);
        debug!(
            %source,
            %target,
            rel = %relationship.id,
            kind = %relationship.kind,
            "added relationship"
        );
        Ok(relationship)
    }

    /// Every object linked to or from `id`, optionally only through
    /// relationships of one type.
    ///
    /// Outgoing links come first, then incoming references, each in the
    /// order they were added. Edges whose other end no longer exists are
    /// skipped, and an unknown `id` has no neighbours.
    pub fn get_related_objects(&self, id: &ObjectId, kind: Option<&str>) -> Vec<RelatedObject> {
        let state = self.read_state();
        let Some(object) = state.get(id) else {
            return Vec::new();
        };
        let wanted = |rel: &&Relationship| kind.map_or(true, |k| rel.kind == k);

        let outgoing = object
            .relationships
            .links
            .iter()
            .filter(wanted)
            .filter_map(|rel| {
                state.get(&rel.target_id).map(|other| RelatedObject {
                    object: other.clone(),
                    relationship: rel.clone(),
                    direction: Direction::Outgoing,
                })
            });
        let incoming = object
            .relationships
            .references
            .iter()
            .filter(wanted)
            .filter_map(|rel| {
                state.get(&rel.source_id).map(|other| RelatedObject {
                    object: other.clone(),
                    relationship: rel.clone(),
                    direction: Direction::Incoming,
                })
            });
        outgoing.chain(incoming).collect()
    }
}
