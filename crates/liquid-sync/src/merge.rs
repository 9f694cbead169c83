use liquid_types::LiquidObject;
use tracing::trace;

use crate::error::{SyncError, SyncResult};
use crate::types::RemoteObject;

/// What the merge did with the remote object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MergeOutcome {
    /// No local object existed; the remote one was taken verbatim.
    Adopted,
    /// The remote object was strictly newer and was folded into the local one.
    RemoteApplied,
    /// The remote object was not newer; local state is unchanged.
    LocalRetained,
}

impl MergeOutcome {
    /// Whether the merged object differs from the local one and must be
    /// written back.
    pub fn changed_local(&self) -> bool {
        !matches!(self, Self::LocalRetained)
    }
}

/// The merged object and how it was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Merged {
    pub object: LiquidObject,
    pub outcome: MergeOutcome,
}

/// Reconcile a remote copy of an object with the local one.
///
/// 1. No local object: adopt `remote` as-is.
/// 2. `remote.updatedAt` strictly after `local.updatedAt`:
///    - every remote property overwrites the local value when they differ;
///      local-only keys survive,
///    - `updatedAt` becomes the remote value,
///    - `version` becomes `max(local, remote)`,
///    - each relationship slot (`links`, `references`, `parents`,
///      `children`) the remote actually sent replaces the local slot;
///      slots it left out stay local.
/// 3. Otherwise local is kept unchanged.
///
/// Type, tags, author, tombstone fields, and history always stay local.
pub fn merge(local: Option<&LiquidObject>, remote: &RemoteObject) -> SyncResult<Merged> {
    let Some(local) = local else {
        return Ok(Merged {
            object: remote.object.clone(),
            outcome: MergeOutcome::Adopted,
        });
    };

    if local.id != remote.id {
        return Err(SyncError::IdMismatch {
            local: local.id,
            remote: remote.id,
        });
    }

    if !remote.metadata.updated_at.is_after(&local.metadata.updated_at) {
        trace!(id = %local.id, "remote not newer; keeping local");
        return Ok(Merged {
            object: local.clone(),
            outcome: MergeOutcome::LocalRetained,
        });
    }

    let mut merged = local.clone();
    for (key, value) in &remote.properties {
        if merged.properties.get(key) != Some(value) {
            merged.properties.insert(key.clone(), value.clone());
        }
    }
    merged.metadata.updated_at = remote.metadata.updated_at;
    merged.metadata.version = local.metadata.version.max(remote.metadata.version);
    let (ours, theirs) = (&mut merged.relationships, &remote.relationships);
    if remote.slots.links {
        ours.links = theirs.links.clone();
    }
    if remote.slots.references {
        ours.references = theirs.references.clone();
    }
    if remote.slots.parents {
        ours.parents = theirs.parents.clone();
    }
    if remote.slots.children {
        ours.children = theirs.children.clone();
    }

    trace!(
        id = %merged.id,
        version = merged.metadata.version,
        "applied newer remote object"
    );
    Ok(Merged {
        object: merged,
        outcome: MergeOutcome::RemoteApplied,
    })
}
