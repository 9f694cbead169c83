use std::collections::{BTreeMap, HashMap, VecDeque};

use liquid_types::{
    ChangeId, ChangeLogEntry, ChangeOperation, ObjectId, Provenance, ReplicaId, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LedgerError;

/// Trim policy: once a local append pushes the log past `max_entries`, the
/// oldest entries are dropped until `retain_entries` remain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeLogLimits {
    pub max_entries: usize,
    pub retain_entries: usize,
}

impl ChangeLogLimits {
    pub fn new(max_entries: usize, retain_entries: usize) -> Result<Self, LedgerError> {
        let limits = Self {
            max_entries,
            retain_entries,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.retain_entries == 0 || self.retain_entries > self.max_entries {
            return Err(LedgerError::InvalidLimits {
                max: self.max_entries,
                retain: self.retain_entries,
            });
        }
        Ok(())
    }
}

impl Default for ChangeLogLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            retain_entries: 5_000,
        }
    }
}

/// Outcome of absorbing a batch of remote entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AbsorbReport {
    pub appended: usize,
    pub duplicates: usize,
}

/// Sequence numbers seen from one replica, as disjoint inclusive ranges
/// keyed by their start.
#[derive(Debug, Default)]
struct SeenSeqs {
    ranges: BTreeMap<u64, u64>,
}

impl SeenSeqs {
    fn contains(&self, seq: u64) -> bool {
        self.ranges
            .range(..=seq)
            .next_back()
            .is_some_and(|(_, &end)| seq <= end)
    }

    /// Record `seq`; returns `false` if it was already present.
    fn insert(&mut self, seq: u64) -> bool {
        if self.contains(seq) {
            return false;
        }
        let mut start = seq;
        let mut end = seq;
        if let Some((&s, &e)) = self.ranges.range(..seq).next_back() {
            if e + 1 == seq {
                start = s;
            }
        }
        if let Some(next_end) = seq.checked_add(1).and_then(|n| self.ranges.remove(&n)) {
            end = next_end;
        }
        self.ranges.insert(start, end);
        true
    }
}

/// Append-only, bounded ledger of mutation events for one replica.
///
/// Local entries are stamped with this replica's id and a gap-free sequence
/// number. Imported entries keep their original provenance; an entry whose
/// exact `(replica, seq)` has been seen before is a duplicate, so entries
/// arriving late or out of order are still kept. Entries without provenance
/// cannot be recognized and are always appended.
///
/// Trimming happens only after local appends, never after an import.
#[derive(Debug)]
pub struct ChangeLog {
    replica: ReplicaId,
    next_seq: u64,
    limits: ChangeLogLimits,
    entries: VecDeque<ChangeLogEntry>,
    seen: HashMap<ReplicaId, SeenSeqs>,
}

impl ChangeLog {
    pub fn new(replica: ReplicaId, limits: ChangeLogLimits) -> Self {
        Self {
            replica,
            next_seq: 1,
            limits,
            entries: VecDeque::new(),
            seen: HashMap::new(),
        }
    }

    pub fn replica(&self) -> ReplicaId {
        self.replica
    }

    pub fn limits(&self) -> ChangeLogLimits {
        self.limits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number of the most recent local entry (0 if none).
    pub fn last_local_seq(&self) -> u64 {
        self.next_seq - 1
    }

    /// Append a local mutation event, then trim if over the limit.
    pub fn record(
        &mut self,
        operation: ChangeOperation,
        object_id: ObjectId,
        version: u64,
        author: &str,
    ) -> ChangeLogEntry {
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = ChangeLogEntry {
            id: ChangeId::new(),
            operation,
            object_id,
            timestamp: Timestamp::now(),
            version,
            author: author.to_string(),
            origin: Some(Provenance {
                replica: self.replica,
                seq,
            }),
        };
        self.seen.entry(self.replica).or_default().insert(seq);
        self.entries.push_back(entry.clone());
        self.trim();
        entry
    }

    /// Append entries received from a peer, skipping ones already seen.
    pub fn absorb<I>(&mut self, entries: I) -> AbsorbReport
    where
        I: IntoIterator<Item = ChangeLogEntry>,
    {
        let mut report = AbsorbReport::default();
        for entry in entries {
            if let Some(origin) = entry.origin {
                let fresh = self.seen.entry(origin.replica).or_default().insert(origin.seq);
                if !fresh {
                    report.duplicates += 1;
                    continue;
                }
            }
            self.entries.push_back(entry);
            report.appended += 1;
        }
        debug!(
            appended = report.appended,
            duplicates = report.duplicates,
            len = self.entries.len(),
            "absorbed remote change log entries"
        );
        report
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &ChangeLogEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ChangeLogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Entries touching one object, oldest first.
    pub fn for_object(&self, id: &ObjectId) -> Vec<&ChangeLogEntry> {
        self.entries.iter().filter(|e| e.object_id == *id).collect()
    }

    fn trim(&mut self) {
        if self.entries.len() <= self.limits.max_entries {
            return;
        }
        let drop = self.entries.len() - self.limits.retain_entries;
        self.entries.drain(..drop);
        debug!(dropped = drop, retained = self.entries.len(), "trimmed change log");
    }
}
