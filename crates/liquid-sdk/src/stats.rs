use std::collections::BTreeMap;

use serde::Serialize;

use crate::store::LiquidStore;

/// Store-wide counts. Soft-deleted objects are included.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_objects: usize,
    /// Object count per type.
    pub object_types: BTreeMap<String, usize>,
    /// Relationships counted once each, at their source.
    pub total_relationships: usize,
    /// Current change log length.
    pub total_changes: usize,
}

impl LiquidStore {
    pub fn stats(&self) -> StoreStats {
        let state = self.read_state();
        let mut stats = StoreStats {
            total_changes: state.change_log.len(),
            ..StoreStats::default()
        };
        for object in state.iter() {
            stats.total_objects += 1;
            *stats.object_types.entry(object.kind.clone()).or_default() += 1;
            stats.total_relationships += object.relationships.links.len();
        }
        stats
    }
}
