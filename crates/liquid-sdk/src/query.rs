use liquid_types::{LiquidObject, Properties, Value};
use serde::{Deserialize, Serialize};

use crate::store::LiquidStore;

/// Predicates for [`LiquidStore::query`](crate::LiquidStore::query).
///
/// All supplied predicates are ANDed; an unset predicate imposes no
/// constraint. Soft-deleted objects are excluded unless `include_deleted`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Filter {
    /// Exact match on the object's type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Every listed tag must be present.
    pub tags: Vec<String>,
    /// Each key must match via [`Value::loosely_matches`].
    pub properties: Properties,
    pub include_deleted: bool,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = include;
        self
    }

    pub fn matches(&self, object: &LiquidObject) -> bool {
        if !self.include_deleted && object.is_deleted() {
            return false;
        }
        if let Some(kind) = &self.kind {
            if object.kind != *kind {
                return false;
            }
        }
        if !object.has_all_tags(&self.tags) {
            return false;
        }
        self.properties.iter().all(|(key, want)| {
            object
                .properties
                .get(key)
                .is_some_and(|have| have.loosely_matches(want))
        })
    }
}

impl LiquidStore {
    /// Objects matching `filter`, in insertion order.
    pub fn query(&self, filter: &Filter) -> Vec<LiquidObject> {
        self.read_state()
            .iter()
            .filter(|object| filter.matches(object))
            .cloned()
            .collect()
    }
}
