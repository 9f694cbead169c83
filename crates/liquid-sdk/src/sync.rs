use liquid_sync::{merge, ImportReport, SyncBundle};
use tracing::{debug, info};

use crate::error::LiquidResult;
use crate::query::Filter;
use crate::store::LiquidStore;

impl LiquidStore {
    /// Snapshot the objects matching `filter` (all live objects when `None`)
    /// together with the full local change log.
    pub fn export_for_sync(&self, filter: Option<&Filter>) -> SyncBundle {
        let state = self.read_state();
        let everything = Filter::default();
        let filter = filter.unwrap_or(&everything);
        let objects = state
            .iter()
            .filter(|object| filter.matches(object))
            .cloned()
            .collect::<Vec<_>>();
        debug!(
            objects = objects.len(),
            changes = state.change_log.len(),
            "exporting for sync"
        );
        SyncBundle::new(objects, state.change_log.to_vec()).from_replica(state.change_log.replica())
    }

    /// Merge a peer's bundle into this store.
    ///
    /// Each object is reconciled with [`merge`] and written back when the
    /// merge changed it; merging does not add change log entries of its own.
    /// The bundle's change log is then appended, skipping entries already
    /// seen. A failed write stops the import: objects merged before it
    /// stay merged and the change log is left alone.
    pub fn import_from_sync(&self, bundle: SyncBundle) -> LiquidResult<ImportReport> {
        let mut state = self.write_state();
        let mut report = ImportReport::default();

        for remote in &bundle.objects {
            let merged = merge(state.get(&remote.id), remote)?;
            if merged.outcome.changed_local() {
                self.persistence().save(&merged.object)?;
                state.put(merged.object);
            }
            report.count(merged.outcome);
        }

        let absorbed = state.change_log.absorb(bundle.change_log);
        report.changes_appended = absorbed.appended;
        report.changes_skipped = absorbed.duplicates;

        info!(
            origin = ?bundle.origin,
            adopted = report.adopted,
            applied = report.remote_applied,
            retained = report.local_retained,
            changes = report.changes_appended,
            duplicates = report.changes_skipped,
            "imported sync bundle"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::flaky_store;
    use crate::LiquidError;
    use liquid_types::{LiquidObject, MutationMeta, Properties, Timestamp, Value};

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    fn later(obj: &LiquidObject, ms: i64) -> Timestamp {
        Timestamp::from_millis(obj.metadata.updated_at.as_millis() + ms).unwrap()
    }

    fn seeded() -> LiquidStore {
        let store = LiquidStore::in_memory().unwrap();
        let p = store
            .create("project", props(&[("name", "Launch")]), &MutationMeta::new())
            .unwrap();
        let t = store
            .create("task", props(&[("status", "open")]), &MutationMeta::new())
            .unwrap();
        store
            .update(&t.id, props(&[("status", "done")]), &MutationMeta::new())
            .unwrap();
        store
            .add_relationship(&t.id, &p.id, "belongs_to", Properties::new())
            .unwrap();
        store
    }

    #[test]
    fn roundtrip_into_empty_store() {
        let source = seeded();
        let bundle = source.export_for_sync(None);
        assert_eq!(bundle.origin, Some(source.replica()));
        assert_eq!(bundle.change_log.len(), source.change_log().len());

        let target = LiquidStore::in_memory().unwrap();
        let report = target.import_from_sync(bundle.clone()).unwrap();
        assert_eq!(report.adopted, 2);
        assert_eq!(report.changes_appended, bundle.change_log.len());

        for exported in &bundle.objects {
            let imported = target.get(&exported.id).unwrap();
            assert_eq!(imported.properties, exported.properties);
            assert_eq!(imported.version(), exported.version());
            assert_eq!(imported, exported.object);
        }
        assert_eq!(target.all_ids(), source.all_ids());
        // Merging adds nothing beyond the imported entries.
        assert_eq!(target.change_log(), source.change_log());
    }

    #[test]
    fn roundtrip_through_json() {
        let source = seeded();
        let json = source.export_for_sync(None).to_json().unwrap();
        let target = LiquidStore::in_memory().unwrap();
        target
            .import_from_sync(SyncBundle::from_json(&json).unwrap())
            .unwrap();
        assert_eq!(target.stats().total_objects, 2);
        assert_eq!(target.stats().total_relationships, 1);
    }

    #[test]
    fn export_respects_filter_and_deletion() {
        let store = seeded();
        let note = store
            .create("note", Properties::new(), &MutationMeta::new())
            .unwrap();
        store.soft_delete(&note.id).unwrap();

        assert_eq!(store.export_for_sync(None).objects.len(), 2);
        let all = Filter::new().include_deleted(true);
        assert_eq!(store.export_for_sync(Some(&all)).objects.len(), 3);
        let tasks = Filter::new().with_type("task");
        let bundle = store.export_for_sync(Some(&tasks));
        assert_eq!(bundle.objects.len(), 1);
        // The change log is always exported in full.
        assert_eq!(bundle.change_log.len(), store.change_log().len());
    }

    #[test]
    fn newer_remote_is_merged_per_key() {
        let local = LiquidStore::in_memory().unwrap();
        let obj = local
            .create(
                "task",
                props(&[("status", "open"), ("note", "local only")]),
                &MutationMeta::new(),
            )
            .unwrap();

        let mut remote = obj.clone();
        remote.properties = props(&[("status", "done")]);
        remote.metadata.version = 7;
        remote.metadata.updated_at = later(&obj, 1_000);

        let report = local
            .import_from_sync(SyncBundle::new(vec![remote.clone()], vec![]))
            .unwrap();
        assert_eq!(report.remote_applied, 1);

        let merged = local.get(&obj.id).unwrap();
        assert_eq!(merged.properties["status"], Value::from("done"));
        assert_eq!(merged.properties["note"], Value::from("local only"));
        assert_eq!(merged.version(), 7);
        assert_eq!(merged.metadata.updated_at, remote.metadata.updated_at);
        assert_eq!(local.persistence().load(&obj.id).unwrap().unwrap(), merged);
    }

    #[test]
    fn stale_remote_is_ignored() {
        let local = LiquidStore::in_memory().unwrap();
        let obj = local
            .create("task", props(&[("status", "open")]), &MutationMeta::new())
            .unwrap();
        let mut remote = obj.clone();
        remote.properties = props(&[("status", "stale")]);
        remote.metadata.updated_at = later(&obj, -1_000);

        let report = local
            .import_from_sync(SyncBundle::new(vec![remote], vec![]))
            .unwrap();
        assert_eq!(report.local_retained, 1);
        assert_eq!(local.get(&obj.id).unwrap(), obj);
    }

    #[test]
    fn remote_without_links_keeps_local_links() {
        let local = LiquidStore::in_memory().unwrap();
        let a = local
            .create("task", props(&[("status", "open")]), &MutationMeta::new())
            .unwrap();
        let b = local
            .create("project", Properties::new(), &MutationMeta::new())
            .unwrap();
        local
            .add_relationship(&a.id, &b.id, "belongs_to", Properties::new())
            .unwrap();
        let a = local.get(&a.id).unwrap();

        let mut json = serde_json::to_value(&a).unwrap();
        json["properties"]["status"] = "done".into();
        json["metadata"]["updatedAt"] = serde_json::to_value(later(&a, 1_000)).unwrap();
        json["relationships"] = serde_json::json!({ "references": [] });
        let bundle = serde_json::json!({
            "objects": [json],
            "timestamp": Timestamp::now(),
        });
        let bundle = SyncBundle::from_json(&bundle.to_string()).unwrap();

        let report = local.import_from_sync(bundle).unwrap();
        assert_eq!(report.remote_applied, 1);
        let merged = local.get(&a.id).unwrap();
        assert_eq!(merged.properties["status"], Value::from("done"));
        assert_eq!(merged.relationships.links.len(), 1);
        assert_eq!(local.get_related_objects(&a.id, None).len(), 1);
    }

    #[test]
    fn merge_does_not_resurrect_deleted_objects() {
        let local = LiquidStore::in_memory().unwrap();
        let obj = local
            .create("task", Properties::new(), &MutationMeta::new())
            .unwrap();
        let mut remote = obj.clone();
        remote.properties = props(&[("status", "done")]);
        remote.metadata.updated_at = later(&obj, 1_000);
        local.soft_delete(&obj.id).unwrap();

        local
            .import_from_sync(SyncBundle::new(vec![remote], vec![]))
            .unwrap();
        let merged = local.get(&obj.id).unwrap();
        assert!(merged.is_deleted());
        assert_eq!(merged.properties["status"], Value::from("done"));
    }

    #[test]
    fn repeated_import_skips_seen_changes() {
        let source = seeded();
        let bundle = source.export_for_sync(None);
        let target = LiquidStore::in_memory().unwrap();

        let first = target.import_from_sync(bundle.clone()).unwrap();
        let second = target.import_from_sync(bundle.clone()).unwrap();
        assert_eq!(first.changes_appended, bundle.change_log.len());
        assert_eq!(second.changes_appended, 0);
        assert_eq!(second.changes_skipped, bundle.change_log.len());
        assert_eq!(second.local_retained, 2);
        assert_eq!(target.change_log().len(), bundle.change_log.len());
    }

    #[test]
    fn echoed_changes_are_not_duplicated() {
        let a = seeded();
        let b = LiquidStore::in_memory().unwrap();
        b.import_from_sync(a.export_for_sync(None)).unwrap();

        let before = a.change_log().len();
        let report = a.import_from_sync(b.export_for_sync(None)).unwrap();
        assert_eq!(report.changes_appended, 0);
        assert_eq!(a.change_log().len(), before);
    }

    #[test]
    fn legacy_entries_without_origin_always_append() {
        let source = seeded();
        let mut bundle = source.export_for_sync(None);
        for entry in &mut bundle.change_log {
            entry.origin = None;
        }
        let target = LiquidStore::in_memory().unwrap();
        target.import_from_sync(bundle.clone()).unwrap();
        target.import_from_sync(bundle.clone()).unwrap();
        assert_eq!(target.change_log().len(), 2 * bundle.change_log.len());
    }

    #[test]
    fn object_stamped_at_the_last_instant_stays_writable() {
        let local = LiquidStore::in_memory().unwrap();
        let other = local
            .create("project", Properties::new(), &MutationMeta::new())
            .unwrap();
        let mut far = LiquidObject::new("task", Properties::new(), &MutationMeta::new(), "peer");
        far.metadata.updated_at = Timestamp::MAX;
        local
            .import_from_sync(SyncBundle::new(vec![far.clone()], vec![]))
            .unwrap();

        let updated = local
            .update(&far.id, props(&[("status", "done")]), &MutationMeta::new())
            .unwrap();
        assert_eq!(updated.version(), 2);
        assert_eq!(updated.metadata.updated_at, Timestamp::MAX);
        local
            .add_relationship(&far.id, &other.id, "belongs_to", Properties::new())
            .unwrap();
        assert_eq!(local.get(&far.id).unwrap().version(), 3);
    }

    #[test]
    fn failed_write_stops_import() {
        let source = seeded();
        let bundle = source.export_for_sync(None);
        let (target, records) = flaky_store();
        records.fail_after(bundle.objects[1].id.to_string(), 0);

        let err = target.import_from_sync(bundle.clone()).unwrap_err();
        assert!(matches!(err, LiquidError::Store(_)));
        assert!(target.contains(&bundle.objects[0].id));
        assert!(!target.contains(&bundle.objects[1].id));
        assert!(target.change_log().is_empty());
    }
}
