use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use liquid_crypto::StoreKey;
use liquid_ledger::ChangeLog;
use liquid_store::{
    DecodeFailure, DirectoryRecordStore, InMemoryRecordStore, ObjectPersistence, RecordStore,
};
use liquid_types::{
    ChangeLogEntry, ChangeOperation, LiquidObject, MutationMeta, ObjectId, Properties, ReplicaId,
};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{LiquidError, LiquidResult};

/// The embedded object store.
///
/// Holds every object in memory, mirrors each mutation to an encrypted
/// per-object record, and keeps a bounded change log for synchronization.
/// Each instance is its own replica with a fresh [`ReplicaId`].
pub struct LiquidStore {
    default_author: String,
    persistence: ObjectPersistence,
    state: RwLock<StoreState>,
    load_failures: Vec<DecodeFailure>,
}

/// Everything guarded by the store lock.
#[derive(Debug)]
pub(crate) struct StoreState {
    objects: HashMap<ObjectId, LiquidObject>,
    /// Ids in creation or adoption order.
    order: Vec<ObjectId>,
    pub(crate) change_log: ChangeLog,
}

impl StoreState {
    pub(crate) fn get(&self, id: &ObjectId) -> Option<&LiquidObject> {
        self.objects.get(id)
    }

    pub(crate) fn require(&self, id: &ObjectId) -> LiquidResult<&LiquidObject> {
        self.objects.get(id).ok_or(LiquidError::NotFound(*id))
    }

    /// Insert or replace an object, keeping first-seen order.
    pub(crate) fn put(&mut self, object: LiquidObject) {
        let id = object.id;
        if self.objects.insert(id, object).is_none() {
            self.order.push(id);
        }
    }

    /// Objects in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &LiquidObject> {
        self.order.iter().filter_map(|id| self.objects.get(id))
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}

impl LiquidStore {
    /// Open a store as described by `config`, loading any persisted objects.
    pub fn open(config: StoreConfig) -> LiquidResult<Self> {
        config.validate()?;
        let key = config.key.resolve()?;
        let records: Arc<dyn RecordStore> = match &config.data_dir {
            Some(dir) => Arc::new(DirectoryRecordStore::open(dir)?),
            None => Arc::new(InMemoryRecordStore::new()),
        };
        Self::with_records(records, key, config)
    }

    /// An empty store with in-memory records and a random key.
    pub fn in_memory() -> LiquidResult<Self> {
        Self::with_records(
            Arc::new(InMemoryRecordStore::new()),
            StoreKey::generate(),
            StoreConfig::in_memory(),
        )
    }

    /// Open a store over an explicit record backend and key.
    ///
    /// `config.data_dir` and `config.key` are ignored.
    pub fn with_records(
        records: Arc<dyn RecordStore>,
        key: StoreKey,
        config: StoreConfig,
    ) -> LiquidResult<Self> {
        config.change_log.validate()?;
        let persistence = ObjectPersistence::new(records, key);
        let report = persistence.load_all()?;

        let replica = ReplicaId::new();
        let mut state = StoreState {
            objects: HashMap::with_capacity(report.objects.len()),
            order: Vec::with_capacity(report.objects.len()),
            change_log: ChangeLog::new(replica, config.change_log),
        };
        for object in report.objects {
            state.put(object);
        }

        info!(
            %replica,
            objects = state.len(),
            skipped = report.failures.len(),
            "opened liquid store"
        );
        Ok(Self {
            default_author: config.default_author,
            persistence,
            state: RwLock::new(state),
            load_failures: report.failures,
        })
    }

    // ---- Objects ----

    /// Create an object at version 1 and persist it.
    pub fn create(
        &self,
        kind: impl Into<String>,
        properties: Properties,
        meta: &MutationMeta,
    ) -> LiquidResult<LiquidObject> {
        require_finite(&properties)?;
        let object = LiquidObject::new(kind, properties, meta, &self.default_author);
        let mut state = self.write_state();
        self.commit(&mut state, object, ChangeOperation::Create)
    }

    /// Shallow-merge `updates` into an object's properties.
    pub fn update(
        &self,
        id: &ObjectId,
        updates: Properties,
        meta: &MutationMeta,
    ) -> LiquidResult<LiquidObject> {
        require_finite(&updates)?;
        let mut state = self.write_state();
        let mut object = state.require(id)?.clone();
        object.apply_update(updates, meta);
        self.commit(&mut state, object, ChangeOperation::Update)
    }

    /// Tombstone an object. Version and history are left alone; deleting an
    /// already deleted object changes nothing.
    pub fn soft_delete(&self, id: &ObjectId) -> LiquidResult<LiquidObject> {
        let mut state = self.write_state();
        let current = state.require(id)?;
        if current.is_deleted() {
            debug!(%id, "object already deleted");
            return Ok(current.clone());
        }
        let mut object = current.clone();
        object.mark_deleted();
        self.commit(&mut state, object, ChangeOperation::Delete)
    }

    pub fn get(&self, id: &ObjectId) -> Option<LiquidObject> {
        self.read_state().get(id).cloned()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.read_state().get(id).is_some()
    }

    /// Number of objects, soft-deleted ones included.
    pub fn len(&self) -> usize {
        self.read_state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every object id in insertion order.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        self.read_state().order.clone()
    }

    // ---- Replica ----

    pub fn replica(&self) -> ReplicaId {
        self.read_state().change_log.replica()
    }

    pub fn default_author(&self) -> &str {
        &self.default_author
    }

    /// The local change log, oldest first.
    pub fn change_log(&self) -> Vec<ChangeLogEntry> {
        self.read_state().change_log.to_vec()
    }

    /// Persisted records skipped when the store was opened.
    pub fn load_failures(&self) -> &[DecodeFailure] {
        &self.load_failures
    }

    // ---- Internals ----

    /// Persist `object`, then install it and log the change.
    ///
    /// Memory is only touched once the record is written, so a failed write
    /// leaves the store as it was.
    pub(crate) fn commit(
        &self,
        state: &mut StoreState,
        object: LiquidObject,
        operation: ChangeOperation,
    ) -> LiquidResult<LiquidObject> {
        self.persistence.save(&object)?;
        Ok(Self::install(state, object, operation))
    }

    /// Install an already persisted object and log the change.
    pub(crate) fn install(
        state: &mut StoreState,
        object: LiquidObject,
        operation: ChangeOperation,
    ) -> LiquidObject {
        state.change_log.record(
            operation,
            object.id,
            object.version(),
            &object.metadata.author,
        );
        debug!(
            id = %object.id,
            op = operation.as_str(),
            version = object.version(),
            "committed object"
        );
        state.put(object.clone());
        object
    }

    pub(crate) fn persistence(&self) -> &ObjectPersistence {
        &self.persistence
    }

    // State is only written after every fallible step has succeeded, so a
    // panic while the lock is held cannot leave it half-updated.
    pub(crate) fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn require_finite(properties: &Properties) -> LiquidResult<()> {
    match properties.iter().find(|(_, value)| !value.is_finite()) {
        Some((key, _)) => Err(LiquidError::NonFiniteNumber(key.clone())),
        None => Ok(()),
    }
}

impl std::fmt::Debug for LiquidStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("LiquidStore")
            .field("replica", &state.change_log.replica())
            .field("objects", &state.len())
            .field("changes", &state.change_log.len())
            .finish_non_exhaustive()
    }
}
