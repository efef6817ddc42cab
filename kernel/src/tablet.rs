// Tablet Façade
//
// Binds a tablet id to a metadata store and a location provider, and
// drives the transaction-log lifecycle:
//
//   txn id:  none → pending → staged → applied
//   version: unassigned → versioned-log-written → metadata-published
//
// No lock serializes writers. Every object is immutable once stored and
// the store's create-or-fail put is the only mutual-exclusion point:
// whoever writes the versioned log for version V first wins V.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::apply::apply_txn_log;
use crate::error::{MetaError, Result};
use crate::location::LocationProvider;
use crate::metadata::{DeletePredicate, Rowset, TabletId, TabletMetadata, TabletSchema, Version};
use crate::store::MetadataStore;
use crate::txn::{TxnId, TxnLog};
use crate::writer::{new_writer, TabletWriter, WriterConfig, WriterType};

/// Handle to one tablet. Cheap to construct; holds no authoritative state.
///
/// The cached schema and version hint are opportunistic: they only
/// short-circuit lookups and are never trusted over the store.
pub struct Tablet {
    id: TabletId,
    store: Arc<dyn MetadataStore>,
    location: Arc<LocationProvider>,
    cached_schema: Mutex<Option<Arc<TabletSchema>>>,
    // 0 means "no hint"; version 0 never needs hinting (it is the genesis).
    version_hint: AtomicU64,
}

impl Tablet {
    pub fn new(id: TabletId, store: Arc<dyn MetadataStore>, location: Arc<LocationProvider>) -> Self {
        Self {
            id,
            store,
            location,
            cached_schema: Mutex::new(None),
            version_hint: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> TabletId {
        self.id
    }

    // ---- metadata ----------------------------------------------------

    /// Publish a metadata snapshot. Fails with AlreadyExists if this
    /// version was already published; published versions are immutable.
    pub fn put_metadata(&self, metadata: &TabletMetadata) -> Result<()> {
        if metadata.tablet_id != self.id {
            return Err(MetaError::InvalidArgument(format!(
                "metadata is for tablet {}, not {}",
                metadata.tablet_id, self.id
            )));
        }
        let key = self.metadata_location(metadata.version);
        self.store.put(&key, &metadata.to_bytes()?)?;
        self.note_published(metadata);
        Ok(())
    }

    pub fn get_metadata(&self, version: Version) -> Result<Arc<TabletMetadata>> {
        let key = self.metadata_location(version);
        let metadata = TabletMetadata::from_bytes(&self.store.get(&key)?)?;
        if metadata.tablet_id != self.id || metadata.version != version {
            return Err(MetaError::Corruption(format!(
                "metadata at {key} identifies as tablet {} version {}",
                metadata.tablet_id, metadata.version
            )));
        }
        Ok(Arc::new(metadata))
    }

    /// Remove an expired version. Garbage-collection policy (which
    /// versions are still reachable) is the caller's concern.
    pub fn delete_metadata(&self, version: Version) -> Result<()> {
        self.store.delete(&self.metadata_location(version))
    }

    /// Highest published version, found by listing the metadata prefix.
    pub fn latest_version(&self) -> Result<Version> {
        let prefix = format!("{}/", self.location.metadata_root_location(self.id));
        let latest = self
            .store
            .list(&prefix)?
            .iter()
            .filter_map(|key| LocationProvider::parse_metadata_version(key))
            .max()
            .ok_or_else(|| MetaError::NotFound(format!("tablet {} has no metadata", self.id)))?;
        self.version_hint.fetch_max(latest, Ordering::Relaxed);
        Ok(latest)
    }

    // ---- transaction log lifecycle ------------------------------------

    /// Record a pending log for an in-flight transaction.
    ///
    /// Fails with AlreadyExists if a pending or staged log already holds
    /// this txn id.
    pub fn put_txn_log(&self, log: &TxnLog) -> Result<()> {
        if log.tablet_id != self.id {
            return Err(MetaError::InvalidArgument(format!(
                "txn log is for tablet {}, not {}",
                log.tablet_id, self.id
            )));
        }
        let slog_key = self.txn_slog_location(log.txn_id);
        match self.store.get(&slog_key) {
            Ok(_) => return Err(MetaError::AlreadyExists(slog_key)),
            Err(MetaError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.store.put(&self.txn_log_location(log.txn_id), &log.to_bytes()?)?;
        debug!(tablet_id = self.id, txn_id = log.txn_id, "pending log written");
        Ok(())
    }

    pub fn get_txn_log(&self, txn_id: TxnId) -> Result<TxnLog> {
        self.read_log(&self.txn_log_location(txn_id))
    }

    /// Promote a pending log to staged.
    ///
    /// Idempotent when the staged copy already holds the identical
    /// payload; a diverging staged copy means two transactions claimed
    /// one txn id and is Corruption.
    pub fn stage_txn_log(&self, txn_id: TxnId) -> Result<()> {
        let log = self.get_txn_log(txn_id)?;
        self.put_txn_slog(&log)
    }

    /// Write a staged log directly (coordinator already holds the payload).
    /// Same idempotency contract as [`stage_txn_log`](Self::stage_txn_log).
    pub fn put_txn_slog(&self, log: &TxnLog) -> Result<()> {
        if log.tablet_id != self.id {
            return Err(MetaError::InvalidArgument(format!(
                "txn log is for tablet {}, not {}",
                log.tablet_id, self.id
            )));
        }
        let key = self.txn_slog_location(log.txn_id);
        match self.store.put(&key, &log.to_bytes()?) {
            Ok(()) => {
                debug!(tablet_id = self.id, txn_id = log.txn_id, "log staged");
                Ok(())
            }
            Err(MetaError::AlreadyExists(_)) => {
                let staged = self.read_log(&key)?;
                if staged == *log {
                    Ok(())
                } else {
                    Err(MetaError::Corruption(format!(
                        "staged log for txn {} diverges from pending payload",
                        log.txn_id
                    )))
                }
            }
            Err(e) => Err(e),
        }
    }

    pub fn get_txn_slog(&self, txn_id: TxnId) -> Result<TxnLog> {
        self.read_log(&self.txn_slog_location(txn_id))
    }

    /// Assign `version` to the staged transaction `txn_id`.
    ///
    /// This is the system's only compare-and-swap point: the first writer
    /// of the versioned-log key wins the version. Losing a race surfaces
    /// VersionConflict and the caller retries with a new version. Retrying
    /// an assignment this txn already won is a no-op.
    pub fn assign_version(&self, txn_id: TxnId, version: Version) -> Result<()> {
        if version == 0 {
            return Err(MetaError::InvalidArgument(
                "version 0 is the genesis snapshot and cannot be assigned".into(),
            ));
        }
        let log = self.get_txn_slog(txn_id)?;
        let key = self.txn_vlog_location(version);
        match self.store.put(&key, &log.to_bytes()?) {
            Ok(()) => {
                debug!(tablet_id = self.id, txn_id, version, "version assigned");
                Ok(())
            }
            Err(MetaError::AlreadyExists(_)) => {
                let holder = self.read_log(&key)?;
                if holder.txn_id == txn_id {
                    Ok(())
                } else {
                    Err(MetaError::VersionConflict {
                        version,
                        holder: holder.txn_id,
                    })
                }
            }
            Err(e) => Err(e),
        }
    }

    pub fn get_txn_vlog(&self, version: Version) -> Result<TxnLog> {
        self.read_log(&self.txn_vlog_location(version))
    }

    /// Fold the versioned log for `version` into the prior snapshot and
    /// publish the result.
    ///
    /// Version 1 folds onto the genesis snapshot (stored version 0 if one
    /// was seeded, the implicit empty one otherwise). For any later
    /// version a missing base is a log-order violation. Racing publishers
    /// converge: the fold is deterministic, so if someone else already
    /// published this version their snapshot is returned as-is.
    pub fn apply_version(&self, version: Version) -> Result<Arc<TabletMetadata>> {
        if version == 0 {
            return Err(MetaError::InvalidArgument("cannot apply version 0".into()));
        }
        let log = self.get_txn_vlog(version)?;
        let base = match self.get_metadata(version - 1) {
            Ok(base) => base,
            Err(MetaError::NotFound(_)) if version == 1 => {
                Arc::new(TabletMetadata::genesis(self.id, TabletSchema::default()))
            }
            Err(MetaError::NotFound(_)) => {
                return Err(MetaError::Corruption(format!(
                    "cannot apply version {version}: version {} was never published",
                    version - 1
                )));
            }
            Err(e) => return Err(e),
        };

        let next = apply_txn_log(&base, &log, version)?;
        match self.put_metadata(&next) {
            Ok(()) => Ok(Arc::new(next)),
            Err(MetaError::AlreadyExists(_)) => self.get_metadata(version),
            Err(e) => Err(e),
        }
    }

    /// Reclaim logs whose metadata version is durable and whose retry
    /// window has elapsed. Deleting an absent log is not an error.
    pub fn delete_txn_log(&self, txn_id: TxnId) -> Result<()> {
        self.store.delete(&self.txn_log_location(txn_id))
    }

    pub fn delete_txn_slog(&self, txn_id: TxnId) -> Result<()> {
        self.store.delete(&self.txn_slog_location(txn_id))
    }

    pub fn delete_txn_vlog(&self, version: Version) -> Result<()> {
        self.store.delete(&self.txn_vlog_location(version))
    }

    // ---- snapshot reads ------------------------------------------------

    pub fn get_rowsets(&self, version: Version) -> Result<Vec<Arc<Rowset>>> {
        Ok(self.get_metadata(version)?.rowsets.clone())
    }

    pub fn has_delete_predicates(&self, version: Version) -> Result<bool> {
        Ok(self.get_metadata(version)?.has_delete_predicates())
    }

    /// Resolve the tablet schema: cache, then latest metadata.
    pub fn get_schema(&self) -> Result<Arc<TabletSchema>> {
        if let Some(schema) = self.cached_schema.lock().clone() {
            return Ok(schema);
        }
        let metadata = self.load_latest_metadata()?;
        let schema = Arc::new(metadata.schema.clone());
        *self.cached_schema.lock() = Some(schema.clone());
        Ok(schema)
    }

    /// Look up a schema in the by-id side table.
    pub fn get_schema_by_id(&self, schema_id: u64) -> Result<Arc<TabletSchema>> {
        let bytes = self.store.get(&self.location.schema_location(self.id, schema_id))?;
        let schema: TabletSchema = serde_json::from_slice(&bytes)
            .map_err(|e| MetaError::Corruption(format!("malformed schema {schema_id}: {e}")))?;
        Ok(Arc::new(schema))
    }

    /// Record a schema in the by-id side table.
    pub fn put_schema(&self, schema: &TabletSchema) -> Result<()> {
        let key = self.location.schema_location(self.id, schema.id);
        let bytes = serde_json::to_vec(schema).map_err(|e| MetaError::Storage(e.to_string()))?;
        self.store.put(&key, &bytes)
    }

    // ---- best-effort statistics ----------------------------------------

    /// Cumulative data size of the latest snapshot.
    ///
    /// Observability-only: degrades to 0 on any failure. Never use this
    /// for correctness decisions.
    pub fn data_size(&self) -> u64 {
        match self.load_latest_metadata() {
            Ok(metadata) => metadata.data_size(),
            Err(e) => {
                warn!(tablet_id = self.id, error = %e, "failed to get tablet data size");
                0
            }
        }
    }

    /// Cumulative row count of the latest snapshot. Same contract as
    /// [`data_size`](Self::data_size).
    pub fn num_rows(&self) -> u64 {
        match self.load_latest_metadata() {
            Ok(metadata) => metadata.num_rows(),
            Err(e) => {
                warn!(tablet_id = self.id, error = %e, "failed to get tablet row count");
                0
            }
        }
    }

    // ---- convenience ----------------------------------------------------

    /// Record a logical delete as a pending log: one zero-data rowset
    /// carrying the predicate. No segment is rewritten.
    pub fn delete_data(&self, txn_id: TxnId, predicate: DeletePredicate) -> Result<()> {
        self.put_txn_log(&TxnLog::delete_data(self.id, txn_id, predicate))
    }

    /// Build the writer for this tablet's key model and the requested
    /// batching mode. Pure selection; see the writer module.
    pub fn new_writer(
        &self,
        writer_type: WriterType,
        txn_id: TxnId,
        max_rows_per_segment: u64,
        is_compaction: bool,
    ) -> Result<TabletWriter> {
        let schema = self.get_schema()?;
        let config = WriterConfig {
            tablet_id: self.id,
            txn_id,
            schema: (*schema).clone(),
            is_compaction,
        };
        new_writer(config, writer_type, max_rows_per_segment)
    }

    // ---- version hint ----------------------------------------------------

    /// Prime the version hint so statistics reads can skip the listing.
    pub fn set_version_hint(&self, version: Version) {
        self.version_hint.store(version, Ordering::Relaxed);
    }

    pub fn version_hint(&self) -> Option<Version> {
        match self.version_hint.load(Ordering::Relaxed) {
            0 => None,
            v => Some(v),
        }
    }

    // ---- locations -------------------------------------------------------

    pub fn metadata_location(&self, version: Version) -> String {
        self.location.tablet_metadata_location(self.id, version)
    }

    pub fn metadata_root_location(&self) -> String {
        self.location.metadata_root_location(self.id)
    }

    pub fn txn_log_location(&self, txn_id: TxnId) -> String {
        self.location.txn_log_location(self.id, txn_id)
    }

    pub fn txn_slog_location(&self, txn_id: TxnId) -> String {
        self.location.txn_slog_location(self.id, txn_id)
    }

    pub fn txn_vlog_location(&self, version: Version) -> String {
        self.location.txn_vlog_location(self.id, version)
    }

    pub fn segment_location(&self, segment_name: &str) -> String {
        self.location.segment_location(self.id, segment_name)
    }

    pub fn del_location(&self, del_name: &str) -> String {
        self.location.del_location(self.id, del_name)
    }

    pub fn delvec_location(&self, delvec_name: &str) -> String {
        self.location.delvec_location(self.id, delvec_name)
    }

    pub fn root_location(&self) -> String {
        self.location.root_location(self.id)
    }

    // ---- internals --------------------------------------------------------

    fn read_log(&self, key: &str) -> Result<TxnLog> {
        let log = TxnLog::from_bytes(&self.store.get(key)?)?;
        if log.tablet_id != self.id {
            return Err(MetaError::Corruption(format!(
                "log at {key} identifies as tablet {}",
                log.tablet_id
            )));
        }
        Ok(log)
    }

    fn load_latest_metadata(&self) -> Result<Arc<TabletMetadata>> {
        // The hint only short-circuits the listing; when it is stale or
        // absent the store is consulted.
        let version = match self.version_hint() {
            Some(v) => v,
            None => self.latest_version()?,
        };
        self.get_metadata(version)
    }

    fn note_published(&self, metadata: &TabletMetadata) {
        self.version_hint.fetch_max(metadata.version, Ordering::Relaxed);
        *self.cached_schema.lock() = Some(Arc::new(metadata.schema.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnPredicate, KeyModel, PredicateOp};
    use crate::store::InMemoryStore;

    fn tablet(id: TabletId) -> Tablet {
        let store = Arc::new(InMemoryStore::new());
        let location = Arc::new(LocationProvider::new("lake"));
        Tablet::new(id, store, location)
    }

    fn write_rowset(num_rows: u64) -> Rowset {
        Rowset {
            id: 0,
            overlapped: false,
            segments: if num_rows > 0 { vec!["s.dat".into()] } else { Vec::new() },
            num_rows,
            data_size: num_rows * 16,
            delete_predicate: None,
        }
    }

    fn predicate(column: &str) -> DeletePredicate {
        DeletePredicate {
            conjuncts: vec![ColumnPredicate {
                column: column.into(),
                op: PredicateOp::Eq,
                operands: vec!["x".into()],
            }],
        }
    }

    /// pending → staged → versioned → applied, in one call.
    fn commit(tablet: &Tablet, log: &TxnLog, version: Version) -> Arc<TabletMetadata> {
        tablet.put_txn_log(log).unwrap();
        tablet.stage_txn_log(log.txn_id).unwrap();
        tablet.assign_version(log.txn_id, version).unwrap();
        tablet.apply_version(version).unwrap()
    }

    #[test]
    fn fresh_tablet_has_nothing() {
        let t = tablet(1);

        assert!(t.get_rowsets(1).unwrap_err().is_not_found());
        assert!(t.get_metadata(1).unwrap_err().is_not_found());
        assert!(t.latest_version().unwrap_err().is_not_found());
    }

    #[test]
    fn write_lifecycle_publishes_version_one() {
        let t = tablet(1);
        let log = TxnLog::write(1, 100, vec![write_rowset(1000)]);

        t.put_txn_log(&log).unwrap();
        t.stage_txn_log(100).unwrap();
        t.assign_version(100, 1).unwrap();
        let meta = t.apply_version(1).unwrap();

        assert_eq!(meta.version, 1);
        assert_eq!(meta.rowsets.len(), 1);
        assert_eq!(meta.rowsets[0].num_rows, 1000);

        let rowsets = t.get_rowsets(1).unwrap();
        assert_eq!(rowsets.len(), 1);
        assert_eq!(rowsets[0].num_rows, 1000);
        assert!(!t.has_delete_predicates(1).unwrap());
    }

    #[test]
    fn delete_data_publishes_predicate_only_version() {
        let t = tablet(1);
        commit(&t, &TxnLog::write(1, 100, vec![write_rowset(1000)]), 1);

        t.delete_data(200, predicate("city")).unwrap();
        t.stage_txn_log(200).unwrap();
        t.assign_version(200, 2).unwrap();
        let meta = t.apply_version(2).unwrap();

        assert_eq!(meta.rowsets.len(), 2);
        assert_eq!(meta.rowsets[1].num_rows, 0);
        assert!(meta.rowsets[1].has_delete_predicate());
        assert!(t.has_delete_predicates(2).unwrap());
        assert!(!t.has_delete_predicates(1).unwrap());
    }

    #[test]
    fn pending_log_rejects_duplicate_txn_id() {
        let t = tablet(1);
        let log = TxnLog::write(1, 100, vec![write_rowset(10)]);

        t.put_txn_log(&log).unwrap();
        let err = t.put_txn_log(&log).unwrap_err();
        assert!(matches!(err, MetaError::AlreadyExists(_)));

        // Still rejected after staging, even if the pending copy is gone.
        t.stage_txn_log(100).unwrap();
        t.delete_txn_log(100).unwrap();
        let err = t.put_txn_log(&log).unwrap_err();
        assert!(matches!(err, MetaError::AlreadyExists(_)));
    }

    #[test]
    fn stage_requires_pending_log() {
        let t = tablet(1);
        assert!(t.stage_txn_log(404).unwrap_err().is_not_found());
    }

    #[test]
    fn stage_is_idempotent_on_identical_payload() {
        let t = tablet(1);
        let log = TxnLog::write(1, 100, vec![write_rowset(10)]);

        t.put_txn_log(&log).unwrap();
        t.stage_txn_log(100).unwrap();
        t.stage_txn_log(100).unwrap();

        assert_eq!(t.get_txn_slog(100).unwrap(), log);
    }

    #[test]
    fn diverging_staged_payload_is_corruption() {
        let t = tablet(1);
        t.put_txn_log(&TxnLog::write(1, 100, vec![write_rowset(10)])).unwrap();
        t.stage_txn_log(100).unwrap();

        let err = t
            .put_txn_slog(&TxnLog::write(1, 100, vec![write_rowset(11)]))
            .unwrap_err();
        assert!(matches!(err, MetaError::Corruption(_)));
    }

    #[test]
    fn assign_version_requires_staged_log() {
        let t = tablet(1);
        t.put_txn_log(&TxnLog::write(1, 100, vec![write_rowset(10)])).unwrap();

        assert!(t.assign_version(100, 1).unwrap_err().is_not_found());
    }

    #[test]
    fn version_race_has_exactly_one_winner() {
        let t = tablet(1);
        for txn_id in [100, 200] {
            t.put_txn_log(&TxnLog::write(1, txn_id, vec![write_rowset(10)])).unwrap();
            t.stage_txn_log(txn_id).unwrap();
        }

        t.assign_version(100, 1).unwrap();
        let err = t.assign_version(200, 1).unwrap_err();
        assert_eq!(err, MetaError::VersionConflict { version: 1, holder: 100 });

        // The winner can retry its own assignment.
        t.assign_version(100, 1).unwrap();
        // The loser retries with the next version.
        t.assign_version(200, 2).unwrap();
    }

    #[test]
    fn concurrent_assign_version_is_mutually_exclusive() {
        let t = tablet(1);
        let txn_ids: Vec<TxnId> = (100..116).collect();
        for &txn_id in &txn_ids {
            t.put_txn_log(&TxnLog::write(1, txn_id, vec![write_rowset(1)])).unwrap();
            t.stage_txn_log(txn_id).unwrap();
        }

        let mut outcomes = Vec::new();
        std::thread::scope(|scope| {
            let t = &t;
            let handles: Vec<_> = txn_ids
                .iter()
                .map(|&txn_id| scope.spawn(move || t.assign_version(txn_id, 1)))
                .collect();
            for handle in handles {
                outcomes.push(handle.join().unwrap());
            }
        });

        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(outcomes
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(MetaError::VersionConflict { version: 1, .. }))));
    }

    #[test]
    fn apply_requires_versioned_log() {
        let t = tablet(1);
        assert!(t.apply_version(1).unwrap_err().is_not_found());
    }

    #[test]
    fn apply_with_missing_base_is_corruption() {
        let t = tablet(1);
        t.put_txn_log(&TxnLog::write(1, 100, vec![write_rowset(10)])).unwrap();
        t.stage_txn_log(100).unwrap();
        t.assign_version(100, 3).unwrap();

        let err = t.apply_version(3).unwrap_err();
        assert!(matches!(err, MetaError::Corruption(_)));
    }

    #[test]
    fn apply_is_idempotent_for_racing_publishers() {
        let t = tablet(1);
        let meta = commit(&t, &TxnLog::write(1, 100, vec![write_rowset(10)]), 1);

        let again = t.apply_version(1).unwrap();
        assert_eq!(*again, *meta);
    }

    #[test]
    fn versions_form_contiguous_sequence() {
        let t = tablet(1);
        for i in 0..5u64 {
            commit(&t, &TxnLog::write(1, 100 + i, vec![write_rowset(10)]), i + 1);
        }

        assert_eq!(t.latest_version().unwrap(), 5);
        for version in 1..=5u64 {
            let meta = t.get_metadata(version).unwrap();
            assert_eq!(meta.version, version);
            assert_eq!(meta.rowsets.len(), version as usize);
        }
    }

    #[test]
    fn seeded_genesis_pins_the_schema() {
        let t = tablet(1);
        let schema = TabletSchema::primary_key(7, vec!["k".into(), "v".into()]);
        t.put_metadata(&TabletMetadata::genesis(1, schema.clone())).unwrap();

        commit(&t, &TxnLog::write(1, 100, vec![write_rowset(10)]), 1);

        assert_eq!(*t.get_schema().unwrap(), schema);
        let writer = t.new_writer(WriterType::Horizontal, 101, 0, false).unwrap();
        assert_eq!(writer.key_model(), KeyModel::PrimaryKey);
    }

    #[test]
    fn schema_side_table_round_trips() {
        let t = tablet(1);
        let schema = TabletSchema::general(9, vec!["a".into()]);

        t.put_schema(&schema).unwrap();
        assert_eq!(*t.get_schema_by_id(9).unwrap(), schema);
        assert!(t.get_schema_by_id(8).unwrap_err().is_not_found());
    }

    #[test]
    fn new_writer_validates_before_io() {
        let t = tablet(1);
        t.put_metadata(&TabletMetadata::genesis(1, TabletSchema::default())).unwrap();

        let err = t.new_writer(WriterType::Vertical, 100, 0, true).unwrap_err();
        assert!(matches!(err, MetaError::InvalidArgument(_)));
    }

    #[test]
    fn statistics_reflect_latest_snapshot() {
        let t = tablet(1);
        commit(&t, &TxnLog::write(1, 100, vec![write_rowset(1000)]), 1);

        assert_eq!(t.num_rows(), 1000);
        assert_eq!(t.data_size(), 16000);
        assert_eq!(t.version_hint(), Some(1));
    }

    #[test]
    fn statistics_degrade_to_zero_on_failure() {
        // No metadata at all: both reads warn and return 0.
        let t = tablet(1);
        assert_eq!(t.num_rows(), 0);
        assert_eq!(t.data_size(), 0);
    }

    #[test]
    fn stale_version_hint_is_not_trusted_blindly() {
        let t = tablet(1);
        commit(&t, &TxnLog::write(1, 100, vec![write_rowset(10)]), 1);
        commit(&t, &TxnLog::write(1, 200, vec![write_rowset(20)]), 2);

        // A hint behind the latest version still reads a complete snapshot.
        t.set_version_hint(1);
        assert_eq!(t.num_rows(), 10);

        // Dropping the hint falls back to the listing.
        let t2 = Tablet::new(1, t.store.clone(), t.location.clone());
        assert_eq!(t2.num_rows(), 30);
    }

    #[test]
    fn aborted_txn_leaves_only_safe_garbage() {
        let t = tablet(1);
        t.put_txn_log(&TxnLog::write(1, 100, vec![write_rowset(10)])).unwrap();
        t.stage_txn_log(100).unwrap();
        // Abort before assign_version: no vlog, no metadata references it.
        assert!(t.latest_version().unwrap_err().is_not_found());

        // A background reclaimer can drop the orphans.
        t.delete_txn_log(100).unwrap();
        t.delete_txn_slog(100).unwrap();
        assert!(t.get_txn_slog(100).unwrap_err().is_not_found());
    }

    #[test]
    fn reclaiming_logs_after_publish_keeps_metadata_readable() {
        let t = tablet(1);
        commit(&t, &TxnLog::write(1, 100, vec![write_rowset(10)]), 1);

        t.delete_txn_log(100).unwrap();
        t.delete_txn_slog(100).unwrap();
        t.delete_txn_vlog(1).unwrap();

        assert_eq!(t.get_rowsets(1).unwrap().len(), 1);
    }

    #[test]
    fn published_snapshots_stay_valid_across_new_versions() {
        let t = tablet(1);
        let v1 = commit(&t, &TxnLog::write(1, 100, vec![write_rowset(10)]), 1);
        let v2 = commit(&t, &TxnLog::write(1, 200, vec![write_rowset(20)]), 2);

        // The older handle is untouched by the newer publish.
        assert_eq!(v1.rowsets.len(), 1);
        assert_eq!(v2.rowsets.len(), 2);
        assert!(Arc::ptr_eq(&v2.rowsets[0], &v1.rowsets[0]) || *v2.rowsets[0] == *v1.rowsets[0]);
    }
}
