// Tablet Metadata Model
//
// Immutable snapshot types. A tablet's state is a sequence of
// TabletMetadata versions; each version owns an ordered rowset list.
// Unaffected rowsets are shared (reference-counted) across versions,
// never duplicated.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{MetaError, Result};

/// Stable identifier for a tablet (a table partition's storage unit).
pub type TabletId = u64;

/// Logical version of a tablet. Version 0 is the empty genesis snapshot.
pub type Version = u64;

/// Identifier of a rowset within one tablet, assigned at apply time.
pub type RowsetId = u64;

/// Key semantics of a tablet's schema.
///
/// Primary-key tablets require merge-on-write: a new write may logically
/// supersede older rows sharing a key. General tablets are append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyModel {
    General,
    PrimaryKey,
}

/// Logical schema of a tablet.
///
/// Column encodings are out of scope here; the kernel only needs the key
/// model and a stable schema id for the by-id side table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabletSchema {
    pub id: u64,
    pub key_model: KeyModel,
    pub columns: Vec<String>,
}

impl TabletSchema {
    pub fn general(id: u64, columns: Vec<String>) -> Self {
        Self {
            id,
            key_model: KeyModel::General,
            columns,
        }
    }

    pub fn primary_key(id: u64, columns: Vec<String>) -> Self {
        Self {
            id,
            key_model: KeyModel::PrimaryKey,
            columns,
        }
    }
}

impl Default for TabletSchema {
    fn default() -> Self {
        TabletSchema::general(0, Vec::new())
    }
}

/// Comparison operator of a single delete condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
}

/// One column condition inside a delete predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPredicate {
    pub column: String,
    pub op: PredicateOp,
    pub operands: Vec<String>,
}

/// A logical-delete condition.
///
/// Applying one never rewrites data: it is recorded on a zero-row rowset
/// and honored lazily by readers and compactions (deferred deletion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePredicate {
    pub conjuncts: Vec<ColumnPredicate>,
}

/// An immutable group of data segments contributed by one write or
/// compaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rowset {
    /// Assigned when the rowset is adopted by a metadata version; 0 while
    /// the rowset still lives inside a transaction log.
    pub id: RowsetId,

    /// Whether row keys may overlap other rowsets of the same version.
    /// False for non-overlapping sorted output (compactions, sorted loads).
    pub overlapped: bool,

    /// Segment file names, resolved to full keys by the location component.
    pub segments: Vec<String>,

    pub num_rows: u64,
    pub data_size: u64,

    pub delete_predicate: Option<DeletePredicate>,
}

impl Rowset {
    pub fn has_delete_predicate(&self) -> bool {
        self.delete_predicate.is_some()
    }
}

/// Immutable snapshot of a tablet at one version.
///
/// Once published, a snapshot is never mutated; a new mutation always
/// produces version `V+1`. Handles stay valid regardless of newer
/// versions being published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabletMetadata {
    pub tablet_id: TabletId,
    pub version: Version,
    pub schema: TabletSchema,

    /// Next rowset id to assign at apply time.
    pub next_rowset_id: RowsetId,

    /// Ordered rowset list. Entries are shared with prior versions
    /// (copy-on-write at rowset granularity).
    pub rowsets: Vec<Arc<Rowset>>,
}

impl TabletMetadata {
    /// The empty genesis snapshot (version 0). It needs no stored object:
    /// applying the first versioned log folds onto it.
    pub fn genesis(tablet_id: TabletId, schema: TabletSchema) -> Self {
        Self {
            tablet_id,
            version: 0,
            schema,
            next_rowset_id: 1,
            rowsets: Vec::new(),
        }
    }

    /// Cumulative row count across all rowsets.
    pub fn num_rows(&self) -> u64 {
        self.rowsets.iter().map(|r| r.num_rows).sum()
    }

    /// Cumulative data size in bytes across all rowsets.
    pub fn data_size(&self) -> u64 {
        self.rowsets.iter().map(|r| r.data_size).sum()
    }

    pub fn has_delete_predicates(&self) -> bool {
        self.rowsets.iter().any(|r| r.has_delete_predicate())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| MetaError::Storage(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| MetaError::Corruption(format!("malformed tablet metadata: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rowset(id: RowsetId, num_rows: u64, data_size: u64) -> Arc<Rowset> {
        Arc::new(Rowset {
            id,
            overlapped: false,
            segments: vec![format!("seg-{id}.dat")],
            num_rows,
            data_size,
            delete_predicate: None,
        })
    }

    #[test]
    fn genesis_is_empty() {
        let meta = TabletMetadata::genesis(1, TabletSchema::default());

        assert_eq!(meta.version, 0);
        assert_eq!(meta.num_rows(), 0);
        assert_eq!(meta.data_size(), 0);
        assert!(!meta.has_delete_predicates());
    }

    #[test]
    fn statistics_sum_over_rowsets() {
        let mut meta = TabletMetadata::genesis(1, TabletSchema::default());
        meta.rowsets.push(rowset(1, 100, 4096));
        meta.rowsets.push(rowset(2, 50, 2048));

        assert_eq!(meta.num_rows(), 150);
        assert_eq!(meta.data_size(), 6144);
    }

    #[test]
    fn metadata_round_trips_through_bytes() {
        let mut meta = TabletMetadata::genesis(7, TabletSchema::primary_key(3, vec!["k".into()]));
        meta.version = 2;
        meta.rowsets.push(rowset(1, 10, 100));

        let decoded = TabletMetadata::from_bytes(&meta.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn malformed_bytes_are_corruption() {
        let err = TabletMetadata::from_bytes(b"not json").unwrap_err();
        assert!(matches!(err, MetaError::Corruption(_)));
    }
}
