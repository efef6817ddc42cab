// Transaction Log
//
// A TxnLog records a mutation before it is folded into metadata. The same
// payload moves through three durability stages, distinguished by storage
// key alone: pending (keyed by txn id), staged (keyed by txn id), and
// versioned (keyed by the version it will produce).

use serde::{Deserialize, Serialize};

use crate::error::{MetaError, Result};
use crate::metadata::{DeletePredicate, Rowset, RowsetId, TabletId, TabletSchema};

/// Identifier of a transaction, allocated by the commit coordinator.
pub type TxnId = u64;

/// Lifecycle stage of a transaction log. The stage is a property of the
/// storage key, not a field of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStage {
    Pending,
    Staged,
    Versioned,
}

/// Operation payload of a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TxnOp {
    /// Append new rowsets. A delete-predicate-only mutation is a Write
    /// carrying one zero-row, zero-byte rowset with the predicate attached.
    Write { rowsets: Vec<Rowset> },

    /// Replace a contiguous run of input rowsets, captured by identity at
    /// transaction-creation time, with the compacted outputs.
    Compaction {
        input_rowset_ids: Vec<RowsetId>,
        output_rowsets: Vec<Rowset>,
    },

    /// Swap the embedded schema.
    SchemaChange { schema: TabletSchema },
}

/// A not-yet-applied mutation of one tablet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxnLog {
    pub tablet_id: TabletId,
    pub txn_id: TxnId,
    pub op: TxnOp,
}

impl TxnLog {
    pub fn write(tablet_id: TabletId, txn_id: TxnId, rowsets: Vec<Rowset>) -> Self {
        Self {
            tablet_id,
            txn_id,
            op: TxnOp::Write { rowsets },
        }
    }

    pub fn compaction(
        tablet_id: TabletId,
        txn_id: TxnId,
        input_rowset_ids: Vec<RowsetId>,
        output_rowsets: Vec<Rowset>,
    ) -> Self {
        Self {
            tablet_id,
            txn_id,
            op: TxnOp::Compaction {
                input_rowset_ids,
                output_rowsets,
            },
        }
    }

    pub fn schema_change(tablet_id: TabletId, txn_id: TxnId, schema: TabletSchema) -> Self {
        Self {
            tablet_id,
            txn_id,
            op: TxnOp::SchemaChange { schema },
        }
    }

    /// A logical delete: one synthetic zero-data rowset carrying the
    /// predicate. No segment is rewritten; readers and compactions honor
    /// the predicate lazily.
    pub fn delete_data(tablet_id: TabletId, txn_id: TxnId, predicate: DeletePredicate) -> Self {
        let rowset = Rowset {
            id: 0,
            overlapped: false,
            segments: Vec::new(),
            num_rows: 0,
            data_size: 0,
            delete_predicate: Some(predicate),
        };
        Self::write(tablet_id, txn_id, vec![rowset])
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| MetaError::Storage(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| MetaError::Corruption(format!("malformed txn log: {e}")))
    }
}
