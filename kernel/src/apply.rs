// Deterministic Apply
//
// Folds a versioned transaction log into the prior metadata snapshot,
// producing the next version. This function is pure, deterministic, and
// side-effect free: every replica folding the same (base, log, version)
// triple produces an identical snapshot.

use std::sync::Arc;

use crate::error::{MetaError, Result};
use crate::metadata::{Rowset, TabletMetadata, Version};
use crate::txn::{TxnLog, TxnOp};

/// Fold `log` into `base`, producing the snapshot at `version`.
///
/// `version` must be exactly `base.version + 1`; anything else is a
/// log-order violation and reported as Corruption.
pub fn apply_txn_log(base: &TabletMetadata, log: &TxnLog, version: Version) -> Result<TabletMetadata> {
    if log.tablet_id != base.tablet_id {
        return Err(MetaError::Corruption(format!(
            "txn {} targets tablet {} but base metadata is for tablet {}",
            log.txn_id, log.tablet_id, base.tablet_id
        )));
    }
    if version != base.version + 1 {
        return Err(MetaError::Corruption(format!(
            "cannot apply version {} on top of version {}",
            version, base.version
        )));
    }

    let mut next = TabletMetadata {
        tablet_id: base.tablet_id,
        version,
        schema: base.schema.clone(),
        next_rowset_id: base.next_rowset_id,
        rowsets: base.rowsets.clone(),
    };

    match &log.op {
        TxnOp::Write { rowsets } => {
            for rowset in rowsets {
                let adopted = adopt(&mut next, rowset)?;
                next.rowsets.push(adopted);
            }
        }
        TxnOp::Compaction {
            input_rowset_ids,
            output_rowsets,
        } => {
            let (start, len) = locate_inputs(base, input_rowset_ids)?;

            let input_rows: u64 = base.rowsets[start..start + len].iter().map(|r| r.num_rows).sum();
            let output_rows: u64 = output_rowsets.iter().map(|r| r.num_rows).sum();
            // Delete predicates may shrink the output; it can never grow.
            if output_rows > input_rows {
                return Err(MetaError::Corruption(format!(
                    "compaction output has {} rows but inputs only had {}",
                    output_rows, input_rows
                )));
            }

            let mut outputs = Vec::with_capacity(output_rowsets.len());
            for rowset in output_rowsets {
                outputs.push(adopt(&mut next, rowset)?);
            }
            let mut rowsets = Vec::with_capacity(base.rowsets.len() - len + outputs.len());
            rowsets.extend_from_slice(&base.rowsets[..start]);
            rowsets.extend(outputs);
            rowsets.extend_from_slice(&base.rowsets[start + len..]);
            next.rowsets = rowsets;
        }
        TxnOp::SchemaChange { schema } => {
            next.schema = schema.clone();
        }
    }

    Ok(next)
}

/// Assign the next rowset id and take ownership of a log-carried rowset.
fn adopt(next: &mut TabletMetadata, rowset: &Rowset) -> Result<Arc<Rowset>> {
    if rowset.num_rows > 0 && rowset.segments.is_empty() {
        return Err(MetaError::Corruption(format!(
            "rowset claims {} rows but has no segments",
            rowset.num_rows
        )));
    }
    let mut adopted = rowset.clone();
    adopted.id = next.next_rowset_id;
    next.next_rowset_id += 1;
    Ok(Arc::new(adopted))
}

/// Resolve compaction inputs to a contiguous run in the base rowset list.
///
/// Inputs are captured by rowset identity at transaction-creation time, so
/// a missing or non-contiguous input means the log is malformed relative
/// to the base it is being applied to.
fn locate_inputs(base: &TabletMetadata, input_ids: &[u64]) -> Result<(usize, usize)> {
    if input_ids.is_empty() {
        return Err(MetaError::Corruption("compaction with no input rowsets".into()));
    }

    let mut start = None;
    for (offset, id) in input_ids.iter().enumerate() {
        let pos = base
            .rowsets
            .iter()
            .position(|r| r.id == *id)
            .ok_or_else(|| {
                MetaError::Corruption(format!("compaction input rowset {id} not in base version"))
            })?;
        match start {
            None => start = Some(pos),
            Some(first) if pos != first + offset => {
                return Err(MetaError::Corruption(format!(
                    "compaction inputs are not a contiguous run (rowset {id} out of place)"
                )));
            }
            Some(_) => {}
        }
    }

    Ok((start.unwrap_or(0), input_ids.len()))
}
