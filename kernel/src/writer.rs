// Tablet Writers
//
// Four writer variants over two independent axes:
//   key model:     general (append-only) vs primary-key (merge-on-write)
//   batching mode: horizontal (row-at-a-time) vs vertical (column groups)
//
// Selection is a pure function of schema key model plus caller parameters;
// no writer ever inspects data to pick a strategy. Writers account rows
// and bytes and cut segments, they do not encode them: segment encoding
// belongs to the data path, not to this kernel.

use uuid::Uuid;

use crate::error::{MetaError, Result};
use crate::metadata::{KeyModel, Rowset, TabletId, TabletSchema};
use crate::txn::TxnId;

/// Row-batching mode requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterType {
    Horizontal,
    Vertical,
}

/// Horizontal segments are cut by whichever threshold trips first.
pub const MAX_SEGMENT_ROWS: u64 = 1 << 20;
pub const MAX_SEGMENT_BYTES: u64 = 256 * 1024 * 1024;

/// Writer parameters fixed at construction. Two writers built from equal
/// configurations behave identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    pub tablet_id: TabletId,
    pub txn_id: TxnId,
    pub schema: TabletSchema,
    pub is_compaction: bool,
}

/// Select the writer variant for (key model × batching mode).
///
/// Pure and side-effect free. Vertical mode with a zero row cap is
/// rejected up front with InvalidArgument.
pub fn new_writer(
    config: WriterConfig,
    writer_type: WriterType,
    max_rows_per_segment: u64,
) -> Result<TabletWriter> {
    if writer_type == WriterType::Vertical && max_rows_per_segment == 0 {
        return Err(MetaError::InvalidArgument(
            "vertical writer requires a non-zero max_rows_per_segment".into(),
        ));
    }

    let writer = match (config.schema.key_model, writer_type) {
        (KeyModel::General, WriterType::Horizontal) => {
            TabletWriter::HorizontalGeneral(HorizontalGeneralWriter {
                inner: HorizontalState::new(config),
            })
        }
        (KeyModel::General, WriterType::Vertical) => {
            TabletWriter::VerticalGeneral(VerticalGeneralWriter {
                inner: VerticalState::new(config, max_rows_per_segment),
            })
        }
        (KeyModel::PrimaryKey, WriterType::Horizontal) => {
            TabletWriter::HorizontalPk(HorizontalPkWriter {
                inner: HorizontalState::new(config),
                key_collisions: 0,
            })
        }
        (KeyModel::PrimaryKey, WriterType::Vertical) => {
            TabletWriter::VerticalPk(VerticalPkWriter {
                inner: VerticalState::new(config, max_rows_per_segment),
                key_collisions: 0,
            })
        }
    };
    Ok(writer)
}

/// One writer per (key model × batching mode) combination.
#[derive(Debug)]
pub enum TabletWriter {
    HorizontalGeneral(HorizontalGeneralWriter),
    VerticalGeneral(VerticalGeneralWriter),
    HorizontalPk(HorizontalPkWriter),
    VerticalPk(VerticalPkWriter),
}

impl TabletWriter {
    pub fn writer_type(&self) -> WriterType {
        match self {
            TabletWriter::HorizontalGeneral(_) | TabletWriter::HorizontalPk(_) => {
                WriterType::Horizontal
            }
            TabletWriter::VerticalGeneral(_) | TabletWriter::VerticalPk(_) => WriterType::Vertical,
        }
    }

    pub fn key_model(&self) -> KeyModel {
        match self {
            TabletWriter::HorizontalGeneral(_) | TabletWriter::VerticalGeneral(_) => {
                KeyModel::General
            }
            TabletWriter::HorizontalPk(_) | TabletWriter::VerticalPk(_) => KeyModel::PrimaryKey,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        match self {
            TabletWriter::HorizontalGeneral(w) => &w.inner.config,
            TabletWriter::VerticalGeneral(w) => &w.inner.config,
            TabletWriter::HorizontalPk(w) => &w.inner.config,
            TabletWriter::VerticalPk(w) => &w.inner.config,
        }
    }

    pub fn is_compaction(&self) -> bool {
        self.config().is_compaction
    }

    /// Row cap per segment and column group. `None` for horizontal
    /// writers, which cut segments by internal thresholds instead.
    pub fn max_rows_per_segment(&self) -> Option<u64> {
        match self {
            TabletWriter::VerticalGeneral(w) => Some(w.inner.max_rows_per_segment),
            TabletWriter::VerticalPk(w) => Some(w.inner.max_rows_per_segment),
            _ => None,
        }
    }

    /// Account a batch of rows.
    ///
    /// Horizontal: complete rows appended to the current segment.
    /// Vertical: rows of the current column group.
    pub fn write(&mut self, num_rows: u64, num_bytes: u64) -> Result<()> {
        match self {
            TabletWriter::HorizontalGeneral(w) => w.inner.write(num_rows, num_bytes),
            TabletWriter::HorizontalPk(w) => w.inner.write(num_rows, num_bytes),
            TabletWriter::VerticalGeneral(w) => w.inner.write(num_rows, num_bytes),
            TabletWriter::VerticalPk(w) => w.inner.write(num_rows, num_bytes),
        }
    }

    /// Close the current column group and move to the next.
    ///
    /// Every group must carry the same total row count as the first.
    /// InvalidArgument when called on a horizontal writer.
    pub fn finish_column_group(&mut self) -> Result<()> {
        match self {
            TabletWriter::VerticalGeneral(w) => w.inner.finish_column_group(),
            TabletWriter::VerticalPk(w) => w.inner.finish_column_group(),
            _ => Err(MetaError::InvalidArgument(
                "column groups only apply to vertical writers".into(),
            )),
        }
    }

    /// Record rows superseded by key collisions (merge-on-write).
    ///
    /// InvalidArgument on general writers, which have no key semantics.
    pub fn record_key_collisions(&mut self, rows: u64) -> Result<()> {
        match self {
            TabletWriter::HorizontalPk(w) => {
                w.key_collisions += rows;
                Ok(())
            }
            TabletWriter::VerticalPk(w) => {
                w.key_collisions += rows;
                Ok(())
            }
            _ => Err(MetaError::InvalidArgument(
                "key collisions only apply to primary-key writers".into(),
            )),
        }
    }

    /// Rows superseded so far. Always 0 for general writers.
    pub fn key_collisions(&self) -> u64 {
        match self {
            TabletWriter::HorizontalPk(w) => w.key_collisions,
            TabletWriter::VerticalPk(w) => w.key_collisions,
            _ => 0,
        }
    }

    /// Seal the writer and hand back the produced rowset.
    ///
    /// The rowset id is 0 until a metadata version adopts it.
    pub fn finish(self) -> Result<Rowset> {
        match self {
            TabletWriter::HorizontalGeneral(w) => w.inner.finish(KeyModel::General),
            TabletWriter::HorizontalPk(w) => w.inner.finish(KeyModel::PrimaryKey),
            TabletWriter::VerticalGeneral(w) => w.inner.finish(),
            TabletWriter::VerticalPk(w) => w.inner.finish(),
        }
    }
}

#[derive(Debug)]
pub struct HorizontalGeneralWriter {
    inner: HorizontalState,
}

#[derive(Debug)]
pub struct HorizontalPkWriter {
    inner: HorizontalState,
    key_collisions: u64,
}

#[derive(Debug)]
pub struct VerticalGeneralWriter {
    inner: VerticalState,
}

#[derive(Debug)]
pub struct VerticalPkWriter {
    inner: VerticalState,
    key_collisions: u64,
}

fn new_segment_name() -> String {
    format!("{}.dat", Uuid::new_v4())
}

/// Row-at-a-time accounting: rows land in the open segment, which is cut
/// when either threshold trips.
#[derive(Debug)]
struct HorizontalState {
    config: WriterConfig,
    segments: Vec<String>,
    open_rows: u64,
    open_bytes: u64,
    total_rows: u64,
    total_bytes: u64,
}

impl HorizontalState {
    fn new(config: WriterConfig) -> Self {
        Self {
            config,
            segments: Vec::new(),
            open_rows: 0,
            open_bytes: 0,
            total_rows: 0,
            total_bytes: 0,
        }
    }

    fn write(&mut self, num_rows: u64, num_bytes: u64) -> Result<()> {
        if num_rows == 0 && num_bytes == 0 {
            return Ok(());
        }
        if self.open_rows == 0 && self.open_bytes == 0 {
            self.segments.push(new_segment_name());
        }
        self.open_rows += num_rows;
        self.open_bytes += num_bytes;
        self.total_rows += num_rows;
        self.total_bytes += num_bytes;
        if self.open_rows >= MAX_SEGMENT_ROWS || self.open_bytes >= MAX_SEGMENT_BYTES {
            self.open_rows = 0;
            self.open_bytes = 0;
        }
        Ok(())
    }

    fn finish(self, key_model: KeyModel) -> Result<Rowset> {
        // Merge-on-write output is always key-disjoint; general multi-segment
        // flushes may overlap unless produced by a compaction.
        let overlapped = key_model == KeyModel::General
            && !self.config.is_compaction
            && self.segments.len() > 1;
        Ok(Rowset {
            id: 0,
            overlapped,
            segments: self.segments,
            num_rows: self.total_rows,
            data_size: self.total_bytes,
            delete_predicate: None,
        })
    }
}

/// Column-group-at-a-time accounting: the first group fixes the row
/// layout, later groups must match it row-for-row. Segments hold at most
/// `max_rows_per_segment` rows each, bounding peak memory for wide
/// schemas.
#[derive(Debug)]
struct VerticalState {
    config: WriterConfig,
    max_rows_per_segment: u64,
    group_rows: u64,
    first_group_rows: Option<u64>,
    total_bytes: u64,
}

impl VerticalState {
    fn new(config: WriterConfig, max_rows_per_segment: u64) -> Self {
        Self {
            config,
            max_rows_per_segment,
            group_rows: 0,
            first_group_rows: None,
            total_bytes: 0,
        }
    }

    fn write(&mut self, num_rows: u64, num_bytes: u64) -> Result<()> {
        if let Some(expected) = self.first_group_rows {
            if self.group_rows + num_rows > expected {
                return Err(MetaError::InvalidArgument(format!(
                    "column group overflows the row layout fixed by the first group ({expected} rows)"
                )));
            }
        }
        self.group_rows += num_rows;
        self.total_bytes += num_bytes;
        Ok(())
    }

    fn finish_column_group(&mut self) -> Result<()> {
        match self.first_group_rows {
            None => self.first_group_rows = Some(self.group_rows),
            Some(expected) if self.group_rows != expected => {
                return Err(MetaError::InvalidArgument(format!(
                    "column group has {} rows, expected {}",
                    self.group_rows, expected
                )));
            }
            Some(_) => {}
        }
        self.group_rows = 0;
        Ok(())
    }

    fn finish(mut self) -> Result<Rowset> {
        if self.group_rows > 0 {
            self.finish_column_group()?;
        }
        let num_rows = self.first_group_rows.unwrap_or(0);
        let num_segments = num_rows.div_ceil(self.max_rows_per_segment);
        let segments = (0..num_segments).map(|_| new_segment_name()).collect();
        Ok(Rowset {
            id: 0,
            overlapped: false,
            segments,
            num_rows,
            data_size: self.total_bytes,
            delete_predicate: None,
        })
    }
}
