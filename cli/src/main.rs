use std::fs;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use lakelet_kernel::location::LocationProvider;
use lakelet_kernel::metadata::{TabletMetadata, TabletSchema};
use lakelet_kernel::store::InMemoryStore;
use lakelet_kernel::tablet::Tablet;
use lakelet_kernel::txn::TxnLog;

/// Lakelet Tablet CLI
#[derive(Parser, Debug)]
#[command(name = "lakelet")]
#[command(about = "Lakelet tablet metadata replay (dry-run)", long_about = None)]
struct Cli {
    /// Tablet id to replay against
    #[arg(long, default_value_t = 1)]
    tablet_id: u64,

    /// Path to genesis schema JSON (optional)
    #[arg(long)]
    schema: Option<String>,

    /// Path to transaction payload JSON (array of txn logs)
    #[arg(long)]
    txns: String,
}

/// One published version in the replay.
#[derive(Debug, Serialize)]
struct VersionSummary {
    version: u64,
    txn_id: u64,
    rowsets: usize,
    num_rows: u64,
    data_size: u64,
    has_delete_predicates: bool,
}

/// Wrapper for JSON output
#[derive(Debug, Serialize)]
struct CliOutput {
    versions: Vec<VersionSummary>,
    final_metadata: serde_json::Value,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // ----------------------------
    // In-memory store and tablet
    // ----------------------------
    let store = Arc::new(InMemoryStore::new());
    let location = Arc::new(LocationProvider::new("lake"));
    let tablet = Tablet::new(cli.tablet_id, store, location);

    // ----------------------------
    // Seed genesis schema
    // ----------------------------
    if let Some(path) = cli.schema {
        let data = fs::read_to_string(path)?;
        let schema: TabletSchema = serde_json::from_str(&data)?;
        tablet.put_metadata(&TabletMetadata::genesis(cli.tablet_id, schema))?;
    }

    // ----------------------------
    // Load transaction payloads
    // ----------------------------
    let data = fs::read_to_string(&cli.txns)?;
    let logs: Vec<TxnLog> = serde_json::from_str(&data)?;

    // ----------------------------
    // Replay: pending → staged → versioned → applied
    // ----------------------------
    let mut versions = Vec::with_capacity(logs.len());
    let mut final_metadata = serde_json::Value::Null;

    for (i, log) in logs.iter().enumerate() {
        let version = i as u64 + 1;

        tablet.put_txn_log(log)?;
        tablet.stage_txn_log(log.txn_id)?;
        tablet.assign_version(log.txn_id, version)?;
        let metadata = tablet.apply_version(version)?;

        versions.push(VersionSummary {
            version,
            txn_id: log.txn_id,
            rowsets: metadata.rowsets.len(),
            num_rows: metadata.num_rows(),
            data_size: metadata.data_size(),
            has_delete_predicates: metadata.has_delete_predicates(),
        });
        final_metadata = serde_json::to_value(&*metadata)?;
    }

    // ----------------------------
    // Output
    // ----------------------------
    let output = CliOutput {
        versions,
        final_metadata,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
