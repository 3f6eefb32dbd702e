//! evidencectl: operator CLI for the evidence store.
//!
//! Writes, reads, and verifies records in a hash-chained WORM store, walks
//! the chain, and runs the export workflow against mock platform data.
//!
//! Usage:
//!   evidencectl write --type audit_export --user admin1 payload.json
//!   evidencectl read <hash>
//!   evidencectl verify <hash>
//!   evidencectl export --start 2026-01-01T00:00:00Z
//!   evidencectl verify-chain
//!   evidencectl demo

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use evidence_config::StoreConfig;
use evidence_contracts::{
    record::{METADATA_TYPE_KEY, METADATA_USER_KEY},
    EvidenceError, EvidenceResult, Metadata,
};
use evidence_core::EvidenceStore;
use evidence_exports::{mock_data::MockSource, ExportKind, ExportQuery, ExportService};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Append-only, hash-chained evidence store.
#[derive(Parser)]
#[command(
    name = "evidencectl",
    about = "Write, read, and verify tamper-evident evidence records",
    long_about = "Operates a write-once evidence store in which every record is keyed by the\n\
                  SHA-256 of its content and linked to its predecessor's hash."
)]
struct Cli {
    /// TOML store configuration.  Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory; overrides the config file and EVIDENCE_STORE_DIR.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append a JSON document as a new record and print its receipt.
    Write {
        /// Metadata type tag, e.g. `audit_export`.
        #[arg(long = "type")]
        kind: String,
        /// Actor recorded in metadata.
        #[arg(long)]
        user: Option<String>,
        /// JSON file to seal; `-` or omitted reads stdin.
        file: Option<PathBuf>,
    },
    /// Print the record stored under HASH.
    Read { hash: String },
    /// Check a single record's integrity.  Exits 1 if it fails.
    Verify { hash: String },
    /// Print records in chain order as JSON lines.
    Export {
        /// Inclusive lower bound (RFC 3339).
        #[arg(long, value_parser = parse_time)]
        start: Option<DateTime<Utc>>,
        /// Inclusive upper bound (RFC 3339).
        #[arg(long, value_parser = parse_time)]
        end: Option<DateTime<Utc>>,
    },
    /// Verify every record and link from genesis to head.
    VerifyChain,
    /// Print the hash of the newest record.
    Head,
    /// Seal one export of each kind from mock data and confirm them.
    Demo {
        /// Actor recorded on each export.
        #[arg(long, default_value = "admin1")]
        user: String,
    },
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", s, e))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("evidencectl: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when a check ran but did not pass.
fn run(cli: Cli) -> EvidenceResult<bool> {
    let store = open_store(cli.config, cli.dir)?;

    match cli.command {
        Command::Write { kind, user, file } => write(&store, kind, user, file),
        Command::Read { hash } => {
            print_json(&store.read(&hash)?, true)?;
            Ok(true)
        }
        Command::Verify { hash } => {
            let verified = store.verify(&hash);
            println!("{}", serde_json::json!({ "hash": hash, "verified": verified }));
            Ok(verified)
        }
        Command::Export { start, end } => {
            for record in store.export(start, end)? {
                print_json(&record?, false)?;
            }
            Ok(true)
        }
        Command::VerifyChain => {
            let summary = store.verify_chain()?;
            print_json(&summary, true)?;
            Ok(true)
        }
        Command::Head => {
            match store.head() {
                Some(hash) => println!("{}", hash),
                None => println!("(empty)"),
            }
            Ok(true)
        }
        Command::Demo { user } => demo(store, &user),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn open_store(config: Option<PathBuf>, dir: Option<PathBuf>) -> EvidenceResult<EvidenceStore> {
    let mut config = match config {
        Some(path) => StoreConfig::from_file(&path)?,
        None => StoreConfig::default(),
    }
    .apply_env();
    if let Some(dir) = dir {
        config.dir = dir;
    }

    info!(dir = %config.dir.display(), backend = ?config.backend, "opening evidence store");
    config.open_store()
}

fn write(
    store: &EvidenceStore,
    kind: String,
    user: Option<String>,
    file: Option<PathBuf>,
) -> EvidenceResult<bool> {
    let raw = match file.filter(|p| p.as_path() != Path::new("-")) {
        Some(path) => std::fs::read_to_string(&path).map_err(|e| EvidenceError::StorageIo {
            reason: format!("failed to read '{}': {}", path.display(), e),
        })?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| EvidenceError::StorageIo {
                    reason: format!("failed to read stdin: {}", e),
                })?;
            buf
        }
    };
    let data: Value = serde_json::from_str(&raw)?;

    let mut metadata = Metadata::new().with(METADATA_TYPE_KEY, kind);
    if let Some(user) = user {
        metadata.insert(METADATA_USER_KEY, user);
    }

    let receipt = store.write(&data, metadata)?;
    print_json(&receipt, true)?;
    Ok(true)
}

fn demo(store: EvidenceStore, user: &str) -> EvidenceResult<bool> {
    let service = ExportService::new(Arc::new(store), Box::new(MockSource::new()));
    let query = ExportQuery::default();

    println!();
    println!("Evidence Store Export Demo");
    println!("==========================");

    let mut all_confirmed = true;
    for kind in ExportKind::ALL {
        let envelope = service.export(kind, user, &query)?;
        let confirmed = service.confirm(&envelope.metadata.export_id).is_ok();
        all_confirmed &= confirmed;

        println!();
        println!("  export    : {}", kind);
        println!("  file      : {}", envelope.file_name());
        println!("  entities  : {}", envelope.payload.len());
        println!("  exportId  : {}", envelope.metadata.export_id);
        println!("  verified  : {}", envelope.metadata.verified);
        println!("  confirmed : {}", confirmed);
    }

    let summary = service.store().verify_chain()?;
    println!();
    println!(
        "Chain intact: {} records, head {}",
        summary.length,
        summary.head.as_deref().unwrap_or("(none)")
    );
    println!();

    Ok(all_confirmed)
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> EvidenceResult<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}
