//! Append-only chain snapshots on the local filesystem.
//!
//! Every save stages the whole chain in a hidden file, syncs it and renames
//! it to a brand-new `chain_<micros>.json`; existing snapshots are never
//! rewritten. A snapshot is a JSON array
//! whose items are the canonical JSON strings of each block.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};

use crate::blockchain::{Block, ChainSettings, validate_chain};
use crate::error::{LedgerError, Result};

const SNAPSHOT_PREFIX: &str = "chain_";
const SNAPSHOT_SUFFIX: &str = ".json";

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `(stamp, path)` of every snapshot file, unordered. A missing
    /// directory simply means nothing has been saved yet.
    fn snapshots(&self) -> Result<Vec<(i64, PathBuf)>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let stamp = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(SNAPSHOT_PREFIX))
                .and_then(|n| n.strip_suffix(SNAPSHOT_SUFFIX))
                .and_then(|n| n.parse::<i64>().ok());
            if let Some(stamp) = stamp {
                found.push((stamp, path));
            }
        }
        Ok(found)
    }

    pub fn latest_path(&self) -> Result<Option<PathBuf>> {
        Ok(self
            .snapshots()?
            .into_iter()
            .max_by_key(|(stamp, _)| *stamp)
            .map(|(_, path)| path))
    }

    /// Load the newest snapshot and re-validate every link.
    ///
    /// `Ok(None)` means no snapshot exists (cold start). Unreadable storage
    /// is `LedgerError::Io`; a broken chain is `EmptySnapshot` or
    /// `InvalidChain`. A snapshot that does not parse is a torn write and
    /// the next older one is tried; `Serialization` is returned only when
    /// none parses.
    ///
    /// Every block is vouched for by its successor's `previous_hash`, so
    /// an edit to the data of the last block in a snapshot goes unnoticed.
    pub fn load_latest(&self, settings: &ChainSettings) -> Result<Option<Vec<Block>>> {
        let mut snapshots = self.snapshots()?;
        snapshots.sort_by_key(|(stamp, _)| std::cmp::Reverse(*stamp));

        let mut torn = None;
        for (_, path) in snapshots {
            debug!("STORE - loading snapshot {}", path.display());
            let blocks = match Self::read_snapshot(&path) {
                Ok(blocks) => blocks,
                Err(LedgerError::Serialization(e)) => {
                    warn!("STORE - skipping unreadable snapshot {}: {e}", path.display());
                    if torn.is_none() {
                        torn = Some(e);
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };
            validate_chain(&blocks, settings)?;
            return Ok(Some(blocks));
        }

        match torn {
            Some(e) => Err(e.into()),
            None => Ok(None),
        }
    }

    fn read_snapshot(path: &Path) -> Result<Vec<Block>> {
        let raw = fs::read_to_string(path)?;
        let serialized: Vec<String> = serde_json::from_str(&raw)?;
        let blocks = serialized
            .iter()
            .map(|s| serde_json::from_str::<Block>(s))
            .collect::<serde_json::Result<Vec<_>>>()?;
        Ok(blocks)
    }

    /// Write `chain` as a new snapshot, unless the newest trusted snapshot
    /// holds a block that `chain` does not have at the same index.
    pub fn save(&self, chain: &[Block], settings: &ChainSettings) -> Result<PathBuf> {
        match self.load_latest(settings) {
            Ok(Some(stored)) => {
                if let Some(missing) = stored
                    .iter()
                    .find(|b| chain.get(b.index as usize) != Some(*b))
                {
                    return Err(LedgerError::Tampered {
                        index: missing.index,
                    });
                }
            }
            Ok(None) => {}
            Err(LedgerError::Io(e)) => return Err(LedgerError::Io(e)),
            Err(e) => warn!("STORE - latest snapshot is not trusted history ({e}); superseding it"),
        }

        let serialized: Vec<String> = chain.iter().map(Block::canonical_json).collect();
        let body = serde_json::to_string(&serialized)?;

        fs::create_dir_all(&self.dir)?;
        let staging = self.dir.join(format!(".{SNAPSHOT_PREFIX}staging{SNAPSHOT_SUFFIX}"));
        let mut file = File::create(&staging)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;
        drop(file);

        let path = self.next_snapshot_path()?;
        fs::rename(&staging, &path)?;

        info!(
            "STORE - wrote snapshot {} ({} blocks)",
            path.display(),
            chain.len()
        );
        Ok(path)
    }

    /// Snapshot name stamped with the current time, never reusing or
    /// preceding an existing name.
    fn next_snapshot_path(&self) -> Result<PathBuf> {
        let newest = self.snapshots()?.into_iter().map(|(s, _)| s).max();
        let mut stamp = Utc::now().timestamp_micros();
        if let Some(newest) = newest {
            stamp = stamp.max(newest.saturating_add(1));
        }

        loop {
            let path = self
                .dir
                .join(format!("{SNAPSHOT_PREFIX}{stamp}{SNAPSHOT_SUFFIX}"));
            if !path.try_exists()? {
                return Ok(path);
            }
            stamp += 1;
        }
    }
}
