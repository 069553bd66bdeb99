//! The latest collected volume statistics and their hand-off to readers.
//!
//! A [`Reporter`] is the single writer. Every call to [`Reporter::report`] builds a
//! complete [`Snapshot`] and swaps it in as one value, so a [`SnapshotReader`]
//! observes either the previous or the new snapshot, never a mix of both.

use std::sync::Arc;

use tokio::sync::watch;

use crate::mountinfo::MountRecord;
use crate::scan::ScanResult;
use crate::usage::BlockUsage;

/// One complete set of reported values.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Snapshot {
    /// Timestamp (in UNIX epoch seconds)
    timestamp: u64,
    mount: Arc<MountRecord>,
    scan: ScanResult,
    blocks: BlockUsage,
    /// Set when the block statistics could not be read and `blocks` is zeroed.
    blocks_degraded: bool,
}

impl Snapshot {
    pub fn mount(&self) -> &MountRecord {
        &self.mount
    }

    pub fn scan(&self) -> &ScanResult {
        &self.scan
    }

    pub fn blocks(&self) -> &BlockUsage {
        &self.blocks
    }

    pub fn blocks_degraded(&self) -> bool {
        self.blocks_degraded
    }
}

/// Publishes snapshots for a fixed mount.
#[derive(Debug)]
pub struct Reporter {
    mount: Arc<MountRecord>,
    tx: watch::Sender<Option<Arc<Snapshot>>>,
}

impl Reporter {
    /// Creates a reporter for `mount` together with a reader for its snapshots.
    ///
    /// The reader yields `None` until the first report.
    pub fn new(mount: MountRecord) -> (Self, SnapshotReader) {
        let (tx, rx) = watch::channel(None);
        let reporter = Self {
            mount: Arc::new(mount),
            tx,
        };
        (reporter, SnapshotReader { rx })
    }

    pub fn mount(&self) -> &MountRecord {
        &self.mount
    }

    /// Replaces the current snapshot.
    ///
    /// `blocks` is `None` when the block statistics could not be read; the snapshot
    /// then carries zeroed usage and is flagged as degraded.
    pub fn report(&self, scan: ScanResult, blocks: Option<BlockUsage>) {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let snapshot = Snapshot {
            timestamp,
            mount: Arc::clone(&self.mount),
            scan,
            blocks: blocks.unwrap_or_default(),
            blocks_degraded: blocks.is_none(),
        };
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }
}

/// Read-only handle to the latest [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    rx: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotReader {
    /// Returns the latest snapshot, or `None` if nothing was reported yet.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.rx.borrow().clone()
    }
}
