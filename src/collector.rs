use std::path::PathBuf;

use crate::error::ResultOkLogExt;
use crate::snapshot::Reporter;
use crate::{scan, usage};

/// Runs one scan-and-report cycle for a target directory.
#[derive(Debug)]
pub struct Collector {
    target: PathBuf,
    reporter: Reporter,
}

impl Collector {
    /// Creates a collector that scans the reporter's resolved target path.
    pub fn new(reporter: Reporter) -> Self {
        Self {
            target: reporter.mount().target().to_path_buf(),
            reporter,
        }
    }

    /// Scans the target, reads block usage of its filesystem and publishes the result.
    ///
    /// The filesystem work runs on the blocking thread pool. Failures are absorbed:
    /// unreadable entries are counted by the scan, a failed block statistics query
    /// yields a degraded snapshot.
    pub async fn collect(&self) {
        let target = self.target.clone();
        log::info!("Updating stats for {}", target.display());

        let collected = tokio::task::spawn_blocking(move || {
            let scan = scan::scan(&target);
            let blocks = usage::read_block_usage(&target).ok_log();
            (scan, blocks)
        })
        .await;

        match collected {
            Ok((scan, blocks)) => {
                log::debug!(
                    target: "collector",
                    "scan finished: size={} files={} directories={} errors={} took={}us",
                    scan.size_bytes,
                    scan.files,
                    scan.directories,
                    scan.errors,
                    scan.elapsed_micros()
                );
                self.reporter.report(scan, blocks);
            }
            Err(err) => log::error!("Stats collection task failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mountinfo::MountRecord;

    #[tokio::test]
    async fn test_collect_publishes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a"), [0u8; 100]).unwrap();
        std::fs::write(dir.path().join("b"), [0u8; 200]).unwrap();
        std::fs::write(dir.path().join("c"), [0u8; 300]).unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();

        let (reporter, reader) = Reporter::new(MountRecord::unknown(dir.path()));
        let collector = Collector::new(reporter);
        collector.collect().await;

        let snapshot = reader.current().unwrap();
        assert_eq!(snapshot.scan().size_bytes, 600);
        assert_eq!(snapshot.scan().files, 3);
        assert_eq!(snapshot.scan().directories, 1);
        assert_eq!(snapshot.scan().errors, 0);
        assert!(!snapshot.blocks_degraded());
        assert_eq!(
            snapshot.blocks().used_bytes,
            snapshot.blocks().total_bytes - snapshot.blocks().free_bytes
        );
    }

    #[tokio::test]
    async fn test_collect_missing_target_is_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");

        let (reporter, reader) = Reporter::new(MountRecord::unknown(&missing));
        Collector::new(reporter).collect().await;

        let snapshot = reader.current().unwrap();
        assert_eq!(snapshot.scan().errors, 1);
        assert!(snapshot.blocks_degraded());
        assert_eq!(snapshot.blocks().total_bytes, 0);
    }

    #[tokio::test]
    async fn test_consecutive_cycles_match() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/file"), [0u8; 64]).unwrap();

        let (reporter, reader) = Reporter::new(MountRecord::unknown(dir.path()));
        let collector = Collector::new(reporter);
        collector.collect().await;
        let first = reader.current().unwrap();
        collector.collect().await;
        let second = reader.current().unwrap();

        assert_eq!(first.scan().size_bytes, second.scan().size_bytes);
        assert_eq!(first.scan().files, second.scan().files);
        assert_eq!(first.scan().directories, second.scan().directories);
        assert_eq!(first.scan().errors, second.scan().errors);
    }
}
