//! Startup ingestion of a manifest tree into the store.
//!
//! A blocking producer walks the tree and feeds directories into a bounded
//! channel. Each directory's files are read, grouped and merged on the
//! blocking pool, at most `workers` directories at a time. The returned
//! future resolves once every directory has been processed.

use std::collections::BTreeMap;
use std::fs;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use futures::stream::StreamExt;
use pkgsource_schema::ManifestType;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use walkdir::WalkDir;

use crate::merger::{ManifestGroupKey, load_singleton, merge_group};
use crate::parser::{inspect, is_yaml_file};
use crate::store::ManifestStore;

/// Counters describing one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Directories processed.
    pub directories: usize,
    /// Records written to the store.
    pub records: usize,
    /// Manifest files that could not be used.
    pub skipped_files: usize,
    /// Multi-file groups that could not be merged.
    pub failed_groups: usize,
}

impl AddAssign for IngestReport {
    fn add_assign(&mut self, other: Self) {
        self.directories += other.directories;
        self.records += other.records;
        self.skipped_files += other.skipped_files;
        self.failed_groups += other.failed_groups;
    }
}

/// Upper bound on concurrently processed directories.
pub const MAX_WORKERS: usize = 1024;

/// Parallel ingestion driver.
#[derive(Debug, Clone, Copy)]
pub struct Ingestor {
    workers: usize,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl Ingestor {
    /// Create an ingestor processing up to `workers` directories at once,
    /// clamped to `1..=MAX_WORKERS`.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_WORKERS),
        }
    }

    /// Number of directories processed concurrently.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Ingest every manifest under `root` into `store`.
    ///
    /// Problems with individual files, groups or subdirectories are logged
    /// and counted, never returned.
    ///
    /// # Errors
    ///
    /// Fails only if `root` is not a readable directory.
    pub async fn run(&self, root: &Path, store: Arc<ManifestStore>) -> Result<IngestReport> {
        let metadata = fs::metadata(root)
            .with_context(|| format!("Failed to read manifest directory {}", root.display()))?;
        if !metadata.is_dir() {
            bail!("Manifest path {} is not a directory", root.display());
        }

        tracing::info!(root = %root.display(), workers = self.workers, "Ingesting manifests");

        let (tx, rx) = mpsc::channel::<PathBuf>(self.workers.saturating_mul(2));
        let walk_root = root.to_path_buf();
        let producer = tokio::task::spawn_blocking(move || {
            for entry in WalkDir::new(&walk_root) {
                match entry {
                    Ok(entry) if entry.file_type().is_dir() => {
                        if tx.blocking_send(entry.into_path()).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Skipping unreadable path"),
                }
            }
        });

        let mut results = ReceiverStream::new(rx)
            .map(|dir| {
                let store = Arc::clone(&store);
                tokio::task::spawn_blocking(move || ingest_directory(&dir, &store))
            })
            .buffer_unordered(self.workers);

        let mut report = IngestReport::default();
        while let Some(result) = results.next().await {
            match result {
                Ok(dir_report) => report += dir_report,
                Err(e) => tracing::error!(error = %e, "Directory worker panicked"),
            }
        }

        if let Err(e) = producer.await {
            tracing::error!(error = %e, "Directory walker panicked");
        }

        tracing::info!(
            directories = report.directories,
            records = report.records,
            skipped_files = report.skipped_files,
            failed_groups = report.failed_groups,
            packages = store.package_count(),
            "Ingestion complete"
        );
        Ok(report)
    }
}

/// Process the manifest files directly inside `dir`.
///
/// Singletons go straight into the store. Everything else is grouped by
/// [`ManifestGroupKey`] and merged.
pub fn ingest_directory(dir: &Path, store: &ManifestStore) -> IngestReport {
    let mut report = IngestReport {
        directories: 1,
        ..IngestReport::default()
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
            return report;
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_yaml_file(path))
        .collect();
    paths.sort();

    let mut groups: BTreeMap<ManifestGroupKey, Vec<(ManifestType, PathBuf)>> = BTreeMap::new();

    for path in paths {
        let file = match inspect(&path) {
            Ok(Some(file)) => file,
            Ok(None) => {
                tracing::debug!(path = %path.display(), "Not a manifest");
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping manifest file");
                report.skipped_files += 1;
                continue;
            }
        };

        let package_id = file.header.package_identifier.trim();
        let version = file.header.package_version.trim();

        if file.manifest_type == ManifestType::Singleton {
            match load_singleton(&file.path, file.schema_version) {
                Ok(record) => {
                    store.set(package_id, version, record);
                    report.records += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping singleton manifest");
                    report.skipped_files += 1;
                }
            }
            continue;
        }

        groups
            .entry(ManifestGroupKey::new(package_id, version, file.schema_version))
            .or_default()
            .push((file.manifest_type, file.path));
    }

    for (key, files) in groups {
        match merge_group(&key, &files) {
            Ok(record) => {
                store.set(&key.package_identifier, &key.package_version, record);
                report.records += 1;
            }
            Err(e) => {
                tracing::warn!(package = %key.package_identifier, error = %e, "Skipping manifest group");
                report.failed_groups += 1;
            }
        }
    }

    report
}
