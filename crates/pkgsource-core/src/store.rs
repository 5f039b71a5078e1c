//! The concurrent in-memory manifest index.
//!
//! One reader/writer lock covers the whole index. Records are published as
//! `Arc`s and replaced wholesale, so readers never see a half-built record
//! and can keep using one after the lock is released.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pkgsource_schema::PackageVersionRecord;

use crate::query::{SearchPredicate, evaluate, keyword_matches};

type Versions = HashMap<String, Arc<PackageVersionRecord>>;

/// Records grouped by package identifier.
pub type PackageMap = HashMap<String, Vec<Arc<PackageVersionRecord>>>;

/// Package identifier -> package version -> record.
#[derive(Debug, Default)]
pub struct ManifestStore {
    packages: RwLock<HashMap<String, Versions>>,
}

impl ManifestStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Versions>> {
        self.packages.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Versions>> {
        self.packages.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the record for `(package_id, version)`.
    pub fn set(&self, package_id: &str, version: &str, record: PackageVersionRecord) {
        let record = Arc::new(record);
        self.write()
            .entry(package_id.to_string())
            .or_default()
            .insert(version.to_string(), record);
    }

    /// Look up one version.
    pub fn get(&self, package_id: &str, version: &str) -> Option<Arc<PackageVersionRecord>> {
        self.read()
            .get(package_id)
            .and_then(|versions| versions.get(version))
            .cloned()
    }

    /// Every version of a package, unordered. Empty for unknown packages.
    pub fn get_all_versions(&self, package_id: &str) -> Vec<Arc<PackageVersionRecord>> {
        self.read()
            .get(package_id)
            .map(|versions| versions.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every record, grouped by package.
    pub fn get_all(&self) -> PackageMap {
        self.collect(|_, _| true)
    }

    /// Distinct package identifiers, unordered.
    pub fn get_all_package_identifiers(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Records whose default-locale package name or short description
    /// contains `keyword`, ignoring case.
    pub fn get_by_keyword(&self, keyword: &str) -> PackageMap {
        self.collect(|_, record| keyword_matches(record, keyword))
    }

    /// Records passing every filter and, if any are given, at least one
    /// inclusion.
    pub fn get_by_match_filter(
        &self,
        inclusions: &[SearchPredicate],
        filters: &[SearchPredicate],
    ) -> PackageMap {
        self.collect(|id, record| evaluate(id, record, inclusions, filters))
    }

    /// Whether any version of the package is stored.
    pub fn contains_package(&self, package_id: &str) -> bool {
        self.read().contains_key(package_id)
    }

    /// Number of stored records across all packages.
    pub fn len(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of distinct packages.
    pub fn package_count(&self) -> usize {
        self.read().len()
    }

    fn collect(&self, keep: impl Fn(&str, &PackageVersionRecord) -> bool) -> PackageMap {
        let packages = self.read();
        let mut out = PackageMap::new();
        for (id, versions) in packages.iter() {
            let matched: Vec<_> = versions
                .values()
                .filter(|record| keep(id, record))
                .cloned()
                .collect();
            if !matched.is_empty() {
                out.insert(id.clone(), matched);
            }
        }
        out
    }
}
