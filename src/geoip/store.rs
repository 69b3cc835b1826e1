//! In-memory GeoIP dataset.

use std::cell::RefCell;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{debug, info, warn};
use serde::Serialize;

use super::discovery::{discover_files, DiscoveredFiles};
use super::error_log::ReaderErrorLog;
use crate::config::{FileFilters, GeoIpOptions, DEFAULT_CHUNK_SIZE};
use crate::error_handling::{AddressError, LoadError};
use crate::index::{LookupTable, Matches, RangeIndex};
use crate::models::{BlockRow, TableRow};
use crate::network::{ordinal_to_ip, parse_address, parse_cidr};
use crate::tabular::BatchReader;

/// Record counts of the loaded dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DatasetCounts {
    pub blocks: usize,
    pub block_chunks: usize,
    pub locations: usize,
    pub isps: usize,
}

/// Outcome of a successful [`GeoDataStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub files: DiscoveredFiles,
    pub counts: DatasetCounts,
    /// Rows reported to the error log and left out of the dataset
    pub skipped_rows: usize,
}

/// A block together with the location and ISP rows it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult<B, L, I> {
    /// The queried address, IPv4-mapped input rendered as IPv4
    pub address: IpAddr,
    pub block: B,
    pub location: Option<L>,
    pub isp: Option<I>,
}

struct Dataset<B, L, I> {
    blocks: RangeIndex<B>,
    locations: LookupTable<L>,
    isps: LookupTable<I>,
}

impl<B, L, I> Default for Dataset<B, L, I> {
    fn default() -> Self {
        Self {
            blocks: RangeIndex::default(),
            locations: LookupTable::default(),
            isps: LookupTable::default(),
        }
    }
}

impl<B: BlockRow, L: TableRow, I: TableRow> Dataset<B, L, I> {
    fn clear(&mut self) {
        self.blocks.clear();
        self.locations.clear();
        self.isps.clear();
    }

    fn counts(&self) -> DatasetCounts {
        DatasetCounts {
            blocks: self.blocks.len(),
            block_chunks: self.blocks.chunk_count(),
            locations: self.locations.len(),
            isps: self.isps.len(),
        }
    }
}

/// Block index plus location and ISP tables behind one lock.
///
/// `load` replaces the whole dataset while holding the write lock, so a
/// query either waits or sees a complete dataset. Queries hold the read lock
/// only for the lookup itself and return owned clones. If the lock is
/// poisoned, queries return `None` and `load` fails with
/// [`LoadError::LockPoisoned`].
pub struct GeoDataStore<B, L, I> {
    data: RwLock<Dataset<B, L, I>>,
    chunk_size: usize,
    reader_error_log: Option<PathBuf>,
}

impl<B, L, I> Default for GeoDataStore<B, L, I> {
    fn default() -> Self {
        Self {
            data: RwLock::new(Dataset::default()),
            chunk_size: DEFAULT_CHUNK_SIZE,
            reader_error_log: None,
        }
    }
}

impl<B: BlockRow, L: TableRow, I: TableRow> GeoDataStore<B, L, I> {
    /// Empty store reading `chunk_size` rows per chunk, optionally logging skipped rows.
    pub fn new(chunk_size: usize, reader_error_log: Option<PathBuf>) -> Self {
        Self {
            data: RwLock::new(Dataset::default()),
            chunk_size: chunk_size.max(1),
            reader_error_log,
        }
    }

    pub fn from_options(options: &GeoIpOptions) -> Self {
        Self::new(
            options.effective_chunk_size(),
            options.reader_error_log.clone(),
        )
    }

    /// Replaces the dataset with the CSV files found in `data_dir`.
    ///
    /// Returns [`LoadError::DataNotFound`] without touching the current data
    /// when neither blocks file is present. Malformed rows (including
    /// unparsable networks) are skipped and written to the reader error log.
    /// A failure after clearing leaves the store empty.
    pub fn load(&self, data_dir: &Path, filters: &FileFilters) -> Result<LoadSummary, LoadError> {
        let files = discover_files(data_dir, filters).map_err(|source| LoadError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;
        if !files.has_blocks() {
            return Err(LoadError::DataNotFound {
                directory: data_dir.to_path_buf(),
            });
        }
        debug!("Discovered GeoIP files: {:?}", files);

        let mut error_log = ReaderErrorLog::open(self.reader_error_log.as_deref())?;
        let mut data = self.data.write().map_err(|_| LoadError::LockPoisoned)?;

        data.clear();
        match self.populate(&mut data, &files, &mut error_log) {
            Ok(skipped_rows) => {
                let counts = data.counts();
                info!(
                    "Loaded {} blocks in {} chunks, {} locations, {} ISPs from {}",
                    counts.blocks,
                    counts.block_chunks,
                    counts.locations,
                    counts.isps,
                    data_dir.display()
                );
                if skipped_rows > 0 {
                    warn!("Skipped {} malformed rows while loading", skipped_rows);
                }
                Ok(LoadSummary {
                    files,
                    counts,
                    skipped_rows,
                })
            }
            Err(e) => {
                data.clear();
                Err(e)
            }
        }
    }

    fn populate(
        &self,
        data: &mut Dataset<B, L, I>,
        files: &DiscoveredFiles,
        error_log: &mut ReaderErrorLog,
    ) -> Result<usize, LoadError> {
        let mut skipped = 0;
        for path in [&files.blocks_ipv4, &files.blocks_ipv6].into_iter().flatten() {
            skipped += self.read_blocks(path, &mut data.blocks, error_log)?;
        }
        if let Some(path) = &files.locations {
            skipped += self.read_table(path, &mut data.locations, error_log)?;
        }
        if let Some(path) = &files.isps {
            skipped += self.read_table(path, &mut data.isps, error_log)?;
        }
        Ok(skipped)
    }

    fn read_blocks(
        &self,
        path: &Path,
        index: &mut RangeIndex<B>,
        error_log: &mut ReaderErrorLog,
    ) -> Result<usize, LoadError> {
        let errors = RefCell::new(Vec::new());
        let reader = BatchReader::<_, B, _>::from_path(path, self.chunk_size, |e| {
            errors.borrow_mut().push(e.to_string())
        })
        .map_err(|source| io_error(path, source))?;

        for batch in reader {
            let batch = batch.map_err(|source| csv_error(path, source))?;
            let mut ranged = Vec::with_capacity(batch.len());
            for mut block in batch {
                match parse_cidr(block.network()) {
                    Ok(range) => {
                        block.assign_range(range);
                        ranged.push(block);
                    }
                    Err(e) => errors.borrow_mut().push(e.to_string()),
                }
            }
            index.add(ranged);
        }

        let errors = errors.into_inner();
        error_log.append(path, &errors)?;
        debug!("Read {} ({} rows skipped)", path.display(), errors.len());
        Ok(errors.len())
    }

    fn read_table<T: TableRow>(
        &self,
        path: &Path,
        table: &mut LookupTable<T>,
        error_log: &mut ReaderErrorLog,
    ) -> Result<usize, LoadError> {
        let mut errors = Vec::new();
        let reader = BatchReader::<_, T, _>::from_path(path, self.chunk_size, |e| {
            errors.push(e.to_string())
        })
        .map_err(|source| io_error(path, source))?;

        for batch in reader {
            table.add(batch.map_err(|source| csv_error(path, source))?);
        }

        error_log.append(path, &errors)?;
        debug!("Read {} ({} rows skipped)", path.display(), errors.len());
        Ok(errors.len())
    }

    /// Block whose range contains `ordinal`.
    pub fn get_block(&self, ordinal: u128) -> Option<B> {
        let data = self.data.read().ok()?;
        data.blocks.query(ordinal).cloned()
    }

    /// Block containing the address given as text.
    pub fn get_block_by_address(&self, address: &str) -> Result<Option<B>, AddressError> {
        let parsed = parse_address(address)?;
        Ok(self.get_block(parsed.ordinal))
    }

    pub fn get_location(&self, geoname_id: u32) -> Option<L> {
        let data = self.data.read().ok()?;
        data.locations.get(geoname_id).cloned()
    }

    pub fn get_isp(&self, isp_id: u32) -> Option<I> {
        let data = self.data.read().ok()?;
        data.isps.get(isp_id).cloned()
    }

    /// Blocks matching `predicate`, iterated after the lock is released.
    pub fn get_blocks<P>(&self, predicate: P) -> Matches<B, P>
    where
        P: FnMut(&B) -> bool,
    {
        match self.data.read() {
            Ok(data) => data.blocks.matches(predicate),
            Err(_) => Matches::new(Vec::new(), predicate),
        }
    }

    pub fn get_locations<P>(&self, predicate: P) -> Matches<L, P>
    where
        P: FnMut(&L) -> bool,
    {
        match self.data.read() {
            Ok(data) => data.locations.matches(predicate),
            Err(_) => Matches::new(Vec::new(), predicate),
        }
    }

    pub fn get_isps<P>(&self, predicate: P) -> Matches<I, P>
    where
        P: FnMut(&I) -> bool,
    {
        match self.data.read() {
            Ok(data) => data.isps.matches(predicate),
            Err(_) => Matches::new(Vec::new(), predicate),
        }
    }

    /// Block, location and ISP for one address, read under a single lock.
    ///
    /// `Ok(None)` when no block covers the address.
    pub fn lookup(&self, address: &str) -> Result<Option<LookupResult<B, L, I>>, AddressError> {
        let parsed = parse_address(address)?;
        let Ok(data) = self.data.read() else {
            return Ok(None);
        };
        let Some(block) = data.blocks.query(parsed.ordinal) else {
            return Ok(None);
        };

        let location = block
            .geoname_id()
            .and_then(|id| data.locations.get(id))
            .cloned();
        let isp = block.isp_id().and_then(|id| data.isps.get(id)).cloned();
        Ok(Some(LookupResult {
            address: ordinal_to_ip(parsed.ordinal),
            block: block.clone(),
            location,
            isp,
        }))
    }

    /// `true` once at least one block chunk is loaded.
    pub fn has_data(&self) -> bool {
        self.data
            .read()
            .map(|data| !data.blocks.is_empty())
            .unwrap_or(false)
    }

    pub fn counts(&self) -> DatasetCounts {
        self.data
            .read()
            .map(|data| data.counts())
            .unwrap_or_default()
    }
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CityBlock, CityLocation, EnterpriseBlock, IspRecord, NoIsp};
    use std::sync::Arc;
    use tempfile::TempDir;

    type CityStore = GeoDataStore<CityBlock, CityLocation, NoIsp>;

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).expect("Failed to write fixture");
    }

    fn city_fixture(dir: &Path) {
        write(
            dir,
            "GeoLite2-City-Blocks-IPv4.csv",
            "network,geoname_id,latitude,longitude\n\
             1.0.0.0/24,100,1.5,2.5\n\
             1.0.1.0/24,200,,\n\
             10.0.0.0/8,100,,\n",
        );
        write(
            dir,
            "GeoLite2-City-Blocks-IPv6.csv",
            "network,geoname_id\n2001:db8::/32,200\n",
        );
        write(
            dir,
            "GeoLite2-City-Locations-en.csv",
            "geoname_id,country_iso_code,city_name\n100,AU,Sydney\n200,DE,Berlin\n",
        );
    }

    #[test]
    fn test_load_and_query() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        city_fixture(dir.path());
        let store = CityStore::new(2, None);

        let summary = store.load(dir.path(), &FileFilters::default()).unwrap();
        assert_eq!(summary.counts.blocks, 4);
        assert_eq!(summary.counts.block_chunks, 3);
        assert_eq!(summary.counts.locations, 2);
        assert_eq!(summary.skipped_rows, 0);
        assert!(store.has_data());

        let block = store.get_block_by_address("1.0.1.77").unwrap().unwrap();
        assert_eq!(block.network, "1.0.1.0/24");
        assert_eq!(store.get_block_by_address("9.9.9.9").unwrap(), None);

        let result = store.lookup("2001:db8::1").unwrap().unwrap();
        assert_eq!(result.block.geoname_id, Some(200));
        assert_eq!(
            result.location.and_then(|l| l.city_name).as_deref(),
            Some("Berlin")
        );
        assert_eq!(result.isp, None);

        let mapped = store.lookup("::ffff:10.1.2.3").unwrap().unwrap();
        assert_eq!(mapped.address.to_string(), "10.1.2.3");
    }

    #[test]
    fn test_invalid_address_is_an_error() {
        let store = CityStore::default();
        assert!(matches!(
            store.get_block_by_address("not an ip"),
            Err(AddressError::InvalidAddress(_))
        ));
        assert!(store.lookup("300.1.1.1").is_err());
    }

    #[test]
    fn test_missing_blocks_leaves_data_untouched() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        city_fixture(dir.path());
        let store = CityStore::default();
        store.load(dir.path(), &FileFilters::default()).unwrap();

        let empty = TempDir::new().expect("Failed to create temp directory");
        let err = store.load(empty.path(), &FileFilters::default()).unwrap_err();
        assert!(matches!(err, LoadError::DataNotFound { .. }));
        assert!(store.has_data());
    }

    #[test]
    fn test_reload_replaces_dataset() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        city_fixture(dir.path());
        let store = CityStore::default();
        let first = store.load(dir.path(), &FileFilters::default()).unwrap();
        let second = store.load(dir.path(), &FileFilters::default()).unwrap();
        assert_eq!(first.counts, second.counts);

        write(
            dir.path(),
            "GeoLite2-City-Blocks-IPv4.csv",
            "network,geoname_id\n5.5.5.0/24,100\n",
        );
        store.load(dir.path(), &FileFilters::default()).unwrap();
        assert_eq!(store.get_block_by_address("1.0.0.1").unwrap(), None);
        assert!(store.get_block_by_address("5.5.5.5").unwrap().is_some());
    }

    #[test]
    fn test_bad_networks_are_skipped_and_logged() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        write(
            dir.path(),
            "Blocks-IPv4.csv",
            "network,geoname_id\n1.0.0.0/24,1\n1.0.1.0/40,1\n,1\n1.0.2.0/24,oops\n",
        );
        let log = dir.path().join("errors.log");
        let store = CityStore::new(10, Some(log.clone()));

        let summary = store.load(dir.path(), &FileFilters::default()).unwrap();
        assert_eq!(summary.counts.blocks, 1);
        assert_eq!(summary.skipped_rows, 3);

        let contents = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            format!("=={}==", dir.path().join("Blocks-IPv4.csv").display())
        );
        assert!(contents.contains("1.0.1.0/40"));
    }

    #[test]
    fn test_filtered_iteration_outlives_reload() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        city_fixture(dir.path());
        let store = CityStore::default();
        store.load(dir.path(), &FileFilters::default()).unwrap();

        let sydney = store.get_blocks(|b| b.geoname_id == Some(100));
        write(
            dir.path(),
            "GeoLite2-City-Blocks-IPv4.csv",
            "network,geoname_id\n5.5.5.0/24,300\n",
        );
        store.load(dir.path(), &FileFilters::default()).unwrap();

        assert_eq!(sydney.count(), 2);
        assert_eq!(store.get_blocks(|b| b.geoname_id == Some(100)).count(), 0);
        assert_eq!(store.get_locations(|l| l.geoname_id > 100).count(), 1);
    }

    #[test]
    fn test_enterprise_lookup_resolves_isp() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        write(
            dir.path(),
            "GeoIP2-Enterprise-Blocks-IPv4.csv",
            "network,geoname_id,isp_id\n8.8.8.0/24,6252001,15169\n",
        );
        write(
            dir.path(),
            "GeoIP2-Enterprise-ISP.csv",
            "isp_id,isp,autonomous_system_number\n15169,Google,15169\n",
        );
        let filters = FileFilters {
            isps: "ISP.csv".to_string(),
            ..Default::default()
        };
        let store: GeoDataStore<EnterpriseBlock, CityLocation, IspRecord> = GeoDataStore::default();
        store.load(dir.path(), &filters).unwrap();

        let result = store.lookup("8.8.8.8").unwrap().unwrap();
        assert_eq!(result.location, None);
        assert_eq!(result.isp.and_then(|i| i.isp).as_deref(), Some("Google"));
        assert_eq!(store.get_isps(|_| true).count(), 1);
        assert_eq!(store.get_isp(15169).map(|i| i.isp_id), Some(15169));
    }

    #[test]
    fn test_poisoned_lock() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        city_fixture(dir.path());
        let store = Arc::new(CityStore::default());
        store.load(dir.path(), &FileFilters::default()).unwrap();

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.data.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(store.get_block_by_address("1.0.0.1").unwrap(), None);
        assert_eq!(store.get_location(100), None);
        assert!(!store.has_data());
        assert_eq!(store.counts(), DatasetCounts::default());
        assert_eq!(store.get_blocks(|_| true).count(), 0);
        assert!(matches!(
            store.load(dir.path(), &FileFilters::default()),
            Err(LoadError::LockPoisoned)
        ));
    }
}
