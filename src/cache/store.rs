//! Cache Store Module
//!
//! `SessionCache` layers expiry, chunking and eviction over a `Storage`
//! medium. Storage faults never escape `get` or `set`: reads degrade to a
//! miss and writes report `WriteOutcome::Skipped`.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::entry::{is_expired, EntryBody, StoredRecord};
use crate::cache::{
    compress, CacheEntry, CacheStats, ChunkManifest, ChunkRecord, Clock, EvictionCandidate,
    EvictionQueue, SystemClock,
};
use crate::config::CacheConfig;
use crate::error::StorageFault;
use crate::storage::{estimate_size, record_size, Storage};

// == Write Outcome ==
/// How a `set` was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Stored as one record under the entry key
    Direct,
    /// Stored as `chunks` chunk records plus a manifest
    Chunked { chunks: usize },
    /// Nothing was stored; the next read is a miss
    Skipped(StorageFault),
}

impl WriteOutcome {
    /// True unless the write was skipped.
    pub fn is_stored(&self) -> bool {
        !matches!(self, WriteOutcome::Skipped(_))
    }
}

// == Cleanup Report ==
/// What a cleanup sweep removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Entries removed for age
    pub expired: usize,
    /// Records removed because they could not be parsed or reassembled
    pub corrupt: usize,
    /// Entries removed oldest-first to get back under the size limit
    pub evicted: usize,
    pub usage_before: usize,
    pub usage_after: usize,
}

impl CleanupReport {
    pub fn removed(&self) -> usize {
        self.expired + self.corrupt + self.evicted
    }
}

/// A parent record (entry or manifest) found during a sweep.
struct SweepEntry {
    timestamp: u64,
    size: usize,
    manifest: Option<ChunkManifest>,
    chunks_found: Vec<usize>,
}

// == Session Cache ==
/// Key/value cache over a size-bounded string store.
#[derive(Debug)]
pub struct SessionCache<S: Storage> {
    storage: S,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl<S: Storage> SessionCache<S> {
    // == Constructor ==
    /// Creates a cache over `storage` using the wall clock.
    pub fn new(storage: S, config: CacheConfig) -> Self {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit clock.
    pub fn with_clock(storage: S, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            config,
            clock,
            stats: CacheStats::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current time according to the cache's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Direct access to the medium, bypassing the cache's bookkeeping.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // == Get ==
    /// Returns the entry stored under `key`.
    ///
    /// Returns None when nothing is stored, the entry has expired, a chunk is
    /// missing or inconsistent, or the stored JSON does not decode into `T`.
    /// Storage is never modified.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let body = match self.read_body(key) {
            Ok(Some(body)) => body,
            Ok(None) => {
                debug!(key, "cache miss");
                self.stats.record_miss();
                return None;
            }
            Err(fault) => {
                warn!(key, %fault, "treating unreadable cache entry as a miss");
                self.stats.record_miss();
                return None;
            }
        };

        match serde_json::from_value::<T>(body.data) {
            Ok(data) => {
                self.stats.record_hit();
                Some(CacheEntry {
                    key: key.to_string(),
                    data,
                    timestamp: body.timestamp,
                })
            }
            Err(e) => {
                warn!(key, error = %e, "cached data does not match requested type");
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the serialized body stored under `key`, reassembled from
    /// chunks if needed. Expired or inconsistent entries yield None.
    pub fn get_serialized(&self, key: &str) -> Option<String> {
        let raw = self.storage.get_item(&self.storage_key(key))?;
        let now = self.clock.now_ms();
        match StoredRecord::parse(&raw)? {
            StoredRecord::Entry(body) if !self.expired(body.timestamp, now) => Some(raw),
            StoredRecord::Manifest(manifest) if !self.expired(manifest.timestamp, now) => {
                self.assemble_chunks(key, &manifest).ok()
            }
            _ => None,
        }
    }

    fn read_body(&self, key: &str) -> Result<Option<EntryBody>, StorageFault> {
        let Some(raw) = self.storage.get_item(&self.storage_key(key)) else {
            return Ok(None);
        };
        let now = self.clock.now_ms();

        match StoredRecord::parse(&raw) {
            Some(StoredRecord::Entry(body)) => {
                if self.expired(body.timestamp, now) {
                    return Ok(None);
                }
                Ok(Some(body))
            }
            Some(StoredRecord::Manifest(manifest)) => {
                if self.expired(manifest.timestamp, now) {
                    return Ok(None);
                }
                let serialized = self.assemble_chunks(key, &manifest)?;
                let body: EntryBody = serde_json::from_str(&serialized)
                    .map_err(|_| StorageFault::Corrupt(key.to_string()))?;
                if body.timestamp != manifest.timestamp {
                    return Err(StorageFault::Corrupt(key.to_string()));
                }
                Ok(Some(body))
            }
            Some(StoredRecord::Chunk(_)) | None => Err(StorageFault::Corrupt(key.to_string())),
        }
    }

    /// Joins the chunk records of `manifest` back into the serialized body.
    fn assemble_chunks(&self, key: &str, manifest: &ChunkManifest) -> Result<String, StorageFault> {
        let mut serialized = String::new();
        for index in 0..manifest.chunks {
            let raw = self
                .storage
                .get_item(&self.chunk_key(key, index))
                .ok_or_else(|| StorageFault::MissingChunk {
                    key: key.to_string(),
                    index,
                })?;
            let chunk: ChunkRecord = serde_json::from_str(&raw).map_err(|_| {
                StorageFault::ChunkMismatch {
                    key: key.to_string(),
                    index,
                }
            })?;
            if chunk.index != index
                || chunk.total != manifest.chunks
                || chunk.timestamp != manifest.timestamp
            {
                return Err(StorageFault::ChunkMismatch {
                    key: key.to_string(),
                    index,
                });
            }
            serialized.push_str(&chunk.chunk);
        }
        Ok(serialized)
    }

    // == Set ==
    /// Stores `data` under `key`, fully replacing any previous entry.
    ///
    /// The payload is compressed before serialization. Payloads within the
    /// size limit are written directly; if the medium is full a cleanup runs
    /// and the write is retried once, then chunked storage is attempted.
    /// Failures are logged and reported as `WriteOutcome::Skipped`.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, data: &T) -> WriteOutcome {
        let outcome = match self.try_set(key, data) {
            Ok(outcome) => outcome,
            Err(fault) => {
                warn!(key, %fault, "cache write skipped");
                WriteOutcome::Skipped(fault)
            }
        };

        match &outcome {
            WriteOutcome::Direct => self.stats.record_direct_write(),
            WriteOutcome::Chunked { .. } => self.stats.record_chunked_write(),
            WriteOutcome::Skipped(_) => self.stats.record_failed_write(),
        }
        outcome
    }

    fn try_set<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        data: &T,
    ) -> Result<WriteOutcome, StorageFault> {
        let value =
            serde_json::to_value(data).map_err(|e| StorageFault::Serialization(e.to_string()))?;
        let body = EntryBody {
            data: compress(value),
            timestamp: self.clock.now_ms(),
        };
        let serialized =
            serde_json::to_string(&body).map_err(|e| StorageFault::Serialization(e.to_string()))?;
        let size = estimate_size(&serialized);

        if size <= self.config.max_cache_size {
            match self.storage.set_item(&self.storage_key(key), &serialized) {
                Ok(()) => {
                    self.purge_chunks(key, 0);
                    return Ok(WriteOutcome::Direct);
                }
                Err(fault) => {
                    warn!(key, %fault, "direct write failed, running cleanup");
                    self.cleanup();
                }
            }

            match self.storage.set_item(&self.storage_key(key), &serialized) {
                Ok(()) => {
                    self.purge_chunks(key, 0);
                    return Ok(WriteOutcome::Direct);
                }
                Err(fault) => {
                    warn!(key, %fault, "retry after cleanup failed, falling back to chunks");
                }
            }
        }

        let replaces_chunked = self.manifest_of(key).is_some();
        let chunks = self.write_chunks(key, &serialized, size, body.timestamp, replaces_chunked)?;
        Ok(WriteOutcome::Chunked { chunks })
    }

    /// Writes `serialized` as chunk records followed by the manifest.
    /// Either every record lands or none of the new ones remain.
    fn write_chunks(
        &mut self,
        key: &str,
        serialized: &str,
        size: usize,
        timestamp: u64,
        replaces_chunked: bool,
    ) -> Result<usize, StorageFault> {
        if size > self.config.max_cache_size {
            return Err(StorageFault::TooLarge {
                size,
                limit: self.config.max_cache_size,
            });
        }

        let slices = split_chunks(serialized, self.config.chunk_size);
        let total = slices.len();
        let records = slices
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                serde_json::to_string(&ChunkRecord {
                    chunk: chunk.to_string(),
                    index,
                    total,
                    timestamp,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageFault::Serialization(e.to_string()))?;
        let manifest = serde_json::to_string(&ChunkManifest {
            is_chunked: true,
            chunks: total,
            timestamp,
            size,
        })
        .map_err(|e| StorageFault::Serialization(e.to_string()))?;

        for (index, raw) in records.iter().enumerate() {
            if let Err(fault) = self.storage.set_item(&self.chunk_key(key, index), raw) {
                self.rollback_chunks(key, index, replaces_chunked);
                return Err(fault);
            }
        }
        if let Err(fault) = self.storage.set_item(&self.storage_key(key), &manifest) {
            self.rollback_chunks(key, total, replaces_chunked);
            return Err(fault);
        }

        self.purge_chunks(key, total);
        debug!(key, chunks = total, size, "stored chunked entry");
        Ok(total)
    }

    /// Removes the first `written` chunk records of a failed write. If they
    /// overwrote chunks of a previous entry, that entry is removed too since
    /// it can no longer be reassembled.
    fn rollback_chunks(&mut self, key: &str, written: usize, replaces_chunked: bool) {
        for index in 0..written {
            self.storage.remove_item(&self.chunk_key(key, index));
        }
        if written > 0 && replaces_chunked {
            self.remove_entry(key);
        }
        warn!(key, written, "rolled back partial chunk write");
    }

    /// Removes the stored chunk records of `key` with index `from` or above.
    ///
    /// Visits only keys present in the medium, never a manifest's count.
    fn purge_chunks(&mut self, key: &str, from: usize) {
        let chunk_prefix = format!("{}{}_chunk_", self.config.prefix, key);
        let stale: Vec<String> = self
            .namespaced_keys()
            .into_iter()
            .filter(|storage_key| {
                storage_key
                    .strip_prefix(&chunk_prefix)
                    .and_then(|suffix| suffix.parse::<usize>().ok())
                    .is_some_and(|index| index >= from)
            })
            .collect();
        for storage_key in &stale {
            self.storage.remove_item(storage_key);
        }
    }

    fn manifest_of(&self, key: &str) -> Option<ChunkManifest> {
        let raw = self.storage.get_item(&self.storage_key(key))?;
        match StoredRecord::parse(&raw)? {
            StoredRecord::Manifest(manifest) => Some(manifest),
            _ => None,
        }
    }

    // == Invalidate ==
    /// Removes the entry under `key` and any chunk records it owns.
    ///
    /// Returns true if an entry was stored.
    pub fn invalidate(&mut self, key: &str) -> bool {
        let storage_key = self.storage_key(key);
        if self.storage.get_item(&storage_key).is_none() {
            return false;
        }
        self.remove_entry(key);
        true
    }

    // == Clear ==
    /// Removes every record under the cache namespace.
    ///
    /// Returns the number of records removed.
    pub fn clear(&mut self) -> usize {
        let keys = self.namespaced_keys();
        for key in &keys {
            self.storage.remove_item(key);
        }
        keys.len()
    }

    // == Cleanup ==
    /// Sweeps the namespace: removes corrupt and expired entries, then
    /// evicts the oldest entries until usage is within the size limit.
    pub fn cleanup(&mut self) -> CleanupReport {
        let now = self.clock.now_ms();
        let mut report = CleanupReport {
            usage_before: self.storage.used_bytes(),
            ..Default::default()
        };

        let mut entries: HashMap<String, SweepEntry> = HashMap::new();
        let mut chunks: Vec<(String, String, ChunkRecord, usize)> = Vec::new();
        let mut corrupt: Vec<String> = Vec::new();

        for storage_key in self.namespaced_keys() {
            let Some(raw) = self.storage.get_item(&storage_key) else {
                continue;
            };
            let size = record_size(&storage_key, &raw);
            let logical = storage_key[self.config.prefix.len()..].to_string();

            match StoredRecord::parse(&raw) {
                None => corrupt.push(storage_key),
                Some(StoredRecord::Chunk(chunk)) => chunks.push((storage_key, logical, chunk, size)),
                Some(StoredRecord::Manifest(manifest)) => {
                    entries.insert(
                        logical,
                        SweepEntry {
                            timestamp: manifest.timestamp,
                            size,
                            manifest: Some(manifest),
                            chunks_found: Vec::new(),
                        },
                    );
                }
                Some(StoredRecord::Entry(body)) => {
                    entries.insert(
                        logical,
                        SweepEntry {
                            timestamp: body.timestamp,
                            size,
                            manifest: None,
                            chunks_found: Vec::new(),
                        },
                    );
                }
            }
        }

        // Attach chunks to their manifests; anything unclaimed is corrupt
        for (storage_key, logical, chunk, size) in chunks {
            let parent = chunk_parent(&logical, chunk.index)
                .and_then(|parent| entries.get_mut(parent))
                .filter(|entry| {
                    entry.manifest.as_ref().is_some_and(|m| {
                        m.timestamp == chunk.timestamp
                            && m.chunks == chunk.total
                            && chunk.index < m.chunks
                    })
                });
            match parent {
                Some(entry) => {
                    entry.size += size;
                    entry.chunks_found.push(chunk.index);
                }
                None => corrupt.push(storage_key),
            }
        }

        for storage_key in &corrupt {
            self.storage.remove_item(storage_key);
        }
        report.corrupt = corrupt.len();

        let mut candidates = Vec::new();
        for (key, entry) in entries {
            let incomplete = entry
                .manifest
                .as_ref()
                .is_some_and(|m| entry.chunks_found.len() != m.chunks);
            if incomplete {
                self.remove_entry(&key);
                report.corrupt += 1;
            } else if self.expired(entry.timestamp, now) {
                self.remove_entry(&key);
                report.expired += 1;
            } else {
                candidates.push(EvictionCandidate {
                    key,
                    timestamp: entry.timestamp,
                    size: entry.size,
                });
            }
        }

        let mut queue = EvictionQueue::new(candidates);
        while self.storage.used_bytes() > self.config.max_cache_size {
            let Some(oldest) = queue.evict_oldest() else {
                break;
            };
            self.remove_entry(&oldest.key);
            debug!(key = %oldest.key, size = oldest.size, "evicted oldest entry");
            report.evicted += 1;
        }

        report.usage_after = self.storage.used_bytes();
        self.stats.record_cleanup(report.evicted);

        if report.removed() > 0 {
            info!(
                "Cache cleanup: removed {} expired, {} corrupt, {} evicted ({} -> {} bytes)",
                report.expired, report.corrupt, report.evicted, report.usage_before, report.usage_after
            );
        } else {
            debug!("Cache cleanup: nothing to remove");
        }
        report
    }

    fn remove_entry(&mut self, key: &str) {
        self.storage.remove_item(&self.storage_key(key));
        self.purge_chunks(key, 0);
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Estimated bytes used by the storage medium.
    pub fn usage(&self) -> usize {
        self.storage.used_bytes()
    }

    /// Number of stored records under the cache namespace, chunks included.
    pub fn record_count(&self) -> usize {
        self.namespaced_keys().len()
    }

    fn namespaced_keys(&self) -> Vec<String> {
        self.storage
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(&self.config.prefix))
            .collect()
    }

    fn expired(&self, timestamp: u64, now: u64) -> bool {
        is_expired(timestamp, now, self.config.expiry_ms)
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    fn chunk_key(&self, key: &str, index: usize) -> String {
        format!("{}{}_chunk_{}", self.config.prefix, key, index)
    }
}

/// Logical key owning a chunk stored under `<key>_chunk_<index>`.
fn chunk_parent(logical: &str, index: usize) -> Option<&str> {
    let (parent, suffix) = logical.rsplit_once("_chunk_")?;
    (suffix.parse::<usize>().ok()? == index).then_some(parent)
}

/// Splits `s` into slices of at most `chunk_size` characters.
fn split_chunks(s: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);
    let mut slices = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in s.char_indices() {
        if count == chunk_size {
            slices.push(&s[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < s.len() || slices.is_empty() {
        slices.push(&s[start..]);
    }
    slices
}
