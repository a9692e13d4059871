use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Mutex, RwLock},
    time::{Duration, SystemTime},
};

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::{
    chains::ChainRegistry,
    error::{poison_error, CatalogResult},
    identity::IdentityAllocator,
    loader::CatalogLoader,
    model::{AssetRecord, CacheStats},
    settings::CatalogSettings,
};

#[derive(Debug, Default)]
struct CacheState {
    buckets: HashMap<String, Vec<AssetRecord>>,
    last_update: Option<SystemTime>,
}

impl CacheState {
    fn is_stale(&self, ttl: Duration) -> bool {
        if self.buckets.is_empty() {
            return true;
        }
        match self.last_update {
            None => true,
            // a clock that went backwards counts as stale too
            Some(at) => at.elapsed().map(|age| age > ttl).unwrap_or(true),
        }
    }
}

/// Symbol-indexed catalog cache with synchronous refresh-on-read.
///
/// Reads serve the current snapshot under a shared lock; a stale or empty
/// snapshot is rebuilt inline before the read answers. The rebuild is
/// single-flight: the whole check-then-rebuild sequence runs under a
/// dedicated gate mutex, so concurrent callers that observe staleness block
/// on the gate and then re-read the fresh result instead of scanning again.
///
/// Construct one instance at startup and share it; there is deliberately no
/// process-wide singleton, so tests can run independent instances against
/// separate temp directories.
#[derive(Debug)]
pub struct CatalogCache {
    state: RwLock<CacheState>,
    refresh_gate: Mutex<()>,
    allocator: Mutex<IdentityAllocator>,
    loader: CatalogLoader,
    registry: ChainRegistry,
    mapping_file: PathBuf,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(settings: &CatalogSettings) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            refresh_gate: Mutex::new(()),
            allocator: Mutex::new(IdentityAllocator::load(&settings.id_mapping_file)),
            loader: CatalogLoader::new(&settings.assets_path),
            registry: ChainRegistry::new(),
            mapping_file: settings.id_mapping_file.clone(),
            ttl: settings.cache_ttl,
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// All assets sharing `symbol`, case-insensitive. An unknown symbol is
    /// an empty list, not an error.
    pub fn get_by_symbol(&self, symbol: &str) -> CatalogResult<Vec<AssetRecord>> {
        self.refresh_if_needed()?;
        let state = self.state.read().map_err(|_| poison_error("catalog cache"))?;
        Ok(state
            .buckets
            .get(&symbol.to_uppercase())
            .cloned()
            .unwrap_or_default())
    }

    /// Every known uppercased symbol, order unspecified.
    pub fn all_symbols(&self) -> CatalogResult<Vec<String>> {
        self.refresh_if_needed()?;
        let state = self.state.read().map_err(|_| poison_error("catalog cache"))?;
        Ok(state.buckets.keys().cloned().collect_vec())
    }

    pub fn all_assets(&self) -> CatalogResult<Vec<AssetRecord>> {
        self.refresh_if_needed()?;
        let state = self.state.read().map_err(|_| poison_error("catalog cache"))?;
        Ok(state.buckets.values().flatten().cloned().collect_vec())
    }

    /// Paginated listing sorted by numeric ID, optionally filtered by
    /// coin-type code. Returns the page plus the total before pagination.
    pub fn assets_page(
        &self,
        limit: usize,
        offset: usize,
        chain_id: Option<&str>,
    ) -> CatalogResult<(Vec<AssetRecord>, usize)> {
        let mut assets = self.all_assets()?;

        if let Some(chain_id) = chain_id {
            assets.retain(|asset| asset.blockchain_id == chain_id);
        }
        assets.sort_by(|a, b| match (a.id.parse::<u64>(), b.id.parse::<u64>()) {
            (Ok(left), Ok(right)) => left.cmp(&right),
            _ => a.id.cmp(&b.id),
        });

        let total = assets.len();
        let start = offset.min(total);
        let end = (start + limit).min(total);
        Ok((assets[start..end].to_vec(), total))
    }

    /// Rebuilds unconditionally. A scan failure is returned to the caller
    /// and the previously-served snapshot stays in place.
    pub fn force_refresh(&self) -> CatalogResult<()> {
        let _gate = self
            .refresh_gate
            .lock()
            .map_err(|_| poison_error("refresh gate"))?;
        self.rebuild()
    }

    /// Walks the whole catalog allocating IDs without serving records, then
    /// persists the mapping. Returns the number of assets visited.
    pub fn generate_all_ids(&self) -> CatalogResult<usize> {
        let _gate = self
            .refresh_gate
            .lock()
            .map_err(|_| poison_error("refresh gate"))?;
        let mut allocator = self
            .allocator
            .lock()
            .map_err(|_| poison_error("identity allocator"))?;
        let generated = self.loader.generate_ids(&self.registry, &mut allocator)?;
        allocator.persist_if_dirty(&self.mapping_file)?;
        Ok(generated)
    }

    /// Stable ID for a token contract, for consumers outside the catalog
    /// (balance normalization and the like). Never allocates.
    pub fn token_id(&self, chain: &str, address: &str) -> CatalogResult<Option<String>> {
        let allocator = self
            .allocator
            .lock()
            .map_err(|_| poison_error("identity allocator"))?;
        Ok(allocator.id_for_token(chain, address))
    }

    /// Stable ID for a chain's native coin. Never allocates.
    pub fn native_token_id(&self, chain: &str, symbol: &str) -> CatalogResult<Option<String>> {
        let allocator = self
            .allocator
            .lock()
            .map_err(|_| poison_error("identity allocator"))?;
        Ok(allocator.id_for_native(chain, symbol))
    }

    /// Introspection only; never triggers a refresh.
    pub fn stats(&self) -> CatalogResult<CacheStats> {
        let state = self.state.read().map_err(|_| poison_error("catalog cache"))?;
        let allocator = self
            .allocator
            .lock()
            .map_err(|_| poison_error("identity allocator"))?;

        let last_update = state.last_update.map(DateTime::<Utc>::from);
        let next_refresh = state
            .last_update
            .map(|at| DateTime::<Utc>::from(at + self.ttl));

        Ok(CacheStats {
            total_symbols: state.buckets.len(),
            total_assets: state.buckets.values().map(Vec::len).sum(),
            last_update,
            next_refresh,
            cache_ttl_mins: self.ttl.as_secs() / 60,
            total_id_mappings: allocator.len(),
            next_id: allocator.next_id(),
        })
    }

    fn refresh_if_needed(&self) -> CatalogResult<()> {
        {
            let state = self.state.read().map_err(|_| poison_error("catalog cache"))?;
            if !state.is_stale(self.ttl) {
                return Ok(());
            }
        }

        let _gate = self
            .refresh_gate
            .lock()
            .map_err(|_| poison_error("refresh gate"))?;
        {
            // someone else may have rebuilt while we waited on the gate
            let state = self.state.read().map_err(|_| poison_error("catalog cache"))?;
            if !state.is_stale(self.ttl) {
                return Ok(());
            }
        }
        self.rebuild()
    }

    /// Scan, persist, install. Caller must hold the refresh gate. The new
    /// bucket map is built off to the side and swapped in under the write
    /// lock, so readers see either the old snapshot or the new one, never a
    /// partial rebuild.
    fn rebuild(&self) -> CatalogResult<()> {
        let buckets = {
            let mut allocator = self
                .allocator
                .lock()
                .map_err(|_| poison_error("identity allocator"))?;
            let buckets = self.loader.scan(&self.registry, &mut allocator)?;
            if let Err(error) = allocator.persist_if_dirty(&self.mapping_file) {
                // in-memory allocations stay valid for this process; losing
                // the write is recoverable on the next cold start
                log::error!(
                    "unable to persist id mappings to {}: {error}",
                    self.mapping_file.display()
                );
            }
            buckets
        };

        let mut state = self.state.write().map_err(|_| poison_error("catalog cache"))?;
        state.buckets = buckets;
        state.last_update = Some(SystemTime::now());
        Ok(())
    }

    #[cfg(test)]
    fn set_last_update(&self, at: SystemTime) {
        self.state.write().unwrap().last_update = Some(at);
    }
}
