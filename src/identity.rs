use std::{
    collections::HashMap,
    fs, io,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::{
    chains::canonical_chain_name,
    error::CatalogResult,
    model::AssetKey,
};

/// One persisted `(asset key, ID)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdMappingEntry {
    pub asset_key: String,
    pub id: String,
}

/// Owner of the asset-key → stable-ID mapping.
///
/// IDs are decimal strings of a monotonically increasing counter. The
/// mapping is strictly additive: once a key has an ID, that ID is never
/// reused or reassigned, even if the backing asset disappears from the
/// catalog.
#[derive(Debug)]
pub struct IdentityAllocator {
    mappings: HashMap<String, String>,
    next_id: u64,
    dirty: bool,
}

impl IdentityAllocator {
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            next_id: 1,
            dirty: false,
        }
    }

    /// Loads the persisted mapping. Fails soft on every level: a missing or
    /// unparsable file yields an empty allocator, a corrupt entry is skipped
    /// while the rest of the file is kept.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut allocator = Self::new();

        let data = match fs::read(path) {
            Ok(data) => data,
            Err(error) => {
                // First run has no mapping file yet; anything else is worth a warning.
                if error.kind() != io::ErrorKind::NotFound {
                    log::warn!("unable to read id mappings from {}: {error}", path.display());
                }
                return allocator;
            }
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_slice(&data) {
            Ok(entries) => entries,
            Err(error) => {
                log::error!("unable to parse id mappings from {}: {error}", path.display());
                return allocator;
            }
        };

        let mut max_id = 0;
        for entry in entries {
            let entry: IdMappingEntry = match serde_json::from_value(entry) {
                Ok(entry) => entry,
                Err(error) => {
                    log::warn!("skipping corrupt id mapping entry: {error}");
                    continue;
                }
            };
            let id = match entry.id.parse::<u64>() {
                Ok(id) if id > 0 => id,
                _ => {
                    log::warn!("skipping id mapping entry {} with non-numeric id {}", entry.asset_key, entry.id);
                    continue;
                }
            };
            max_id = max_id.max(id);
            allocator.mappings.insert(entry.asset_key.to_lowercase(), entry.id);
        }
        allocator.next_id = max_id + 1;
        allocator
    }

    /// Returns the ID already assigned to `key`, or allocates the next one.
    /// Idempotent for equal keys, within a process and across restarts once
    /// persisted.
    pub fn get_or_create(&mut self, key: &AssetKey) -> String {
        let canonical = key.canonical();
        if let Some(id) = self.mappings.get(&canonical) {
            return id.clone();
        }

        let id = self.next_id.to_string();
        self.mappings.insert(canonical, id.clone());
        self.next_id += 1;
        self.dirty = true;
        id
    }

    /// Looks up the stable ID for a token contract. `chain` may be a short
    /// alias (`eth`, `bsc`, ...); never allocates.
    pub fn id_for_token(&self, chain: &str, address: &str) -> Option<String> {
        let key = AssetKey::token(canonical_chain_name(chain), address);
        self.mappings.get(&key.canonical()).cloned()
    }

    /// Looks up the stable ID for a chain's native coin; never allocates.
    pub fn id_for_native(&self, chain: &str, symbol: &str) -> Option<String> {
        let key = AssetKey::native(canonical_chain_name(chain), symbol);
        self.mappings.get(&key.canonical()).cloned()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Serializes the full mapping to `path` if any IDs were allocated since
    /// the last persist; a no-op otherwise so routine cache refreshes do not
    /// touch the disk. The file is written to a temporary sibling and renamed
    /// into place so readers never observe a half-written mapping.
    pub fn persist_if_dirty(&mut self, path: impl AsRef<Path>) -> CatalogResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let path = path.as_ref();

        let mut entries: Vec<IdMappingEntry> = self
            .mappings
            .iter()
            .map(|(asset_key, id)| IdMappingEntry {
                asset_key: asset_key.clone(),
                id: id.clone(),
            })
            .collect();
        entries.sort_by_key(|entry| entry.id.parse::<u64>().unwrap_or(u64::MAX));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "id_mappings.json".to_string());
        let temporary_file = path.with_file_name(format!("{file_name}_tmp_{suffix}"));

        let contents = serde_json::to_string_pretty(&entries)?;
        fs::write(&temporary_file, contents)?;
        fs::rename(&temporary_file, path)?;

        self.dirty = false;
        Ok(())
    }
}

impl Default for IdentityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_ok, assert_some_eq};

    use super::*;

    #[test]
    fn allocates_monotonic_unique_ids() {
        let mut allocator = IdentityAllocator::new();

        let keys: Vec<AssetKey> = (0..5)
            .map(|i| AssetKey::token("ethereum", format!("0x{i:040x}")))
            .collect();
        let ids: Vec<String> = keys.iter().map(|key| allocator.get_or_create(key)).collect();

        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(allocator.next_id(), 6);
        assert_eq!(allocator.len(), 5);
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut allocator = IdentityAllocator::new();
        let key = AssetKey::native("ethereum", "ETH");

        let first = allocator.get_or_create(&key);
        for _ in 0..10 {
            assert_eq!(allocator.get_or_create(&key), first);
        }
        // equal keys with different casing hit the same entry
        assert_eq!(allocator.get_or_create(&AssetKey::native("Ethereum", "eth")), first);
        assert_eq!(allocator.len(), 1);
    }

    #[test]
    fn round_trips_through_the_mapping_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings").join("id_mappings.json");

        let keys: Vec<AssetKey> = (0..4)
            .map(|i| AssetKey::token("solana", format!("Mint{i}")))
            .collect();

        let mut allocator = IdentityAllocator::new();
        let original: Vec<String> = keys.iter().map(|key| allocator.get_or_create(key)).collect();
        assert_ok!(allocator.persist_if_dirty(&path));

        // simulated restart
        let mut reloaded = IdentityAllocator::load(&path);
        let after: Vec<String> = keys.iter().map(|key| reloaded.get_or_create(key)).collect();
        assert_eq!(after, original);

        let fresh = reloaded.get_or_create(&AssetKey::native("solana", "SOL"));
        assert_eq!(fresh, "5");
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();

        let allocator = IdentityAllocator::load(dir.path().join("nope.json"));

        assert!(allocator.is_empty());
        assert_eq!(allocator.next_id(), 1);
    }

    #[test]
    fn corrupt_entries_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id_mappings.json");
        fs::write(
            &path,
            r#"[
                {"asset_key": "ethereum-eth-native", "id": "1"},
                {"asset_key": "ethereum-0xabc"},
                {"asset_key": "ethereum-0xdef", "id": "not-a-number"},
                {"asset_key": "solana-sol-native", "id": "7"}
            ]"#,
        )
        .unwrap();

        let allocator = IdentityAllocator::load(&path);

        assert_eq!(allocator.len(), 2);
        assert_some_eq!(allocator.id_for_native("ethereum", "ETH"), "1".to_string());
        assert_some_eq!(allocator.id_for_native("solana", "SOL"), "7".to_string());
        assert_eq!(allocator.next_id(), 8);
    }

    #[test]
    fn unparsable_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id_mappings.json");
        fs::write(&path, "{truncated").unwrap();

        let allocator = IdentityAllocator::load(&path);

        assert!(allocator.is_empty());
        assert_eq!(allocator.next_id(), 1);
    }

    #[test]
    fn persist_is_skipped_when_nothing_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id_mappings.json");

        let mut allocator = IdentityAllocator::new();
        allocator.get_or_create(&AssetKey::native("ethereum", "ETH"));
        assert_ok!(allocator.persist_if_dirty(&path));

        // nothing allocated since the last persist: removing the file and
        // persisting again must not recreate it
        fs::remove_file(&path).unwrap();
        assert_ok!(allocator.persist_if_dirty(&path));
        assert!(!path.exists());

        // a lookup hit does not mark the allocator dirty either
        allocator.get_or_create(&AssetKey::native("ethereum", "ETH"));
        assert_ok!(allocator.persist_if_dirty(&path));
        assert!(!path.exists());
    }

    #[test]
    fn lookups_fold_chain_aliases() {
        let mut allocator = IdentityAllocator::new();
        let token = allocator.get_or_create(&AssetKey::token("ethereum", "0xABC"));
        let native = allocator.get_or_create(&AssetKey::native("smartchain", "BNB"));

        assert_some_eq!(allocator.id_for_token("eth", "0xabc"), token);
        assert_some_eq!(allocator.id_for_native("bsc", "bnb"), native);
        assert_none!(allocator.id_for_token("eth", "0xeee"));
    }
}
