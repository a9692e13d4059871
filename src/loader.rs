use std::{
    collections::HashMap,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::{
    chains::ChainRegistry,
    error::{CatalogError, CatalogResult},
    identity::IdentityAllocator,
    model::{AssetInfo, AssetKey, AssetRecord},
};

/// Walks the on-disk asset hierarchy and produces normalized records.
///
/// Layout consumed, read-only:
///
/// ```text
/// <assets_root>/<chain>/info/info.json          native asset metadata
/// <assets_root>/<chain>/info/logo.png           optional
/// <assets_root>/<chain>/assets/<address>/info.json
/// <assets_root>/<chain>/assets/<address>/logo.png
/// ```
///
/// A scan is a pure function of filesystem plus allocator state; installing
/// the result is the cache's job.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    assets_root: PathBuf,
}

impl CatalogLoader {
    pub fn new(assets_root: impl Into<PathBuf>) -> Self {
        Self {
            assets_root: assets_root.into(),
        }
    }

    /// Full catalog scan. Chains the registry does not know are skipped
    /// entirely; individual unparsable metadata files are skipped without
    /// aborting the scan. Only an unreadable root is an error.
    pub fn scan(
        &self,
        registry: &ChainRegistry,
        allocator: &mut IdentityAllocator,
    ) -> CatalogResult<HashMap<String, Vec<AssetRecord>>> {
        let mut buckets: HashMap<String, Vec<AssetRecord>> = HashMap::new();

        for chain in self.chain_names()? {
            let Some(chain_id) = registry.resolve(&chain) else {
                continue;
            };
            for record in self.load_chain_assets(&chain, chain_id, allocator) {
                buckets
                    .entry(record.symbol.to_uppercase())
                    .or_default()
                    .push(record);
            }
        }

        Ok(buckets)
    }

    /// Allocates IDs for every asset in the catalog without building records.
    /// Returns the number of assets visited.
    pub fn generate_ids(
        &self,
        registry: &ChainRegistry,
        allocator: &mut IdentityAllocator,
    ) -> CatalogResult<usize> {
        let mut generated = 0;

        for chain in self.chain_names()? {
            if !registry.contains(&chain) {
                continue;
            }
            let chain_dir = self.assets_root.join(&chain);

            if let Some(info) = read_asset_info(&chain_dir.join("info").join("info.json")) {
                allocator.get_or_create(&AssetKey::native(&chain, &info.symbol));
                generated += 1;
            }
            for address in subdirectories(&chain_dir.join("assets")) {
                let info_path = chain_dir.join("assets").join(&address).join("info.json");
                if read_asset_info(&info_path).is_some() {
                    allocator.get_or_create(&AssetKey::token(&chain, &address));
                    generated += 1;
                }
            }
        }

        Ok(generated)
    }

    fn chain_names(&self) -> CatalogResult<Vec<String>> {
        let entries = fs::read_dir(&self.assets_root).map_err(|source| {
            CatalogError::AssetsRootUnreadable {
                path: self.assets_root.clone(),
                source,
            }
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        // deterministic walk order so first-scan IDs are stable
        names.sort();
        Ok(names)
    }

    fn load_chain_assets(
        &self,
        chain: &str,
        chain_id: &'static str,
        allocator: &mut IdentityAllocator,
    ) -> Vec<AssetRecord> {
        let mut records = Vec::new();
        let chain_dir = self.assets_root.join(chain);

        // native coin first, then the token contracts
        let info_dir = chain_dir.join("info");
        if let Some(info) = read_asset_info(&info_dir.join("info.json")) {
            let id = allocator.get_or_create(&AssetKey::native(chain, &info.symbol));
            let logo_path = if info_dir.join("logo.png").exists() {
                format!("/static/assetsLogo/blockchains/{chain}/info/logo.png")
            } else {
                String::new()
            };
            records.push(AssetRecord {
                id,
                symbol: info.symbol,
                name: info.name,
                blockchain: chain.to_string(),
                blockchain_id: chain_id.to_string(),
                address: String::new(),
                logo_path,
                asset_type: info.asset_type,
                decimals: info.decimals,
                status: info.status,
            });
        }

        let assets_dir = chain_dir.join("assets");
        for address in subdirectories(&assets_dir) {
            let asset_dir = assets_dir.join(&address);
            let Some(info) = read_asset_info(&asset_dir.join("info.json")) else {
                continue;
            };
            // the subdirectory name is the on-chain address, taken verbatim
            let id = allocator.get_or_create(&AssetKey::token(chain, &address));
            let logo_path = if asset_dir.join("logo.png").exists() {
                format!("/static/assetsLogo/blockchains/{chain}/assets/{address}/logo.png")
            } else {
                String::new()
            };
            records.push(AssetRecord {
                id,
                symbol: info.symbol,
                name: info.name,
                blockchain: chain.to_string(),
                blockchain_id: chain_id.to_string(),
                address,
                logo_path,
                asset_type: info.asset_type,
                decimals: info.decimals,
                status: info.status,
            });
        }

        records
    }
}

/// Immediate subdirectory names of `dir`, sorted; empty when `dir` is
/// missing or unreadable.
fn subdirectories(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Reads one metadata file, skipping it (with a warning) when missing or
/// malformed. A single bad file must never abort a rebuild.
pub(crate) fn read_asset_info(path: &Path) -> Option<AssetInfo> {
    let file = File::open(path).ok()?;
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(info) => Some(info),
        Err(error) => {
            log::warn!("skipping asset metadata {}: {error}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use claims::assert_ok;

    use super::*;

    fn write_chain_info(root: &Path, chain: &str, symbol: &str, name: &str) {
        let info_dir = root.join(chain).join("info");
        fs::create_dir_all(&info_dir).unwrap();
        fs::write(
            info_dir.join("info.json"),
            format!(
                r#"{{"name": "{name}", "symbol": "{symbol}", "type": "coin", "decimals": 18, "status": "active"}}"#
            ),
        )
        .unwrap();
    }

    fn write_token_info(root: &Path, chain: &str, address: &str, symbol: &str, decimals: &str) {
        let token_dir = root.join(chain).join("assets").join(address);
        fs::create_dir_all(&token_dir).unwrap();
        fs::write(
            token_dir.join("info.json"),
            format!(
                r#"{{"name": "{symbol} token", "symbol": "{symbol}", "type": "token", "decimals": {decimals}, "status": "active"}}"#
            ),
        )
        .unwrap();
    }

    #[test]
    fn scans_native_and_token_assets() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_chain_info(root, "ethereum", "ETH", "Ethereum");
        write_token_info(root, "ethereum", "0xaaa", "USDC", "\"6\"");

        let loader = CatalogLoader::new(root);
        let registry = ChainRegistry::new();
        let mut allocator = IdentityAllocator::new();
        let buckets = assert_ok!(loader.scan(&registry, &mut allocator));

        let eth = &buckets["ETH"];
        assert_eq!(eth.len(), 1);
        assert_eq!(eth[0].id, "1");
        assert_eq!(eth[0].blockchain_id, "60");
        assert!(eth[0].address.is_empty());

        let usdc = &buckets["USDC"];
        assert_eq!(usdc.len(), 1);
        assert_eq!(usdc[0].id, "2");
        assert_eq!(usdc[0].address, "0xaaa");
        assert_eq!(usdc[0].decimals.0, 6);
    }

    #[test]
    fn unknown_chains_are_excluded_from_snapshot_and_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_chain_info(root, "atlantis", "ATL", "Atlantis");
        write_token_info(root, "atlantis", "0xbbb", "AQUA", "9");
        write_chain_info(root, "ethereum", "ETH", "Ethereum");

        let loader = CatalogLoader::new(root);
        let registry = ChainRegistry::new();
        let mut allocator = IdentityAllocator::new();
        let buckets = assert_ok!(loader.scan(&registry, &mut allocator));

        assert!(buckets.contains_key("ETH"));
        assert!(!buckets.contains_key("ATL"));
        assert!(!buckets.contains_key("AQUA"));
        assert_eq!(allocator.len(), 1);
    }

    #[test]
    fn one_corrupt_metadata_file_does_not_abort_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_chain_info(root, "ethereum", "ETH", "Ethereum");
        for i in 0..9 {
            write_token_info(root, "ethereum", &format!("0x{i:03}"), &format!("TK{i}"), "8");
        }
        let corrupt_dir = root.join("ethereum").join("assets").join("0xbad");
        fs::create_dir_all(&corrupt_dir).unwrap();
        fs::write(corrupt_dir.join("info.json"), "{not json").unwrap();

        let loader = CatalogLoader::new(root);
        let registry = ChainRegistry::new();
        let mut allocator = IdentityAllocator::new();
        let buckets = assert_ok!(loader.scan(&registry, &mut allocator));

        let total: usize = buckets.values().map(Vec::len).sum();
        assert_eq!(total, 10); // native + nine good tokens, corrupt one skipped
        assert!(!buckets.values().flatten().any(|record| record.address == "0xbad"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let loader = CatalogLoader::new("/definitely/not/a/real/assets/root");
        let registry = ChainRegistry::new();
        let mut allocator = IdentityAllocator::new();

        let error = loader.scan(&registry, &mut allocator).unwrap_err();
        assert!(matches!(error, CatalogError::AssetsRootUnreadable { .. }));
    }

    #[test]
    fn logo_paths_are_set_only_when_the_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_chain_info(root, "ethereum", "ETH", "Ethereum");
        fs::write(root.join("ethereum").join("info").join("logo.png"), b"png").unwrap();
        write_token_info(root, "ethereum", "0xaaa", "USDC", "6");

        let loader = CatalogLoader::new(root);
        let registry = ChainRegistry::new();
        let mut allocator = IdentityAllocator::new();
        let buckets = assert_ok!(loader.scan(&registry, &mut allocator));

        assert_eq!(
            buckets["ETH"][0].logo_path,
            "/static/assetsLogo/blockchains/ethereum/info/logo.png"
        );
        assert!(buckets["USDC"][0].logo_path.is_empty());
    }

    #[test]
    fn generate_ids_visits_every_asset() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_chain_info(root, "ethereum", "ETH", "Ethereum");
        write_token_info(root, "ethereum", "0xaaa", "USDC", "6");
        write_token_info(root, "solana", "MintA", "RAY", "6");
        write_chain_info(root, "solana", "SOL", "Solana");

        let loader = CatalogLoader::new(root);
        let registry = ChainRegistry::new();
        let mut allocator = IdentityAllocator::new();

        let generated = assert_ok!(loader.generate_ids(&registry, &mut allocator));
        assert_eq!(generated, 4);
        assert_eq!(allocator.len(), 4);
        assert_eq!(allocator.next_id(), 5);

        // rerunning allocates nothing new
        assert_ok!(loader.generate_ids(&registry, &mut allocator));
        assert_eq!(allocator.len(), 4);
    }
}
