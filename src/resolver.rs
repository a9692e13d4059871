use std::{
    collections::HashMap,
    fs::{self, File},
    io::BufReader,
    path::PathBuf,
    sync::RwLock,
};

use serde::Deserialize;

use crate::{
    error::{poison_error, CatalogResult},
    loader::read_asset_info,
};

#[derive(Debug, Deserialize)]
struct TokenList {
    #[serde(default)]
    tokens: Vec<TokenListItem>,
}

#[derive(Debug, Deserialize)]
struct TokenListItem {
    address: String,
    symbol: String,
}

/// Lazily-built address → symbol lookup for one chain's tokens.
///
/// Built once on first use from the chain's `assets/<address>/info.json`
/// files, supplemented by `tokenlist.json` entries (which never override a
/// symbol learned from an asset file). No TTL; the map lives for the
/// lifetime of the instance.
#[derive(Debug)]
pub struct TokenSymbolCache {
    assets_root: PathBuf,
    chain: String,
    symbols: RwLock<Option<HashMap<String, String>>>,
}

impl TokenSymbolCache {
    pub fn new(assets_root: impl Into<PathBuf>, chain: impl Into<String>) -> Self {
        Self {
            assets_root: assets_root.into(),
            chain: chain.into(),
            symbols: RwLock::new(None),
        }
    }

    /// The catalog ships its richest token list for solana mints.
    pub fn solana(assets_root: impl Into<PathBuf>) -> Self {
        Self::new(assets_root, "solana")
    }

    /// Symbol for an on-chain address, case-insensitive. Unknown addresses
    /// fall back to a truncated rendering of the address itself.
    pub fn symbol_by_address(&self, address: &str) -> CatalogResult<String> {
        self.ensure_loaded()?;

        let symbols = self.symbols.read().map_err(|_| poison_error("token symbol cache"))?;
        if let Some(symbol) = symbols
            .as_ref()
            .and_then(|map| map.get(&address.to_lowercase()))
        {
            return Ok(symbol.clone());
        }
        Ok(fallback_symbol(address))
    }

    fn ensure_loaded(&self) -> CatalogResult<()> {
        {
            let symbols = self.symbols.read().map_err(|_| poison_error("token symbol cache"))?;
            if symbols.is_some() {
                return Ok(());
            }
        }

        let mut symbols = self.symbols.write().map_err(|_| poison_error("token symbol cache"))?;
        if symbols.is_none() {
            *symbols = Some(self.build());
        }
        Ok(())
    }

    fn build(&self) -> HashMap<String, String> {
        let mut symbols = HashMap::new();
        let chain_dir = self.assets_root.join(&self.chain);

        let assets_dir = chain_dir.join("assets");
        if let Ok(entries) = fs::read_dir(&assets_dir) {
            for entry in entries.flatten() {
                if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    continue;
                }
                let address = entry.file_name().to_string_lossy().into_owned();
                if let Some(info) = read_asset_info(&assets_dir.join(&address).join("info.json")) {
                    symbols.insert(address.to_lowercase(), info.symbol);
                }
            }
        }

        let list_path = chain_dir.join("tokenlist.json");
        if let Ok(file) = File::open(&list_path) {
            match serde_json::from_reader::<_, TokenList>(BufReader::new(file)) {
                Ok(list) => {
                    for token in list.tokens {
                        symbols.entry(token.address.to_lowercase()).or_insert(token.symbol);
                    }
                }
                Err(error) => log::warn!("skipping token list {}: {error}", list_path.display()),
            }
        }

        log::info!("loaded {} {} token symbols", symbols.len(), self.chain);
        symbols
    }
}

fn fallback_symbol(address: &str) -> String {
    match address.get(..4) {
        Some(prefix) => format!("{prefix}..."),
        None => "UNKNOWN".to_string(),
    }
}
