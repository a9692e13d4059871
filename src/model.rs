use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Composite identity of a catalog asset.
///
/// Two assets are the same entity iff their canonical renderings are equal;
/// the rendering is lowercased so lookups stay case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub chain: String,
    pub address: String,
    pub symbol: String,
}

impl AssetKey {
    pub fn token(chain: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            address: address.into(),
            symbol: String::new(),
        }
    }

    pub fn native(chain: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            chain: chain.into(),
            address: String::new(),
            symbol: symbol.into(),
        }
    }

    /// Canonical rendering: `{chain}-{address}` for token contracts,
    /// `{chain}-{symbol}-native` for a chain's native coin.
    pub fn canonical(&self) -> String {
        let key = if self.address.is_empty() {
            format!("{}-{}-native", self.chain, self.symbol)
        } else {
            format!("{}-{}", self.chain, self.address)
        };
        key.to_lowercase()
    }
}

/// Token decimal count as found in metadata files.
///
/// The asset repository carries both `"decimals": 18` and `"decimals": "18"`;
/// both shapes decode into the same integer here, anything else is rejected
/// at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimals(pub u32);

impl<'de> Deserialize<'de> for Decimals {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Decimals(value)),
            Raw::Text(value) => value
                .trim()
                .parse()
                .map(Decimals)
                .map_err(|_| de::Error::custom("decimals must be an integer or a numeric string")),
        }
    }
}

impl Serialize for Decimals {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(self.0)
    }
}

/// Shape of an `info.json` metadata file, shared by chain-native and token
/// assets. Unknown fields are ignored; a file missing `name`, `symbol` or
/// `decimals` fails to parse and its asset is skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetInfo {
    pub name: String,
    pub symbol: String,
    #[serde(rename = "type", default)]
    pub asset_type: String,
    pub decimals: Decimals,
    #[serde(default)]
    pub status: String,
}

/// One catalog entry, immutable once constructed. Snapshots are rebuilt
/// wholesale on refresh; records are never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetRecord {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub blockchain: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub blockchain_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub address: String,
    pub logo_path: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    pub decimals: Decimals,
    pub status: String,
}

/// Cache introspection snapshot, no side effects.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_symbols: usize,
    pub total_assets: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub next_refresh: Option<DateTime<Utc>>,
    pub cache_ttl_mins: u64,
    pub total_id_mappings: usize,
    pub next_id: u64,
}
