use std::collections::HashMap;

/// Registered chain names and their coin-type codes (SLIP-44 derived,
/// extended with the vendor-specific high ranges used by the asset
/// repository).
const COIN_TYPES: &[(&str, &str)] = &[
    ("aeternity", "457"),
    ("aion", "425"),
    ("binance", "714"),
    ("bitcoin", "0"),
    ("bitcoincash", "145"),
    ("bitcoingold", "156"),
    ("callisto", "820"),
    ("cardano", "1815"),
    ("cosmos", "118"),
    ("pivx", "119"),
    ("dash", "5"),
    ("decred", "42"),
    ("digibyte", "20"),
    ("dogecoin", "3"),
    ("eos", "194"),
    ("wax", "14001"),
    ("ethereum", "60"),
    ("ethereumclassic", "61"),
    ("fio", "235"),
    ("gochain", "6060"),
    ("groestlcoin", "17"),
    ("icon", "74"),
    ("iotex", "304"),
    ("kava", "459"),
    ("kin", "2017"),
    ("litecoin", "2"),
    ("monacoin", "22"),
    ("nebulas", "2718"),
    ("nuls", "8964"),
    ("nano", "165"),
    ("near", "397"),
    ("nimiq", "242"),
    ("ontology", "1024"),
    ("poanetwork", "178"),
    ("qtum", "2301"),
    ("xrp", "144"),
    ("solana", "501"),
    ("stellar", "148"),
    ("tezos", "1729"),
    ("theta", "500"),
    ("thundercore", "1001"),
    ("neo", "888"),
    ("viction", "889"),
    ("tron", "195"),
    ("vechain", "818"),
    ("viacoin", "14"),
    ("wanchain", "5718350"),
    ("zcash", "133"),
    ("firo", "136"),
    ("zilliqa", "313"),
    ("zelcash", "19167"),
    ("ravencoin", "175"),
    ("waves", "5741564"),
    ("terra", "330"),
    ("terrav2", "10000330"),
    ("harmony", "1023"),
    ("algorand", "283"),
    ("kusama", "434"),
    ("polkadot", "354"),
    ("filecoin", "461"),
    ("multiversx", "508"),
    ("bandchain", "494"),
    ("smartchainlegacy", "10000714"),
    ("smartchain", "20000714"),
    ("tbinance", "30000714"),
    ("oasis", "474"),
    ("polygon", "966"),
    ("thorchain", "931"),
    ("bluzelle", "483"),
    ("optimism", "10000070"),
    ("zksync", "10000324"),
    ("arbitrum", "10042221"),
    ("ecochain", "10000553"),
    ("avalanchec", "10009000"),
    ("xdai", "10000100"),
    ("fantom", "10000250"),
    ("cryptoorg", "394"),
    ("celo", "52752"),
    ("ronin", "10002020"),
    ("osmosis", "10000118"),
    ("ecash", "899"),
    ("iost", "291"),
    ("cronos", "10000025"),
    ("smartbch", "10000145"),
    ("kcc", "10000321"),
    ("bitcoindiamond", "999"),
    ("boba", "10000288"),
    ("syscoin", "57"),
    ("verge", "77"),
    ("zen", "121"),
    ("metis", "10001088"),
    ("aurora", "1323161554"),
    ("evmos", "10009001"),
    ("nativeevmos", "20009001"),
    ("moonriver", "10001285"),
    ("moonbeam", "10001284"),
    ("kavaevm", "10002222"),
    ("kaia", "10008217"),
    ("meter", "18000"),
    ("okxchain", "996"),
    ("stratis", "105105"),
    ("komodo", "141"),
    ("nervos", "309"),
    ("everscale", "396"),
    ("aptos", "637"),
    ("nebl", "146"),
    ("hedera", "3030"),
    ("secret", "529"),
    ("nativeinjective", "10000060"),
    ("agoric", "564"),
    ("ton", "607"),
    ("sui", "784"),
    ("stargaze", "20000118"),
    ("polygonzkevm", "10001101"),
    ("juno", "30000118"),
    ("stride", "40000118"),
    ("axelar", "50000118"),
    ("crescent", "60000118"),
    ("kujira", "70000118"),
    ("iotexevm", "10004689"),
    ("nativecanto", "10007700"),
    ("comdex", "80000118"),
    ("neutron", "90000118"),
    ("sommelier", "11000118"),
    ("fetchai", "12000118"),
    ("mars", "13000118"),
    ("umee", "14000118"),
    ("coreum", "10000990"),
    ("quasar", "15000118"),
    ("persistence", "16000118"),
    ("akash", "17000118"),
    ("noble", "18000118"),
    ("scroll", "534352"),
    ("rootstock", "137"),
    ("thetafuel", "361"),
    ("cfxevm", "1030"),
    ("acala", "787"),
    ("acalaevm", "10000787"),
    ("opbnb", "204"),
    ("neon", "245022934"),
    ("base", "8453"),
    ("sei", "19000118"),
    ("arbitrumnova", "10042170"),
    ("linea", "59144"),
    ("greenfield", "5600"),
    ("mantle", "5000"),
    ("zeneon", "7332"),
    ("internetcomputer", "223"),
    ("tia", "21000118"),
    ("manta", "169"),
    ("nativezetachain", "10007000"),
    ("zetaevm", "20007000"),
    ("dydx", "22000118"),
    ("merlin", "4200"),
    ("lightlink", "1890"),
    ("blast", "81457"),
    ("bouncebit", "6001"),
    ("zklink", "810180"),
    ("pactus", "21888"),
    ("sonic", "10000146"),
    ("polymesh", "595"),
];

/// Short chain names used by callers outside the catalog (tickers and
/// exchange-style abbreviations) mapped to the directory names the asset
/// repository uses.
const CHAIN_ALIASES: &[(&str, &str)] = &[
    ("eth", "ethereum"),
    ("matic", "polygon"),
    ("pol", "polygon"),
    ("sol", "solana"),
    ("bsc", "smartchain"),
    ("bnb", "smartchain"),
    ("avax", "avalanchec"),
    ("avaxc", "avalanchec"),
    ("ftm", "fantom"),
    ("arb", "arbitrum"),
    ("op", "optimism"),
    ("zeta", "zetachain"),
    ("trx", "tron"),
];

/// Read-only lookup from chain name to its coin-type code.
///
/// Built once at construction; lookups are case-insensitive and never fail,
/// an unknown chain is simply absent.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    coin_types: HashMap<&'static str, &'static str>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self {
            coin_types: COIN_TYPES.iter().copied().collect(),
        }
    }

    pub fn resolve(&self, chain_name: &str) -> Option<&'static str> {
        self.coin_types.get(chain_name.to_lowercase().as_str()).copied()
    }

    pub fn contains(&self, chain_name: &str) -> bool {
        self.resolve(chain_name).is_some()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Folds caller-facing short names into the repository's chain names and
/// lowercases the rest.
pub fn canonical_chain_name(chain: &str) -> String {
    let normalized = chain.to_lowercase();
    for (alias, canonical) in CHAIN_ALIASES {
        if *alias == normalized {
            return (*canonical).to_string();
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_some_eq};

    use super::*;

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = ChainRegistry::new();

        assert_some_eq!(registry.resolve("ethereum"), "60");
        assert_some_eq!(registry.resolve("Ethereum"), "60");
        assert_some_eq!(registry.resolve("SOLANA"), "501");
        assert_some_eq!(registry.resolve("bitcoin"), "0");
    }

    #[test]
    fn unknown_chain_is_absent_not_an_error() {
        let registry = ChainRegistry::new();

        assert_none!(registry.resolve("atlantis"));
        assert!(!registry.contains("atlantis"));
    }

    #[test]
    fn aliases_fold_to_repository_names() {
        assert_eq!(canonical_chain_name("ETH"), "ethereum");
        assert_eq!(canonical_chain_name("bsc"), "smartchain");
        assert_eq!(canonical_chain_name("trx"), "tron");
        // unknown names pass through lowercased
        assert_eq!(canonical_chain_name("Polkadot"), "polkadot");
    }
}
