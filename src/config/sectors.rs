// src/config/sectors.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SECTORS_PATH: &str = "SECTORS_CONFIG_PATH";
pub const DEFAULT_SECTORS_PATH: &str = "config/sectors.toml";

const YAHOO_HEADLINES: &str = "https://feeds.finance.yahoo.com/rss/2.0/headline";

/// Built-in sector baskets (ticker lists fed to the Yahoo headline feed).
const BUILTIN: &[(&str, &str)] = &[
    ("All", "^GSPC"),
    ("Technology", "AAPL,MSFT,NVDA,GOOG,AMZN"),
    ("Healthcare", "JNJ,MRK,PFE,UNH,ABBV"),
    ("Finance", "JPM,BAC,WFC,C,GS"),
    ("Energy", "XOM,CVX,SLB,BKR,HES"),
    ("Consumer Goods", "PG,KO,PEP,NKE,MCD"),
    ("Industrial", "HON,GE,MMM,CAT,BA"),
    ("Utilities", "NEE,DUK,SO,D,EXC"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub name: String,
    pub url: String,
}

/// Ordered, named feed catalog. The first entry is the default selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectorCatalog {
    sectors: Vec<Sector>,
}

impl Default for SectorCatalog {
    fn default() -> Self {
        let sectors = BUILTIN
            .iter()
            .map(|(name, tickers)| Sector {
                name: (*name).to_string(),
                url: format!("{YAHOO_HEADLINES}?s={tickers}&region=US&lang=en-US"),
            })
            .collect();
        Self { sectors }
    }
}

impl SectorCatalog {
    pub fn new(sectors: Vec<Sector>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::with_capacity(sectors.len());
        for s in sectors {
            let name = s.name.trim().to_string();
            let url = s.url.trim().to_string();
            if name.is_empty() || url.is_empty() {
                continue;
            }
            if !seen.insert(name.to_lowercase()) {
                bail!("duplicate sector name: {name}");
            }
            out.push(Sector { name, url });
        }
        if out.is_empty() {
            return Err(anyhow!("sector catalog is empty"));
        }
        Ok(Self { sectors: out })
    }

    /// Case-insensitive lookup by name.
    pub fn get(&self, name: &str) -> Option<&Sector> {
        let name = name.trim();
        self.sectors
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn default_sector(&self) -> &Sector {
        // `new` and `default` both guarantee at least one entry
        &self.sectors[0]
    }

    pub fn names(&self) -> Vec<&str> {
        self.sectors.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }
}

#[derive(Deserialize)]
struct SectorsFile {
    sectors: Vec<Sector>,
}

pub fn load_sectors_from(path: &Path) -> Result<SectorCatalog> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sectors from {}", path.display()))?;
    let parsed: SectorsFile =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    SectorCatalog::new(parsed.sectors)
}

/// Load the catalog using env var + fallbacks:
/// 1) $SECTORS_CONFIG_PATH
/// 2) config/sectors.toml
/// 3) built-in catalog
pub fn load_sectors_default() -> Result<SectorCatalog> {
    if let Ok(p) = std::env::var(ENV_SECTORS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sectors_from(&pb);
        }
        return Err(anyhow!("{ENV_SECTORS_PATH} points to non-existent path"));
    }
    let p = PathBuf::from(DEFAULT_SECTORS_PATH);
    if p.exists() {
        return load_sectors_from(&p);
    }
    Ok(SectorCatalog::default())
}
