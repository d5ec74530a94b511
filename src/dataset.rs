//! Reference data seeded into the lookup tables.
//!
//! The built-in set is compiled in; a JSON file of the shape
//! `{"formats": [{"code": "...", "name": "..."}], ...}` can replace it.

use crate::error::SeedError;
use crate::types::{LookupEntry, LookupTable};
use std::collections::BTreeMap;
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceData {
    tables: Vec<(LookupTable, Vec<LookupEntry>)>,
}

const FORMATS: &[(&str, &str)] = &[
    ("teaser", "Teaser"),
    ("video", "Video"),
    ("banner", "Banner"),
    ("image", "Image"),
];

const TYPES: &[(&str, &str)] = &[
    ("crypt", "Crypt"),
    ("gambling", "Gambling"),
    ("nutra", "Nutra"),
    ("news", "News"),
    ("product", "Product"),
    ("nutra_vsl", "Nutra (VSL)"),
    ("finance", "Finance"),
    ("dating", "Dating"),
];

const PLACEMENTS: &[(&str, &str)] = &[
    ("demand_gen", "Demand Gen"),
    ("uac", "UAC"),
    ("facebook_ads", "Facebook Ads"),
    ("google_ads", "Google Ads"),
    ("youtube_ads", "YouTube Ads"),
    ("native", "Native"),
    ("push", "Push"),
];

const PLATFORMS: &[(&str, &str)] = &[
    ("web", "Web"),
    ("google", "Google"),
    ("youtube", "YouTube"),
    ("facebook", "Facebook"),
    ("instagram", "Instagram"),
    ("tiktok", "TikTok"),
    ("telegram", "Telegram"),
    ("discovery", "Discovery"),
];

const COUNTRIES: &[(&str, &str)] = &[
    ("DE", "Germany"),
    ("PL", "Poland"),
    ("IT", "Italy"),
    ("ES", "Spain"),
    ("FR", "France"),
    ("AR", "Argentina"),
    ("US", "United States"),
    ("RU", "Russia"),
    ("BR", "Brazil"),
    ("TR", "Turkey"),
    ("RO", "Romania"),
    ("CZ", "Czech Republic"),
    ("AT", "Austria"),
    ("HU", "Hungary"),
    ("LT", "Lithuania"),
    ("BD", "Bangladesh"),
    ("BG", "Bulgaria"),
    ("UA", "Ukraine"),
    ("PT", "Portugal"),
    ("IE", "Ireland"),
    ("SK", "Slovakia"),
    ("BE", "Belgium"),
    ("GR", "Greece"),
    ("AU", "Australia"),
    ("SI", "Slovenia"),
    ("GB", "United Kingdom"),
    ("CA", "Canada"),
    ("NL", "Netherlands"),
    ("IN", "India"),
    ("HR", "Croatia"),
    ("LV", "Latvia"),
    ("KZ", "Kazakhstan"),
    ("KR", "South Korea"),
    ("MY", "Malaysia"),
    ("EE", "Estonia"),
    ("SE", "Sweden"),
    ("DK", "Denmark"),
    ("CY", "Cyprus"),
    ("PH", "Philippines"),
    ("SG", "Singapore"),
    ("VN", "Vietnam"),
    ("AZ", "Azerbaijan"),
    ("ZA", "South Africa"),
    ("FI", "Finland"),
    ("MX", "Mexico"),
    ("PK", "Pakistan"),
    ("NZ", "New Zealand"),
    ("EG", "Egypt"),
    ("CO", "Colombia"),
    ("IS", "Iceland"),
    ("ID", "Indonesia"),
    ("PE", "Peru"),
    ("NG", "Nigeria"),
    ("AE", "United Arab Emirates"),
    ("JP", "Japan"),
    ("NO", "Norway"),
    ("CL", "Chile"),
    ("LU", "Luxembourg"),
    ("TH", "Thailand"),
    ("SA", "Saudi Arabia"),
    ("HK", "Hong Kong"),
];

fn entries(pairs: &[(&str, &str)]) -> Vec<LookupEntry> {
    pairs
        .iter()
        .map(|(code, name)| LookupEntry::new(*code, *name))
        .collect()
}

impl ReferenceData {
    pub fn builtin() -> Self {
        let tables = LookupTable::ALL
            .into_iter()
            .map(|table| {
                let pairs = match table {
                    LookupTable::Formats => FORMATS,
                    LookupTable::Types => TYPES,
                    LookupTable::Placements => PLACEMENTS,
                    LookupTable::Platforms => PLATFORMS,
                    LookupTable::Countries => COUNTRIES,
                };
                (table, entries(pairs))
            })
            .collect();
        Self { tables }
    }

    /// Load a dataset from JSON. Tables are reordered into seeding order.
    pub fn from_json_file(path: &Path) -> Result<Self, SeedError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, SeedError> {
        let parsed: BTreeMap<String, Vec<LookupEntry>> = serde_json::from_str(raw)?;
        let mut by_table = BTreeMap::new();
        for (name, rows) in parsed {
            let table = name.parse::<LookupTable>()?;
            if by_table.insert(table, rows).is_some() {
                return Err(SeedError::DuplicateTable(table.to_string()));
            }
        }
        Ok(Self {
            tables: by_table.into_iter().collect(),
        })
    }

    /// Keep only `table`. Yields an empty dataset if it is absent.
    pub fn only(self, table: LookupTable) -> Self {
        self.restricted_to(&[table])
    }

    pub fn restricted_to(self, keep: &[LookupTable]) -> Self {
        Self {
            tables: self
                .tables
                .into_iter()
                .filter(|(t, _)| keep.contains(t))
                .collect(),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = (LookupTable, &[LookupEntry])> {
        self.tables.iter().map(|(t, rows)| (*t, rows.as_slice()))
    }

    pub fn get(&self, table: LookupTable) -> Option<&[LookupEntry]> {
        self.tables
            .iter()
            .find(|(t, _)| *t == table)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn len(&self) -> usize {
        self.tables.iter().map(|(_, rows)| rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
