// src/models/region.rs

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// A region the analysis may be filtered on: a two-letter code and its full name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Region {
    #[serde(rename = "abbr")]
    pub code: &'static str,
    pub name: &'static str,
}

const fn region(code: &'static str, name: &'static str) -> Region {
    Region { code, name }
}

static REGIONS: [Region; 48] = [
    region("AL", "Alabama"),
    region("AR", "Arkansas"),
    region("AZ", "Arizona"),
    region("CA", "California"),
    region("CO", "Colorado"),
    region("CT", "Connecticut"),
    region("DE", "Delaware"),
    region("FL", "Florida"),
    region("GA", "Georgia"),
    region("IA", "Iowa"),
    region("ID", "Idaho"),
    region("IL", "Illinois"),
    region("IN", "Indiana"),
    region("KS", "Kansas"),
    region("KY", "Kentucky"),
    region("LA", "Louisiana"),
    region("MA", "Massachusetts"),
    region("MD", "Maryland"),
    region("ME", "Maine"),
    region("MI", "Michigan"),
    region("MN", "Minnesota"),
    region("MO", "Missouri"),
    region("MS", "Mississippi"),
    region("MT", "Montana"),
    region("NC", "North Carolina"),
    region("ND", "North Dakota"),
    region("NE", "Nebraska"),
    region("NH", "New Hampshire"),
    region("NJ", "New Jersey"),
    region("NM", "New Mexico"),
    region("NV", "Nevada"),
    region("NY", "New York"),
    region("OH", "Ohio"),
    region("OK", "Oklahoma"),
    region("OR", "Oregon"),
    region("PA", "Pennsylvania"),
    region("RI", "Rhode Island"),
    region("SC", "South Carolina"),
    region("SD", "South Dakota"),
    region("TN", "Tennessee"),
    region("TX", "Texas"),
    region("UT", "Utah"),
    region("VA", "Virginia"),
    region("VT", "Vermont"),
    region("WA", "Washington"),
    region("WI", "Wisconsin"),
    region("WV", "West Virginia"),
    region("WY", "Wyoming"),
];

static REGION_BY_CODE: Lazy<HashMap<&'static str, Region>> =
    Lazy::new(|| REGIONS.iter().map(|r| (r.code, *r)).collect());

impl Region {
    /// All supported regions in table order.
    pub fn all() -> &'static [Region] {
        &REGIONS
    }

    /// Exact, case-sensitive lookup by two-letter code.
    pub fn from_code(code: &str) -> Option<Region> {
        REGION_BY_CODE.get(code).copied()
    }
}
