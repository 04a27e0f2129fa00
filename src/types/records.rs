use chrono::NaiveDate;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

use super::fips::FipsCode;

/// Winner of a state's popular vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    Democratic,
    Republican,
}

impl Party {
    /// Ties go Republican, matching the reference dataset (no state tied).
    pub fn from_totals(clinton: u64, trump: u64) -> Self {
        if clinton > trump { Party::Democratic } else { Party::Republican }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Democratic => "Democratic",
            Party::Republican => "Republican",
        }
    }
}

/// Census region of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Northeast,
    South,
    Midwest,
    West,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::Northeast, Region::South, Region::Midwest, Region::West];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Northeast => "Northeast",
            Region::South => "South",
            Region::Midwest => "Midwest",
            Region::West => "West",
        }
    }
}

/// State-grain vote totals, one row per state plus DC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVoteRecord {
    pub state: String,
    pub clinton_votes: u64,
    pub trump_votes: u64,
    pub party: Party,
}

/// County-grain vote counts keyed for the registry join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyVoteRecord {
    pub county: String,
    pub state_abbr: String,
    pub clinton_votes: u64,
    pub trump_votes: u64,
    pub match_key: String,
}

/// One row of the federal county registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FipsRecord {
    pub fips: FipsCode,
    pub match_key: String,
}

/// One reporting day for one county. County and state names ride along from
/// the feed; the state name is what later joins the state vote table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    pub date: NaiveDate,
    pub county: String,
    pub state: String,
    pub fips: FipsCode,
    pub cases: u64,
    pub deaths: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationRecord {
    pub fips: FipsCode,
    pub population_2019: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DensityRecord {
    pub fips: FipsCode,
    pub density: f64,
}

/// County boundary attributes plus geometry, continental US only.
#[derive(Debug, Clone)]
pub struct BoundaryRecord {
    pub fips: FipsCode,
    pub name: String,
    pub lsad: String,
    pub land_area: f64,
    pub water_area: f64,
    pub geometry: MultiPolygon<f64>,
}
