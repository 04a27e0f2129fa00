use crate::types::Region;

/// One row of the static state roster: the 50 states plus the District of
/// Columbia. Territories (state FIPS 60, 66, 69, 72, 78) are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateInfo {
    pub abbr: &'static str,
    pub name: &'static str,
    pub fips: &'static str,
    pub region: Region,
}

const fn state(abbr: &'static str, name: &'static str, fips: &'static str, region: Region) -> StateInfo {
    StateInfo { abbr, name, fips, region }
}

/// Census-region membership follows the reference grouping; DC is carried in
/// the South rather than left regionless.
pub const STATES: [StateInfo; 51] = [
    state("AL", "Alabama", "01", Region::South),
    state("AK", "Alaska", "02", Region::West),
    state("AZ", "Arizona", "04", Region::West),
    state("AR", "Arkansas", "05", Region::South),
    state("CA", "California", "06", Region::West),
    state("CO", "Colorado", "08", Region::West),
    state("CT", "Connecticut", "09", Region::Northeast),
    state("DE", "Delaware", "10", Region::South),
    state("DC", "District of Columbia", "11", Region::South),
    state("FL", "Florida", "12", Region::South),
    state("GA", "Georgia", "13", Region::South),
    state("HI", "Hawaii", "15", Region::West),
    state("ID", "Idaho", "16", Region::West),
    state("IL", "Illinois", "17", Region::Midwest),
    state("IN", "Indiana", "18", Region::Midwest),
    state("IA", "Iowa", "19", Region::Midwest),
    state("KS", "Kansas", "20", Region::Midwest),
    state("KY", "Kentucky", "21", Region::South),
    state("LA", "Louisiana", "22", Region::South),
    state("ME", "Maine", "23", Region::Northeast),
    state("MD", "Maryland", "24", Region::South),
    state("MA", "Massachusetts", "25", Region::Northeast),
    state("MI", "Michigan", "26", Region::Midwest),
    state("MN", "Minnesota", "27", Region::Midwest),
    state("MS", "Mississippi", "28", Region::South),
    state("MO", "Missouri", "29", Region::Midwest),
    state("MT", "Montana", "30", Region::West),
    state("NE", "Nebraska", "31", Region::Midwest),
    state("NV", "Nevada", "32", Region::West),
    state("NH", "New Hampshire", "33", Region::Northeast),
    state("NJ", "New Jersey", "34", Region::Northeast),
    state("NM", "New Mexico", "35", Region::West),
    state("NY", "New York", "36", Region::Northeast),
    state("NC", "North Carolina", "37", Region::South),
    state("ND", "North Dakota", "38", Region::Midwest),
    state("OH", "Ohio", "39", Region::Midwest),
    state("OK", "Oklahoma", "40", Region::South),
    state("OR", "Oregon", "41", Region::West),
    state("PA", "Pennsylvania", "42", Region::Northeast),
    state("RI", "Rhode Island", "44", Region::Northeast),
    state("SC", "South Carolina", "45", Region::South),
    state("SD", "South Dakota", "46", Region::Midwest),
    state("TN", "Tennessee", "47", Region::South),
    state("TX", "Texas", "48", Region::South),
    state("UT", "Utah", "49", Region::West),
    state("VT", "Vermont", "50", Region::Northeast),
    state("VA", "Virginia", "51", Region::South),
    state("WA", "Washington", "53", Region::West),
    state("WV", "West Virginia", "54", Region::South),
    state("WI", "Wisconsin", "55", Region::Midwest),
    state("WY", "Wyoming", "56", Region::West),
];

pub fn state_by_abbr(abbr: &str) -> Option<&'static StateInfo> {
    STATES.iter().find(|s| s.abbr.eq_ignore_ascii_case(abbr.trim()))
}

pub fn state_by_name(name: &str) -> Option<&'static StateInfo> {
    STATES.iter().find(|s| s.name.eq_ignore_ascii_case(name.trim()))
}

/// Region for a full state name, None for anything off the roster.
pub fn region_of(state_name: &str) -> Option<Region> {
    state_by_name(state_name).map(|s| s.region)
}
