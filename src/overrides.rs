//! The one place where known source defects get corrected.
//!
//! Two correction shapes exist. Positional renames patch county names at
//! fixed row offsets of a specific source snapshot; they cover the
//! independent cities whose bare names collide with a same-named county and
//! which no attribute in the source can tell apart. Keyed FIPS fixes patch
//! the code of a county identified by its match key; they cover registry
//! rows whose code is stale or swapped. Both carry the value the snapshot is
//! expected to hold, and the apply pass refuses to overwrite anything else,
//! so a reordered or re-scraped upstream page fails the run instead of
//! silently corrupting a neighbor row.

use anyhow::Result;
use polars::prelude::*;

use crate::error::LinkageError;

/// Rename the county at a known row of a source snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Rename {
    pub row: usize,
    pub expect: &'static str,
    pub set: &'static str,
}

/// Set the FIPS code of the county whose match key equals `key`.
#[derive(Debug, Clone, Copy)]
pub struct FipsFix {
    pub key: &'static str,
    pub expect: &'static str,
    pub set: &'static str,
}

/// A county missing from the registry entirely, inserted after the
/// name-key join with hand-verified vote totals.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticCounty {
    pub fips: &'static str,
    pub county: &'static str,
    pub state_abbr: &'static str,
    pub clinton_votes: u64,
    pub trump_votes: u64,
}

/// Vote-scrape renames. Row indices and expected (suffix-stripped) names are
/// tied to the November 2020 snapshot of the county results pages.
pub const VOTE_RENAMES: &[Rename] = &[
    // St. Louis City vs. St. Louis County, Missouri
    Rename { row: 1555, expect: "St. Louis", set: "St Louis City" },
    // Virginia independent cities vs. their same-named counties
    Rename { row: 2801, expect: "Bedford", set: "Bedford County" },
    Rename { row: 2828, expect: "Fairfax", set: "Fairfax City" },
    Rename { row: 2829, expect: "Fairfax", set: "Fairfax County" },
    Rename { row: 2835, expect: "Franklin", set: "Franklin County" },
    Rename { row: 2896, expect: "Richmond", set: "Richmond County" },
    Rename { row: 2898, expect: "Roanoke", set: "Roanoke County" },
];

/// Registry renames, same counties as `VOTE_RENAMES` seen from the other
/// side. Indices are tied to the registry table snapshot.
pub const REGISTRY_RENAMES: &[Rename] = &[
    // St. Louis City vs. St. Louis County, Missouri
    Rename { row: 1593, expect: "St. Louis", set: "St Louis City" },
    // Virginia independent cities vs. their same-named counties
    Rename { row: 2826, expect: "Bedford", set: "Bedford County" },
    Rename { row: 2845, expect: "Fairfax", set: "Fairfax County" },
    Rename { row: 2849, expect: "Franklin", set: "Franklin County" },
    Rename { row: 2892, expect: "Richmond", set: "Richmond County" },
    Rename { row: 2893, expect: "Roanoke", set: "Roanoke County" },
    Rename { row: 2923, expect: "Fairfax", set: "Fairfax City" },
];

/// Registry codes that disagree with the county's actual FIPS.
pub const FIPS_FIXES: &[FipsFix] = &[
    // The registry lists DC under its state-level code.
    FipsFix { key: "districtofcolumbiadc", expect: "11000", set: "11001" },
    // Baltimore, MD: city and county codes swapped in the registry.
    FipsFix { key: "baltimorecitymd", expect: "24005", set: "24510" },
    FipsFix { key: "baltimoremd", expect: "24510", set: "24005" },
    // St. Louis, MO: same swap.
    FipsFix { key: "stlouiscitymo", expect: "29189", set: "29510" },
    FipsFix { key: "stlouismo", expect: "29510", set: "29189" },
];

/// Counties absent from the registry snapshot.
pub const MISSING_COUNTIES: &[SyntheticCounty] = &[
    // Oglala Lakota, SD (46102): renamed from Shannon County in 2015 and
    // never added to the registry page. Totals hand-checked against the
    // South Dakota canvass.
    SyntheticCounty {
        fips: "46102",
        county: "Oglala Lakota",
        state_abbr: "SD",
        clinton_votes: 2504,
        trump_votes: 241,
    },
];

/// The full correction set threaded through one run. The associated
/// constructors are the only places the static tables above get wired in,
/// which keeps this file the single audit point for every correction.
#[derive(Debug, Clone, Copy)]
pub struct OverrideSet {
    pub vote_renames: &'static [Rename],
    pub registry_renames: &'static [Rename],
    pub fips_fixes: &'static [FipsFix],
    pub missing_counties: &'static [SyntheticCounty],
}

impl OverrideSet {
    /// Corrections for the reference source snapshots.
    pub fn reference() -> Self {
        Self {
            vote_renames: VOTE_RENAMES,
            registry_renames: REGISTRY_RENAMES,
            fips_fixes: FIPS_FIXES,
            missing_counties: MISSING_COUNTIES,
        }
    }

    /// No corrections at all, for clean fixtures.
    pub fn none() -> Self {
        Self { vote_renames: &[], registry_renames: &[], fips_fixes: &[], missing_counties: &[] }
    }
}

impl Default for OverrideSet {
    fn default() -> Self {
        Self::reference()
    }
}

/// Apply positional renames to a source's county-name column, verifying the
/// snapshot still holds the expected value at each row.
pub fn apply_renames(names: &mut [String], renames: &[Rename], source: &'static str) -> Result<()> {
    for patch in renames {
        let found = names.get(patch.row).ok_or_else(|| LinkageError::StaleOverride {
            src: source,
            target: format!("row {}", patch.row),
            expected: patch.expect.to_string(),
            found: format!("<only {} rows>", names.len()),
        })?;
        if found != patch.expect {
            return Err(LinkageError::StaleOverride {
                src: source,
                target: format!("row {}", patch.row),
                expected: patch.expect.to_string(),
                found: found.clone(),
            }
            .into());
        }
        names[patch.row] = patch.set.to_string();
    }
    Ok(())
}

/// Apply keyed FIPS fixes to the merged vote/registry frame. Each key must
/// identify exactly one row, and the row must still carry the stale code the
/// fix was written against.
pub fn apply_fips_fixes(df: &mut DataFrame, fixes: &[FipsFix], source: &'static str) -> Result<()> {
    let keys: Vec<String> = df
        .column("MATCH_ID")?
        .str()?
        .into_no_null_iter()
        .map(str::to_string)
        .collect();
    let mut codes: Vec<String> = df
        .column("FIPS")?
        .str()?
        .into_no_null_iter()
        .map(str::to_string)
        .collect();

    for fix in fixes {
        let rows: Vec<usize> = keys
            .iter()
            .enumerate()
            .filter(|(_, k)| k.as_str() == fix.key)
            .map(|(i, _)| i)
            .collect();
        match rows.as_slice() {
            [row] => {
                if codes[*row] != fix.expect {
                    return Err(LinkageError::StaleOverride {
                        src: source,
                        target: fix.key.to_string(),
                        expected: fix.expect.to_string(),
                        found: codes[*row].clone(),
                    }
                    .into());
                }
                codes[*row] = fix.set.to_string();
            }
            [] => {
                return Err(LinkageError::StaleOverride {
                    src: source,
                    target: fix.key.to_string(),
                    expected: fix.expect.to_string(),
                    found: "<no such key>".to_string(),
                }
                .into());
            }
            many => {
                return Err(LinkageError::JoinCardinality {
                    table: source,
                    key: fix.key.to_string(),
                    count: many.len(),
                }
                .into());
            }
        }
    }

    df.replace("FIPS", Series::new("FIPS".into(), codes))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_names() -> Vec<String> {
        ["Adams", "Fairfax", "Fairfax", "Harris"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn rename_touches_only_its_row() {
        let mut names = make_names();
        let patches = [
            Rename { row: 1, expect: "Fairfax", set: "Fairfax City" },
            Rename { row: 2, expect: "Fairfax", set: "Fairfax County" },
        ];
        apply_renames(&mut names, &patches, "test").unwrap();
        assert_eq!(names, ["Adams", "Fairfax City", "Fairfax County", "Harris"]);
    }

    #[test]
    fn stale_rename_fails_loudly() {
        let mut names = make_names();
        let patches = [Rename { row: 1, expect: "Bedford", set: "Bedford County" }];
        let err = apply_renames(&mut names, &patches, "test").unwrap_err();
        assert!(err.to_string().contains("stale override"));
        // Nothing was written.
        assert_eq!(names, make_names());
    }

    #[test]
    fn rename_past_the_end_fails_loudly() {
        let mut names = make_names();
        let patches = [Rename { row: 99, expect: "Adams", set: "Adams County" }];
        assert!(apply_renames(&mut names, &patches, "test").is_err());
    }

    fn make_merged() -> DataFrame {
        DataFrame::new(vec![
            Column::new("MATCH_ID".into(), vec!["adamsoh", "baltimoremd", "baltimorecitymd"]),
            Column::new("FIPS".into(), vec!["39001", "24510", "24005"]),
        ])
        .unwrap()
    }

    #[test]
    fn fips_fix_swaps_exactly_the_targeted_cells() {
        let mut df = make_merged();
        let fixes = [
            FipsFix { key: "baltimorecitymd", expect: "24005", set: "24510" },
            FipsFix { key: "baltimoremd", expect: "24510", set: "24005" },
        ];
        apply_fips_fixes(&mut df, &fixes, "test").unwrap();
        let codes: Vec<&str> = df.column("FIPS").unwrap().str().unwrap().into_no_null_iter().collect();
        assert_eq!(codes, ["39001", "24005", "24510"]);
    }

    #[test]
    fn fips_fix_with_wrong_expectation_fails() {
        let mut df = make_merged();
        let fixes = [FipsFix { key: "adamsoh", expect: "39999", set: "39001" }];
        assert!(apply_fips_fixes(&mut df, &fixes, "test").is_err());
    }

    #[test]
    fn fips_fix_with_missing_key_fails() {
        let mut df = make_merged();
        let fixes = [FipsFix { key: "nowherexx", expect: "00000", set: "00001" }];
        assert!(apply_fips_fixes(&mut df, &fixes, "test").is_err());
    }
}
