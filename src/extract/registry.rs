use anyhow::Result;
use polars::prelude::*;

use crate::error::LinkageError;
use crate::normalize::{match_key, strip_registry_suffix};
use crate::overrides::{self, Rename};
use crate::source::CellFeed;
use crate::types::{FipsCode, FipsRecord};

/// First and last county of the registry table; both must be present or the
/// page no longer has the shape the stride walk assumes.
const FIRST_COUNTY: &str = "Autauga";
const LAST_COUNTY: &str = "Weston";

/// The federal registry page flattens to `code / county / state` triplets.
/// Anchor on the first county, walk triplets while the code cell still looks
/// like a county code, and require the last county to have been seen.
///
/// `renames` is the positional override set for this snapshot; pass an empty
/// slice for clean fixtures.
pub fn extract_registry(feed: &dyn CellFeed, renames: &[Rename]) -> Result<Vec<FipsRecord>> {
    let source = feed.name();
    let cells = feed.cells()?;

    let anchor = cells.iter().position(|c| c == FIRST_COUNTY).ok_or_else(|| {
        LinkageError::source_format(source, format!("index marker {FIRST_COUNTY:?} not found"))
    })?;
    if anchor == 0 || !is_fips_cell(&cells[anchor - 1]) {
        return Err(LinkageError::source_format(
            source,
            format!("cell before {FIRST_COUNTY:?} is not a county code"),
        )
        .into());
    }

    let mut codes: Vec<String> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    let mut states: Vec<String> = Vec::new();
    let mut i = anchor - 1;
    while i + 3 <= cells.len() && is_fips_cell(&cells[i]) {
        codes.push(cells[i].trim().to_string());
        names.push(strip_registry_suffix(&cells[i + 1]).to_string());
        states.push(cells[i + 2].trim().to_string());
        i += 3;
    }

    if !names.iter().any(|n| n == LAST_COUNTY) {
        return Err(LinkageError::source_format(
            source,
            format!("index marker {LAST_COUNTY:?} not found among extracted counties"),
        )
        .into());
    }

    overrides::apply_renames(&mut names, renames, source)?;

    codes
        .iter()
        .zip(names.iter().zip(states.iter()))
        .map(|(code, (name, state))| {
            Ok(FipsRecord { fips: FipsCode::new(code)?, match_key: match_key(name, state) })
        })
        .collect()
}

pub fn registry_frame(records: &[FipsRecord]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("FIPS".into(), records.iter().map(|r| r.fips.as_str()).collect::<Vec<_>>()),
        Column::new("MATCH_ID".into(), records.iter().map(|r| r.match_key.as_str()).collect::<Vec<_>>()),
    ])?)
}

fn is_fips_cell(cell: &str) -> bool {
    let cell = cell.trim();
    cell.len() == 5 && cell.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cells(Vec<String>);

    impl CellFeed for Cells {
        fn name(&self) -> &'static str {
            "fips registry"
        }
        fn cells(&self) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    fn make_feed(cells: &[&str]) -> Cells {
        Cells(cells.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn stride_walk_extracts_triplets_between_markers() {
        let feed = make_feed(&[
            "FIPS", "Name", "State", // header junk before the anchor
            "01001", "Autauga", "AL",
            "32510", "Carson City", "NV",
            "56045", "Weston", "WY",
            "about this dataset", // trailing junk breaks the walk
        ]);

        let records = extract_registry(&feed, &[]).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].fips.as_str(), "01001");
        assert_eq!(records[0].match_key, "autaugaal");
        // " City" suffix stripped, alias applied, shared key rule holds.
        assert_eq!(records[1].match_key, "carsonnv");
    }

    #[test]
    fn missing_first_marker_is_a_format_error() {
        let feed = make_feed(&["01001", "Autaugaville", "AL", "56045", "Weston", "WY"]);
        let err = extract_registry(&feed, &[]).unwrap_err();
        assert!(err.to_string().contains("Autauga"));
    }

    #[test]
    fn missing_last_marker_is_a_format_error() {
        let feed = make_feed(&["01001", "Autauga", "AL", "01003", "Baldwin", "AL"]);
        let err = extract_registry(&feed, &[]).unwrap_err();
        assert!(err.to_string().contains("Weston"));
    }

    #[test]
    fn registry_renames_disambiguate_stripped_cities() {
        let feed = make_feed(&[
            "01001", "Autauga", "AL",
            "51059", "Fairfax", "VA",
            "51600", "Fairfax City", "VA", // stripped to "Fairfax" by the suffix rule
            "56045", "Weston", "WY",
        ]);
        let renames = [
            Rename { row: 1, expect: "Fairfax", set: "Fairfax County" },
            Rename { row: 2, expect: "Fairfax", set: "Fairfax City" },
        ];
        let records = extract_registry(&feed, &renames).unwrap();
        assert_eq!(records[1].match_key, "fairfaxcountyva");
        assert_eq!(records[2].match_key, "fairfaxcityva");
    }
}
