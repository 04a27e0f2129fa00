use std::collections::HashSet;

use anyhow::Result;
use polars::prelude::*;

use crate::common;
use crate::error::LinkageError;
use crate::extract::parse_count;
use crate::normalize::{canonical_county, match_key, strip_vote_suffix};
use crate::overrides::{self, Rename};
use crate::source::{CellFeed, CountyPageFeed};
use crate::types::{CountyVoteRecord, Party, StateVoteRecord};

const CLINTON: &str = "Hillary Clinton";
const TRUMP: &str = "Donald Trump";

/// State-grain results: the collaborator hands over
/// `state / clinton votes / trump votes` cell triplets, one per state plus
/// DC. State names are canonicalized against the roster so the later
/// state-name join cannot miss on spelling ("DC" vs "District of Columbia").
pub fn extract_state_votes(feed: &dyn CellFeed) -> Result<Vec<StateVoteRecord>> {
    let source = feed.name();
    let cells = feed.cells()?;
    if cells.is_empty() || cells.len() % 3 != 0 {
        return Err(LinkageError::source_format(
            source,
            format!("expected state/clinton/trump triplets, found {} cells", cells.len()),
        )
        .into());
    }

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(cells.len() / 3);
    for triplet in cells.chunks(3) {
        let state = common::state_by_name(&triplet[0])
            .or_else(|| common::state_by_abbr(&triplet[0]))
            .ok_or_else(|| {
                LinkageError::source_format(source, format!("unknown state {:?}", triplet[0]))
            })?;
        if !seen.insert(state.abbr) {
            return Err(LinkageError::JoinCardinality {
                table: source,
                key: state.name.to_string(),
                count: 2,
            }
            .into());
        }
        let clinton_votes = parse_count(&triplet[1], source)?;
        let trump_votes = parse_count(&triplet[2], source)?;
        records.push(StateVoteRecord {
            state: state.name.to_string(),
            clinton_votes,
            trump_votes,
            party: Party::from_totals(clinton_votes, trump_votes),
        });
    }

    if records.len() != common::STATES.len() {
        return Err(LinkageError::source_format(
            source,
            format!("expected {} states, found {}", common::STATES.len(), records.len()),
        )
        .into());
    }

    Ok(records)
}

pub fn state_votes_frame(records: &[StateVoteRecord]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("STATE".into(), records.iter().map(|r| r.state.as_str()).collect::<Vec<_>>()),
        Column::new("CLINTON_VOTES".into(), records.iter().map(|r| r.clinton_votes as i64).collect::<Vec<_>>()),
        Column::new("TRUMP_VOTES".into(), records.iter().map(|r| r.trump_votes as i64).collect::<Vec<_>>()),
        Column::new("PARTY_ID".into(), records.iter().map(|r| r.party.as_str()).collect::<Vec<_>>()),
    ])?)
}

/// County-grain results. Each state page is a cell walk over county blocks:
/// a county-name cell, then `candidate / votes / share` rows in whatever
/// order the page ranked the candidates. The name cell is recognized as the
/// cell right before a candidate marker that is itself neither a count nor a
/// percentage.
///
/// `renames` is the positional override set for this snapshot; pass an empty
/// slice for clean fixtures.
pub fn extract_county_votes(
    feed: &dyn CountyPageFeed,
    renames: &[Rename],
) -> Result<Vec<CountyVoteRecord>> {
    let source = feed.name();
    let pages = feed.pages()?;

    let mut names: Vec<String> = Vec::new();
    let mut states: Vec<String> = Vec::new();
    let mut clinton: Vec<u64> = Vec::new();
    let mut trump: Vec<u64> = Vec::new();

    for page in &pages {
        for (i, cell) in page.cells.iter().enumerate() {
            if let Some(next) = page.cells.get(i + 1) {
                if (next == CLINTON || next == TRUMP) && !is_statistic(cell) {
                    names.push(strip_vote_suffix(cell).to_string());
                    states.push(page.state_abbr.clone());
                }
            }
            if cell == CLINTON || cell == TRUMP {
                let votes = page.cells.get(i + 1).ok_or_else(|| {
                    LinkageError::source_format(
                        source,
                        format!("{}: page ends right after a candidate marker", page.state_abbr),
                    )
                })?;
                let votes = parse_count(votes, source)?;
                if cell == CLINTON { clinton.push(votes) } else { trump.push(votes) }
            }
        }
        if names.len() != clinton.len() || names.len() != trump.len() {
            return Err(LinkageError::source_format(
                source,
                format!(
                    "{}: malformed county blocks ({} names, {} Clinton rows, {} Trump rows)",
                    page.state_abbr,
                    names.len(),
                    clinton.len(),
                    trump.len()
                ),
            )
            .into());
        }
    }

    for name in &mut names {
        *name = canonical_county(name).to_string();
    }
    overrides::apply_renames(&mut names, renames, source)?;

    Ok(names
        .into_iter()
        .zip(states)
        .zip(clinton.into_iter().zip(trump))
        .map(|((county, state_abbr), (clinton_votes, trump_votes))| CountyVoteRecord {
            match_key: match_key(&county, &state_abbr),
            county,
            state_abbr,
            clinton_votes,
            trump_votes,
        })
        .collect())
}

pub fn county_votes_frame(records: &[CountyVoteRecord]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("COUNTY".into(), records.iter().map(|r| r.county.as_str()).collect::<Vec<_>>()),
        Column::new("STATE".into(), records.iter().map(|r| r.state_abbr.as_str()).collect::<Vec<_>>()),
        Column::new("CLINTON_COUNTY_VOTES".into(), records.iter().map(|r| r.clinton_votes as i64).collect::<Vec<_>>()),
        Column::new("TRUMP_COUNTY_VOTES".into(), records.iter().map(|r| r.trump_votes as i64).collect::<Vec<_>>()),
        Column::new("MATCH_ID".into(), records.iter().map(|r| r.match_key.as_str()).collect::<Vec<_>>()),
    ])?)
}

/// A cell that belongs to a candidate row rather than naming a county.
fn is_statistic(cell: &str) -> bool {
    let cell = cell.trim();
    cell.ends_with('%') || cell.replace(',', "").parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StatePage;

    struct Cells(Vec<&'static str>);

    impl CellFeed for Cells {
        fn name(&self) -> &'static str {
            "state votes"
        }
        fn cells(&self) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Pages(Vec<StatePage>);

    impl CountyPageFeed for Pages {
        fn name(&self) -> &'static str {
            "county votes"
        }
        fn pages(&self) -> Result<Vec<StatePage>> {
            Ok(self
                .0
                .iter()
                .map(|p| StatePage { state_abbr: p.state_abbr.clone(), cells: p.cells.clone() })
                .collect())
        }
    }

    fn page(abbr: &str, cells: &[&str]) -> StatePage {
        StatePage {
            state_abbr: abbr.to_string(),
            cells: cells.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn state_triplets_become_records_with_winners() {
        // One triplet per roster state; give DC a Clinton landslide by
        // feeding its abbreviation, which must canonicalize to the full name.
        let cells: Vec<String> = crate::common::STATES
            .iter()
            .flat_map(|s| {
                let name = if s.abbr == "DC" { "DC" } else { s.name };
                [name.to_string(), "1,000".to_string(), "2,000".to_string()]
            })
            .collect();
        struct Owned(Vec<String>);
        impl CellFeed for Owned {
            fn name(&self) -> &'static str {
                "state votes"
            }
            fn cells(&self) -> Result<Vec<String>> {
                Ok(self.0.clone())
            }
        }

        let records = extract_state_votes(&Owned(cells)).unwrap();
        assert_eq!(records.len(), 51);
        let dc = records.iter().find(|r| r.state == "District of Columbia").unwrap();
        assert_eq!(dc.clinton_votes, 1000);
        assert_eq!(dc.party, Party::Republican);
    }

    #[test]
    fn unknown_state_is_a_format_error() {
        let feed = Cells(vec!["Atlantis", "10", "20"]);
        let err = extract_state_votes(&feed).unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }

    #[test]
    fn county_walk_reads_blocks_in_any_candidate_order() {
        let feed = Pages(vec![page(
            "TX",
            &[
                "Harris Co.",
                "Hillary Clinton",
                "707,914",
                "54.2%",
                "Donald Trump",
                "545,955",
                "41.8%",
                "Travis Co.",
                "Donald Trump",
                "123",
                "27.4%",
                "Hillary Clinton",
                "306",
                "66.3%",
            ],
        )]);

        let records = extract_county_votes(&feed, &[]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].county, "Harris");
        assert_eq!(records[0].clinton_votes, 707_914);
        assert_eq!(records[0].trump_votes, 545_955);
        assert_eq!(records[0].match_key, "harristx");
        assert_eq!(records[1].county, "Travis");
        assert_eq!(records[1].clinton_votes, 306);
    }

    #[test]
    fn county_aliases_feed_the_key() {
        let feed = Pages(vec![page(
            "NV",
            &["Carson City", "Hillary Clinton", "100", "48.0%", "Donald Trump", "90", "43.0%"],
        )]);
        let records = extract_county_votes(&feed, &[]).unwrap();
        assert_eq!(records[0].county, "Carson");
        assert_eq!(records[0].match_key, "carsonnv");
    }

    #[test]
    fn positional_rename_applies_across_pages() {
        let feed = Pages(vec![
            page("VA", &["Fairfax", "Hillary Clinton", "10", "50.0%", "Donald Trump", "5", "25.0%"]),
            page("VA", &["Fairfax Co.", "Hillary Clinton", "20", "50.0%", "Donald Trump", "10", "25.0%"]),
        ]);
        let renames = [
            Rename { row: 0, expect: "Fairfax", set: "Fairfax City" },
            Rename { row: 1, expect: "Fairfax", set: "Fairfax County" },
        ];
        let records = extract_county_votes(&feed, &renames).unwrap();
        assert_eq!(records[0].match_key, "fairfaxcityva");
        assert_eq!(records[1].match_key, "fairfaxcountyva");
    }

    #[test]
    fn dangling_candidate_marker_is_a_format_error() {
        let feed = Pages(vec![page("TX", &["Harris Co.", "Hillary Clinton"])]);
        assert!(extract_county_votes(&feed, &[]).is_err());
    }
}
