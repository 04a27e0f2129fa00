//! The entity resolver: sequential inner joins that funnel six sources into
//! one FIPS-keyed table. The policy is complete-case analysis — a county
//! missing from any source falls out of the final table — so every join
//! counts what it dropped and the counts travel with the output.

use std::collections::HashMap;

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use crate::error::LinkageError;
use crate::normalize::match_key;
use crate::overrides::{self, FipsFix, SyntheticCounty};

/// What one inner join did to the row stream.
#[derive(Debug, Clone, Serialize)]
pub struct JoinReport {
    pub stage: &'static str,
    pub left_rows: usize,
    pub right_rows: usize,
    pub out_rows: usize,
    pub dropped_rows: usize,
}

/// Per-join accounting for the whole resolution pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub joins: Vec<JoinReport>,
}

/// The six extracted tables, already keyed and override-corrected upstream.
pub struct SourceTables {
    pub state_votes: DataFrame,
    pub county_votes: DataFrame,
    pub registry: DataFrame,
    pub cases: DataFrame,
    pub population: DataFrame,
    pub density: DataFrame,
    pub boundary: DataFrame,
}

/// Join everything down to one row per county per reporting date.
///
/// `fixes` and `missing` are the post-merge override sets; pass empty slices
/// for clean fixtures.
pub fn resolve(
    tables: &SourceTables,
    fixes: &[FipsFix],
    missing: &[SyntheticCounty],
) -> Result<(DataFrame, MergeReport)> {
    let mut report = MergeReport::default();

    // Name-keyed stage: votes to registry, then the corrections that need
    // the merged view, then the margin projection.
    let county_fips = merge_county_registry(tables, fixes, missing, &mut report)?;
    let margins = vote_margins(&county_fips)?;

    // FIPS-keyed stage: the case history fans out state attributes to every
    // county-date row, then each county attribute narrows the set.
    ensure_unique_key(&tables.state_votes, "STATE", "state votes")?;
    ensure_unique_key(&tables.population, "COUNTYFP", "population")?;
    ensure_unique_key(&tables.density, "COUNTYFP", "density")?;
    ensure_unique_key(&margins, "COUNTYFP", "vote margins")?;
    ensure_unique_key(&tables.boundary, "COUNTYFP", "boundaries")?;

    let merged = join_inner(&tables.cases, &tables.state_votes, "STATE", "cases + state votes", &mut report)?;
    let merged = join_inner(&merged, &tables.population, "COUNTYFP", "+ population", &mut report)?;
    let merged = join_inner(&merged, &tables.density, "COUNTYFP", "+ density", &mut report)?;
    let merged = join_inner(&merged, &margins, "COUNTYFP", "+ vote margins", &mut report)?;
    let merged = join_inner(&merged, &tables.boundary, "COUNTYFP", "+ boundaries", &mut report)?;

    // State vote totals have served their purpose (the winner rode along).
    let merged = merged.drop_many(["CLINTON_VOTES", "TRUMP_VOTES"]);

    Ok((merged, report))
}

/// Vote table to registry on the normalized name key, plus the corrections
/// that only make sense on the merged view: the scrape's statewide "Alaska"
/// artifact row, the keyed FIPS fixes, and the synthetic missing counties.
fn merge_county_registry(
    tables: &SourceTables,
    fixes: &[FipsFix],
    missing: &[SyntheticCounty],
    report: &mut MergeReport,
) -> Result<DataFrame> {
    ensure_unique_key(&tables.county_votes, "MATCH_ID", "county votes")?;
    ensure_unique_key(&tables.registry, "MATCH_ID", "registry")?;

    let mut merged = join_inner(
        &tables.county_votes,
        &tables.registry,
        "MATCH_ID",
        "county votes + registry",
        report,
    )?;

    merged = drop_scrape_artifacts(&merged)?;
    overrides::apply_fips_fixes(&mut merged, fixes, "vote/registry merge")?;

    if !missing.is_empty() {
        merged.vstack_mut(&synthetic_rows(missing)?)?;
    }

    Ok(merged)
}

/// Clinton-minus-Trump vote share per county, projected down to the key.
fn vote_margins(county_fips: &DataFrame) -> Result<DataFrame> {
    let total = col("CLINTON_COUNTY_VOTES") + col("TRUMP_COUNTY_VOTES");
    Ok(county_fips
        .clone()
        .lazy()
        .with_columns([
            (col("CLINTON_COUNTY_VOTES").cast(DataType::Float64)
                / total.clone().cast(DataType::Float64))
            .alias("CLINTON_COUNTY_PCT"),
            (col("TRUMP_COUNTY_VOTES").cast(DataType::Float64)
                / total.cast(DataType::Float64))
            .alias("TRUMP_COUNTY_PCT"),
        ])
        .with_columns([(col("CLINTON_COUNTY_PCT") - col("TRUMP_COUNTY_PCT")).alias("COUNTY_PCT_DIFF")])
        .select([col("FIPS").alias("COUNTYFP"), col("COUNTY_PCT_DIFF")])
        .collect()?)
}

/// The Alaska results page reports statewide totals as a single pseudo-county
/// named "Alaska"; no borough-level row backs it. The row is dropped
/// literally rather than by a name-equals-state rule, because DC's one real
/// county is also named exactly like its state and must stay.
fn drop_scrape_artifacts(merged: &DataFrame) -> Result<DataFrame> {
    let counties = merged.column("COUNTY")?.str()?;
    let states = merged.column("STATE")?.str()?;

    let mask: BooleanChunked = counties
        .into_iter()
        .zip(states)
        .map(|(county, abbr)| Some(!(county == Some("Alaska") && abbr == Some("AK"))))
        .collect();

    Ok(merged.filter(&mask)?)
}

/// Hand-verified rows for counties the registry is missing, shaped like the
/// vote/registry merge output.
fn synthetic_rows(missing: &[SyntheticCounty]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("COUNTY".into(), missing.iter().map(|c| c.county).collect::<Vec<_>>()),
        Column::new("STATE".into(), missing.iter().map(|c| c.state_abbr).collect::<Vec<_>>()),
        Column::new(
            "CLINTON_COUNTY_VOTES".into(),
            missing.iter().map(|c| c.clinton_votes as i64).collect::<Vec<_>>(),
        ),
        Column::new(
            "TRUMP_COUNTY_VOTES".into(),
            missing.iter().map(|c| c.trump_votes as i64).collect::<Vec<_>>(),
        ),
        Column::new(
            "MATCH_ID".into(),
            missing.iter().map(|c| match_key(c.county, c.state_abbr)).collect::<Vec<_>>(),
        ),
        Column::new("FIPS".into(), missing.iter().map(|c| c.fips).collect::<Vec<_>>()),
    ])?)
}

/// Inner join with unique right key, logging and recording what fell out.
fn join_inner(
    left: &DataFrame,
    right: &DataFrame,
    on: &str,
    stage: &'static str,
    report: &mut MergeReport,
) -> Result<DataFrame> {
    let out = left.inner_join(right, [on], [on])?;
    let dropped_rows = left.height() - out.height();
    if dropped_rows > 0 {
        log::warn!("[resolve] {stage}: dropped {dropped_rows} of {} rows", left.height());
    }
    report.joins.push(JoinReport {
        stage,
        left_rows: left.height(),
        right_rows: right.height(),
        out_rows: out.height(),
        dropped_rows,
    });
    Ok(out)
}

/// A key column that must identify rows 1:1; duplicates are a correctness
/// failure of the source, not something a join should paper over.
fn ensure_unique_key(df: &DataFrame, key: &str, table: &'static str) -> Result<()> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(df.height());
    for value in df.column(key)?.str()?.into_no_null_iter() {
        *seen.entry(value).or_default() += 1;
    }
    if let Some((value, count)) = seen.into_iter().find(|(_, count)| *count > 1) {
        return Err(LinkageError::JoinCardinality {
            table,
            key: value.to_string(),
            count,
        }
        .into());
    }
    Ok(())
}
