//! Stage orchestration: extract each source once, resolve, derive, and
//! optionally export the materialized tables plus a JSON run report. Any
//! failure aborts before anything is written.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use geo::MultiPolygon;
use polars::frame::DataFrame;
use serde::Serialize;

use crate::common;
use crate::derive;
use crate::extract;
use crate::overrides::OverrideSet;
use crate::resolve::{self, JoinReport, SourceTables};
use crate::source::{CellFeed, CountyPageFeed, FrameFeed, ShapeFeed};
use crate::summary;
use crate::types::FipsCode;

/// The injected collaborators, one per external dataset.
pub struct Sources {
    pub state_votes: Box<dyn CellFeed>,
    pub county_votes: Box<dyn CountyPageFeed>,
    pub registry: Box<dyn CellFeed>,
    pub cases: Box<dyn FrameFeed>,
    pub population: Box<dyn FrameFeed>,
    pub density: Box<dyn FrameFeed>,
    pub boundary: Box<dyn ShapeFeed>,
}

pub struct Config {
    /// Last reporting date carried into the linked table.
    pub cutoff: NaiveDate,
    /// Correction set for the source snapshots in play.
    pub overrides: OverrideSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cutoff: NaiveDate::from_ymd_opt(2020, 12, 1).expect("valid date"),
            overrides: OverrideSet::reference(),
        }
    }
}

/// Rows kept and rows discarded while shaping one source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: &'static str,
    pub rows: usize,
    pub dropped_rows: usize,
}

/// Everything auditable about one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub cutoff: String,
    pub sources: Vec<SourceReport>,
    pub joins: Vec<JoinReport>,
    pub final_rows: usize,
    pub final_counties: usize,
}

/// The resolved output: the canonical table, the geometry side table, the
/// materialized source tables, and the run report.
pub struct Linked {
    pub table: DataFrame,
    pub boundaries: HashMap<FipsCode, MultiPolygon<f64>>,
    pub sources: SourceTables,
    pub report: RunReport,
}

/// Run the full linkage once, in memory.
pub fn run(sources: &Sources, config: &Config) -> Result<Linked> {
    let mut source_reports = Vec::new();

    log::info!("[pipeline] extracting state votes");
    let state_records = extract::extract_state_votes(sources.state_votes.as_ref())?;
    let state_votes = extract::state_votes_frame(&state_records)?;
    source_reports.push(SourceReport {
        source: "state votes",
        rows: state_records.len(),
        dropped_rows: 0,
    });

    log::info!("[pipeline] extracting county votes");
    let county_records =
        extract::extract_county_votes(sources.county_votes.as_ref(), config.overrides.vote_renames)?;
    let county_votes = extract::county_votes_frame(&county_records)?;
    source_reports.push(SourceReport {
        source: "county votes",
        rows: county_records.len(),
        dropped_rows: 0,
    });

    log::info!("[pipeline] extracting FIPS registry");
    let registry_records =
        extract::extract_registry(sources.registry.as_ref(), config.overrides.registry_renames)?;
    let registry = extract::registry_frame(&registry_records)?;
    source_reports.push(SourceReport {
        source: "fips registry",
        rows: registry_records.len(),
        dropped_rows: 0,
    });

    log::info!("[pipeline] extracting case history");
    let cases = extract::extract_cases(sources.cases.as_ref(), config.cutoff)?;
    source_reports.push(SourceReport {
        source: "case history",
        rows: cases.frame.height(),
        dropped_rows: cases.dropped,
    });

    log::info!("[pipeline] extracting population");
    let population = extract::extract_population(sources.population.as_ref())?;
    source_reports.push(SourceReport {
        source: "population",
        rows: population.frame.height(),
        dropped_rows: population.dropped,
    });

    log::info!("[pipeline] extracting density");
    let density = extract::extract_density(sources.density.as_ref())?;
    source_reports.push(SourceReport {
        source: "density",
        rows: density.frame.height(),
        dropped_rows: density.dropped,
    });

    log::info!("[pipeline] extracting boundaries");
    let boundary = extract::extract_boundaries(sources.boundary.as_ref())?;
    source_reports.push(SourceReport {
        source: "county boundaries",
        rows: boundary.frame.height(),
        dropped_rows: 0,
    });

    let tables = SourceTables {
        state_votes,
        county_votes,
        registry,
        cases: cases.frame,
        population: population.frame,
        density: density.frame,
        boundary: boundary.frame,
    };

    log::info!("[pipeline] resolving counties across sources");
    let (merged, merge_report) =
        resolve::resolve(&tables, config.overrides.fips_fixes, config.overrides.missing_counties)?;

    log::info!("[pipeline] computing derived fields");
    let table = derive::with_region(derive::with_bins(derive::with_rates(merged)?)?)?;

    let report = RunReport {
        cutoff: config.cutoff.format("%Y-%m-%d").to_string(),
        sources: source_reports,
        joins: merge_report.joins,
        final_rows: table.height(),
        final_counties: count_counties(&table)?,
    };
    log::info!(
        "[pipeline] linked {} counties across {} county-date rows",
        report.final_counties,
        report.final_rows
    );

    Ok(Linked { table, boundaries: boundary.geoms, sources: tables, report })
}

/// Bookkeeping columns stripped from the final CSV; they exist for the
/// choropleth collaborator, which takes the in-memory table.
const EXPORT_DROP: [&str; 8] =
    ["NAME", "LSAD", "ALAND", "AWATER", "INFECTION_BINS", "DENSITY_BINS", "VOTE_BINS", "REGION"];

/// Write every materialized table, the summary frames, and the run report
/// under `out_dir`.
pub fn export(linked: &Linked, config: &Config, out_dir: &Path) -> Result<()> {
    common::ensure_dir_exists(out_dir)?;

    let write = |name: &str, df: &DataFrame| -> Result<()> {
        common::write_to_csv(&mut df.clone(), &out_dir.join(name))
    };

    write("votes_by_state_2016.csv", &linked.sources.state_votes)?;
    write("votes_by_county_2016.csv", &linked.sources.county_votes)?;
    write("fips_codes.csv", &linked.sources.registry)?;
    write("daily_cases.csv", &linked.sources.cases)?;
    write("population_2019.csv", &linked.sources.population)?;
    write("density.csv", &linked.sources.density)?;

    write("county_linked.csv", &linked.table.drop_many(EXPORT_DROP))?;

    write("new_cases_by_party.csv", &summary::daily_new_cases(&linked.table, "PARTY_ID")?)?;
    write("new_cases_by_region.csv", &summary::daily_new_cases(&linked.table, "REGION")?)?;
    write("regression_input.csv", &summary::regression_frame(&linked.table, config.cutoff)?)?;

    let report = serde_json::to_string_pretty(&linked.report)?;
    std::fs::write(out_dir.join("run_report.json"), report)?;

    Ok(())
}

fn count_counties(table: &DataFrame) -> Result<usize> {
    let codes: HashSet<&str> = table.column("COUNTYFP")?.str()?.into_no_null_iter().collect();
    Ok(codes.len())
}
