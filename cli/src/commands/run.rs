use anyhow::{Context, Result};
use chrono::NaiveDate;

use covote::pipeline::{self, Config, Sources};
use covote::source::{CellFile, CountyPageDir, CsvFileFeed, LocalShapefile};

/// Expected input directory layout:
///   state_votes.cells           cell dump of the state results table
///   county_votes/<ABBR>.cells   one cell dump per state results page
///   fips_registry.cells         cell dump of the registry table
///   cases.csv                   raw case feed (date,county,state,fips,...)
///   population.csv              FIPStxt / POP_ESTIMATE_2019
///   density.csv                 GEOID / B01001_calc_PopDensity
///   cb_2018_us_county_500k.*    boundary shapefile set
pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::RunArgs) -> Result<()> {
    let input = &args.input;
    let output = args.output.clone().unwrap_or_else(|| "out".into());

    let mut config = Config::default();
    if let Some(cutoff) = &args.cutoff {
        config.cutoff = NaiveDate::parse_from_str(cutoff, "%Y-%m-%d")
            .with_context(|| format!("invalid cutoff date: {cutoff:?}"))?;
    }

    let sources = Sources {
        state_votes: Box::new(CellFile::new("state votes", input.join("state_votes.cells"))),
        county_votes: Box::new(CountyPageDir::new(input.join("county_votes"))),
        registry: Box::new(CellFile::new("fips registry", input.join("fips_registry.cells"))),
        cases: Box::new(CsvFileFeed::new("case history", input.join("cases.csv"))),
        population: Box::new(CsvFileFeed::new("population", input.join("population.csv"))),
        density: Box::new(CsvFileFeed::new("density", input.join("density.csv"))),
        boundary: Box::new(LocalShapefile::new(input.join("cb_2018_us_county_500k.shp"))),
    };

    let linked = pipeline::run(&sources, &config)?;
    pipeline::export(&linked, &config, &output)?;

    log::info!(
        "[run] wrote {} county-date rows covering {} counties to {}",
        linked.report.final_rows,
        linked.report.final_counties,
        output.display()
    );

    Ok(())
}
