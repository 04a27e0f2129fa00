//! Derived fields over the merged table: rates, categorical bins, and the
//! census region. Binning is closed-open with unbounded extreme buckets; a
//! value that fits nowhere (NaN from a zero denominator) gets the empty
//! sentinel instead of a panic.

use anyhow::Result;
use polars::prelude::*;

use crate::common;

/// Sentinel category for values no bin can hold.
pub const BIN_NONE: &str = "";

/// Infection-rate buckets (percent of population).
pub fn infection_bin(rate: f64) -> &'static str {
    if rate.is_nan() {
        return BIN_NONE;
    }
    match rate {
        r if r < 1.0 => "Less than 1",
        r if r < 2.0 => "1 to 2",
        r if r < 3.0 => "2 to 3",
        r if r < 4.0 => "3 to 4",
        r if r < 5.0 => "4 to 5",
        _ => "5 +",
    }
}

/// Population-density buckets (people per square km).
pub fn density_bin(density: f64) -> &'static str {
    if density.is_nan() {
        return BIN_NONE;
    }
    match density {
        d if d < 1.0 => "Less than 1",
        d if d < 20.0 => "1 to 20",
        d if d < 80.0 => "20 to 80",
        d if d < 250.0 => "80 to 250",
        d if d < 500.0 => "250 to 500",
        _ => "500 +",
    }
}

/// Vote-margin buckets over the Clinton-minus-Trump share difference.
pub fn vote_bin(margin: f64) -> &'static str {
    if margin.is_nan() {
        return BIN_NONE;
    }
    match margin {
        m if m < -0.66 => "-0.99 to -0.66",
        m if m < -0.33 => "-0.66 to -0.33",
        m if m < 0.0 => "-0.33 to 0",
        m if m < 0.33 => "0 to 0.33",
        m if m < 0.66 => "0.33 to 0.66",
        _ => "0.66 to 0.99",
    }
}

/// Death rate (deaths over cases, NaN when no cases) and infection rate
/// (cases per hundred residents).
pub fn with_rates(df: DataFrame) -> Result<DataFrame> {
    Ok(df
        .lazy()
        .with_columns([
            (col("DEATHS").cast(DataType::Float64) / col("CASES").cast(DataType::Float64))
                .alias("DEATH_RATE"),
            (col("CASES").cast(DataType::Float64) / col("POP_EST_2019").cast(DataType::Float64)
                * lit(100.0))
            .alias("INFECTION_RATE"),
        ])
        .collect()?)
}

/// The three categorical bin columns.
pub fn with_bins(mut df: DataFrame) -> Result<DataFrame> {
    let bin_column = |df: &DataFrame, source: &str, name: &str, f: fn(f64) -> &'static str| -> Result<Column> {
        Ok(Column::new(
            name.into(),
            df.column(source)?
                .f64()?
                .into_iter()
                .map(|opt| opt.map(f).unwrap_or(BIN_NONE))
                .collect::<Vec<_>>(),
        ))
    };

    let infection = bin_column(&df, "INFECTION_RATE", "INFECTION_BINS", infection_bin)?;
    let density = bin_column(&df, "POP_DENSITY", "DENSITY_BINS", density_bin)?;
    let vote = bin_column(&df, "COUNTY_PCT_DIFF", "VOTE_BINS", vote_bin)?;

    df.with_column(infection)?;
    df.with_column(density)?;
    df.with_column(vote)?;
    Ok(df)
}

/// Census region from the full state name; off-roster names get the
/// sentinel (they only appear in fixtures, since the roster join has already
/// narrowed real data to the 50 states plus DC).
pub fn with_region(mut df: DataFrame) -> Result<DataFrame> {
    let region = Column::new(
        "REGION".into(),
        df.column("STATE")?
            .str()?
            .into_iter()
            .map(|opt| {
                opt.and_then(common::region_of)
                    .map(|r| r.as_str())
                    .unwrap_or(BIN_NONE)
            })
            .collect::<Vec<_>>(),
    );
    df.with_column(region)?;
    Ok(df)
}
