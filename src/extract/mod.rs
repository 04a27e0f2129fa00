//! Per-source extractors: each turns a collaborator feed into a typed,
//! keyed table ready for the resolver. Column handling is defensive about
//! how the CSV reader typed things (zero-padded codes arrive as strings,
//! bare integers, or floats depending on the feed).

mod boundary;
mod cases;
mod density;
mod election;
mod population;
mod registry;

pub use boundary::*;
pub use cases::*;
pub use density::*;
pub use election::*;
pub use population::*;
pub use registry::*;

use anyhow::Result;
use polars::prelude::*;

use crate::error::LinkageError;
use crate::types::FipsCode;

/// Parse a scraped vote count, tolerating thousands separators.
pub(crate) fn parse_count(cell: &str, source: &'static str) -> Result<u64> {
    cell.trim()
        .replace(',', "")
        .parse::<u64>()
        .map_err(|_| LinkageError::source_format(source, format!("expected a count, found {cell:?}")).into())
}

/// Read a FIPS column regardless of inferred dtype.
pub(crate) fn fips_values(
    df: &DataFrame,
    name: &str,
    source: &'static str,
) -> Result<Vec<Option<FipsCode>>> {
    let col = column(df, name, source)?;
    match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|opt| opt.map(FipsCode::new).transpose())
            .collect(),
        DataType::Int64 => col
            .i64()?
            .into_iter()
            .map(|opt| {
                opt.map(|v| {
                    u32::try_from(v)
                        .map_err(|_| anyhow::anyhow!("FIPS code out of range: {}", v))
                        .and_then(FipsCode::from_u32)
                })
                .transpose()
            })
            .collect(),
        DataType::Float64 => col
            .f64()?
            .into_iter()
            .map(|opt| opt.map(FipsCode::from_f64).transpose())
            .collect(),
        other => Err(LinkageError::source_format(
            source,
            format!("column {name:?} has unexpected type {other:?}"),
        )
        .into()),
    }
}

/// Read an integer-valued column that may have been inferred as float.
pub(crate) fn int_values(
    df: &DataFrame,
    name: &str,
    source: &'static str,
) -> Result<Vec<Option<i64>>> {
    let col = column(df, name, source)?;
    match col.dtype() {
        DataType::Int64 => Ok(col.i64()?.into_iter().collect()),
        DataType::Float64 => col
            .f64()?
            .into_iter()
            .map(|opt| {
                opt.map(|v| {
                    if v.is_finite() && v.fract() == 0.0 {
                        Ok(v as i64)
                    } else {
                        Err(LinkageError::source_format(
                            source,
                            format!("column {name:?} holds non-integral value {v}"),
                        )
                        .into())
                    }
                })
                .transpose()
            })
            .collect(),
        other => Err(LinkageError::source_format(
            source,
            format!("column {name:?} has unexpected type {other:?}"),
        )
        .into()),
    }
}

/// Read a string column as owned values.
pub(crate) fn str_values(
    df: &DataFrame,
    name: &str,
    source: &'static str,
) -> Result<Vec<Option<String>>> {
    let col = column(df, name, source)?;
    Ok(col
        .str()
        .map_err(|_| {
            LinkageError::source_format(source, format!("column {name:?} is not text"))
        })?
        .into_iter()
        .map(|opt| opt.map(str::to_string))
        .collect())
}

fn column<'a>(df: &'a DataFrame, name: &str, source: &'static str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| LinkageError::source_format(source, format!("missing column {name:?}")).into())
}
