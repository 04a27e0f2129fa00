use anyhow::Result;
use polars::prelude::*;

use crate::error::LinkageError;
use crate::extract::fips_values;
use crate::source::FrameFeed;
use crate::types::DensityRecord;

/// Keyed population density plus the count of unusable rows.
pub struct DensityTable {
    pub frame: DataFrame,
    pub dropped: usize,
}

/// Shape the ACS density feed (`GEOID`, `B01001_calc_PopDensity`) into the
/// canonical column set; rows without a usable density are dropped and
/// counted.
pub fn extract_density(feed: &dyn FrameFeed) -> Result<DensityTable> {
    let source = feed.name();
    let raw = feed.frame()?;

    let fips = fips_values(&raw, "GEOID", source)?;
    let densities: Vec<Option<f64>> = raw
        .column("B01001_calc_PopDensity")
        .map_err(|_| {
            LinkageError::source_format(source, "missing column \"B01001_calc_PopDensity\"")
        })?
        .f64()?
        .into_iter()
        .collect();

    let mut records: Vec<DensityRecord> = Vec::new();
    let mut dropped = 0usize;

    for (code, density) in fips.into_iter().zip(densities) {
        match (code, density) {
            (Some(fips), Some(density)) if density >= 0.0 => {
                records.push(DensityRecord { fips, density });
            }
            _ => dropped += 1,
        }
    }

    Ok(DensityTable { frame: density_frame(&records)?, dropped })
}

pub fn density_frame(records: &[DensityRecord]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("COUNTYFP".into(), records.iter().map(|r| r.fips.as_str()).collect::<Vec<_>>()),
        Column::new("POP_DENSITY".into(), records.iter().map(|r| r.density).collect::<Vec<_>>()),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frame(DataFrame);

    impl FrameFeed for Frame {
        fn name(&self) -> &'static str {
            "density"
        }
        fn frame(&self) -> Result<DataFrame> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn null_densities_are_dropped_and_counted() {
        let raw = DataFrame::new(vec![
            Column::new("GEOID".into(), vec!["01001", "46102"]),
            Column::new("B01001_calc_PopDensity".into(), vec![Some(36.5f64), None]),
        ])
        .unwrap();

        let table = extract_density(&Frame(raw)).unwrap();
        assert_eq!(table.frame.height(), 1);
        assert_eq!(table.dropped, 1);
    }
}
