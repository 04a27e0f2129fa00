use anyhow::Result;
use polars::prelude::*;

use crate::extract::{fips_values, int_values};
use crate::source::FrameFeed;
use crate::types::PopulationRecord;

/// Keyed 2019 population estimates plus the count of unusable rows.
pub struct PopulationTable {
    pub frame: DataFrame,
    pub dropped: usize,
}

/// Shape the USDA estimates feed (`FIPStxt`, `POP_ESTIMATE_2019`) into the
/// canonical column set. State- and national-level rows ride along with
/// their own codes and fall out at the county join.
pub fn extract_population(feed: &dyn FrameFeed) -> Result<PopulationTable> {
    let source = feed.name();
    let raw = feed.frame()?;

    let fips = fips_values(&raw, "FIPStxt", source)?;
    let estimates = int_values(&raw, "POP_ESTIMATE_2019", source)?;

    let mut records: Vec<PopulationRecord> = Vec::new();
    let mut dropped = 0usize;

    for (code, estimate) in fips.into_iter().zip(estimates) {
        match (code, estimate) {
            (Some(fips), Some(estimate)) if estimate > 0 => {
                records.push(PopulationRecord { fips, population_2019: estimate as u64 });
            }
            _ => dropped += 1,
        }
    }

    Ok(PopulationTable { frame: population_frame(&records)?, dropped })
}

pub fn population_frame(records: &[PopulationRecord]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new("COUNTYFP".into(), records.iter().map(|r| r.fips.as_str()).collect::<Vec<_>>()),
        Column::new(
            "POP_EST_2019".into(),
            records.iter().map(|r| r.population_2019 as i64).collect::<Vec<_>>(),
        ),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frame(DataFrame);

    impl FrameFeed for Frame {
        fn name(&self) -> &'static str {
            "population"
        }
        fn frame(&self) -> Result<DataFrame> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn keys_and_positive_estimates_survive() {
        let raw = DataFrame::new(vec![
            Column::new("FIPStxt".into(), vec![Some("01001"), Some("46102"), None]),
            Column::new("POP_ESTIMATE_2019".into(), vec![Some(55_869i64), Some(0), Some(10)]),
        ])
        .unwrap();

        let table = extract_population(&Frame(raw)).unwrap();
        assert_eq!(table.frame.height(), 1);
        assert_eq!(table.dropped, 2);
        let pops: Vec<i64> =
            table.frame.column("POP_EST_2019").unwrap().i64().unwrap().into_no_null_iter().collect();
        assert_eq!(pops, [55_869]);
    }

    #[test]
    fn float_typed_feed_is_tolerated() {
        let raw = DataFrame::new(vec![
            Column::new("FIPStxt".into(), vec![1001.0f64]),
            Column::new("POP_ESTIMATE_2019".into(), vec![55_869.0f64]),
        ])
        .unwrap();

        let table = extract_population(&Frame(raw)).unwrap();
        let codes: Vec<&str> =
            table.frame.column("COUNTYFP").unwrap().str().unwrap().into_no_null_iter().collect();
        assert_eq!(codes, ["01001"]);
    }
}
