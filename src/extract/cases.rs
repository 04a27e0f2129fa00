use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::LinkageError;
use crate::extract::{fips_values, int_values, str_values};
use crate::source::FrameFeed;
use crate::types::CaseRecord;

/// Case history plus the count of rows that could not be keyed (no FIPS: the
/// feed's "Unknown" counties and the New York City aggregate) or carried no
/// counts.
pub struct CaseTable {
    pub frame: DataFrame,
    pub dropped: usize,
}

/// Shape the raw case feed (`date,county,state,fips,cases,deaths`) into the
/// canonical column set, keeping only rows on or before `cutoff`.
pub fn extract_cases(feed: &dyn FrameFeed, cutoff: NaiveDate) -> Result<CaseTable> {
    let source = feed.name();
    let raw = feed.frame()?;

    let dates = str_values(&raw, "date", source)?;
    let counties = str_values(&raw, "county", source)?;
    let states = str_values(&raw, "state", source)?;
    let fips = fips_values(&raw, "fips", source)?;
    let cases = int_values(&raw, "cases", source)?;
    let deaths = int_values(&raw, "deaths", source)?;

    let mut records: Vec<CaseRecord> = Vec::new();
    let mut dropped = 0usize;

    for i in 0..raw.height() {
        let date_text = dates[i]
            .as_deref()
            .ok_or_else(|| LinkageError::source_format(source, format!("row {i} has no date")))?;
        let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|_| {
            LinkageError::source_format(source, format!("unparseable date {date_text:?}"))
        })?;
        if date > cutoff {
            continue;
        }
        let (Some(code), Some(cases_n), Some(deaths_n)) = (&fips[i], cases[i], deaths[i]) else {
            dropped += 1;
            continue;
        };
        if cases_n < 0 || deaths_n < 0 {
            dropped += 1;
            continue;
        }
        records.push(CaseRecord {
            date,
            county: counties[i].clone().unwrap_or_default(),
            state: states[i].clone().unwrap_or_default(),
            fips: code.clone(),
            cases: cases_n as u64,
            deaths: deaths_n as u64,
        });
    }

    Ok(CaseTable { frame: case_frame(&records)?, dropped })
}

pub fn case_frame(records: &[CaseRecord]) -> Result<DataFrame> {
    Ok(DataFrame::new(vec![
        Column::new(
            "DATE".into(),
            records.iter().map(|r| r.date.format("%Y-%m-%d").to_string()).collect::<Vec<_>>(),
        ),
        Column::new("COUNTY".into(), records.iter().map(|r| r.county.as_str()).collect::<Vec<_>>()),
        Column::new("STATE".into(), records.iter().map(|r| r.state.as_str()).collect::<Vec<_>>()),
        Column::new("COUNTYFP".into(), records.iter().map(|r| r.fips.as_str()).collect::<Vec<_>>()),
        Column::new("CASES".into(), records.iter().map(|r| r.cases as i64).collect::<Vec<_>>()),
        Column::new("DEATHS".into(), records.iter().map(|r| r.deaths as i64).collect::<Vec<_>>()),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frame(DataFrame);

    impl FrameFeed for Frame {
        fn name(&self) -> &'static str {
            "case history"
        }
        fn frame(&self) -> Result<DataFrame> {
            Ok(self.0.clone())
        }
    }

    fn cutoff() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 12, 1).unwrap()
    }

    #[test]
    fn keeps_keyed_rows_up_to_the_cutoff() {
        let raw = DataFrame::new(vec![
            Column::new("date".into(), vec!["2020-11-30", "2020-12-01", "2020-12-02"]),
            Column::new("county".into(), vec!["Autauga", "Autauga", "Autauga"]),
            Column::new("state".into(), vec!["Alabama"; 3]),
            Column::new("fips".into(), vec![1001i64, 1001, 1001]),
            Column::new("cases".into(), vec![10i64, 12, 15]),
            Column::new("deaths".into(), vec![1i64, 1, 2]),
        ])
        .unwrap();

        let table = extract_cases(&Frame(raw), cutoff()).unwrap();
        assert_eq!(table.frame.height(), 2);
        assert_eq!(table.dropped, 0);
        let codes: Vec<&str> =
            table.frame.column("COUNTYFP").unwrap().str().unwrap().into_no_null_iter().collect();
        // Leading zero restored from the integer-typed feed.
        assert_eq!(codes, ["01001", "01001"]);
    }

    #[test]
    fn unkeyed_rows_are_dropped_and_counted() {
        let raw = DataFrame::new(vec![
            Column::new("date".into(), vec!["2020-11-30", "2020-11-30"]),
            Column::new("county".into(), vec!["Unknown", "New York City"]),
            Column::new("state".into(), vec!["Rhode Island", "New York"]),
            Column::new("fips".into(), vec![None::<i64>, None]),
            Column::new("cases".into(), vec![5i64, 100]),
            Column::new("deaths".into(), vec![0i64, 10]),
        ])
        .unwrap();

        let table = extract_cases(&Frame(raw), cutoff()).unwrap();
        assert_eq!(table.frame.height(), 0);
        assert_eq!(table.dropped, 2);
    }

    #[test]
    fn bad_dates_are_fatal() {
        let raw = DataFrame::new(vec![
            Column::new("date".into(), vec!["11/30/2020"]),
            Column::new("county".into(), vec!["Autauga"]),
            Column::new("state".into(), vec!["Alabama"]),
            Column::new("fips".into(), vec![1001i64]),
            Column::new("cases".into(), vec![10i64]),
            Column::new("deaths".into(), vec![1i64]),
        ])
        .unwrap();

        assert!(extract_cases(&Frame(raw), cutoff()).is_err());
    }
}
