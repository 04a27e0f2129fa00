//! Downstream framing: the tidy tables the plotting and regression
//! collaborators consume. Nothing here renders or estimates anything.

use anyhow::Result;
use chrono::NaiveDate;
use polars::prelude::*;

/// Total and first-differenced daily cases per value of `group` (the party
/// column or the region column). Output columns: DATE, the group column,
/// CASES, NEW_CASES; the first day of each group has no difference.
pub fn daily_new_cases(df: &DataFrame, group: &str) -> Result<DataFrame> {
    let totals = df
        .clone()
        .lazy()
        .group_by([col("DATE"), col(group)])
        .agg([col("CASES").sum().alias("CASES")])
        .sort([group, "DATE"], SortMultipleOptions::default())
        .collect()?;

    let mut labels: Vec<String> = Vec::new();
    for label in totals.column(group)?.str()?.into_no_null_iter() {
        if labels.last().map(String::as_str) != Some(label) {
            labels.push(label.to_string());
        }
    }

    let mut parts: Vec<DataFrame> = Vec::with_capacity(labels.len());
    for label in labels {
        let mut sub = totals
            .clone()
            .lazy()
            .filter(col(group).eq(lit(label)))
            .sort(["DATE"], SortMultipleOptions::default())
            .collect()?;

        let cases: Vec<i64> = sub.column("CASES")?.i64()?.into_no_null_iter().collect();
        let new_cases: Vec<Option<i64>> = std::iter::once(None)
            .chain(cases.windows(2).map(|pair| Some(pair[1] - pair[0])))
            .collect();
        sub.with_column(Column::new("NEW_CASES".into(), new_cases))?;
        parts.push(sub);
    }

    let mut out = parts
        .first()
        .cloned()
        .unwrap_or_else(|| totals.clear());
    for part in parts.iter().skip(1) {
        out.vstack_mut(part)?;
    }
    Ok(out)
}

/// The regression input: one row per county at the cutoff date, with the
/// binary party indicator the downstream formulas reference.
pub fn regression_frame(df: &DataFrame, cutoff: NaiveDate) -> Result<DataFrame> {
    let cutoff = cutoff.format("%Y-%m-%d").to_string();
    Ok(df
        .clone()
        .lazy()
        .filter(col("DATE").eq(lit(cutoff)))
        .with_columns([when(col("COUNTY_PCT_DIFF").gt(lit(0.0)))
            .then(lit(1i64))
            .otherwise(lit(0i64))
            .cast(DataType::Int64)
            .alias("BINARY_PARTY_ID")])
        .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_merged() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "DATE".into(),
                vec!["2020-11-29", "2020-11-29", "2020-11-30", "2020-11-30"],
            ),
            Column::new(
                "PARTY_ID".into(),
                vec!["Democratic", "Republican", "Democratic", "Republican"],
            ),
            Column::new("CASES".into(), vec![10i64, 5, 25, 9]),
            Column::new("COUNTY_PCT_DIFF".into(), vec![0.2f64, -0.4, 0.2, -0.4]),
        ])
        .unwrap()
    }

    #[test]
    fn new_cases_are_first_differences_within_each_group() {
        let out = daily_new_cases(&make_merged(), "PARTY_ID").unwrap();
        assert_eq!(out.height(), 4);

        let parties: Vec<&str> =
            out.column("PARTY_ID").unwrap().str().unwrap().into_no_null_iter().collect();
        let new_cases: Vec<Option<i64>> =
            out.column("NEW_CASES").unwrap().i64().unwrap().into_iter().collect();

        // Sorted by group then date: Democratic first day has no diff, the
        // second day grew by 15; Republican grew by 4.
        assert_eq!(parties, ["Democratic", "Democratic", "Republican", "Republican"]);
        assert_eq!(new_cases, [None, Some(15), None, Some(4)]);
    }

    #[test]
    fn regression_frame_is_the_cutoff_slice_with_the_indicator() {
        let cutoff = NaiveDate::from_ymd_opt(2020, 11, 30).unwrap();
        let out = regression_frame(&make_merged(), cutoff).unwrap();
        assert_eq!(out.height(), 2);
        let flags: Vec<i64> =
            out.column("BINARY_PARTY_ID").unwrap().i64().unwrap().into_no_null_iter().collect();
        assert_eq!(flags, [1, 0]);
    }
}
