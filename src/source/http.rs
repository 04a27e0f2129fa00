//! HTTP implementations of the public feeds (`download` feature).

use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xls};
use polars::frame::DataFrame;
use polars::io::SerReader;
use polars::prelude::{Column, CsvReader};
use shapefile::{Shape, dbase::Record};

use crate::common::{download_big_file, ensure_dir_exists, extract_zip, fetch_bytes, fetch_text};
use crate::error::LinkageError;
use crate::source::{FrameFeed, LocalShapefile, ShapeFeed};

const CASES_URL: &str =
    "https://raw.githubusercontent.com/nytimes/covid-19-data/master/us-counties.csv";
const POPULATION_URL: &str =
    "https://www.ers.usda.gov/webdocs/DataFiles/48747/PopulationEstimates.xls?v=6825.4";
const DENSITY_URL: &str =
    "https://opendata.arcgis.com/datasets/21843f238cbb46b08615fc53e19e0daf_1.geojson";
const BOUNDARY_URL: &str =
    "https://www2.census.gov/geo/tiger/GENZ2018/shp/cb_2018_us_county_500k.zip";

const BOUNDARY_STEM: &str = "cb_2018_us_county_500k";

/// Daily county case counts from the NYT repository.
pub struct NytCaseFeed;

impl FrameFeed for NytCaseFeed {
    fn name(&self) -> &'static str {
        "case history"
    }

    fn frame(&self) -> Result<DataFrame> {
        let body = fetch_text(CASES_URL)?;
        let df = CsvReader::new(Cursor::new(body.into_bytes()))
            .finish()
            .context("parse case-history CSV")?;
        Ok(df)
    }
}

/// 2019 county population estimates from the USDA spreadsheet.
pub struct UsdaPopulationFeed;

impl FrameFeed for UsdaPopulationFeed {
    fn name(&self) -> &'static str {
        "population"
    }

    fn frame(&self) -> Result<DataFrame> {
        let bytes = fetch_bytes(POPULATION_URL)?;
        population_frame_from_xls(&bytes, self.name())
    }
}

/// Parse the USDA workbook: locate the header row by its column labels, then
/// pull the FIPS and 2019-estimate columns.
fn population_frame_from_xls(bytes: &[u8], source: &'static str) -> Result<DataFrame> {
    let mut workbook =
        Xls::new(Cursor::new(bytes.to_vec())).context("open population workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LinkageError::source_format(source, "workbook has no sheets"))?
        .context("read population sheet")?;

    let rows: Vec<&[Data]> = range.rows().collect();
    let header = rows
        .iter()
        .position(|row| row.iter().any(|cell| matches!(cell, Data::String(s) if s == "FIPStxt")))
        .ok_or_else(|| LinkageError::source_format(source, "header row with FIPStxt not found"))?;

    let col_of = |label: &str| {
        rows[header]
            .iter()
            .position(|cell| matches!(cell, Data::String(s) if s == label))
            .ok_or_else(|| LinkageError::source_format(source, format!("column {label:?} not found")))
    };
    let fips_col = col_of("FIPStxt")?;
    let pop_col = col_of("POP_ESTIMATE_2019")?;

    let mut fips = Vec::new();
    let mut pop = Vec::new();
    for row in &rows[header + 1..] {
        let code = match row.get(fips_col) {
            Some(Data::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Data::Float(f)) => format!("{:.0}", f),
            Some(Data::Int(i)) => i.to_string(),
            _ => continue,
        };
        let estimate = match row.get(pop_col) {
            Some(Data::Float(f)) => *f,
            Some(Data::Int(i)) => *i as f64,
            // Some vintages format the estimates as text with separators.
            Some(Data::String(s)) => match s.replace(',', "").trim().parse::<f64>() {
                Ok(v) => v,
                Err(_) => continue,
            },
            _ => continue,
        };
        fips.push(code);
        pop.push(estimate);
    }

    Ok(DataFrame::new(vec![
        Column::new("FIPStxt".into(), fips),
        Column::new("POP_ESTIMATE_2019".into(), pop),
    ])?)
}

/// County population density from the Census ACS GeoJSON feed.
pub struct CensusDensityFeed;

impl FrameFeed for CensusDensityFeed {
    fn name(&self) -> &'static str {
        "density"
    }

    fn frame(&self) -> Result<DataFrame> {
        let body = fetch_text(DENSITY_URL)?;
        density_frame_from_geojson(&body, self.name())
    }
}

fn density_frame_from_geojson(body: &str, source: &'static str) -> Result<DataFrame> {
    let root: serde_json::Value = serde_json::from_str(body).context("parse density GeoJSON")?;
    let features = root["features"]
        .as_array()
        .ok_or_else(|| LinkageError::source_format(source, "GeoJSON has no features array"))?;

    let mut geoid = Vec::with_capacity(features.len());
    let mut density = Vec::with_capacity(features.len());
    for feature in features {
        let props = &feature["properties"];
        let id = props["GEOID"]
            .as_str()
            .map(str::to_string)
            .or_else(|| props["GEOID"].as_f64().map(|v| format!("{v:.0}")))
            .ok_or_else(|| LinkageError::source_format(source, "feature without GEOID"))?;
        geoid.push(id);
        density.push(props["B01001_calc_PopDensity"].as_f64());
    }

    Ok(DataFrame::new(vec![
        Column::new("GEOID".into(), geoid),
        Column::new("B01001_calc_PopDensity".into(), density),
    ])?)
}

/// Cartographic county boundaries, fetched once into a cache directory and
/// read from there afterwards.
pub struct CensusBoundarySource {
    cache_dir: PathBuf,
}

impl CensusBoundarySource {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self { cache_dir: cache_dir.into() }
    }
}

impl ShapeFeed for CensusBoundarySource {
    fn name(&self) -> &'static str {
        "county boundaries"
    }

    fn shapes(&self) -> Result<Vec<(Shape, Record)>> {
        let shp = ensure_boundary_files(&self.cache_dir)?;
        LocalShapefile::new(shp).shapes()
    }
}

/// Make sure the boundary shapefile set exists under `dir`, downloading and
/// extracting the Census zip when any piece is missing. Returns the `.shp`
/// path.
pub fn ensure_boundary_files(dir: &Path) -> Result<PathBuf> {
    ensure_dir_exists(dir)?;

    let required = ["shp", "shx", "dbf", "prj"];
    let have_all = required
        .iter()
        .all(|ext| dir.join(format!("{BOUNDARY_STEM}.{ext}")).exists());

    if !have_all {
        let zip_path = dir.join(format!("{BOUNDARY_STEM}.zip"));
        log::info!("[download] {} -> {}", BOUNDARY_URL, zip_path.display());
        download_big_file(BOUNDARY_URL, &zip_path, true)?;
        extract_zip(&zip_path, dir, true)?;
    }

    Ok(dir.join(format!("{BOUNDARY_STEM}.shp")))
}
