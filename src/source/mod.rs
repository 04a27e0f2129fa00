//! Collaborator seams for the six external datasets.
//!
//! The resolver never touches the network or probes the filesystem; each
//! source is injected as a capability that yields either a scraped cell
//! stream, a tabular frame, or shapefile records. File-backed
//! implementations cover cached runs and fixtures; the `download` feature
//! adds HTTP implementations for the public feeds.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::frame::DataFrame;
use shapefile::{Shape, dbase::Record};

use crate::common;
use crate::error::LinkageError;

#[cfg(feature = "download")]
mod http;
#[cfg(feature = "download")]
pub use http::*;

/// A scraped page reduced to its table cells, in document order.
pub trait CellFeed {
    fn name(&self) -> &'static str;
    fn cells(&self) -> Result<Vec<String>>;
}

/// One county-results page per state, keyed by postal abbreviation.
#[derive(Debug)]
pub struct StatePage {
    pub state_abbr: String,
    pub cells: Vec<String>,
}

/// The county vote scrape: one cell stream per state, in state-FIPS order.
/// Row-positional overrides depend on that order staying fixed.
pub trait CountyPageFeed {
    fn name(&self) -> &'static str;
    fn pages(&self) -> Result<Vec<StatePage>>;
}

/// A tabular feed already shaped like its upstream CSV.
pub trait FrameFeed {
    fn name(&self) -> &'static str;
    fn frame(&self) -> Result<DataFrame>;
}

/// County boundary shapes plus their attribute records.
pub trait ShapeFeed {
    fn name(&self) -> &'static str;
    fn shapes(&self) -> Result<Vec<(Shape, Record)>>;
}

/// Newline-delimited cell dump, as written by the HTML collaborator.
pub struct CellFile {
    name: &'static str,
    path: PathBuf,
}

impl CellFile {
    pub fn new(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self { name, path: path.into() }
    }
}

impl CellFeed for CellFile {
    fn name(&self) -> &'static str {
        self.name
    }

    fn cells(&self) -> Result<Vec<String>> {
        read_cell_lines(&self.path)
    }
}

/// Directory of `<ABBR>.cells` dumps, one per state page.
pub struct CountyPageDir {
    dir: PathBuf,
}

impl CountyPageDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CountyPageFeed for CountyPageDir {
    fn name(&self) -> &'static str {
        "county votes"
    }

    fn pages(&self) -> Result<Vec<StatePage>> {
        common::STATES
            .iter()
            .map(|state| {
                let path = self.dir.join(format!("{}.cells", state.abbr));
                let cells = read_cell_lines(&path).map_err(|_| {
                    LinkageError::source_format(
                        self.name(),
                        format!("missing page dump for {} ({})", state.abbr, path.display()),
                    )
                })?;
                Ok(StatePage { state_abbr: state.abbr.to_string(), cells })
            })
            .collect()
    }
}

/// CSV-backed tabular feed.
pub struct CsvFileFeed {
    name: &'static str,
    path: PathBuf,
}

impl CsvFileFeed {
    pub fn new(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self { name, path: path.into() }
    }
}

impl FrameFeed for CsvFileFeed {
    fn name(&self) -> &'static str {
        self.name
    }

    fn frame(&self) -> Result<DataFrame> {
        common::read_from_csv(&self.path)
    }
}

/// Local `.shp` + `.dbf` pair.
pub struct LocalShapefile {
    path: PathBuf,
}

impl LocalShapefile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ShapeFeed for LocalShapefile {
    fn name(&self) -> &'static str {
        "county boundaries"
    }

    fn shapes(&self) -> Result<Vec<(Shape, Record)>> {
        read_shapefile(&self.path)
    }
}

/// Reads all shapes + attribute records from a given `.shp` file path.
pub fn read_shapefile(path: &Path) -> Result<Vec<(Shape, Record)>> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("Error reading shape+record")?;
        items.push((shape, record));
    }
    Ok(items)
}

fn read_cell_lines(path: &Path) -> Result<Vec<String>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cell dump: {}", path.display()))?;
    Ok(body.lines().map(|line| line.trim_end_matches('\r').to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cell_file_preserves_order_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.cells");
        let mut f = fs::File::create(&path).unwrap();
        write!(f, "Autauga\n01001\nAL\n").unwrap();

        let feed = CellFile::new("registry", &path);
        assert_eq!(feed.cells().unwrap(), ["Autauga", "01001", "AL"]);
    }

    #[test]
    fn county_page_dir_requires_every_state() {
        let dir = tempfile::tempdir().unwrap();
        let feed = CountyPageDir::new(dir.path());
        let err = feed.pages().unwrap_err();
        assert!(err.to_string().contains("missing page dump"));
    }
}
