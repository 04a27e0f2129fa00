use std::path::Path;

use anyhow::Result;

use covote::common::{ensure_dir_exists, write_to_csv};
use covote::source::{
    CensusDensityFeed, FrameFeed, NytCaseFeed, UsdaPopulationFeed, ensure_boundary_files,
};

/// Fetch the four public feeds into the input directory. The two scraped
/// election pages and the registry come from the HTML collaborator as cell
/// dumps and are not fetched here.
pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::DownloadArgs) -> Result<()> {
    let out_dir = &args.output;
    ensure_dir_exists(out_dir)?;

    fetch_csv(&NytCaseFeed, &out_dir.join("cases.csv"), args.force)?;
    fetch_csv(&UsdaPopulationFeed, &out_dir.join("population.csv"), args.force)?;
    fetch_csv(&CensusDensityFeed, &out_dir.join("density.csv"), args.force)?;

    log::info!("[download] ensuring boundary shapefiles");
    ensure_boundary_files(out_dir)?;

    log::info!("[download] feeds ready in {}", out_dir.display());
    Ok(())
}

fn fetch_csv(feed: &dyn FrameFeed, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        log::info!("[download] {} already present, skipping", path.display());
        return Ok(());
    }
    log::info!("[download] fetching {}", feed.name());
    let mut frame = feed.frame()?;
    write_to_csv(&mut frame, path)?;
    Ok(())
}
