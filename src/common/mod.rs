mod data;
#[cfg(feature = "download")]
mod download;
mod fs;
mod geog;

pub use data::*;
#[cfg(feature = "download")]
pub use download::*;
pub use fs::*;
pub use geog::*;
