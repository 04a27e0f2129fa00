#![doc = "County-level linkage of 2016 presidential votes and COVID-19 outcomes"]
pub mod common;
pub mod derive;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod overrides;
pub mod pipeline;
pub mod resolve;
pub mod source;
pub mod summary;
pub mod types;

#[doc(inline)]
pub use pipeline::{Config, Linked, RunReport, Sources, export, run};

#[doc(inline)]
pub use types::{FipsCode, Party, Region};

#[doc(inline)]
pub use error::LinkageError;

#[doc(inline)]
pub use overrides::OverrideSet;
