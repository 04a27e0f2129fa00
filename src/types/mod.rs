mod fips;
mod records;

pub use fips::FipsCode;
pub use records::*;
