use thiserror::Error;

/// Failure classes that are worth distinguishing from generic io/parse noise.
/// Everything converts into `anyhow::Error` at the call sites.
#[derive(Debug, Error)]
pub enum LinkageError {
    /// An external source no longer matches the hard-coded extraction
    /// assumptions (table shape, index markers). Fatal for the run.
    #[error("source {src}: {expectation}")]
    SourceFormat {
        src: &'static str,
        expectation: String,
    },

    /// A key that must identify exactly one row identifies several.
    #[error("join key {key:?} matches {count} rows in {table} (expected exactly one)")]
    JoinCardinality {
        table: &'static str,
        key: String,
        count: usize,
    },

    /// A positional or keyed correction no longer matches the snapshot it was
    /// written against. Failing here beats silently patching the wrong row.
    #[error("stale override in {src} at {target}: expected {expected:?}, found {found:?}")]
    StaleOverride {
        src: &'static str,
        target: String,
        expected: String,
        found: String,
    },
}

impl LinkageError {
    pub fn source_format(source: &'static str, expectation: impl Into<String>) -> Self {
        Self::SourceFormat { src: source, expectation: expectation.into() }
    }
}
