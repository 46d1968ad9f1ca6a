//! Which source records a run processes

use clap::ValueEnum;
use omeka_dsp_core::SourceRecord;
use rand::Rng;

/// Identifiers synchronised by `--mode test` unless others are given.
pub const DEFAULT_TEST_IDENTIFIERS: [&str; 2] = ["abb13025", "abb14375"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Every record of the item set
    #[default]
    All,
    /// A random sample of records
    Sample,
    /// Records with the given identifiers
    Test,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::All => write!(f, "all"),
            Mode::Sample => write!(f, "sample"),
            Mode::Test => write!(f, "test"),
        }
    }
}

/// Pick `size` records at random, keeping their listing order.
pub fn sample<R: Rng + ?Sized>(
    records: Vec<SourceRecord>,
    size: usize,
    rng: &mut R,
) -> Vec<SourceRecord> {
    if size >= records.len() {
        return records;
    }
    let mut picked = rand::seq::index::sample(rng, records.len(), size).into_vec();
    picked.sort_unstable();

    let mut records: Vec<Option<SourceRecord>> = records.into_iter().map(Some).collect();
    picked
        .into_iter()
        .filter_map(|i| records[i].take())
        .collect()
}

/// Records whose identifier is one of `identifiers`.
pub fn by_identifier(records: Vec<SourceRecord>, identifiers: &[String]) -> Vec<SourceRecord> {
    records
        .into_iter()
        .filter(|r| {
            r.identifier()
                .is_some_and(|id| identifiers.iter().any(|wanted| wanted == id))
        })
        .collect()
}

pub fn select<R: Rng + ?Sized>(
    records: Vec<SourceRecord>,
    mode: Mode,
    sample_size: usize,
    identifiers: &[String],
    rng: &mut R,
) -> Vec<SourceRecord> {
    match mode {
        Mode::All => records,
        Mode::Sample => sample(records, sample_size, rng),
        Mode::Test => {
            let selected = by_identifier(records, identifiers);
            for wanted in identifiers {
                if !selected.iter().any(|r| r.identifier() == Some(wanted.as_str())) {
                    tracing::warn!("{}: not found in item set", wanted);
                }
            }
            selected
        }
    }
}
