//! Breach Aggregator Module
//! Counts normalized codes per state and the rows attributed to one reporting agency.

use crate::data::normalizer::{AgencySource, NormalizedFrame};
use crate::data::states::{self, UNKNOWN_SENTINEL};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to write counts to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Code that marks a missing location.
    pub sentinel: String,
    /// Agency whose rows are counted separately, e.g. `HHS`.
    pub agency_name: Option<String>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            sentinel: UNKNOWN_SENTINEL.to_string(),
            agency_name: None,
        }
    }
}

/// Rows attributed to one reporting agency.
#[derive(Debug, Clone, PartialEq)]
pub struct AgencyTally {
    pub name: String,
    pub count: u64,
    pub source: AgencySource,
}

/// Aggregated counts for one input file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreachTally {
    /// Valid state codes only.
    pub counts: BTreeMap<String, u64>,
    /// Rows carrying the sentinel.
    pub unknown: u64,
    /// Codes that are neither valid nor the sentinel.
    pub discarded: BTreeMap<String, u64>,
    pub agency: Option<AgencyTally>,
    /// Rows in the input before any were dropped.
    pub total_rows: usize,
}

impl BreachTally {
    /// Counts joined to every valid code, zero where absent.
    pub fn with_all_states(&self) -> Vec<(&'static str, u64)> {
        states::all_codes()
            .map(|code| (code, self.counts.get(code).copied().unwrap_or(0)))
            .collect()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Rows that landed on a valid state.
    pub fn total_mapped(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn total_discarded(&self) -> u64 {
        self.discarded.values().sum()
    }

    pub fn agency_count(&self) -> u64 {
        self.agency.as_ref().map(|a| a.count).unwrap_or(0)
    }

    /// Export the joined table as `state,name,count`.
    pub fn write_counts_csv(&self, path: &Path) -> Result<(), AggregateError> {
        let joined = self.with_all_states();
        let codes: Vec<&str> = joined.iter().map(|(code, _)| *code).collect();
        let names: Vec<&str> = joined
            .iter()
            .map(|(code, _)| states::state_name(code).unwrap_or_default())
            .collect();
        let counts: Vec<u64> = joined.iter().map(|(_, count)| *count).collect();

        let mut df = DataFrame::new(vec![
            Column::new("state".into(), codes),
            Column::new("name".into(), names),
            Column::new("count".into(), counts),
        ])?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AggregateError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let mut file = File::create(path).map_err(|source| AggregateError::Io {
            path: path.display().to_string(),
            source,
        })?;
        CsvWriter::new(&mut file).finish(&mut df)?;

        info!(path = %path.display(), "wrote state counts");
        Ok(())
    }
}

/// Handles grouping and counting.
pub struct Aggregator;

impl Aggregator {
    /// Group by normalized code and split the groups into valid, unknown and discarded.
    pub fn tally(
        normalized: &NormalizedFrame,
        options: &AggregateOptions,
    ) -> Result<BreachTally, AggregateError> {
        let grouped = normalized
            .df
            .clone()
            .lazy()
            .group_by([col("state")])
            .agg([len().alias("count")])
            .sort(["state"], SortMultipleOptions::default())
            .collect()?;

        let codes = grouped.column("state")?.as_materialized_series().clone();
        let codes = codes.str()?;
        let counts = grouped
            .column("count")?
            .as_materialized_series()
            .cast(&DataType::UInt64)?;
        let counts = counts.u64()?;

        let mut tally = BreachTally {
            total_rows: normalized.total_rows,
            ..Default::default()
        };

        for (code, count) in codes.into_iter().zip(counts.into_iter()) {
            let (Some(code), Some(count)) = (code, count) else {
                continue;
            };
            if code == options.sentinel {
                tally.unknown += count;
            } else if states::is_valid_code(code) {
                tally.counts.insert(code.to_string(), count);
            } else {
                tally.discarded.insert(code.to_string(), count);
            }
        }

        if let (Some(name), Some(source)) = (&options.agency_name, &normalized.agency_source) {
            let name = name.trim().to_uppercase();
            let count = Self::count_agency(&normalized.df, &name)?;
            tally.agency = Some(AgencyTally {
                name,
                count,
                source: source.clone(),
            });
        }

        if !tally.discarded.is_empty() {
            debug!(discarded = ?tally.discarded, "codes outside the valid set");
        }
        info!(
            states = tally.counts.len(),
            mapped = tally.total_mapped(),
            unknown = tally.unknown,
            discarded = tally.total_discarded(),
            "aggregated breach counts"
        );

        Ok(tally)
    }

    /// Count rows whose agency value equals `name`.
    pub fn count_agency(df: &DataFrame, name: &str) -> Result<u64, AggregateError> {
        let matched = df
            .clone()
            .lazy()
            .filter(col("agency").eq(lit(name)))
            .collect()?;
        Ok(matched.height() as u64)
    }
}
