//! State Code Normalizer Module
//! Canonicalizes the location-code column (trim + uppercase), buckets missing
//! values and extracts the reporting-agency column.

use crate::data::loader::find_column_in;
use crate::data::states::UNKNOWN_SENTINEL;
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No state column found (tried {candidates:?}; available: {available:?})")]
    MissingColumn {
        candidates: Vec<String>,
        available: Vec<String>,
    },
}

/// What to do with rows whose location code is null or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingPolicy {
    /// Replace the code with a sentinel so the row is counted as unknown.
    Sentinel(String),
    /// Remove the row.
    Drop,
}

impl Default for MissingPolicy {
    fn default() -> Self {
        MissingPolicy::Sentinel(UNKNOWN_SENTINEL.to_string())
    }
}

/// Agency column lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgencyOptions {
    pub columns: Vec<String>,
}

impl Default for AgencyOptions {
    fn default() -> Self {
        Self {
            columns: default_agency_columns(),
        }
    }
}

pub fn default_agency_columns() -> Vec<String> {
    ["reported_by", "reporting_agency", "agency", "source_agency"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Candidate names for the location-code column, first match wins.
    pub state_columns: Vec<String>,
    pub missing: MissingPolicy,
    pub agency: Option<AgencyOptions>,
}

/// Where agency values were taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgencySource {
    Column(String),
    /// No agency column exists; the normalized state value stands in.
    StateColumn,
}

/// Normalized table with columns `state` and, when requested, `agency`.
#[derive(Debug, Clone)]
pub struct NormalizedFrame {
    pub df: DataFrame,
    pub state_column: String,
    pub agency_source: Option<AgencySource>,
    pub dropped_missing: usize,
    pub total_rows: usize,
}

/// Placeholder spellings that mean "no value", compared after trimming and uppercasing.
pub const MISSING_TOKENS: [&str; 14] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NAN", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NAN", "NONE", "NULL",
];

/// Handles location-code cleaning.
pub struct StateNormalizer;

impl StateNormalizer {
    /// Trim and uppercase one raw value; blanks and placeholders like `N/A` count as missing.
    pub fn normalize_code(raw: Option<&str>) -> Option<String> {
        raw.map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_uppercase)
            .filter(|v| !MISSING_TOKENS.contains(&v.as_str()))
    }

    /// Read a column as nullable strings regardless of its inferred dtype.
    fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, NormalizerError> {
        let series = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let ca = series.str()?;
        Ok(ca.into_iter().map(Self::normalize_code).collect())
    }

    pub fn normalize(
        df: &DataFrame,
        options: &NormalizeOptions,
    ) -> Result<NormalizedFrame, NormalizerError> {
        let available: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let state_column = find_column_in(&available, &options.state_columns).ok_or_else(|| {
            NormalizerError::MissingColumn {
                candidates: options.state_columns.clone(),
                available: available.clone(),
            }
        })?;
        debug!(column = %state_column, "using state column");

        let states = Self::string_values(df, &state_column)?;

        let agency_source = options.agency.as_ref().map(|agency| {
            match find_column_in(&available, &agency.columns) {
                Some(col) => AgencySource::Column(col),
                None => {
                    warn!(
                        candidates = ?agency.columns,
                        "no agency column found, counting agency from state column"
                    );
                    AgencySource::StateColumn
                }
            }
        });

        let agencies: Option<Vec<Option<String>>> = match &agency_source {
            Some(AgencySource::Column(col)) => Some(Self::string_values(df, col)?),
            Some(AgencySource::StateColumn) => Some(states.clone()),
            None => None,
        };

        let mut out_states: Vec<String> = Vec::with_capacity(states.len());
        let mut out_agencies: Vec<Option<String>> = Vec::with_capacity(states.len());
        let mut dropped_missing = 0usize;

        for (idx, state) in states.into_iter().enumerate() {
            let code = match (state, &options.missing) {
                (Some(code), _) => code,
                (None, MissingPolicy::Sentinel(sentinel)) => sentinel.clone(),
                (None, MissingPolicy::Drop) => {
                    dropped_missing += 1;
                    continue;
                }
            };
            out_states.push(code);
            if let Some(agencies) = &agencies {
                out_agencies.push(agencies[idx].clone());
            }
        }

        let mut columns = vec![Column::new("state".into(), out_states)];
        if agencies.is_some() {
            columns.push(Column::new("agency".into(), out_agencies));
        }
        let normalized = DataFrame::new(columns)?;

        debug!(
            rows = normalized.height(),
            dropped = dropped_missing,
            "normalized state codes"
        );

        Ok(NormalizedFrame {
            df: normalized,
            state_column,
            agency_source,
            dropped_missing,
            total_rows: df.height(),
        })
    }
}
