//! Breach Table Loader Module
//! Loads delimited text with Polars and spreadsheets with calamine into one DataFrame shape.

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read spreadsheet: {0}")]
    SpreadsheetError(#[from] calamine::Error),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Input file not found: {0}")]
    NotFound(PathBuf),
    #[error("Unsupported input format '{0}' (expected csv, psv, tsv, txt, xlsx, xls or ods)")]
    UnsupportedFormat(String),
    #[error("Worksheet has no header row")]
    EmptyWorksheet,
    #[error("Workbook has no worksheets")]
    NoWorksheet,
    #[error("No data loaded")]
    NoData,
}

/// Input file family, picked from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Delimited,
    Spreadsheet,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" | "psv" | "tsv" | "dat" => Ok(InputFormat::Delimited),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Spreadsheet),
            _ => Err(LoaderError::UnsupportedFormat(ext)),
        }
    }
}

/// Options controlling how a file is read.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Field separator for delimited files; sniffed from the header when unset.
    pub delimiter: Option<u8>,
    /// Worksheet name for spreadsheets; the first sheet when unset.
    pub sheet: Option<String>,
}

const DELIMITER_CANDIDATES: [u8; 4] = [b'|', b',', b'\t', b';'];

/// Loads breach records into a DataFrame.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Load a delimited or spreadsheet file depending on its extension.
    pub fn load(&mut self, path: &Path, options: &LoadOptions) -> Result<&DataFrame, LoaderError> {
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }

        let df = match InputFormat::from_path(path)? {
            InputFormat::Delimited => {
                let separator = match options.delimiter {
                    Some(sep) => sep,
                    None => Self::sniff_delimiter(path)?,
                };
                Self::read_delimited(path, separator)?
            }
            InputFormat::Spreadsheet => Self::read_spreadsheet(path, options.sheet.as_deref())?,
        };

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded breach table"
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame, LoaderError> {
        debug!(separator = %(separator as char).escape_default(), "reading delimited file");

        let df = LazyCsvReader::new(path)
            .with_separator(separator)
            // every column stays text so codes like `06` keep their zeros
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .with_truncate_ragged_lines(true)
            .finish()?
            .collect()?;

        Ok(df)
    }

    fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto(path)?;

        let range = match sheet {
            Some(name) => workbook.worksheet_range(name)?,
            None => workbook
                .worksheet_range_at(0)
                .ok_or(LoaderError::NoWorksheet)??,
        };

        let mut rows = range.rows();
        let header = rows.next().ok_or(LoaderError::EmptyWorksheet)?;
        let names = Self::unique_header_names(header.iter().map(Self::cell_to_string));

        let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
        for row in rows {
            for (idx, column) in values.iter_mut().enumerate() {
                column.push(row.get(idx).and_then(Self::cell_to_string));
            }
        }

        let columns: Vec<Column> = names
            .into_iter()
            .zip(values)
            .map(|(name, vals)| Column::new(name.into(), vals))
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Render one spreadsheet cell as text; empty and error cells become null.
    fn cell_to_string(cell: &Data) -> Option<String> {
        match cell {
            Data::Empty | Data::Error(_) => None,
            Data::String(s) => Some(s.clone()),
            Data::Int(i) => Some(i.to_string()),
            Data::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(format!("{}", *f as i64)),
            other => Some(other.to_string()),
        }
    }

    /// Blank headers get a positional name and repeats get a numeric suffix,
    /// since a DataFrame rejects duplicate column names.
    fn unique_header_names(raw: impl Iterator<Item = Option<String>>) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        raw.enumerate()
            .map(|(idx, name)| {
                let base = name
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| format!("column_{}", idx + 1));
                let mut candidate = base.clone();
                let mut n = 2;
                while !seen.insert(candidate.clone()) {
                    candidate = format!("{}_{}", base, n);
                    n += 1;
                }
                candidate
            })
            .collect()
    }

    /// Pick the separator from the header line. `.tsv` files are always tab separated.
    pub fn sniff_delimiter(path: &Path) -> Result<u8, LoaderError> {
        let is_tsv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
        if is_tsv {
            return Ok(b'\t');
        }

        let file = File::open(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut header = String::new();
        BufReader::new(file)
            .read_line(&mut header)
            .map_err(|source| LoaderError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::delimiter_for_header(&header))
    }

    /// Most frequent candidate wins; ties and no candidates fall back to a comma.
    pub fn delimiter_for_header(header: &str) -> u8 {
        let counts = DELIMITER_CANDIDATES
            .map(|candidate| (candidate, header.bytes().filter(|&b| b == candidate).count()));
        let top = counts.iter().map(|(_, count)| *count).max().unwrap_or(0);
        let mut leaders = counts.iter().filter(|(_, count)| top > 0 && *count == top);

        match (leaders.next(), leaders.next()) {
            (Some((candidate, _)), None) => *candidate,
            _ => b',',
        }
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First candidate present in the header, compared case-insensitively after trimming.
    /// Returns the column's actual name.
    pub fn find_column(&self, candidates: &[String]) -> Option<String> {
        let columns = self.get_columns();
        find_column_in(&columns, candidates)
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

}

/// Column lookup shared by the loader and the normalizer.
pub fn find_column_in(columns: &[String], candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|wanted| {
        let wanted = wanted.trim();
        columns
            .iter()
            .find(|c| c.trim().eq_ignore_ascii_case(wanted))
            .cloned()
    })
}
