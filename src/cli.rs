//! Command-line interface definitions using clap.

use breach_heatmap::charts::{ColorScale, MapStyle};
use breach_heatmap::config::{GeneralConfig, MapConfig, MissingMode, DEFAULT_CONFIG_FILE};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

/// Breach Heatmap - count data breaches per U.S. state and export choropleth maps.
#[derive(Parser, Debug)]
#[command(name = "breach-heatmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render one map from an input file, or every map in a config file
    Render(RenderArgs),

    /// Print per-state counts and summary statistics without writing files
    Summary(SummaryArgs),

    /// Generate a default configuration file
    InitConfig {
        /// Where to write the file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE, value_name = "FILE")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Options that describe how an input file is read and counted.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Map style: unknowns or agency
    #[arg(long, default_value = "unknowns", value_name = "STYLE")]
    pub style: MapStyle,

    /// Candidate location-code column (repeatable, first match wins)
    #[arg(long = "state-column", value_name = "NAME")]
    pub state_columns: Vec<String>,

    /// Field separator: a single character, tab, pipe or comma
    #[arg(long, value_name = "SEP")]
    pub delimiter: Option<String>,

    /// Worksheet name for spreadsheet input
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Agency counted in the bubble panel (agency style)
    #[arg(long, value_name = "NAME")]
    pub agency: Option<String>,

    /// Drop rows without a location code instead of counting them as unknown
    #[arg(long)]
    pub drop_missing: bool,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Input file (.csv, .psv, .tsv, .txt, .xlsx, .xls, .ods)
    #[arg(value_name = "INPUT", required_unless_present = "config")]
    pub input: Option<PathBuf>,

    /// Render every map listed in a config file instead
    #[arg(short, long, value_name = "FILE", conflicts_with = "input")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub source: InputArgs,

    /// Interactive HTML output path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Static image output path (.png or .svg)
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Per-state counts CSV output path
    #[arg(long, value_name = "FILE")]
    pub counts: Option<PathBuf>,

    /// Map title
    #[arg(long)]
    pub title: Option<String>,

    /// Color scale: viridis, plasma, reds or blues
    #[arg(long, value_name = "SCALE")]
    pub colorscale: Option<ColorScale>,

    /// Color states with zero breaches instead of leaving them blank
    #[arg(long)]
    pub plot_zero_states: bool,

    /// Open the exported page in the default browser
    #[arg(long)]
    pub open: bool,

    /// Run config jobs one after another
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Input file
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[command(flatten)]
    pub source: InputArgs,

    /// List every state, including those without breaches
    #[arg(long)]
    pub all_states: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the log level based on verbosity flags.
    pub fn log_level(&self) -> Level {
        if self.quiet {
            Level::WARN
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }
}

impl InputArgs {
    /// Build a map entry for `input` from the flags.
    pub fn to_map_config(&self, input: PathBuf) -> MapConfig {
        MapConfig {
            input,
            style: self.style,
            delimiter: self.delimiter.clone(),
            sheet: self.sheet.clone(),
            state_columns: (!self.state_columns.is_empty()).then(|| self.state_columns.clone()),
            missing: self.drop_missing.then_some(MissingMode::Drop),
            agency_name: self.agency.clone(),
            ..MapConfig::default()
        }
    }
}

impl RenderArgs {
    /// Build the single map entry described by the flags.
    pub fn to_map_config(&self, input: PathBuf) -> MapConfig {
        MapConfig {
            title: self.title.clone(),
            colorscale: self.colorscale,
            output_html: self.output.clone(),
            output_image: self.image.clone(),
            output_counts: self.counts.clone(),
            plot_zero_states: self.plot_zero_states,
            ..self.source.to_map_config(input)
        }
    }

    /// Apply command-line overrides to settings loaded from a file.
    pub fn apply_general(&self, general: &mut GeneralConfig) {
        if self.open {
            general.open_in_browser = true;
        }
        if self.sequential {
            general.parallel = false;
        }
    }
}
