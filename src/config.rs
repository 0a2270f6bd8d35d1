//! Configuration file handling.
//!
//! A `breachmap.toml` file lists map jobs under `[[maps]]`. Every job field is
//! optional except `input`; missing fields come from the preset of the job's
//! `style`.

use crate::app::MapJob;
use crate::charts::{ChartOptions, ColorScale, MapStyle, DEFAULT_IMAGE_SIZE, DEFAULT_PLOTLY_JS_URL};
use crate::data::normalizer::default_agency_columns;
use crate::data::states::UNKNOWN_SENTINEL;
use crate::data::{AgencyOptions, AggregateOptions, LoadOptions, MissingPolicy, NormalizeOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "breachmap.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid delimiter '{0}' (use a single character, \"tab\", \"pipe\" or \"comma\")")]
    Delimiter(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Map jobs, each rendered independently.
    #[serde(default)]
    pub maps: Vec<MapConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            maps: vec![
                MapConfig {
                    name: "unknowns".into(),
                    input: PathBuf::from("DataBreach Organized.xlsx"),
                    style: MapStyle::Unknowns,
                    output_html: Some(PathBuf::from("breach_map.html")),
                    ..MapConfig::default()
                },
                MapConfig {
                    name: "agency".into(),
                    input: PathBuf::from("Data_Breach_Chronology_sample.csv"),
                    style: MapStyle::Agency,
                    delimiter: Some("|".into()),
                    output_html: Some(PathBuf::from("index.html")),
                    ..MapConfig::default()
                },
            ],
        }
    }
}

/// Settings shared by every job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Script URL embedded in exported pages.
    #[serde(default = "default_plotly_js_url")]
    pub plotly_js_url: String,

    /// Open each exported page in the default browser.
    #[serde(default)]
    pub open_in_browser: bool,

    /// Run jobs on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,

    #[serde(default = "default_image_width")]
    pub image_width: u32,

    #[serde(default = "default_image_height")]
    pub image_height: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            plotly_js_url: default_plotly_js_url(),
            open_in_browser: false,
            parallel: true,
            image_width: default_image_width(),
            image_height: default_image_height(),
        }
    }
}

fn default_plotly_js_url() -> String {
    DEFAULT_PLOTLY_JS_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_image_width() -> u32 {
    DEFAULT_IMAGE_SIZE.0
}

fn default_image_height() -> u32 {
    DEFAULT_IMAGE_SIZE.1
}

/// How rows without a location code are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingMode {
    Sentinel,
    Drop,
}

/// One map job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapConfig {
    /// Job name used in logs; defaults to the input file stem.
    #[serde(default)]
    pub name: String,

    pub input: PathBuf,

    #[serde(default)]
    pub style: MapStyle,

    /// Field separator for delimited input; sniffed when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,

    /// Worksheet for spreadsheet input; the first sheet when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,

    /// Candidate location-code columns, first match wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_columns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing: Option<MissingMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentinel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency_columns: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorscale: Option<ColorScale>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_html: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_image: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_counts: Option<PathBuf>,

    #[serde(default)]
    pub plot_zero_states: bool,
}

/// Defaults a style brings to a job.
#[derive(Debug, Clone)]
pub struct StylePreset {
    pub state_columns: Vec<String>,
    pub missing: MissingMode,
    pub agency_name: Option<String>,
    pub title: String,
    pub colorscale: ColorScale,
    pub output_html: PathBuf,
}

impl StylePreset {
    pub fn for_style(style: MapStyle) -> Self {
        match style {
            MapStyle::Unknowns => Self {
                state_columns: vec!["breach_location_state".into(), "state".into()],
                missing: MissingMode::Sentinel,
                agency_name: None,
                title: "Data Breaches by State Including Unknowns".into(),
                colorscale: ColorScale::Viridis,
                output_html: PathBuf::from("breach_map.html"),
            },
            MapStyle::Agency => Self {
                state_columns: vec!["source".into(), "state".into()],
                missing: MissingMode::Drop,
                agency_name: Some("HHS".into()),
                title: "Heat Map of Data Breaches by State".into(),
                colorscale: ColorScale::Reds,
                output_html: PathBuf::from("index.html"),
            },
        }
    }
}

/// Parse a delimiter setting into a byte.
pub fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "pipe" => Ok(b'|'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(ConfigError::Delimiter(raw.to_string())),
            }
        }
    }
}

impl MapConfig {
    /// Anchor relative input and output paths at `base`.
    ///
    /// An unset `output_html` is pinned to the style's default name first, so
    /// it lands next to the config file as well.
    pub fn rebase(&mut self, base: &Path) {
        if self.output_html.is_none() {
            self.output_html = Some(StylePreset::for_style(self.style).output_html);
        }
        let anchor = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        anchor(&mut self.input);
        for output in [
            &mut self.output_html,
            &mut self.output_image,
            &mut self.output_counts,
        ] {
            if let Some(path) = output.as_mut() {
                anchor(path);
            }
        }
    }

    /// Fill unset fields from the style preset and build a runnable job.
    pub fn resolve(&self, general: &GeneralConfig) -> Result<MapJob, ConfigError> {
        let preset = StylePreset::for_style(self.style);

        let name = if self.name.trim().is_empty() {
            self.input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "map".to_string())
        } else {
            self.name.clone()
        };

        let delimiter = self.delimiter.as_deref().map(parse_delimiter).transpose()?;

        let state_columns = self
            .state_columns
            .clone()
            .filter(|cols| !cols.is_empty())
            .unwrap_or(preset.state_columns);

        let sentinel = self
            .sentinel
            .clone()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNKNOWN_SENTINEL.to_string());

        let missing = match self.missing.unwrap_or(preset.missing) {
            MissingMode::Sentinel => MissingPolicy::Sentinel(sentinel.clone()),
            MissingMode::Drop => MissingPolicy::Drop,
        };

        let agency_name = self.agency_name.clone().or(preset.agency_name);
        if self.style == MapStyle::Agency && agency_name.is_none() {
            return Err(ConfigError::Invalid(format!(
                "map '{}' uses the agency style but has no agency_name",
                name
            )));
        }
        let agency = agency_name.as_ref().map(|_| AgencyOptions {
            columns: self
                .agency_columns
                .clone()
                .filter(|cols| !cols.is_empty())
                .unwrap_or_else(default_agency_columns),
        });

        Ok(MapJob {
            name,
            input: self.input.clone(),
            load: LoadOptions {
                delimiter,
                sheet: self.sheet.clone(),
            },
            normalize: NormalizeOptions {
                state_columns,
                missing,
                agency,
            },
            aggregate: AggregateOptions {
                sentinel,
                agency_name,
            },
            chart: ChartOptions {
                style: self.style,
                title: self.title.clone().unwrap_or(preset.title),
                panel_title: self.panel_title.clone(),
                colorscale: self.colorscale.unwrap_or(preset.colorscale),
                plot_zero_states: self.plot_zero_states,
            },
            output_html: Some(self.output_html.clone().unwrap_or(preset.output_html)),
            output_image: self.output_image.clone(),
            output_counts: self.output_counts.clone(),
            image_size: (general.image_width, general.image_height),
            plotly_js_url: general.plotly_js_url.clone(),
            open_in_browser: general.open_in_browser,
        })
    }
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// Relative `input` and `output_*` paths are resolved against the
    /// directory holding the file, not the working directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            for map in &mut config.maps {
                map.rebase(base);
            }
        }

        Ok(config)
    }

    /// Reject configs that cannot run: no jobs, duplicate names or colliding outputs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maps.is_empty() {
            return Err(ConfigError::Invalid("no [[maps]] entries".into()));
        }
        if self.general.image_width == 0 || self.general.image_height == 0 {
            return Err(ConfigError::Invalid("image size must be non-zero".into()));
        }

        let mut names = HashSet::new();
        let mut outputs = HashSet::new();
        for job in self.jobs()? {
            if !names.insert(job.name.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate map name '{}'",
                    job.name
                )));
            }
            for path in job.outputs() {
                if !outputs.insert(path.clone()) {
                    return Err(ConfigError::Invalid(format!(
                        "output {} is written by more than one map",
                        path.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve every map entry into a job.
    pub fn jobs(&self) -> Result<Vec<MapJob>, ConfigError> {
        self.maps.iter().map(|m| m.resolve(&self.general)).collect()
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String, ConfigError> {
        let body = toml::to_string_pretty(&Config::default())?;
        Ok(format!(
            "# Relative input and output paths are resolved against this file's directory.\n\n{}",
            body
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.maps.len(), 2);
        assert_eq!(config.maps[0].style, MapStyle::Unknowns);
        assert_eq!(config.maps[1].style, MapStyle::Agency);
        assert!(config.general.parallel);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
open_in_browser = true

[[maps]]
name = "chronology"
input = "data/chronology.csv"
style = "agency"
delimiter = "pipe"
agency_name = "ftc"
colorscale = "blues"
output_image = "out/chronology.png"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.open_in_browser);
        assert_eq!(config.general.plotly_js_url, DEFAULT_PLOTLY_JS_URL);

        let job = config.maps[0].resolve(&config.general).unwrap();
        assert_eq!(job.name, "chronology");
        assert_eq!(job.load.delimiter, Some(b'|'));
        assert_eq!(job.normalize.state_columns, vec!["source", "state"]);
        assert_eq!(job.normalize.missing, MissingPolicy::Drop);
        assert_eq!(job.aggregate.agency_name.as_deref(), Some("ftc"));
        assert_eq!(job.chart.colorscale, ColorScale::Blues);
        assert_eq!(job.chart.title, "Heat Map of Data Breaches by State");
        assert_eq!(job.output_html, Some(PathBuf::from("index.html")));
        assert_eq!(job.output_image, Some(PathBuf::from("out/chronology.png")));
        assert!(job.open_in_browser);
    }

    #[test]
    fn unknowns_preset_uses_sentinel() {
        let map = MapConfig {
            input: PathBuf::from("breaches.xlsx"),
            sentinel: Some(" unk ".into()),
            ..Default::default()
        };
        let job = map.resolve(&GeneralConfig::default()).unwrap();
        assert_eq!(job.name, "breaches");
        assert_eq!(job.normalize.missing, MissingPolicy::Sentinel("UNK".into()));
        assert_eq!(job.aggregate.sentinel, "UNK");
        assert!(job.normalize.agency.is_none());
        assert_eq!(job.chart.colorscale, ColorScale::Viridis);
    }

    #[test]
    fn delimiter_parsing() {
        assert_eq!(parse_delimiter("|").unwrap(), b'|');
        assert_eq!(parse_delimiter("TAB").unwrap(), b'\t');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(matches!(
            parse_delimiter("||"),
            Err(ConfigError::Delimiter(_))
        ));
    }

    #[test]
    fn validate_rejects_collisions() {
        let mut config = Config::default();
        config.maps[1].output_html = Some(PathBuf::from("breach_map.html"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("breach_map.html")));

        let mut config = Config::default();
        config.maps[1].name = "unknowns".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("duplicate")));

        let empty = Config {
            maps: Vec::new(),
            ..Config::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml().unwrap();
        assert!(toml_str.starts_with("# Relative input"));
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[[maps]]"));
        assert!(toml_str.contains("style = \"agency\""));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.maps.len(), 2);
    }

    #[test]
    fn image_size_defaults_match_renderer() {
        let general = GeneralConfig::default();
        assert_eq!((general.image_width, general.image_height), DEFAULT_IMAGE_SIZE);
    }

    #[test]
    fn load_resolves_paths_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("breachmap.toml");
        let absolute = dir.path().join("elsewhere").join("counts.csv");
        std::fs::write(
            &path,
            format!(
                r#"
[[maps]]
input = "data/breaches.csv"
output_image = "out/map.png"
output_counts = "{}"

[[maps]]
name = "agency"
input = "chronology.csv"
style = "agency"
"#,
                absolute.display().to_string().replace('\\', "/")
            ),
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let first = &config.maps[0];
        assert_eq!(first.input, dir.path().join("data/breaches.csv"));
        assert_eq!(first.output_image, Some(dir.path().join("out/map.png")));
        assert_eq!(first.output_html, Some(dir.path().join("breach_map.html")));
        assert_eq!(
            first.output_counts.as_deref().map(Path::is_absolute),
            Some(true)
        );
        assert_eq!(
            config.maps[1].output_html,
            Some(dir.path().join("index.html"))
        );
    }
}
