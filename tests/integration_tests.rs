//! End-to-end tests running map jobs against the fixture files.

use breach_heatmap::app::run_all;
use breach_heatmap::charts::{ChartOptions, ColorScale, MapStyle, StaticMapRenderer};
use breach_heatmap::config::{Config, GeneralConfig, MapConfig};
use breach_heatmap::data::{
    AgencySource, AgencyTally, BreachTally, DataLoader, LoadOptions,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn general() -> GeneralConfig {
    GeneralConfig {
        plotly_js_url: "plotly.min.js".into(),
        ..GeneralConfig::default()
    }
}

#[test]
fn agency_map_from_pipe_delimited_file() {
    let dir = TempDir::new().unwrap();
    let map = MapConfig {
        input: fixture("breach_chronology_sample.psv"),
        style: MapStyle::Agency,
        output_html: Some(dir.path().join("index.html")),
        output_counts: Some(dir.path().join("counts.csv")),
        ..MapConfig::default()
    };

    let job = map.resolve(&general()).unwrap();
    let report = job.run().unwrap();
    let tally = &report.tally;

    assert_eq!(tally.total_rows, 8);
    assert_eq!(tally.counts.get("CA"), Some(&2));
    assert_eq!(tally.counts.get("FL"), Some(&1));
    assert_eq!(tally.counts.get("DC"), Some(&1));
    assert_eq!(tally.total_mapped(), 5);
    // the blank row is dropped, not counted
    assert_eq!(tally.unknown, 0);
    assert_eq!(tally.discarded.get("PR"), Some(&1));

    let agency = tally.agency.as_ref().unwrap();
    assert_eq!(agency.name, "HHS");
    assert_eq!(agency.count, 5);

    let html = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(html.contains("<script src=\"plotly.min.js\""));
    assert!(html.contains("HHS Reports:<br>5"));
    assert!(html.contains("albers usa"));

    let counts = std::fs::read_to_string(dir.path().join("counts.csv")).unwrap();
    assert!(counts.contains("CA,California,2"));
    assert!(counts.contains("TX,Texas,1"));
    assert_eq!(report.written.len(), 2);
}

#[test]
fn unknowns_map_counts_blank_locations() {
    let dir = TempDir::new().unwrap();
    let map = MapConfig {
        input: fixture("breaches_by_location.csv"),
        output_html: Some(dir.path().join("breach_map.html")),
        ..MapConfig::default()
    };

    let report = map.resolve(&general()).unwrap().run().unwrap();
    let tally = &report.tally;

    assert_eq!(tally.counts.get("WA"), Some(&2));
    assert_eq!(tally.counts.get("OR"), Some(&1));
    assert_eq!(tally.unknown, 2);
    assert_eq!(tally.discarded.get("ZZ"), Some(&1));
    assert!(tally.agency.is_none());
    assert_eq!(report.summary.states_reporting, 2);
    assert_eq!(report.summary.total, 3);

    let html = std::fs::read_to_string(dir.path().join("breach_map.html")).unwrap();
    assert!(html.contains("Unknown 2"));
    assert!(html.contains("Data Breaches by State Including Unknowns"));
}

#[test]
fn config_file_runs_every_map() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().display().to_string().replace('\\', "/");
    let toml_content = format!(
        r#"
[general]
plotly_js_url = "plotly.min.js"

[[maps]]
name = "locations"
input = "{locations}"
output_html = "{out}/locations.html"

[[maps]]
name = "chronology"
input = "{chronology}"
style = "agency"
delimiter = "pipe"
output_html = "{out}/chronology.html"
output_counts = "{out}/chronology.csv"

[[maps]]
name = "missing"
input = "{out}/does_not_exist.csv"
output_html = "{out}/missing.html"
"#,
        locations = fixture("breaches_by_location.csv").display().to_string().replace('\\', "/"),
        chronology = fixture("breach_chronology_sample.psv").display().to_string().replace('\\', "/"),
        out = out,
    );
    let path = dir.path().join("breachmap.toml");
    std::fs::write(&path, toml_content).unwrap();

    let config = Config::load(&path).unwrap();
    config.validate().unwrap();
    let results = run_all(&config.jobs().unwrap(), config.general.parallel);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, "locations");
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_ok());
    assert!(results[2].1.is_err());
    assert!(dir.path().join("locations.html").exists());
    assert!(dir.path().join("chronology.csv").exists());
    assert!(!dir.path().join("missing.html").exists());
}

#[test]
fn unsupported_image_format_fails_the_job() {
    let dir = TempDir::new().unwrap();
    let map = MapConfig {
        input: fixture("breaches_by_location.csv"),
        output_html: Some(dir.path().join("map.html")),
        output_image: Some(dir.path().join("map.gif")),
        ..MapConfig::default()
    };

    let err = map.resolve(&general()).unwrap().run().unwrap_err();
    assert!(format!("{:#}", err).contains("gif"));
}

#[test]
fn default_config_round_trips() {
    let text = Config::default_toml().unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.maps.len(), 2);
    assert_eq!(parsed.maps[1].delimiter.as_deref(), Some("|"));
    parsed.validate().unwrap();
}

#[test]
fn loads_spreadsheet_fixture() {
    let mut loader = DataLoader::new();
    let df = loader
        .load(&fixture("breaches_organized.xlsx"), &LoadOptions::default())
        .unwrap();
    assert_eq!(df.height(), 4);
    assert_eq!(
        loader.get_columns(),
        vec!["org_name", "breach_location_state", "records"]
    );
    assert_eq!(
        loader.find_column(&["Breach_Location_State".to_string()]),
        Some("breach_location_state".to_string())
    );

    let named = DataLoader::new()
        .load(
            &fixture("breaches_organized.xlsx"),
            &LoadOptions {
                sheet: Some("Breaches".into()),
                ..LoadOptions::default()
            },
        )
        .map(|df| df.height())
        .unwrap();
    assert_eq!(named, 4);
}

#[test]
fn unknowns_map_from_spreadsheet() {
    let dir = TempDir::new().unwrap();
    let map = MapConfig {
        input: fixture("breaches_organized.xlsx"),
        output_html: Some(dir.path().join("breach_map.html")),
        ..MapConfig::default()
    };

    let report = map.resolve(&general()).unwrap().run().unwrap();
    assert_eq!(report.tally.counts.get("CA"), Some(&1));
    assert_eq!(report.tally.counts.get("TX"), Some(&1));
    // one blank cell plus one literal `unkn`
    assert_eq!(report.tally.unknown, 2);
    assert!(report.tally.discarded.is_empty());
}

fn sample_tally() -> BreachTally {
    BreachTally {
        counts: BTreeMap::from([
            ("CA".to_string(), 12),
            ("NY".to_string(), 4),
            ("TX".to_string(), 1),
        ]),
        unknown: 3,
        discarded: BTreeMap::new(),
        agency: Some(AgencyTally {
            name: "HHS".into(),
            count: 9,
            source: AgencySource::Column("reported_by".into()),
        }),
        total_rows: 20,
    }
}

fn chart(style: MapStyle) -> ChartOptions {
    ChartOptions {
        style,
        title: "Breaches".into(),
        panel_title: None,
        colorscale: ColorScale::Reds,
        plot_zero_states: false,
    }
}

#[test]
fn static_maps_render_for_both_styles() {
    let dir = TempDir::new().unwrap();
    let tallies = [("sample", sample_tally()), ("empty", BreachTally::default())];

    for style in [MapStyle::Unknowns, MapStyle::Agency] {
        for (label, tally) in &tallies {
            for ext in ["png", "svg"] {
                let path = dir.path().join(format!("{}/{}_{}.{}", style, label, ext, ext));
                StaticMapRenderer::render_to_file(tally, &chart(style), &path, (800, 600))
                    .unwrap();
                let size = std::fs::metadata(&path).unwrap().len();
                assert!(size > 0, "{} is empty", path.display());
            }
        }
    }

    let svg = std::fs::read_to_string(dir.path().join("agency/sample_svg.svg")).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("HHS Reports:"));
}
