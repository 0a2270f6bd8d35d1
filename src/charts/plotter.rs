//! Chart Plotter Module
//! Builds the interactive choropleth figures from aggregated breach counts.
//!
//! Two layouts are supported:
//! - `Unknowns`: full-width map with an "Unknown N" counter on the right edge
//! - `Agency`: map on the left, a bubble sized by one agency's report count on the right

use crate::charts::colorscale::ColorScale;
use crate::charts::figure::{
    subplot_domains, Annotation, Axis, ChoroplethMarker, ChoroplethTrace, ColorAxis, ColorBar,
    Domain, Figure, Font, Geo, Layout, Line, Margin, Projection, ScatterMarker, ScatterTrace,
    Shape, Title, Trace,
};
use crate::data::{states, BreachTally};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relative widths of the map and bubble panels.
pub const PANEL_WIDTHS: [f64; 2] = [0.82, 0.18];
pub const PANEL_SPACING: f64 = 0.05;

/// Map layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    /// Single map plus an unknown-state counter.
    #[default]
    Unknowns,
    /// Map plus a reporting-agency bubble.
    Agency,
}

impl fmt::Display for MapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapStyle::Unknowns => f.write_str("unknowns"),
            MapStyle::Agency => f.write_str("agency"),
        }
    }
}

impl FromStr for MapStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknowns" | "unknown" => Ok(MapStyle::Unknowns),
            "agency" => Ok(MapStyle::Agency),
            other => Err(format!("unknown map style '{}'", other)),
        }
    }
}

/// Presentation settings for one map.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub style: MapStyle,
    pub title: String,
    /// Heading of the bubble panel in the agency layout.
    pub panel_title: Option<String>,
    pub colorscale: ColorScale,
    /// Plot states with no breaches as zero instead of leaving them blank.
    pub plot_zero_states: bool,
}

/// Builds plotly figures.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn build_figure(tally: &BreachTally, options: &ChartOptions) -> Figure {
        match options.style {
            MapStyle::Unknowns => Self::unknowns_figure(tally, options),
            MapStyle::Agency => Self::agency_figure(tally, options),
        }
    }

    /// Locations and values that go on the map.
    pub fn plotted_counts(tally: &BreachTally, plot_zero_states: bool) -> Vec<(String, u64)> {
        if plot_zero_states {
            tally
                .with_all_states()
                .into_iter()
                .map(|(code, count)| (code.to_string(), count))
                .collect()
        } else {
            tally
                .counts
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(|(code, count)| (code.clone(), *count))
                .collect()
        }
    }

    fn choropleth(
        tally: &BreachTally,
        options: &ChartOptions,
        value_label: &str,
        border: Option<Line>,
    ) -> ChoroplethTrace {
        let rows = Self::plotted_counts(tally, options.plot_zero_states);
        let names = rows
            .iter()
            .map(|(code, _)| states::state_name(code).unwrap_or(code.as_str()).to_string())
            .collect();

        ChoroplethTrace {
            locations: rows.iter().map(|(code, _)| code.clone()).collect(),
            z: rows.iter().map(|(_, count)| *count).collect(),
            locationmode: "USA-states".into(),
            text: Some(names),
            coloraxis: "coloraxis".into(),
            geo: "geo".into(),
            hovertemplate: format!(
                "%{{text}} (%{{location}})<br>{}=%{{z}}<extra></extra>",
                value_label
            ),
            marker: border.map(|line| ChoroplethMarker { line }),
            name: String::new(),
        }
    }

    fn unknowns_figure(tally: &BreachTally, options: &ChartOptions) -> Figure {
        let trace = Self::choropleth(tally, options, "count", None);

        let mut counter = Annotation::paper(format!("Unknown {}", tally.unknown), 0.98, 0.5);
        counter.font = Some(Font {
            size: Some(14.0),
            color: Some("white".into()),
            family: None,
        });
        counter.bgcolor = Some("rgba(0,0,0,0.65)".into());
        counter.bordercolor = Some("white".into());
        counter.borderwidth = Some(1.0);
        counter.borderpad = Some(6.0);

        let halo = Shape {
            kind: "circle".into(),
            xref: "paper".into(),
            yref: "paper".into(),
            x0: 0.90,
            y0: 0.47,
            x1: 1.0,
            y1: 0.53,
            line: Line {
                color: None,
                width: 0.0,
            },
            fillcolor: "rgba(0,0,0,0.35)".into(),
        };

        let layout = Layout {
            title: Title {
                text: options.title.clone(),
                x: Some(0.5),
                xanchor: Some("center".into()),
                yanchor: Some("top".into()),
                font: Some(Font {
                    size: Some(24.0),
                    color: Some("Black".into()),
                    family: Some("Arial".into()),
                }),
            },
            geo: Geo {
                scope: "usa".into(),
                ..Default::default()
            },
            coloraxis: Some(ColorAxis {
                colorscale: options.colorscale.to_plotly(),
                colorbar: ColorBar {
                    title: Title::text("count"),
                },
                cmin: None,
            }),
            annotations: vec![counter],
            shapes: vec![halo],
            margin: Some(Margin {
                t: Some(100.0),
                ..Default::default()
            }),
            showlegend: false,
            ..Default::default()
        };

        Figure {
            data: vec![Trace::Choropleth(trace)],
            layout,
        }
    }

    fn agency_figure(tally: &BreachTally, options: &ChartOptions) -> Figure {
        let domains = subplot_domains(&PANEL_WIDTHS, PANEL_SPACING);
        let (map_domain, bubble_domain) = (domains[0], domains[1]);

        let border = Line {
            color: Some("black".into()),
            width: 0.5,
        };
        let map = Self::choropleth(tally, options, "Number of Breaches", Some(border));

        let agency_name = tally
            .agency
            .as_ref()
            .map(|a| a.name.clone())
            .unwrap_or_else(|| "Agency".to_string());
        let agency_count = tally.agency_count();
        let count_text = group_thousands(agency_count);

        let bubble = ScatterTrace {
            x: vec![0.0],
            y: vec![0.0],
            mode: "markers+text".into(),
            text: vec![format!("{} Reports:<br>{}", agency_name, count_text)],
            textposition: "bottom center".into(),
            marker: ScatterMarker {
                symbol: "circle".into(),
                size: bubble_size(agency_count, tally.max_count()),
                line: Line {
                    color: Some("white".into()),
                    width: 2.0,
                },
                opacity: 0.9,
            },
            hovertemplate: format!("{} Reports: {}<extra></extra>", agency_name, count_text),
            xaxis: "x".into(),
            yaxis: "y".into(),
            showlegend: false,
        };

        let panel_title = options
            .panel_title
            .clone()
            .unwrap_or_else(|| format!("Reported by {}", agency_name));
        let annotations = [
            (options.title.clone(), map_domain),
            (panel_title, bubble_domain),
        ]
        .into_iter()
        .map(|(text, domain)| {
            let mut heading = Annotation::paper(text, (domain[0] + domain[1]) / 2.0, 1.0);
            heading.xanchor = Some("center".into());
            heading.yanchor = Some("bottom".into());
            heading.font = Some(Font {
                size: Some(16.0),
                color: None,
                family: None,
            });
            heading
        })
        .collect();

        let layout = Layout {
            title: Title {
                text: options.title.clone(),
                x: Some(0.5),
                ..Default::default()
            },
            geo: Geo {
                scope: "usa".into(),
                domain: Some(Domain {
                    x: map_domain,
                    y: [0.0, 1.0],
                }),
                projection: Some(Projection {
                    kind: "albers usa".into(),
                }),
                bgcolor: Some("black".into()),
                lakecolor: Some("lightblue".into()),
                landcolor: Some("lightgrey".into()),
                showcountries: Some(true),
                showcoastlines: Some(true),
                showland: Some(true),
                showlakes: Some(true),
            },
            coloraxis: Some(ColorAxis {
                colorscale: options.colorscale.to_plotly(),
                colorbar: ColorBar {
                    title: Title::text("Breaches"),
                },
                cmin: None,
            }),
            xaxis: Some(Axis {
                domain: bubble_domain,
                anchor: "y".into(),
                visible: false,
            }),
            yaxis: Some(Axis {
                domain: [0.0, 1.0],
                anchor: "x".into(),
                visible: false,
            }),
            annotations,
            paper_bgcolor: Some("black".into()),
            plot_bgcolor: Some("black".into()),
            font: Some(Font {
                size: None,
                color: Some("white".into()),
                family: None,
            }),
            showlegend: false,
            ..Default::default()
        };

        Figure {
            data: vec![Trace::Choropleth(map), Trace::Scatter(bubble)],
            layout,
        }
    }
}

/// Marker size for the agency bubble, square-root scaled against the busiest state.
pub fn bubble_size(agency_count: u64, max_state: u64) -> f64 {
    if agency_count == 0 {
        return 40.0;
    }
    20.0 + 40.0 * ((agency_count as f64).sqrt() / (max_state.max(1) as f64).sqrt())
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AgencySource, AgencyTally};

    fn tally() -> BreachTally {
        let mut tally = BreachTally {
            unknown: 3,
            total_rows: 20,
            ..Default::default()
        };
        tally.counts.insert("CA".into(), 9);
        tally.counts.insert("TX".into(), 4);
        tally.agency = Some(AgencyTally {
            name: "HHS".into(),
            count: 1234,
            source: AgencySource::Column("reported_by".into()),
        });
        tally
    }

    fn options(style: MapStyle) -> ChartOptions {
        ChartOptions {
            style,
            title: "Data Breaches by State".into(),
            panel_title: None,
            colorscale: ColorScale::Viridis,
            plot_zero_states: false,
        }
    }

    #[test]
    fn bubble_size_scaling() {
        assert_eq!(bubble_size(0, 100), 40.0);
        assert_eq!(bubble_size(100, 100), 60.0);
        assert_eq!(bubble_size(25, 100), 40.0);
        assert_eq!(bubble_size(4, 0), 100.0);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn style_parsing() {
        assert_eq!("Agency".parse::<MapStyle>(), Ok(MapStyle::Agency));
        assert_eq!("unknowns".parse::<MapStyle>(), Ok(MapStyle::Unknowns));
        assert!("bars".parse::<MapStyle>().is_err());
        assert_eq!(MapStyle::default(), MapStyle::Unknowns);
    }

    #[test]
    fn plotted_counts_optionally_include_zero_states() {
        let t = tally();
        assert_eq!(ChartPlotter::plotted_counts(&t, false).len(), 2);
        let all = ChartPlotter::plotted_counts(&t, true);
        assert_eq!(all.len(), 51);
        assert!(all.contains(&("WY".to_string(), 0)));
    }

    #[test]
    fn unknowns_figure_has_counter_and_halo() {
        let fig = ChartPlotter::build_figure(&tally(), &options(MapStyle::Unknowns));
        let json = serde_json::to_value(&fig).unwrap();

        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["type"], "choropleth");
        assert_eq!(json["data"][0]["locations"][0], "CA");
        assert_eq!(json["data"][0]["z"][0], 9);
        assert_eq!(json["data"][0]["text"][1], "Texas");
        assert_eq!(json["layout"]["annotations"][0]["text"], "Unknown 3");
        assert_eq!(json["layout"]["shapes"][0]["type"], "circle");
        assert_eq!(json["layout"]["title"]["font"]["size"], 24.0);
        assert_eq!(json["layout"]["margin"]["t"], 100.0);
        assert_eq!(json["layout"]["geo"]["scope"], "usa");
    }

    #[test]
    fn agency_figure_has_bubble_panel() {
        let mut opts = options(MapStyle::Agency);
        opts.colorscale = ColorScale::Reds;
        let fig = ChartPlotter::build_figure(&tally(), &opts);
        let json = serde_json::to_value(&fig).unwrap();

        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["marker"]["line"]["color"], "black");
        assert_eq!(data[1]["type"], "scatter");
        assert_eq!(data[1]["text"][0], "HHS Reports:<br>1,234");
        assert_eq!(json["layout"]["annotations"][1]["text"], "Reported by HHS");
        assert_eq!(json["layout"]["geo"]["projection"]["type"], "albers usa");
        assert_eq!(json["layout"]["xaxis"]["visible"], false);
        assert_eq!(json["layout"]["paper_bgcolor"], "black");
        assert_eq!(
            json["layout"]["coloraxis"]["colorbar"]["title"]["text"],
            "Breaches"
        );

        let size = data[1]["marker"]["size"].as_f64().unwrap();
        assert!((size - bubble_size(1234, 9)).abs() < 1e-9);
    }
}
