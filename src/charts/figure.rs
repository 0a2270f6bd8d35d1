//! Figure Model
//! Serializable subset of the plotly.js figure schema used by the breach maps.

use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Choropleth(ChoroplethTrace),
    Scatter(ScatterTrace),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChoroplethTrace {
    pub locations: Vec<String>,
    pub z: Vec<u64>,
    pub locationmode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    pub coloraxis: String,
    pub geo: String,
    pub hovertemplate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<ChoroplethMarker>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethMarker {
    pub line: Line,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScatterTrace {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub mode: String,
    pub text: Vec<String>,
    pub textposition: String,
    pub marker: ScatterMarker,
    pub hovertemplate: String,
    pub xaxis: String,
    pub yaxis: String,
    pub showlegend: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScatterMarker {
    pub symbol: String,
    pub size: f64,
    pub line: Line,
    pub opacity: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub width: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Title {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

impl Title {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Margin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Domain {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Geo {
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<Projection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lakecolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showcountries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showcoastlines: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showland: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showlakes: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorBar {
    pub title: Title,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorAxis {
    pub colorscale: Vec<(f64, String)>,
    pub colorbar: ColorBar,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmin: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub domain: [f64; 2],
    pub anchor: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Annotation {
    pub text: String,
    pub xref: String,
    pub yref: String,
    pub x: f64,
    pub y: f64,
    pub showarrow: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xanchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yanchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bordercolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borderwidth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borderpad: Option<f64>,
}

impl Annotation {
    /// Annotation positioned in paper coordinates with no arrow.
    pub fn paper(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            xref: "paper".into(),
            yref: "paper".into(),
            x,
            y,
            showarrow: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: String,
    pub xref: String,
    pub yref: String,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub line: Line,
    pub fillcolor: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Layout {
    pub title: Title,
    pub geo: Geo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coloraxis: Option<ColorAxis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<Margin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_bgcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    pub showlegend: bool,
}

/// Horizontal domains of side-by-side subplots. `widths` are relative and
/// share the space left after `spacing` between neighbours.
pub fn subplot_domains(widths: &[f64], spacing: f64) -> Vec<[f64; 2]> {
    if widths.is_empty() {
        return Vec::new();
    }
    let total: f64 = widths.iter().sum();
    let usable = 1.0 - spacing * (widths.len() - 1) as f64;

    let mut start = 0.0;
    widths
        .iter()
        .map(|w| {
            let end = start + usable * w / total;
            let domain = [start, end];
            start = end + spacing;
            domain
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subplot_domains_match_two_panel_layout() {
        let domains = subplot_domains(&[0.82, 0.18], 0.05);
        assert_eq!(domains.len(), 2);
        assert!((domains[0][0] - 0.0).abs() < 1e-12);
        assert!((domains[0][1] - 0.779).abs() < 1e-12);
        assert!((domains[1][0] - 0.829).abs() < 1e-12);
        assert!((domains[1][1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn traces_are_tagged_by_type() {
        let trace = Trace::Scatter(ScatterTrace {
            x: vec![0.0],
            y: vec![0.0],
            ..Default::default()
        });
        let value = serde_json::to_value(&trace).unwrap();
        assert_eq!(value["type"], "scatter");
        assert_eq!(value["x"][0], 0.0);
    }

    #[test]
    fn empty_collections_are_omitted() {
        let json = Figure::default().to_json().unwrap();
        assert!(!json.contains("annotations"));
        assert!(!json.contains("shapes"));
        assert!(!json.contains("coloraxis"));
    }
}
