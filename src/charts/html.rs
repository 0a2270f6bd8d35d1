//! HTML Export
//! Writes a standalone page that renders a figure with plotly.js, and opens it.

use crate::charts::figure::Figure;
use crate::charts::RenderError;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_PLOTLY_JS_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Escape text for use inside HTML element content.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render the page for a figure.
pub fn render_html(figure: &Figure, plotly_js_url: &str) -> Result<String, RenderError> {
    // `</` inside an inline script would end the element early
    let figure_json = figure.to_json()?.replace("</", "<\\/");
    let title = escape_html(&figure.layout.title.text);

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<script src="{plotly}" charset="utf-8"></script>
<style>
html, body {{ margin: 0; height: 100%; }}
#breach-map {{ width: 100%; height: 100vh; }}
</style>
</head>
<body>
<div id="breach-map"></div>
<script type="text/javascript">
const figure = {figure_json};
Plotly.newPlot("breach-map", figure.data, figure.layout, {{ responsive: true }});
</script>
</body>
</html>
"#,
        title = title,
        plotly = escape_html(plotly_js_url),
        figure_json = figure_json,
    ))
}

/// Write the figure page to `path`, creating parent directories.
pub fn write_html(figure: &Figure, path: &Path, plotly_js_url: &str) -> Result<(), RenderError> {
    let html = render_html(figure, plotly_js_url)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)?;
    info!(path = %path.display(), "wrote interactive map");
    Ok(())
}

/// Show an exported page in the default browser. Failure is logged, not fatal.
pub fn open_in_browser(path: &Path) -> bool {
    match open::that(path) {
        Ok(()) => {
            info!(path = %path.display(), "opened map in browser");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not open browser");
            false
        }
    }
}
