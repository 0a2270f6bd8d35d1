//! Charts module - interactive figures, HTML export and static images

pub mod colorscale;
pub mod figure;
pub mod html;
mod plotter;
mod renderer;

use thiserror::Error;

pub use colorscale::ColorScale;
pub use figure::Figure;
pub use html::{open_in_browser, write_html, DEFAULT_PLOTLY_JS_URL};
pub use plotter::{bubble_size, group_thousands, ChartOptions, ChartPlotter, MapStyle};
pub use renderer::{ImageFormat, StaticMapRenderer, DEFAULT_IMAGE_SIZE};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to serialize figure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to draw static map: {0}")]
    Plot(String),
    #[error("Unsupported image format '{0}' (expected png or svg)")]
    UnsupportedImageFormat(String),
}
