//! Static Map Renderer
//! Draws a tile-grid heat map to PNG or SVG with plotters.
//!
//! Layout:
//! 1. Title centered at the top
//! 2. Left: one square tile per state on a 12x8 grid, colored by count
//! 3. Below the tiles: gradient legend with quantile ticks
//! 4. Right: side annotation (unknown counter or agency bubble)

use crate::charts::colorscale::ColorScale;
use crate::charts::plotter::{bubble_size, group_thousands, ChartOptions, MapStyle, PANEL_WIDTHS};
use crate::charts::RenderError;
use crate::data::states::{GRID_COLUMNS, GRID_ROWS, TILE_GRID};
use crate::data::BreachTally;
use crate::stats::StatsCalculator;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use tracing::info;

pub const DEFAULT_IMAGE_SIZE: (u32, u32) = (1200, 800);

const LIGHT_GREY: RGBColor = RGBColor(211, 211, 211);
const DARK_GREY: RGBColor = RGBColor(64, 64, 64);
const LEGEND_STEPS: i32 = 100;
const LEGEND_HEIGHT: i32 = 18;
const LEGEND_BINS: usize = 4;

/// Output encoding, picked from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Result<Self, RenderError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            _ => Err(RenderError::UnsupportedImageFormat(ext)),
        }
    }
}

/// Pixel geometry of the tile grid inside the map panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub origin: (i32, i32),
    pub tile: i32,
    pub gap: i32,
}

impl TileLayout {
    /// Largest square tiles that fit `width` x `height`, leaving room for the legend.
    pub fn fit(width: u32, height: u32) -> Self {
        let margin = 20;
        let usable_w = width as i32 - 2 * margin;
        let usable_h = height as i32 - 2 * margin - (LEGEND_HEIGHT + 40);
        let tile = (usable_w / GRID_COLUMNS as i32)
            .min(usable_h / GRID_ROWS as i32)
            .max(8);
        let gap = (tile / 12).max(1);

        let grid_w = tile * GRID_COLUMNS as i32;
        let grid_h = tile * GRID_ROWS as i32;
        let origin = (
            (width as i32 - grid_w) / 2,
            margin + (usable_h - grid_h).max(0) / 2,
        );
        Self { origin, tile, gap }
    }

    /// Corners of the tile at `(col, row)`.
    pub fn cell(&self, col: u32, row: u32) -> [(i32, i32); 2] {
        let x0 = self.origin.0 + col as i32 * self.tile;
        let y0 = self.origin.1 + row as i32 * self.tile;
        [
            (x0 + self.gap, y0 + self.gap),
            (x0 + self.tile - self.gap, y0 + self.tile - self.gap),
        ]
    }

    /// Bottom edge of the grid.
    pub fn bottom(&self) -> i32 {
        self.origin.1 + self.tile * GRID_ROWS as i32
    }
}

/// Black or white, whichever reads better on `bg`.
pub fn contrast_text(bg: (u8, u8, u8)) -> RGBColor {
    let (r, g, b) = bg;
    let luminance = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    if luminance > 140.0 {
        BLACK
    } else {
        WHITE
    }
}

/// Fill color for a state tile.
pub fn tile_color(count: u64, max: u64, scale: ColorScale) -> (u8, u8, u8) {
    if count == 0 || max == 0 {
        return (LIGHT_GREY.0, LIGHT_GREY.1, LIGHT_GREY.2);
    }
    scale.sample(count as f64 / max as f64)
}

struct Theme {
    background: RGBColor,
    foreground: RGBColor,
}

impl Theme {
    fn for_style(style: MapStyle) -> Self {
        match style {
            MapStyle::Unknowns => Theme {
                background: WHITE,
                foreground: BLACK,
            },
            MapStyle::Agency => Theme {
                background: BLACK,
                foreground: WHITE,
            },
        }
    }
}

pub struct StaticMapRenderer;

impl StaticMapRenderer {
    /// Render the tile map to a PNG or SVG file.
    pub fn render_to_file(
        tally: &BreachTally,
        options: &ChartOptions,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        let format = ImageFormat::from_path(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        match format {
            ImageFormat::Png => {
                let root = BitMapBackend::new(path, size).into_drawing_area();
                Self::draw(&root, tally, options).map_err(|e| RenderError::Plot(e.to_string()))?;
                root.present()
                    .map_err(|e| RenderError::Plot(e.to_string()))?;
            }
            ImageFormat::Svg => {
                let root = SVGBackend::new(path, size).into_drawing_area();
                Self::draw(&root, tally, options).map_err(|e| RenderError::Plot(e.to_string()))?;
                root.present()
                    .map_err(|e| RenderError::Plot(e.to_string()))?;
            }
        }

        info!(path = %path.display(), "wrote static map");
        Ok(())
    }

    fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        tally: &BreachTally,
        options: &ChartOptions,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let theme = Theme::for_style(options.style);
        root.fill(&theme.background)?;

        let body = root.titled(
            &options.title,
            ("sans-serif", 28).into_font().color(&theme.foreground),
        )?;

        let (width, _) = body.dim_in_pixel();
        let map_width = (width as f64 * PANEL_WIDTHS[0]) as u32;
        let (map_area, side_area) = body.split_horizontally(map_width);

        let layout = {
            let (w, h) = map_area.dim_in_pixel();
            TileLayout::fit(w, h)
        };

        Self::draw_tiles(&map_area, &layout, tally, options.colorscale)?;
        Self::draw_legend(&map_area, &layout, tally, options.colorscale, &theme)?;

        match options.style {
            MapStyle::Unknowns => Self::draw_unknown_counter(&side_area, tally.unknown, &theme)?,
            MapStyle::Agency => Self::draw_agency_bubble(&side_area, tally, options, &theme)?,
        }

        Ok(())
    }

    fn draw_tiles<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        layout: &TileLayout,
        tally: &BreachTally,
        scale: ColorScale,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let max = tally.max_count();
        let label_size = (layout.tile / 4).max(8);
        let count_size = (layout.tile / 6).max(7);

        for (code, col, row) in TILE_GRID {
            let count = tally.counts.get(code).copied().unwrap_or(0);
            let fill = tile_color(count, max, scale);
            let [(x0, y0), (x1, y1)] = layout.cell(col, row);

            area.draw(&Rectangle::new(
                [(x0, y0), (x1, y1)],
                RGBColor(fill.0, fill.1, fill.2).filled(),
            ))?;

            let text_color = contrast_text(fill);
            let center_x = (x0 + x1) / 2;
            let center_y = (y0 + y1) / 2;
            let centered = Pos::new(HPos::Center, VPos::Center);

            area.draw(&Text::new(
                code.to_string(),
                (center_x, center_y - label_size / 2),
                ("sans-serif", label_size)
                    .into_font()
                    .color(&text_color)
                    .pos(centered),
            ))?;
            area.draw(&Text::new(
                count.to_string(),
                (center_x, center_y + count_size),
                ("sans-serif", count_size)
                    .into_font()
                    .color(&text_color)
                    .pos(centered),
            ))?;
        }
        Ok(())
    }

    fn draw_legend<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        layout: &TileLayout,
        tally: &BreachTally,
        scale: ColorScale,
        theme: &Theme,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let bar_x0 = layout.origin.0 + layout.tile;
        let bar_x1 = layout.origin.0 + layout.tile * (GRID_COLUMNS as i32 - 1);
        let bar_y0 = layout.bottom() + 10;
        let bar_w = (bar_x1 - bar_x0).max(LEGEND_STEPS);

        for step in 0..LEGEND_STEPS {
            let (r, g, b) = scale.sample(step as f64 / (LEGEND_STEPS - 1) as f64);
            let x0 = bar_x0 + bar_w * step / LEGEND_STEPS;
            let x1 = bar_x0 + bar_w * (step + 1) / LEGEND_STEPS;
            area.draw(&Rectangle::new(
                [(x0, bar_y0), (x1, bar_y0 + LEGEND_HEIGHT)],
                RGBColor(r, g, b).filled(),
            ))?;
        }
        area.draw(&Rectangle::new(
            [(bar_x0, bar_y0), (bar_x0 + bar_w, bar_y0 + LEGEND_HEIGHT)],
            DARK_GREY.stroke_width(1),
        ))?;

        let max = tally.max_count();
        if max == 0 {
            return Ok(());
        }

        let values: Vec<f64> = tally.counts.values().map(|&c| c as f64).collect();
        let tick_style = ("sans-serif", 12)
            .into_font()
            .color(&theme.foreground)
            .pos(Pos::new(HPos::Center, VPos::Top));

        for tick in StatsCalculator::quantile_breaks(&values, LEGEND_BINS) {
            let x = bar_x0 + (bar_w as f64 * tick / max as f64).round() as i32;
            area.draw(&PathElement::new(
                vec![(x, bar_y0 + LEGEND_HEIGHT), (x, bar_y0 + LEGEND_HEIGHT + 4)],
                theme.foreground.stroke_width(1),
            ))?;
            area.draw(&Text::new(
                format!("{:.0}", tick),
                (x, bar_y0 + LEGEND_HEIGHT + 6),
                tick_style.clone(),
            ))?;
        }
        Ok(())
    }

    fn draw_unknown_counter<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        unknown: u64,
        theme: &Theme,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = (w as i32 / 2 - 10).clamp(20, 90);

        area.draw(&Circle::new(center, radius, RGBColor(90, 90, 90).filled()))?;
        area.draw(&Circle::new(center, radius, theme.foreground.stroke_width(1)))?;
        area.draw(&Text::new(
            format!("Unknown {}", group_thousands(unknown)),
            center,
            ("sans-serif", 16)
                .into_font()
                .color(&WHITE)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;
        Ok(())
    }

    fn draw_agency_bubble<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        tally: &BreachTally,
        options: &ChartOptions,
        theme: &Theme,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);

        let agency_name = tally
            .agency
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("Agency");
        let count = tally.agency_count();

        // marker size is a diameter in points; 100 is the largest it can get
        let size = bubble_size(count, tally.max_count());
        let max_radius = (w as i32 / 2 - 10).max(10);
        let radius = ((size / 100.0) * max_radius as f64).round().max(4.0) as i32;

        let heading = options
            .panel_title
            .clone()
            .unwrap_or_else(|| format!("Reported by {}", agency_name));
        area.draw(&Text::new(
            heading,
            (center.0, 10),
            ("sans-serif", 16)
                .into_font()
                .color(&theme.foreground)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;

        let (r, g, b) = options.colorscale.sample(1.0);
        area.draw(&Circle::new(center, radius, RGBColor(r, g, b).mix(0.9).filled()))?;
        area.draw(&Circle::new(center, radius, WHITE.stroke_width(2)))?;

        let label_style = ("sans-serif", 14)
            .into_font()
            .color(&theme.foreground)
            .pos(Pos::new(HPos::Center, VPos::Top));
        area.draw(&Text::new(
            format!("{} Reports:", agency_name),
            (center.0, center.1 + radius + 8),
            label_style.clone(),
        ))?;
        area.draw(&Text::new(
            group_thousands(count),
            (center.0, center.1 + radius + 26),
            label_style,
        ))?;
        Ok(())
    }
}
