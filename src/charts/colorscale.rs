//! Sequential color scales shared by the interactive and static maps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

type Rgb = (u8, u8, u8);

const VIRIDIS: [Rgb; 10] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x28, 0x78),
    (0x3e, 0x49, 0x89),
    (0x31, 0x68, 0x8e),
    (0x26, 0x82, 0x8e),
    (0x1f, 0x9e, 0x89),
    (0x35, 0xb7, 0x79),
    (0x6e, 0xce, 0x58),
    (0xb5, 0xde, 0x2b),
    (0xfd, 0xe7, 0x25),
];

const PLASMA: [Rgb; 10] = [
    (0x0d, 0x08, 0x87),
    (0x46, 0x03, 0x9f),
    (0x72, 0x01, 0xa8),
    (0x9c, 0x17, 0x9e),
    (0xbd, 0x37, 0x86),
    (0xd8, 0x57, 0x6b),
    (0xed, 0x79, 0x53),
    (0xfb, 0x9f, 0x3a),
    (0xfd, 0xca, 0x26),
    (0xf0, 0xf9, 0x21),
];

const REDS: [Rgb; 9] = [
    (255, 245, 240),
    (254, 224, 210),
    (252, 187, 161),
    (252, 146, 114),
    (251, 106, 74),
    (239, 59, 44),
    (203, 24, 29),
    (165, 15, 21),
    (103, 0, 13),
];

const BLUES: [Rgb; 9] = [
    (247, 251, 255),
    (222, 235, 247),
    (198, 219, 239),
    (158, 202, 225),
    (107, 174, 214),
    (66, 146, 198),
    (33, 113, 181),
    (8, 81, 156),
    (8, 48, 107),
];

/// Named sequential palette, low values first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScale {
    Viridis,
    Plasma,
    Reds,
    Blues,
}

impl ColorScale {
    pub fn stops(&self) -> &'static [Rgb] {
        match self {
            ColorScale::Viridis => &VIRIDIS,
            ColorScale::Plasma => &PLASMA,
            ColorScale::Reds => &REDS,
            ColorScale::Blues => &BLUES,
        }
    }

    /// `[[position, "rgb(r,g,b)"], ...]` as plotly.js expects.
    pub fn to_plotly(&self) -> Vec<(f64, String)> {
        let stops = self.stops();
        let last = (stops.len() - 1) as f64;
        stops
            .iter()
            .enumerate()
            .map(|(i, (r, g, b))| (i as f64 / last, format!("rgb({},{},{})", r, g, b)))
            .collect()
    }

    /// Linear interpolation between stops; `t` is clamped to `[0, 1]`.
    pub fn sample(&self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let idx = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - idx as f64;

        let (r0, g0, b0) = stops[idx];
        let (r1, g1, b1) = stops[idx + 1];
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
        (mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }
}

impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorScale::Viridis => "viridis",
            ColorScale::Plasma => "plasma",
            ColorScale::Reds => "reds",
            ColorScale::Blues => "blues",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viridis" => Ok(ColorScale::Viridis),
            "plasma" => Ok(ColorScale::Plasma),
            "reds" => Ok(ColorScale::Reds),
            "blues" => Ok(ColorScale::Blues),
            other => Err(format!("unknown color scale '{}'", other)),
        }
    }
}
