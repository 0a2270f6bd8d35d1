//! Breach Heatmap - data breach records to U.S. state heat maps
//!
//! Loads a delimited or spreadsheet file, normalizes its location codes,
//! counts breaches per state and exports a choropleth map.

pub mod app;
pub mod charts;
pub mod config;
pub mod data;
pub mod stats;
