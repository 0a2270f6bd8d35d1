//! Stats module - summary statistics over state counts

mod calculator;

pub use calculator::{CountSummary, StatsCalculator};
