//! Breach Map Runner
//! Runs map jobs: load, normalize, aggregate, summarize, export.

use crate::charts::{open_in_browser, write_html, ChartOptions, ChartPlotter, StaticMapRenderer};
use crate::data::{
    AggregateOptions, Aggregator, BreachTally, DataLoader, LoadOptions, NormalizeOptions,
    StateNormalizer,
};
use crate::stats::CountSummary;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, info_span};

/// Everything needed to turn one input file into its outputs.
#[derive(Debug, Clone)]
pub struct MapJob {
    pub name: String,
    pub input: PathBuf,
    pub load: LoadOptions,
    pub normalize: NormalizeOptions,
    pub aggregate: AggregateOptions,
    pub chart: ChartOptions,
    pub output_html: Option<PathBuf>,
    pub output_image: Option<PathBuf>,
    pub output_counts: Option<PathBuf>,
    pub image_size: (u32, u32),
    pub plotly_js_url: String,
    pub open_in_browser: bool,
}

/// Result of a finished job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub name: String,
    pub tally: BreachTally,
    pub summary: CountSummary,
    pub written: Vec<PathBuf>,
}

impl MapJob {
    /// Paths this job writes to.
    pub fn outputs(&self) -> Vec<PathBuf> {
        [&self.output_html, &self.output_image, &self.output_counts]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Load, normalize and aggregate without writing anything.
    pub fn tally(&self) -> Result<BreachTally> {
        let mut loader = DataLoader::new();
        let df = loader
            .load(&self.input, &self.load)
            .with_context(|| format!("Failed to load {}", self.input.display()))?;

        let normalized = StateNormalizer::normalize(df, &self.normalize)
            .with_context(|| format!("Failed to normalize {}", self.input.display()))?;

        let tally = Aggregator::tally(&normalized, &self.aggregate)
            .with_context(|| format!("Failed to aggregate {}", self.input.display()))?;

        Ok(tally)
    }

    /// Run the whole job and write every configured output.
    pub fn run(&self) -> Result<JobReport> {
        let span = info_span!("map", name = %self.name);
        let _guard = span.enter();
        let started = Instant::now();

        let tally = self.tally()?;
        let summary = CountSummary::from_tally(&tally);
        let mut written = Vec::new();

        if let Some(path) = &self.output_counts {
            tally
                .write_counts_csv(path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path.clone());
        }

        if let Some(path) = &self.output_html {
            let figure = ChartPlotter::build_figure(&tally, &self.chart);
            write_html(&figure, path, &self.plotly_js_url)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path.clone());

            if self.open_in_browser {
                open_in_browser(path);
            }
        }

        if let Some(path) = &self.output_image {
            StaticMapRenderer::render_to_file(&tally, &self.chart, path, self.image_size)
                .with_context(|| format!("Failed to render {}", path.display()))?;
            written.push(path.clone());
        }

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            outputs = written.len(),
            "map complete"
        );

        Ok(JobReport {
            name: self.name.clone(),
            tally,
            summary,
            written,
        })
    }
}

/// Run jobs independently; a failing job does not stop the others.
pub fn run_all(jobs: &[MapJob], parallel: bool) -> Vec<(String, Result<JobReport>)> {
    let run_one = |job: &MapJob| {
        let result = job.run();
        if let Err(e) = &result {
            error!(name = %job.name, error = %format!("{:#}", e), "map failed");
        }
        (job.name.clone(), result)
    };

    if parallel && jobs.len() > 1 {
        jobs.par_iter().map(run_one).collect()
    } else {
        jobs.iter().map(run_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{ColorScale, MapStyle};
    use crate::data::MissingPolicy;
    use std::io::Write;

    fn job(input: PathBuf, out_dir: &std::path::Path) -> MapJob {
        MapJob {
            name: "test".into(),
            input,
            load: LoadOptions::default(),
            normalize: NormalizeOptions {
                state_columns: vec!["breach_location_state".into()],
                missing: MissingPolicy::default(),
                agency: None,
            },
            aggregate: AggregateOptions::default(),
            chart: ChartOptions {
                style: MapStyle::Unknowns,
                title: "Breaches".into(),
                panel_title: None,
                colorscale: ColorScale::Viridis,
                plot_zero_states: false,
            },
            output_html: Some(out_dir.join("map.html")),
            output_image: None,
            output_counts: Some(out_dir.join("counts.csv")),
            image_size: (800, 600),
            plotly_js_url: "plotly.js".into(),
            open_in_browser: false,
        }
    }

    #[test]
    fn run_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("breaches.csv");
        let mut file = std::fs::File::create(&input).unwrap();
        writeln!(file, "org,breach_location_state").unwrap();
        writeln!(file, "a,ca").unwrap();
        writeln!(file, "b,").unwrap();
        writeln!(file, "c,CA").unwrap();
        drop(file);

        let report = job(input, dir.path()).run().unwrap();
        assert_eq!(report.tally.counts.get("CA"), Some(&2));
        assert_eq!(report.tally.unknown, 1);
        assert_eq!(report.summary.states_reporting, 1);
        assert_eq!(report.written.len(), 2);
        assert!(dir.path().join("map.html").exists());
        assert!(dir.path().join("counts.csv").exists());
    }

    #[test]
    fn failing_job_does_not_stop_others() {
        let dir = tempfile::tempdir().unwrap();
        let good_input = dir.path().join("good.csv");
        std::fs::write(&good_input, "breach_location_state\nTX\n").unwrap();

        let mut bad = job(dir.path().join("missing.csv"), dir.path());
        bad.name = "bad".into();
        let good_dir = dir.path().join("good");
        let mut good = job(good_input, &good_dir);
        good.name = "good".into();

        let results = run_all(&[bad, good], true);
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_err());
        assert_eq!(results[1].0, "good");
        assert!(results[1].1.is_ok());
    }

    #[test]
    fn outputs_lists_configured_paths() {
        let dir = tempfile::tempdir().unwrap();
        let j = job(dir.path().join("x.csv"), dir.path());
        assert_eq!(j.outputs().len(), 2);
    }
}
