//! Breach Heatmap - data breach records to U.S. state heat maps
//!
//! Reads a delimited or spreadsheet file of breach records and exports an
//! interactive choropleth page, a static image and a per-state counts table.

mod cli;

use anyhow::{bail, Context, Result};
use breach_heatmap::app::{run_all, MapJob};
use breach_heatmap::config::{Config, GeneralConfig};
use breach_heatmap::data::states;
use breach_heatmap::stats::CountSummary;
use cli::{Cli, Command, RenderArgs, SummaryArgs};
use std::path::Path;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse_args();
    init_logging(&cli);

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over the flags.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Render(args) => render(&args),
        Command::Summary(args) => summary(&args).map(|_| 0),
        Command::InitConfig { path, force } => init_config(&path, force).map(|_| 0),
    }
}

fn render(args: &RenderArgs) -> Result<i32> {
    let (jobs, parallel) = match (&args.config, &args.input) {
        (Some(path), _) => {
            let mut config = Config::load(path)?;
            args.apply_general(&mut config.general);
            config.validate()?;
            (config.jobs()?, config.general.parallel)
        }
        (None, Some(input)) => {
            let mut general = GeneralConfig::default();
            args.apply_general(&mut general);
            let job = args.to_map_config(input.clone()).resolve(&general)?;
            (vec![job], false)
        }
        (None, None) => bail!("an input file or --config is required"),
    };

    info!(maps = jobs.len(), parallel, "rendering");
    let results = run_all(&jobs, parallel);

    let mut failed = 0;
    for (name, result) in &results {
        match result {
            Ok(report) => {
                println!(
                    "{}: {} states, {} unknown, {} total rows",
                    name,
                    report.summary.states_reporting,
                    report.tally.unknown,
                    report.tally.total_rows
                );
                if let Some(agency) = &report.tally.agency {
                    println!("  {} reports: {}", agency.name, agency.count);
                }
                for path in &report.written {
                    println!("  wrote {}", path.display());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: failed: {:#}", name, e);
            }
        }
    }

    Ok(if failed > 0 { 1 } else { 0 })
}

fn summary(args: &SummaryArgs) -> Result<()> {
    let job: MapJob = args
        .source
        .to_map_config(args.input.clone())
        .resolve(&GeneralConfig::default())?;
    let tally = job.tally()?;
    let stats = CountSummary::from_tally(&tally);

    let rows: Vec<(&str, u64)> = if args.all_states {
        tally.with_all_states()
    } else {
        tally
            .counts
            .iter()
            .map(|(code, count)| (code.as_str(), *count))
            .collect()
    };

    if args.json {
        let value = serde_json::json!({
            "input": args.input.display().to_string(),
            "total_rows": tally.total_rows,
            "counts": rows.iter().map(|(c, n)| (c.to_string(), *n)).collect::<std::collections::BTreeMap<_, _>>(),
            "unknown": tally.unknown,
            "discarded": tally.discarded,
            "agency": tally.agency.as_ref().map(|a| serde_json::json!({ "name": a.name, "count": a.count })),
            "summary": stats,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Input: {}", args.input.display());
    println!(
        "Rows: {}  Mapped: {}  Unknown: {}  Discarded: {}",
        tally.total_rows,
        tally.total_mapped(),
        tally.unknown,
        tally.total_discarded()
    );
    if let Some(agency) = &tally.agency {
        println!("{} reports: {}", agency.name, agency.count);
    }
    println!();
    println!("{:<6} {:<22} {:>8}", "State", "Name", "Count");
    for (code, count) in &rows {
        println!(
            "{:<6} {:<22} {:>8}",
            code,
            states::state_name(code).unwrap_or_default(),
            count
        );
    }
    if !tally.discarded.is_empty() {
        println!();
        println!("Discarded codes:");
        for (code, count) in &tally.discarded {
            println!("  {:<10} {}", code, count);
        }
    }

    println!();
    println!(
        "States reporting: {}  Mean: {:.2}  Median: {:.2}  Std: {:.2}",
        stats.states_reporting, stats.mean, stats.median, stats.std
    );
    println!(
        "Min: {:.0}  Max: {:.0}  P05: {:.2}  P95: {:.2}",
        stats.min, stats.max, stats.p05, stats.p95
    );
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    std::fs::write(path, Config::default_toml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
