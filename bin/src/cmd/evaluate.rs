//! Evaluation command implementation.

use crate::{data, output::OutputManager};
use sagres::eval::{Evaluation, Evaluator};
use sagres::signals::SignalRegistry;

/// Run the full pipeline: fetch feeds, build signals, evaluate, rank,
/// and write the CSV artifacts.
pub(crate) async fn run(
    asset: &str,
    hours: i64,
    demo: bool,
    top_n: Option<usize>,
    output_dir: &str,
    include_rolling: bool,
    config_path: Option<&str>,
) -> anyhow::Result<()> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                      Signal Evaluation                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let config = data::load_eval_config(config_path)?;
    println!("Asset:    {}", asset.to_uppercase());
    println!("Window:   {hours}h");
    println!("Horizon:  {} samples", config.horizon);
    println!("Source:   {}", if demo { "demo data" } else { "live backend" });
    println!();

    let feeds = data::load_feeds(demo, asset, hours).await?;
    println!("Fetched {} price points", feeds.price.len());

    let registry = SignalRegistry::from_raw_feeds(&feeds)?;
    println!("Built {} candidate signals", registry.len());

    let evaluator = Evaluator::new(config)?;
    let evaluation = evaluator.evaluate(registry.signals(), &feeds.price)?;

    print_summary(&evaluation, top_n);

    let output = OutputManager::create(output_dir)?;
    output.save_summary(&evaluation, top_n)?;
    output.save_quality(&evaluation.quality)?;
    if include_rolling {
        for result in evaluation.ranked() {
            output.save_rolling(result)?;
        }
    }

    println!("\nResults written to {}\n", output.run_dir().display());
    Ok(())
}

fn print_summary(evaluation: &Evaluation, top_n: Option<usize>) {
    let limit = top_n.unwrap_or(usize::MAX);

    println!("\n{}", "=".repeat(72));
    println!("SIGNAL EVALUATION SUMMARY");
    println!("{}", "=".repeat(72));

    println!(
        "\n{:<6}{:<22}{:>8}{:>8}{:>8}{:>8}{:>10}",
        "Rank", "Signal", "Score", "IC", "EffHR", "Lag", "Type"
    );
    println!("{}", "-".repeat(72));

    for result in evaluation.ranked().take(limit) {
        let ic = result.ic.map_or(f64::NAN, |ic| ic.spearman);
        let eff = result.hit_rate.map_or(f64::NAN, |h| h.effective);
        let lag = result
            .lead_lag
            .map_or_else(|| "-".to_string(), |ll| ll.best_lag.to_string());
        let kind = match result.hit_rate {
            Some(h) if h.is_contrarian => "CONTR",
            Some(_) => "direct",
            None => "-",
        };
        let flag = if result.partial { "*" } else { "" };

        println!(
            "{:<6}{:<22}{:>8.3}{:>8.3}{:>8.2}{:>8}{:>10}{flag}",
            result.rank.unwrap_or_default(),
            truncate(&result.signal, 21),
            result.composite.unwrap_or_default(),
            ic,
            eff,
            lag,
            kind,
        );
    }

    let skipped: Vec<_> = evaluation.skipped().collect();
    if !skipped.is_empty() {
        println!("\nSkipped by quality gate:");
        for result in &skipped {
            println!("  {}: {}", result.signal, result.quality.issue_summary());
        }
    }

    println!(
        "\nData quality: {} signals checked, {} passed, {} failed",
        evaluation.quality.total(),
        evaluation.quality.passed(),
        evaluation.quality.failed()
    );
    println!("(* = partial: some metrics unavailable, weights renormalized)");
}

fn truncate(name: &str, max: usize) -> String {
    if name.len() <= max {
        name.to_string()
    } else {
        name[..max].to_string()
    }
}
