//! Quality command implementation.

use crate::data;
use sagres::quality::DataQualityChecker;
use sagres::signals::SignalRegistry;

/// Run the data quality gate alone, without producing a ranking.
pub(crate) async fn run(
    asset: &str,
    hours: i64,
    demo: bool,
    config_path: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let config = data::load_eval_config(config_path)?;
    let feeds = data::load_feeds(demo, asset, hours).await?;
    let registry = SignalRegistry::from_raw_feeds(&feeds)?;

    let checker = DataQualityChecker::new(config.quality)?;
    let report = checker.check_all(registry.signals(), Some(&feeds.price));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Data Quality Report                       ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!(
        "{} signals checked, {} passed, {} failed\n",
        report.total(),
        report.passed(),
        report.failed()
    );

    for signal_report in report.signals.values() {
        let status = if signal_report.passed { "pass" } else { "FAIL" };
        println!(
            "{:<22} {:>5}  rows={:<6} missing={:.1}%",
            signal_report.name, status, signal_report.total_rows, signal_report.missing_pct
        );
        if !signal_report.issues.is_empty() {
            println!("{:>29}{}", "", signal_report.issue_summary());
        }
    }
    println!();

    Ok(())
}
