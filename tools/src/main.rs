//! report-runner: headless closing-report runner.
//!
//! Usage:
//!   report-runner --tables ./sheets --date 2024-05-10
//!   report-runner --db closing.db --import ./sheets --date 2024-05-10 --out report.json
//!   report-runner --demo --seed 12345 --date 2024-05-10 --json
//!
//! Repeat `--exclude-agent` / `--exclude-store` once per value.

mod demo;
mod source;

use anyhow::{bail, Context, Result};
use closing_core::{
    config::ReportConfig,
    engine::{ClosingReportEngine, ReportInput},
    name_match::ExactMatcher,
    report::ClosingReport,
    types::{Sheet, SourceTables},
};
use demo::DemoGenerator;
use source::{JsonDirSource, SnapshotStore, TableSource};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let demo = args.iter().any(|a| a == "--demo");
    let as_json = args.iter().any(|a| a == "--json");
    let strict_names = args.iter().any(|a| a == "--strict-names");
    let seed = parse_arg(&args, "--seed", 42u64);
    let date = flag_value(&args, "--date")
        .map(str::to_string)
        .unwrap_or_else(|| chrono::Local::now().date_naive().format("%Y-%m-%d").to_string());

    let config = match flag_value(&args, "--config") {
        Some(path) => ReportConfig::load(path).with_context(|| format!("loading config {path}"))?,
        None => ReportConfig::default(),
    };

    let (origin, tables) = load_tables(&args, demo, seed, &date, &config)?;

    let mut input = ReportInput::new(tables, date);
    input.excluded_agents = flag_values(&args, "--exclude-agent");
    input.excluded_stores = flag_values(&args, "--exclude-store");

    let mut engine = ClosingReportEngine::new(config);
    if strict_names {
        engine = engine.with_matcher(Box::new(ExactMatcher));
    }
    let report = engine.run(&input)?;

    if let Some(out) = flag_value(&args, "--out") {
        std::fs::write(out, report.to_json_pretty()?)?;
        log::info!("report written to {out}");
    }

    if as_json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report, &origin);
    }

    Ok(())
}

fn load_tables(
    args: &[String],
    demo: bool,
    seed: u64,
    date: &str,
    config: &ReportConfig,
) -> Result<(String, SourceTables)> {
    if demo {
        let target = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
        let tables = DemoGenerator::new(seed, config).generate(target);
        return Ok((format!("demo:seed={seed}"), tables));
    }

    if let Some(db) = flag_value(args, "--db") {
        let store = SnapshotStore::open(db)?;
        store.migrate()?;
        if let Some(dir) = flag_value(args, "--import") {
            let imported = JsonDirSource::new(dir).load()?;
            store.save_all(&imported, &chrono::Utc::now().to_rfc3339())?;
            for sheet in Sheet::ALL {
                log::info!("imported {} rows into {}", store.row_count(sheet)?, sheet.name());
            }
        }
        return Ok((store.describe(), store.load()?));
    }

    if let Some(dir) = flag_value(args, "--tables") {
        let source = JsonDirSource::new(dir);
        return Ok((source.describe(), source.load()?));
    }

    bail!("no input: pass --tables <dir>, --db <path> or --demo")
}

fn print_summary(report: &ClosingReport, origin: &str) {
    let d = &report.diagnostics;

    println!("=== CLOSING REPORT {} ===", report.date);
    println!("  source:         {origin}");
    println!("  matcher:        {}", d.name_matcher);
    println!("  examined:       {}", d.filter.examined);
    println!("  passed filter:  {}", d.filter.passed);
    println!("  counted:        {}", report.total_performance());
    println!("  fee:            {:.0}", report.total_fee());
    println!("  support:        {:.0}", report.total_support());
    println!("  mismatches:     {}", report.matching_mismatches.len());
    println!("  mapping fails:  {}", report.mapping_failures.len());
    if !report.excluded_agents.is_empty() {
        println!("  excluded:       {}", report.excluded_agents.join(", "));
    }

    println!();
    println!("=== AGENTS ===");
    if report.agent_data.is_empty() {
        println!("  (no activations counted)");
    }
    for row in &report.agent_data {
        println!(
            "  {:<12} perf {:>4}  fee {:>10.0}  target {:>6.0}  exp {:>4}  ach {:>3}%  stores {}/{}  support {:>8.0}",
            row.name,
            row.performance,
            row.fee,
            row.target,
            row.expected_closing,
            row.achievement_rate,
            row.active_stores,
            row.registered_stores,
            row.support
        );
    }

    println!();
    println!("=== OFFICES ===");
    for row in &report.office_data {
        println!(
            "  {:<12} perf {:>4}  fee {:>10.0}  util {:>3}%  rotation {:>3}%",
            row.name, row.performance, row.fee, row.utilization_rate, row.rotation_rate
        );
    }

    if !report.cs_summary.is_empty() {
        println!();
        println!("=== CS STAFF ===");
        for cs in &report.cs_summary {
            println!(
                "  {:<8} wireless {:>4}  wired {:>4}  total {:>4}",
                cs.cs_employee_id, cs.wireless, cs.wired, cs.total
            );
        }
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn flag_values(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
