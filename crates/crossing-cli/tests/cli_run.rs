// Purpose: Integration tests for the crossing command-line runner.

use std::fs;

use anyhow::Result;
use clap::Parser;
use crossing_cli::{execute, Cli};
use tempfile::tempdir;

#[tokio::test]
async fn test_run_writes_event_log_and_report() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("trains.txt");
    let output = dir.path().join("output.txt");
    let report_path = dir.path().join("report.json");
    fs::write(&input, "E 2 3\nw 1 1\ne 0 1\n")?;

    let cli = Cli::try_parse_from([
        "crossing",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
        "--time-unit-ms",
        "5",
        "--report",
        report_path.to_str().unwrap(),
    ])?;
    let report = execute(cli).await?;
    assert_eq!(report.admissions.len(), 3);

    let log = fs::read_to_string(&output)?;
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 9);
    let expected: Vec<String> = report.events.iter().map(|e| e.to_string()).collect();
    assert_eq!(lines, expected);
    assert_eq!(lines.iter().filter(|l| l.contains("is ready to go")).count(), 3);
    assert_eq!(lines.iter().filter(|l| l.contains("is ON the main track")).count(), 3);

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
    assert_eq!(json["admissions"].as_array().map(|a| a.len()), Some(3));
    Ok(())
}

#[tokio::test]
async fn test_capacity_overflow_runs_accepted_trains() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("trains.txt");
    let output = dir.path().join("output.txt");
    fs::write(&input, "e 1 1\nw 1 1\nE 1 1\n")?;

    let cli = Cli::try_parse_from([
        "crossing",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--max-trains",
        "2",
        "--time-unit-ms",
        "1",
    ])?;
    let report = execute(cli).await?;
    assert_eq!(report.trains.len(), 2);
    assert_eq!(fs::read_to_string(&output)?.lines().count(), 6);
    Ok(())
}

#[tokio::test]
async fn test_config_file_and_overrides() -> Result<()> {
    let dir = tempdir()?;
    let config_path = dir.path().join("crossing.toml");
    fs::write(&config_path, "max_trains = 7\ntime_unit_ms = 20\nstarvation_cap = 3\n")?;

    let cli = Cli::try_parse_from([
        "crossing",
        "unused.txt",
        "--config",
        config_path.to_str().unwrap(),
        "--time-unit-ms",
        "2",
    ])?;
    let config = cli.resolve_config()?;
    assert_eq!(config.max_trains, 7);
    assert_eq!(config.time_unit_ms, 2);
    assert_eq!(config.starvation_cap, 3);
    Ok(())
}

#[tokio::test]
async fn test_malformed_input_runs_the_well_formed_prefix() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("trains.txt");
    let output = dir.path().join("output.txt");
    fs::write(&input, "E 2 3\nw 1 1\nq 1 1\ne 1 1\n")?;

    let cli = Cli::try_parse_from([
        "crossing",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--time-unit-ms",
        "1",
    ])?;
    let loaded = cli.load_trains(&cli.resolve_config()?)?;
    let warnings = loaded.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("record #2"));

    let report = execute(cli).await?;
    let mut crossed: Vec<usize> = report.admission_order().iter().map(|id| id.0).collect();
    crossed.sort_unstable();
    assert_eq!(crossed, vec![0, 1]);
    assert_eq!(fs::read_to_string(&output)?.lines().count(), 6);
    Ok(())
}
