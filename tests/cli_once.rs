// tests/cli_once.rs

mod common;

use std::error::Error;
use std::fs;

use clap::Parser;

use common::{init_tracing, with_timeout};
use execbar::cli::CliArgs;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn once_runs_every_executor_and_returns() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("ran");
    let config = dir.path().join("execbar.toml");
    let socket = dir.path().join("execbar.sock");
    fs::write(
        &config,
        format!(
            r#"
[[item]]
kind = "executor"
name = "marker"
command = "echo ran > {}; echo ok"
interval = 5
"#,
            marker.display()
        ),
    )?;

    let args = CliArgs::try_parse_from([
        "execbar",
        "--config",
        &config.display().to_string(),
        "--socket",
        &socket.display().to_string(),
        "--once",
    ])?;

    with_timeout(execbar::run(args)).await?;

    assert_eq!(fs::read_to_string(&marker)?.trim(), "ran");
    assert!(!socket.exists(), "socket is removed on exit");
    Ok(())
}

#[tokio::test]
async fn dry_run_starts_nothing() -> TestResult {
    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("ran");
    let config = dir.path().join("execbar.toml");
    fs::write(
        &config,
        format!(
            r#"
[[item]]
kind = "executor"
name = "marker"
command = "touch {}"
"#,
            marker.display()
        ),
    )?;

    let args = CliArgs::try_parse_from([
        "execbar",
        "--config",
        &config.display().to_string(),
        "--dry-run",
    ])?;
    execbar::run(args).await?;

    assert!(!marker.exists());
    Ok(())
}
