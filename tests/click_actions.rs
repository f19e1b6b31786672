// tests/click_actions.rs

mod common;

use std::error::Error;
use std::fs;

use common::{
    ConfigFileBuilder, ExecutorConfigBuilder, backend, recording_runtime, shows, with_timeout,
};
use execbar::engine::RuntimeOptions;
use execbar::errors::ExecbarError;
use execbar::exec::{ClickOutcome, Pointer};
use execbar::types::{MouseButton, Sink};

type TestResult = Result<(), Box<dyn Error>>;

const TICKER: &str = "while true; do echo tick; sleep 0.05; done";

#[tokio::test]
async fn spawned_click_commands_are_tracked_until_they_exit() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_executor(
            ExecutorConfigBuilder::new("launcher", "echo menu")
                .interval(0)
                .refresh_after_click(false)
                .on_click(MouseButton::Left, "sleep 0.2", Sink::Spawn)
                .build(),
        )
        .with_executor(ExecutorConfigBuilder::new("ticker", TICKER).continuous(1).build())
        .build();
    let (mut rt, _log, _tx) = recording_runtime(&cfg, RuntimeOptions::default());

    with_timeout(rt.run_until(|r| shows("launcher", "menu")(r) && shows("ticker", "tick")(r)))
        .await;

    let outcome = rt.click("launcher", 0, MouseButton::Left, Pointer::default())?;
    let ClickOutcome::Spawned(pid) = outcome else {
        panic!("expected a spawned click command, got {outcome:?}");
    };
    assert_eq!(backend(rt.registry(), "launcher").click_pids(), vec![pid]);

    // The continuous executor keeps producing output meanwhile; its exit
    // notifications must not release the click child early.
    with_timeout(rt.run_until(|r| backend(r, "launcher").click_pids().is_empty())).await;

    let launcher = backend(rt.registry(), "launcher");
    assert!(!launcher.is_running(), "refresh_after_click is off");
    assert!(backend(rt.registry(), "ticker").is_running());
    Ok(())
}

#[tokio::test]
async fn finished_click_command_refreshes_the_executor() -> TestResult {
    let dir = tempfile::tempdir()?;
    let counter = dir.path().join("runs");
    let cmd = format!("echo run >> {0}; wc -l < {0} | tr -d ' '", counter.display());

    let cfg = ConfigFileBuilder::new()
        .with_executor(
            ExecutorConfigBuilder::new("volume", &cmd)
                .interval(0)
                .on_click(MouseButton::WheelUp, "true", Sink::Spawn)
                .build(),
        )
        .build();
    let (mut rt, _log, _tx) = recording_runtime(&cfg, RuntimeOptions::default());

    with_timeout(rt.run_until(shows("volume", "1"))).await;
    rt.click("volume", 0, MouseButton::WheelUp, Pointer::default())?;

    with_timeout(rt.run_until(shows("volume", "2"))).await;
    Ok(())
}

#[tokio::test]
async fn click_commands_see_pointer_and_geometry() -> TestResult {
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("env");
    let on_click = format!(
        "echo $EXECP_X $EXECP_Y $EXECP_W $EXECP_H > {}",
        out.display()
    );

    let cfg = ConfigFileBuilder::new()
        .with_executor(
            ExecutorConfigBuilder::new("menu", "echo hello")
                .interval(0)
                .refresh_after_click(false)
                .on_click(MouseButton::Left, &on_click, Sink::Spawn)
                .build(),
        )
        .build();
    let (mut rt, _log, _tx) = recording_runtime(&cfg, RuntimeOptions::default());

    with_timeout(rt.run_until(shows("menu", "hello"))).await;
    rt.click("menu", 0, MouseButton::Left, Pointer { x: 3, y: 1 })?;
    with_timeout(rt.run_until(|r| backend(r, "menu").click_pids().is_empty())).await;

    // The recording surface measures one column per character.
    assert_eq!(fs::read_to_string(&out)?.trim(), "3 1 5 1");
    Ok(())
}

#[tokio::test]
async fn unbound_buttons_force_an_update() -> TestResult {
    let dir = tempfile::tempdir()?;
    let counter = dir.path().join("runs");
    let cmd = format!("echo run >> {0}; wc -l < {0} | tr -d ' '", counter.display());

    let cfg = ConfigFileBuilder::new()
        .with_executor(ExecutorConfigBuilder::new("mail", &cmd).interval(0).build())
        .build();
    let (mut rt, _log, _tx) = recording_runtime(&cfg, RuntimeOptions::default());

    with_timeout(rt.run_until(|r| shows("mail", "1")(r) && !backend(r, "mail").is_running()))
        .await;

    let outcome = rt.click("mail", 0, MouseButton::Right, Pointer::default())?;
    assert_eq!(outcome, ClickOutcome::Refresh);
    assert!(backend(rt.registry(), "mail").is_running());

    with_timeout(rt.run_until(shows("mail", "2"))).await;
    Ok(())
}

#[tokio::test]
async fn stdin_clicks_need_a_running_continuous_command() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_executor(
            ExecutorConfigBuilder::new("oneshot", "echo once")
                .interval(0)
                .on_click(MouseButton::Left, "next", Sink::Stdin)
                .build(),
        )
        .build();
    let (mut rt, _log, _tx) = recording_runtime(&cfg, RuntimeOptions::default());

    with_timeout(rt.run_until(shows("oneshot", "once"))).await;

    let err = rt
        .click("oneshot", 0, MouseButton::Left, Pointer::default())
        .unwrap_err();
    assert!(matches!(err, ExecbarError::NotInteractive(ref name) if name == "oneshot"));
    Ok(())
}

#[tokio::test]
async fn stdin_clicks_reach_the_running_command() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_executor(
            ExecutorConfigBuilder::new("echoer", "while read line; do echo \"got $line\"; done")
                .continuous(1)
                .on_click(MouseButton::Middle, "ping", Sink::Stdin)
                .build(),
        )
        .build();
    let (mut rt, _log, _tx) = recording_runtime(&cfg, RuntimeOptions::default());

    with_timeout(rt.run_until(|r| backend(r, "echoer").is_running())).await;

    let outcome = rt.click("echoer", 0, MouseButton::Middle, Pointer::default())?;
    let ClickOutcome::WroteStdin(written) = outcome else {
        panic!("expected a stdin write, got {outcome:?}");
    };
    assert_eq!(written.written, "ping\n".len());
    assert_eq!(written.dropped, 0);

    with_timeout(rt.run_until(shows("echoer", "got ping"))).await;
    Ok(())
}

#[tokio::test]
async fn shared_sinks_are_rejected() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_executor(
            ExecutorConfigBuilder::new("fancy", "echo f")
                .interval(0)
                .on_click(MouseButton::Left, "x", Sink::Shared(3))
                .build(),
        )
        .build();
    let (mut rt, _log, _tx) = recording_runtime(&cfg, RuntimeOptions::default());

    let err = rt
        .click("fancy", 0, MouseButton::Left, Pointer::default())
        .unwrap_err();
    assert!(matches!(err, ExecbarError::UnsupportedSink { sink: 3, .. }));
    Ok(())
}
