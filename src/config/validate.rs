// src/config/validate.rs

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::config::model::{ConfigFile, PanelConfig, PanelItem, RawConfigFile};
use crate::errors::{ExecbarError, Result};
use crate::types::Sink;

/// Executor names travel over the control socket as a single word.
static EXECUTOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]{1,20}$").expect("valid executor name regex"));

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ExecbarError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        if raw.panel.is_empty() {
            raw.panel.push(PanelConfig::default());
        }
        Ok(ConfigFile::new_unchecked(raw.panel, raw.item))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_executor_names(cfg)?;
    validate_commands(cfg)?;
    warn_on_unreachable_sinks(cfg);
    Ok(())
}

fn validate_executor_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for item in cfg.item.iter() {
        let PanelItem::Executor(exec) = item else {
            continue;
        };
        if !EXECUTOR_NAME.is_match(&exec.name) {
            return Err(ExecbarError::ConfigError(format!(
                "executor name '{}' must be 1-20 characters of [A-Za-z0-9_.-]",
                exec.name
            )));
        }
        if !seen.insert(exec.name.as_str()) {
            return Err(ExecbarError::ConfigError(format!(
                "executor name '{}' is used more than once",
                exec.name
            )));
        }
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for item in cfg.item.iter() {
        let PanelItem::Executor(exec) = item else {
            continue;
        };
        if exec.command.trim().is_empty() {
            return Err(ExecbarError::ConfigError(format!(
                "executor '{}' has an empty `command`",
                exec.name
            )));
        }
        for (button, action) in exec.on_click.iter() {
            if action.command.trim().is_empty() {
                return Err(ExecbarError::ConfigError(format!(
                    "executor '{}' has an empty command bound to the {} button",
                    exec.name, button
                )));
            }
        }
    }
    Ok(())
}

fn warn_on_unreachable_sinks(cfg: &RawConfigFile) {
    for item in cfg.item.iter() {
        let PanelItem::Executor(exec) = item else {
            continue;
        };
        for (button, action) in exec.on_click.iter() {
            if action.sink == Sink::Stdin && !exec.is_continuous() {
                warn!(
                    executor = %exec.name,
                    %button,
                    "sink 0 needs a continuous executor; clicks on this button will be rejected"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::parse_and_validate;
    use crate::errors::ExecbarError;

    #[test]
    fn missing_panels_default_to_one_on_monitor_zero() {
        let cfg = parse_and_validate(
            r#"
[[item]]
kind = "executor"
name = "clock"
command = "date"
"#,
        )
        .unwrap();
        assert_eq!(cfg.panel.len(), 1);
        assert_eq!(cfg.panel[0].monitor, 0);
        assert_eq!(cfg.executors().count(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = parse_and_validate(
            r#"
[[item]]
kind = "executor"
name = "a"
command = "true"

[[item]]
kind = "executor"
name = "a"
command = "false"
"#,
        )
        .unwrap_err();
        match err {
            ExecbarError::ConfigError(msg) => assert!(msg.contains("more than once")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn names_with_spaces_are_rejected() {
        let err = parse_and_validate(
            r#"
[[item]]
kind = "executor"
name = "two words"
command = "true"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExecbarError::ConfigError(_)));
    }

    #[test]
    fn sink_below_minus_one_fails_to_parse() {
        let err = parse_and_validate(
            r#"
[[item]]
kind = "executor"
name = "a"
command = "true"

[item.on_click.left]
command = "echo hi"
sink = -5
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ExecbarError::TomlError(_)));
    }
}
