// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::{MouseButton, Sink};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [[panel]]
/// monitor = 0
///
/// [[item]]
/// kind = "executor"
/// name = "clock"
/// command = "date +%H:%M:%S"
/// interval = 1
///
/// [[item]]
/// kind = "separator"
/// ```
///
/// Panel items form one ordered list of tagged entries, so the position of an
/// executor on the panel is simply its position in `item`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// On-screen panel instances from `[[panel]]`.
    #[serde(default)]
    pub panel: Vec<PanelConfig>,

    /// Panel items, in layout order, from `[[item]]`.
    #[serde(default)]
    pub item: Vec<PanelItem>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub panel: Vec<PanelConfig>,
    pub item: Vec<PanelItem>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(panel: Vec<PanelConfig>, item: Vec<PanelItem>) -> Self {
        Self { panel, item }
    }

    /// Executor configs in layout order.
    pub fn executors(&self) -> impl Iterator<Item = &ExecutorConfig> {
        self.item.iter().filter_map(|item| match item {
            PanelItem::Executor(cfg) => Some(cfg),
            PanelItem::Separator => None,
        })
    }
}

/// `[[panel]]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PanelConfig {
    /// Monitor this panel instance lives on.
    #[serde(default)]
    pub monitor: u32,
}

/// One `[[item]]` entry, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PanelItem {
    Executor(ExecutorConfig),
    /// Pure layout item; carries no executor state.
    Separator,
}

/// `[[item]] kind = "executor"` section. Immutable after load.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    /// Name used by `execbar refresh <name>` and in logs.
    pub name: String,

    /// Shell command, run as `/bin/sh -c <command>`.
    pub command: String,

    /// Seconds between the end of one run and the start of the next.
    /// `0` runs the command once.
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// `0` for one-shot commands; `N > 0` for long-running commands that
    /// print their output in chunks of `N` lines.
    #[serde(default)]
    pub continuous: usize,

    /// If true, the first output line is an icon path.
    #[serde(default)]
    pub has_icon: bool,

    /// Whether the text contains markup. Passed through to the surface.
    #[serde(default)]
    pub markup: bool,

    /// Restrict the executor to panels on this monitor.
    #[serde(default)]
    pub monitor: Option<u32>,

    /// Fixed tooltip; when set, stderr is not used as the tooltip.
    #[serde(default)]
    pub tooltip: Option<String>,

    /// Re-run the command after a click-spawned process exits.
    #[serde(default = "default_true")]
    pub refresh_after_click: bool,

    #[serde(default)]
    pub on_click: MouseBindings,
}

fn default_interval() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl ExecutorConfig {
    /// Minimal config with defaults for everything but name and command.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            interval: default_interval(),
            continuous: 0,
            has_icon: false,
            markup: false,
            monitor: None,
            tooltip: None,
            refresh_after_click: true,
            on_click: MouseBindings::default(),
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous > 0
    }

    /// Delay before the next polling run, or `None` if the executor runs once.
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.interval > 0).then(|| Duration::from_secs(self.interval))
    }

    /// A stdin pipe is only created for executors that route a click into it.
    pub fn needs_stdin(&self) -> bool {
        self.on_click
            .iter()
            .any(|(_, action)| action.sink == Sink::Stdin)
    }

    pub fn shows_on_monitor(&self, monitor: u32) -> bool {
        self.monitor.is_none_or(|m| m == monitor)
    }
}

/// `[item.on_click]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MouseBindings {
    #[serde(default)]
    pub left: Option<MouseAction>,
    #[serde(default)]
    pub middle: Option<MouseAction>,
    #[serde(default)]
    pub right: Option<MouseAction>,
    #[serde(default)]
    pub wheel_up: Option<MouseAction>,
    #[serde(default)]
    pub wheel_down: Option<MouseAction>,
}

impl MouseBindings {
    pub fn get(&self, button: MouseButton) -> Option<&MouseAction> {
        match button {
            MouseButton::Left => self.left.as_ref(),
            MouseButton::Middle => self.middle.as_ref(),
            MouseButton::Right => self.right.as_ref(),
            MouseButton::WheelUp => self.wheel_up.as_ref(),
            MouseButton::WheelDown => self.wheel_down.as_ref(),
        }
    }

    pub fn set(&mut self, button: MouseButton, action: MouseAction) {
        let slot = match button {
            MouseButton::Left => &mut self.left,
            MouseButton::Middle => &mut self.middle,
            MouseButton::Right => &mut self.right,
            MouseButton::WheelUp => &mut self.wheel_up,
            MouseButton::WheelDown => &mut self.wheel_down,
        };
        *slot = Some(action);
    }

    /// Bound actions in button order.
    pub fn iter(&self) -> impl Iterator<Item = (MouseButton, &MouseAction)> {
        [
            MouseButton::Left,
            MouseButton::Middle,
            MouseButton::Right,
            MouseButton::WheelUp,
            MouseButton::WheelDown,
        ]
        .into_iter()
        .filter_map(|b| self.get(b).map(|a| (b, a)))
    }
}

/// A command bound to a pointer button.
#[derive(Debug, Clone, Deserialize)]
pub struct MouseAction {
    pub command: String,
    #[serde(default)]
    pub sink: Sink,
}
