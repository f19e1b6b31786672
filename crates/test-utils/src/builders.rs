#![allow(dead_code)]

use execbar::config::{
    ConfigFile, ExecutorConfig, MouseAction, PanelConfig, PanelItem, RawConfigFile,
};
use execbar::types::{MouseButton, Sink};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_panel(mut self, monitor: u32) -> Self {
        self.config.panel.push(PanelConfig { monitor });
        self
    }

    pub fn with_executor(mut self, exec: ExecutorConfig) -> Self {
        self.config.item.push(PanelItem::Executor(exec));
        self
    }

    pub fn with_separator(mut self) -> Self {
        self.config.item.push(PanelItem::Separator);
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ExecutorConfig`.
pub struct ExecutorConfigBuilder {
    exec: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            exec: ExecutorConfig::new(name, command),
        }
    }

    pub fn interval(mut self, secs: u64) -> Self {
        self.exec.interval = secs;
        self
    }

    pub fn continuous(mut self, lines: usize) -> Self {
        self.exec.continuous = lines;
        self
    }

    pub fn has_icon(mut self, val: bool) -> Self {
        self.exec.has_icon = val;
        self
    }

    pub fn markup(mut self, val: bool) -> Self {
        self.exec.markup = val;
        self
    }

    pub fn monitor(mut self, monitor: u32) -> Self {
        self.exec.monitor = Some(monitor);
        self
    }

    pub fn tooltip(mut self, text: &str) -> Self {
        self.exec.tooltip = Some(text.to_string());
        self
    }

    pub fn refresh_after_click(mut self, val: bool) -> Self {
        self.exec.refresh_after_click = val;
        self
    }

    pub fn on_click(mut self, button: MouseButton, command: &str, sink: Sink) -> Self {
        self.exec.on_click.set(
            button,
            MouseAction {
                command: command.to_string(),
                sink,
            },
        );
        self
    }

    pub fn build(self) -> ExecutorConfig {
        self.exec
    }
}
