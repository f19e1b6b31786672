// src/display.rs

//! Plain-text surface used by the `execbar` binary.
//!
//! Each redraw prints one line to STDOUT:
//!
//! ```text
//! panel 0 | clock: 12:30:01
//! panel 0 | mail: (hidden)
//! ```

use std::io::{self, Write};

use crate::exec::{Content, Geometry, Surface, SurfaceFactory};

/// Width of an icon, in character cells.
const ICON_CELLS: i32 = 2;

#[derive(Debug)]
pub struct ConsoleSurface {
    panel: usize,
    executor: String,
}

impl ConsoleSurface {
    pub fn new(panel: usize, executor: impl Into<String>) -> Self {
        Self {
            panel,
            executor: executor.into(),
        }
    }

    fn emit(&self, body: &str) {
        let mut out = io::stdout().lock();
        // A closed stdout is not worth taking the panel down for.
        let _ = writeln!(out, "panel {} | {}: {}", self.panel, self.executor, body);
        let _ = out.flush();
    }
}

/// Lay out `content` in character cells: icon first, then the widest line.
pub fn measure_cells(content: &Content) -> Geometry {
    let icon = if content.icon.is_some() { ICON_CELLS } else { 0 };
    let text_x = if icon > 0 && !content.text.is_empty() {
        icon + 1
    } else {
        icon
    };
    let lines: Vec<&str> = content.text.lines().collect();
    let widest = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    let width = text_x + i32::try_from(widest).unwrap_or(i32::MAX - text_x);
    Geometry {
        icon_x: 0,
        text_x,
        width,
        height: i32::try_from(lines.len().max(1)).unwrap_or(1),
    }
}

impl Surface for ConsoleSurface {
    fn measure(&self, content: &Content) -> Geometry {
        measure_cells(content)
    }

    fn set_visible(&mut self, visible: bool) {
        if !visible {
            self.emit("(hidden)");
        }
    }

    fn schedule_redraw(&mut self, content: &Content, _tooltip: Option<&str>, _geometry: &Geometry) {
        let text = content.text.replace('\n', " / ");
        match &content.icon {
            Some(icon) => self.emit(&format!("[{}] {}", icon.display(), text)),
            None => self.emit(&text),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSurfaceFactory;

impl SurfaceFactory for ConsoleSurfaceFactory {
    fn create(&self, panel: usize, executor: &str) -> Box<dyn Surface> {
        Box::new(ConsoleSurface::new(panel, executor))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn geometry_counts_cells_and_reserves_icon_space() {
        let g = measure_cells(&Content {
            text: "ab\nlonger".into(),
            ..Content::default()
        });
        assert_eq!(g, Geometry { icon_x: 0, text_x: 0, width: 6, height: 2 });

        let g = measure_cells(&Content {
            text: "hi".into(),
            icon: Some(PathBuf::from("/i.png")),
            markup: false,
        });
        assert_eq!(g.text_x, 3);
        assert_eq!(g.width, 5);
    }
}
