// src/exec/frontend.rs

//! Per-panel views of an executor.
//!
//! A frontend owns only presentation state (its surface and the geometry
//! last measured on it). Text, icon and tooltip always come from the
//! backend and are handed in on every refresh.

use std::fmt;

use super::ExecutorId;
use super::parser::Content;

/// Index of a frontend in the registry's frontend table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrontendId(pub(crate) usize);

/// Layout measured by a surface for some content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    pub icon_x: i32,
    pub text_x: i32,
    pub width: i32,
    pub height: i32,
}

/// Rendering collaborator. The executor core never draws; it only asks a
/// surface to measure content, toggle visibility and redraw later.
pub trait Surface {
    fn measure(&self, content: &Content) -> Geometry;

    fn set_visible(&mut self, visible: bool);

    /// Mark the surface dirty with new content.
    ///
    /// `tooltip` is rendered at broadcast time. A status tooltip ("finished
    /// 3s ago", "next update in 27s") is not refreshed between broadcasts,
    /// so its relative times are only exact at the moment of the call.
    fn schedule_redraw(&mut self, content: &Content, tooltip: Option<&str>, geometry: &Geometry);
}

/// Creates surfaces for executors placed on a panel.
pub trait SurfaceFactory {
    fn create(&self, panel: usize, executor: &str) -> Box<dyn Surface>;
}

/// Pointer position of a click, relative to the surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pointer {
    pub x: i32,
    pub y: i32,
}

pub struct Frontend {
    pub(crate) backend: ExecutorId,
    pub(crate) panel: usize,
    /// `None` for placeholders on panels whose monitor the executor is not
    /// shown on.
    surface: Option<Box<dyn Surface>>,
    geometry: Geometry,
    /// `None` until the first refresh.
    visible: Option<bool>,
}

impl fmt::Debug for Frontend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frontend")
            .field("backend", &self.backend)
            .field("panel", &self.panel)
            .field("placeholder", &self.surface.is_none())
            .field("geometry", &self.geometry)
            .field("visible", &self.visible)
            .finish()
    }
}

impl Frontend {
    pub fn new(backend: ExecutorId, panel: usize, surface: Box<dyn Surface>) -> Self {
        Self {
            backend,
            panel,
            surface: Some(surface),
            geometry: Geometry::default(),
            visible: None,
        }
    }

    pub fn placeholder(backend: ExecutorId, panel: usize) -> Self {
        Self {
            backend,
            panel,
            surface: None,
            geometry: Geometry::default(),
            visible: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.surface.is_none()
    }

    pub fn backend(&self) -> ExecutorId {
        self.backend
    }

    pub fn panel(&self) -> usize {
        self.panel
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn is_visible(&self) -> bool {
        self.visible == Some(true)
    }

    /// Recompute geometry for `content` and ask the surface to redraw.
    /// Empty content hides the surface instead.
    pub fn refresh(&mut self, content: &Content, tooltip: Option<&str>) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        if content.is_empty() {
            if self.visible != Some(false) {
                surface.set_visible(false);
                self.visible = Some(false);
            }
            self.geometry = Geometry::default();
            return;
        }

        self.geometry = surface.measure(content);
        if self.visible != Some(true) {
            surface.set_visible(true);
            self.visible = Some(true);
        }
        surface.schedule_redraw(content, tooltip, &self.geometry);
    }

    /// Environment handed to click commands.
    pub fn click_env(&self, pointer: Pointer) -> Vec<(&'static str, String)> {
        vec![
            ("EXECP_X", pointer.x.to_string()),
            ("EXECP_Y", pointer.y.to_string()),
            ("EXECP_W", self.geometry.width.to_string()),
            ("EXECP_H", self.geometry.height.to_string()),
        ]
    }
}
