use std::sync::{Arc, Mutex};

use execbar::exec::{Content, Geometry, Surface, SurfaceFactory};

/// Something a surface was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    Visible(bool),
    Redraw {
        content: Content,
        tooltip: Option<String>,
    },
}

/// One recorded call, tagged with the surface it went to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub panel: usize,
    pub executor: String,
    pub call: SurfaceCall,
}

/// Shared log of every surface call made through a [`RecordingFactory`].
#[derive(Debug, Clone, Default)]
pub struct SurfaceLog(Arc<Mutex<Vec<Recorded>>>);

impl SurfaceLog {
    pub fn calls(&self) -> Vec<Recorded> {
        self.0.lock().unwrap().clone()
    }

    /// Redraws of `executor` on `panel`, oldest first.
    pub fn redraws(&self, panel: usize, executor: &str) -> Vec<Content> {
        self.calls()
            .into_iter()
            .filter(|r| r.panel == panel && r.executor == executor)
            .filter_map(|r| match r.call {
                SurfaceCall::Redraw { content, .. } => Some(content),
                SurfaceCall::Visible(_) => None,
            })
            .collect()
    }

    /// Last tooltip handed to `executor` on `panel`.
    pub fn last_tooltip(&self, panel: usize, executor: &str) -> Option<String> {
        self.calls()
            .into_iter()
            .rev()
            .filter(|r| r.panel == panel && r.executor == executor)
            .find_map(|r| match r.call {
                SurfaceCall::Redraw { tooltip, .. } => tooltip,
                SurfaceCall::Visible(_) => None,
            })
    }

    /// Last visibility change of `executor` on `panel`.
    pub fn last_visibility(&self, panel: usize, executor: &str) -> Option<bool> {
        self.calls()
            .into_iter()
            .rev()
            .filter(|r| r.panel == panel && r.executor == executor)
            .find_map(|r| match r.call {
                SurfaceCall::Visible(v) => Some(v),
                SurfaceCall::Redraw { .. } => None,
            })
    }

    fn push(&self, panel: usize, executor: &str, call: SurfaceCall) {
        self.0.lock().unwrap().push(Recorded {
            panel,
            executor: executor.to_string(),
            call,
        });
    }
}

/// Surface that records calls instead of drawing. Each text line counts as
/// one row and every character as one column.
pub struct RecordingSurface {
    panel: usize,
    executor: String,
    log: SurfaceLog,
}

impl Surface for RecordingSurface {
    fn measure(&self, content: &Content) -> Geometry {
        let width = content.text.lines().map(|l| l.len()).max().unwrap_or(0) as i32;
        let height = content.text.lines().count().max(1) as i32;
        Geometry {
            icon_x: 0,
            text_x: if content.icon.is_some() { 2 } else { 0 },
            width,
            height,
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.log
            .push(self.panel, &self.executor, SurfaceCall::Visible(visible));
    }

    fn schedule_redraw(&mut self, content: &Content, tooltip: Option<&str>, _geometry: &Geometry) {
        self.log.push(
            self.panel,
            &self.executor,
            SurfaceCall::Redraw {
                content: content.clone(),
                tooltip: tooltip.map(str::to_string),
            },
        );
    }
}

/// Factory handing out [`RecordingSurface`]s that all share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingFactory {
    log: SurfaceLog,
}

impl RecordingFactory {
    /// A factory plus a handle on the log its surfaces write to.
    pub fn with_log() -> (Self, SurfaceLog) {
        let log = SurfaceLog::default();
        (Self { log: log.clone() }, log)
    }
}

impl SurfaceFactory for RecordingFactory {
    fn create(&self, panel: usize, executor: &str) -> Box<dyn Surface> {
        Box::new(RecordingSurface {
            panel,
            executor: executor.to_string(),
            log: self.log.clone(),
        })
    }
}
