#![allow(dead_code)]

pub use execbar_test_utils::builders::{ConfigFileBuilder, ExecutorConfigBuilder};
pub use execbar_test_utils::recording::{RecordingFactory, SurfaceLog};
pub use execbar_test_utils::{init_tracing, with_timeout};

use execbar::config::ConfigFile;
use execbar::engine::{ControlEvent, Runtime, RuntimeOptions};
use execbar::exec::{Backend, Registry};
use tokio::sync::mpsc;

/// A runtime over `cfg` drawing into a recording log.
///
/// The control sender is returned so the channel stays open for the whole
/// test.
pub fn recording_runtime(
    cfg: &ConfigFile,
    options: RuntimeOptions,
) -> (Runtime, SurfaceLog, mpsc::Sender<ControlEvent>) {
    init_tracing();
    let (factory, log) = RecordingFactory::with_log();
    let (tx, rx) = mpsc::channel(16);
    let runtime = Runtime::new(cfg, Box::new(factory), rx, options).expect("runtime");
    (runtime, log, tx)
}

/// Backend `name`, which must exist.
pub fn backend<'a>(registry: &'a Registry, name: &str) -> &'a Backend {
    registry
        .by_name(name)
        .unwrap_or_else(|| panic!("no executor named {name}"))
}

/// Predicate: executor `name` currently shows `text`.
pub fn shows<'a>(name: &'a str, text: &'a str) -> impl FnMut(&Registry) -> bool + 'a {
    move |r| backend(r, name).content().text == text
}
