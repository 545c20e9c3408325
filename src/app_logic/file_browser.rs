/*
 * The desktop integration for "show in file browser". The controller only
 * decides which paths to reveal; an implementation of `FileBrowserOperations`
 * hands them to the platform. The headless front end logs them instead.
 */
use std::path::PathBuf;

pub trait FileBrowserOperations: Send + Sync {
    fn reveal(&self, paths: &[PathBuf]);
}

#[derive(Debug, Default)]
pub struct LoggingFileBrowser {}

impl LoggingFileBrowser {
    pub fn new() -> Self {
        LoggingFileBrowser {}
    }
}

impl FileBrowserOperations for LoggingFileBrowser {
    fn reveal(&self, paths: &[PathBuf]) {
        for path in paths {
            log::info!("FileBrowser: Reveal {path:?}");
        }
    }
}
