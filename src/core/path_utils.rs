/*
 * Path helpers shared by the settings store and the command line front end:
 * locating the per-user configuration directory, and resolving user supplied
 * paths against an imported root.
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Component, Path, PathBuf};

/*
 * Returns the local (non-roaming) configuration directory for `app_name`,
 * creating it when missing. `None` means the platform offers no such
 * directory or it could not be created.
 */
pub fn app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", app_name)?;
    let config_dir = project_dirs.config_local_dir();
    if !config_dir.exists() {
        if let Err(err) = fs::create_dir_all(config_dir) {
            log::error!("PathUtils: Failed to create config directory {config_dir:?}: {err}");
            return None;
        }
        log::debug!("PathUtils: Created config directory {config_dir:?}");
    }
    Some(config_dir.to_path_buf())
}

/*
 * Joins a user supplied relative path onto `root`, dropping "." components so
 * the result compares equal to the paths the directory parser produces.
 * Absolute inputs are taken as is.
 */
pub fn join_relative(root: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        return relative.to_path_buf();
    }
    let mut joined = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            other => joined.push(other.as_os_str()),
        }
    }
    joined
}
