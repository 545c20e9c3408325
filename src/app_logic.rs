/*
 * This module provides the application logic layer, centered around
 * `WindowController`, which owns the document state of one window and handles
 * its menu actions independently of any UI toolkit.
 * Unit tests for `WindowController` are in `window_controller_tests.rs`.
 */
pub mod file_browser;
pub mod menu_action;
pub mod window_controller;

#[cfg(test)]
mod window_controller_tests;

pub use file_browser::{FileBrowserOperations, LoggingFileBrowser};
pub use menu_action::MenuAction;
pub use window_controller::{ImportStatus, WindowController};
