use super::file_browser::FileBrowserOperations;
use super::menu_action::{HIDE_LINE_NUMBERS_TITLE, MenuAction, SHOW_LINE_NUMBERS_TITLE};
use crate::core::{
    DEFAULT_FONT_SIZE, DirectoryParserOperations, MenuItemState, NodeId, ParseCompletion,
    ParseOperation, ParsePoll, ParseProgress, ParseStats, ResolutionApplicatorOperations,
    SelectionSnapshot, SettingsOperations, SourceFile, SourceFileResolution,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

pub const DEFAULT_WINDOW_TITLE: &str = "Copyright";
pub const MIN_FONT_SIZE: f64 = 1.0;
const FONT_SIZE_STEP: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Idle,
    Running,
    Finished,
    Cancelled,
}

/*
 * The last component of the imported root. Roots such as "." or "sub/.." name
 * no directory themselves and are resolved against the filesystem first.
 */
fn title_for_root(root: &Path) -> String {
    if let Some(Component::Normal(name)) = root.components().next_back() {
        return name.to_string_lossy().into_owned();
    }
    match fs::canonicalize(root) {
        Ok(resolved) => resolved
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| resolved.display().to_string()),
        Err(err) => {
            log::debug!("WindowController: Cannot resolve title for {root:?}: {err}");
            root.display().to_string()
        }
    }
}

pub(crate) struct ActiveImport {
    pub(crate) generation: u64,
    pub(crate) operation: ParseOperation,
}

pub(crate) struct DeliveredTree {
    pub(crate) generation: u64,
    pub(crate) tree: SourceFile,
}

/*
 * Owns the state of one document window: the imported tree, the import in
 * flight, and the window title. It turns menu actions into changes of that
 * state and of the injected settings, and computes the state of every menu item
 * from the model on request. All of this runs on the UI-owning thread; the only
 * cross-thread handoff is the finished tree of an import, which arrives through
 * the parse operation's completion while `poll_import` runs.
 */
pub struct WindowController {
    pub(crate) tree: Option<SourceFile>,
    pub(crate) root_path: Option<PathBuf>,
    pub(crate) active_import: Option<ActiveImport>,
    pub(crate) import_generation: u64,
    pub(crate) delivered: Rc<RefCell<Option<DeliveredTree>>>,
    pub(crate) window_title: String,
    pub(crate) last_parse_stats: Option<ParseStats>,
    parser: Arc<dyn DirectoryParserOperations>,
    settings: Arc<dyn SettingsOperations>,
    file_browser: Arc<dyn FileBrowserOperations>,
    applicator: Arc<dyn ResolutionApplicatorOperations>,
}

impl WindowController {
    pub fn new(
        parser: Arc<dyn DirectoryParserOperations>,
        settings: Arc<dyn SettingsOperations>,
        file_browser: Arc<dyn FileBrowserOperations>,
        applicator: Arc<dyn ResolutionApplicatorOperations>,
    ) -> Self {
        WindowController {
            tree: None,
            root_path: None,
            active_import: None,
            import_generation: 0,
            delivered: Rc::new(RefCell::new(None)),
            window_title: DEFAULT_WINDOW_TITLE.to_string(),
            last_parse_stats: None,
            parser,
            settings,
            file_browser,
            applicator,
        }
    }

    pub fn tree(&self) -> Option<&SourceFile> {
        self.tree.as_ref()
    }

    pub fn root_path(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    pub fn window_title(&self) -> &str {
        &self.window_title
    }

    /* Progress of the running import; `None` while no import is in flight. */
    pub fn active_progress(&self) -> Option<&ParseProgress> {
        self.active_import
            .as_ref()
            .map(|active| active.operation.progress())
    }

    pub fn last_parse_stats(&self) -> Option<ParseStats> {
        self.last_parse_stats
    }

    pub fn find_node_by_path(&self, path: &Path) -> Option<NodeId> {
        self.tree
            .as_ref()?
            .iter()
            .find(|node| node.path() == path)
            .map(|node| node.id())
    }

    /*
     * Replaces the current document with a fresh import of `root`. The old tree
     * is dropped immediately and any import still running is cancelled, so its
     * result can never reach this window.
     */
    pub fn import_directory(&mut self, root: &Path) -> ParseProgress {
        self.tree = None;
        self.last_parse_stats = None;
        if let Some(previous) = self.active_import.take() {
            log::debug!(
                "WindowController: Cancelling import generation {} in favour of {root:?}.",
                previous.generation
            );
            previous.operation.cancel();
        }

        self.import_generation += 1;
        let generation = self.import_generation;
        self.delivered.borrow_mut().take();
        let inbox = Rc::clone(&self.delivered);
        let completion: ParseCompletion = Box::new(move |tree| {
            *inbox.borrow_mut() = Some(DeliveredTree { generation, tree });
        });

        log::info!("WindowController: Importing {root:?} (generation {generation}).");
        let operation = self.parser.parse_directory(root, Some(completion));
        let progress = operation.progress().clone();
        self.root_path = Some(root.to_path_buf());
        self.active_import = Some(ActiveImport {
            generation,
            operation,
        });
        progress
    }

    /* Drives the running import from the UI loop without blocking. */
    pub fn poll_import(&mut self) -> ImportStatus {
        let outcome = match self.active_import.as_mut() {
            Some(active) => active.operation.poll(),
            None => return ImportStatus::Idle,
        };
        self.finish_import(outcome)
    }

    /* Blocks until the running import has completed or been cancelled. */
    pub fn wait_for_import(&mut self) -> ImportStatus {
        let outcome = match self.active_import.as_mut() {
            Some(active) => active.operation.wait(),
            None => return ImportStatus::Idle,
        };
        self.finish_import(outcome)
    }

    pub fn cancel_import(&mut self) {
        if let Some(active) = self.active_import.as_ref() {
            log::info!(
                "WindowController: Import generation {} cancelled by user.",
                active.generation
            );
            active.operation.cancel();
        }
    }

    fn finish_import(&mut self, outcome: ParsePoll) -> ImportStatus {
        match outcome {
            ParsePoll::Pending => ImportStatus::Running,
            ParsePoll::Cancelled => {
                if let Some(active) = self.active_import.take() {
                    self.last_parse_stats = Some(active.operation.progress().stats());
                }
                ImportStatus::Cancelled
            }
            ParsePoll::Completed => {
                if let Some(active) = self.active_import.take() {
                    self.last_parse_stats = Some(active.operation.progress().stats());
                }
                if self.accept_delivered_tree() {
                    ImportStatus::Finished
                } else {
                    ImportStatus::Cancelled
                }
            }
        }
    }

    /* Stores the delivered tree, unless it belongs to a superseded import. */
    pub(crate) fn accept_delivered_tree(&mut self) -> bool {
        let Some(delivered) = self.delivered.borrow_mut().take() else {
            log::error!("WindowController: Import completed without a delivered tree.");
            return false;
        };
        if delivered.generation != self.import_generation {
            log::debug!(
                "WindowController: Ignoring tree from superseded import generation {}.",
                delivered.generation
            );
            return false;
        }
        self.window_title = title_for_root(delivered.tree.path());
        log::info!(
            "WindowController: Imported {} nodes from {:?}.",
            delivered.tree.node_count(),
            delivered.tree.path()
        );
        self.tree = Some(delivered.tree);
        true
    }

    pub fn handle_menu_action(&mut self, action: MenuAction, snapshot: &SelectionSnapshot) {
        log::debug!("WindowController: Handling {action:?}.");
        match action {
            MenuAction::ShowInFileBrowser => self.show_in_file_browser(snapshot),
            MenuAction::ResetFontSize => self.update_font_size(DEFAULT_FONT_SIZE, 0.0),
            MenuAction::IncreaseFontSize => {
                self.update_font_size(self.settings.font_size(), FONT_SIZE_STEP)
            }
            MenuAction::DecreaseFontSize => {
                self.update_font_size(self.settings.font_size(), -FONT_SIZE_STEP)
            }
            MenuAction::ToggleLineNumbers => {
                let show = !self.settings.show_line_numbers();
                self.settings.set_show_line_numbers(show);
            }
            MenuAction::AddComment
            | MenuAction::ModifyComment
            | MenuAction::DeleteComment
            | MenuAction::IgnoreComment => {
                if let Some(resolution) = action.resolution() {
                    self.apply_resolution(resolution, snapshot);
                }
            }
        }
    }

    /*
     * Computes the state of the menu item for `action`. `tag` is the item's
     * tag, which for comment items is the tag of the resolution they set.
     */
    pub fn validate_menu_item(
        &self,
        action: MenuAction,
        tag: i64,
        snapshot: &SelectionSnapshot,
    ) -> MenuItemState {
        match action {
            MenuAction::ToggleLineNumbers => {
                let title = if self.settings.show_line_numbers() {
                    HIDE_LINE_NUMBERS_TITLE
                } else {
                    SHOW_LINE_NUMBERS_TITLE
                };
                MenuItemState {
                    title: Some(title.to_string()),
                    ..MenuItemState::enabled()
                }
            }
            MenuAction::ShowInFileBrowser => {
                if snapshot.selected.is_empty() {
                    MenuItemState::disabled()
                } else {
                    MenuItemState::enabled()
                }
            }
            MenuAction::AddComment
            | MenuAction::ModifyComment
            | MenuAction::DeleteComment
            | MenuAction::IgnoreComment => match self.tree.as_ref() {
                Some(tree) => {
                    self.applicator
                        .validate_resolution_item(tree, &snapshot.targets(), tag)
                }
                None => MenuItemState::disabled(),
            },
            MenuAction::ResetFontSize
            | MenuAction::IncreaseFontSize
            | MenuAction::DecreaseFontSize => MenuItemState::enabled(),
        }
    }

    fn update_font_size(&self, initial: f64, delta: f64) {
        let size = (initial + delta).max(MIN_FONT_SIZE);
        self.settings.set_font_size(size);
        log::debug!("WindowController: Font size is now {size}.");
    }

    fn show_in_file_browser(&self, snapshot: &SelectionSnapshot) {
        let Some(tree) = self.tree.as_ref() else {
            return;
        };
        let paths = SourceFile::paths_of(snapshot.selected.iter().filter_map(|id| tree.find(*id)));
        if paths.is_empty() {
            return;
        }
        self.file_browser.reveal(&paths);
    }

    /*
     * Sets `resolution` on the nodes the snapshot targets. Returns how many
     * nodes were changed. The comment actions go through here, and so can any
     * resolution (including `none`) that has no menu item.
     */
    pub fn apply_resolution(
        &mut self,
        resolution: SourceFileResolution,
        snapshot: &SelectionSnapshot,
    ) -> usize {
        let targets = snapshot.targets();
        if targets.is_empty() {
            return 0;
        }
        let Some(tree) = self.tree.as_mut() else {
            log::warn!("WindowController: No tree loaded; '{resolution}' not applied.");
            return 0;
        };
        self.applicator.apply_resolution(tree, &targets, resolution)
    }
}
