use super::file_browser::FileBrowserOperations;
use super::menu_action::{HIDE_LINE_NUMBERS_TITLE, MenuAction, SHOW_LINE_NUMBERS_TITLE};
use super::window_controller::*;

use crate::core::{
    CoreDirectoryParser, CoreResolutionApplicator, DEFAULT_FONT_SIZE, DirectoryParserOperations,
    InMemorySettings, MenuItemState, NodeId, ParseCompletion, ParseOperation, ParseProgress,
    SelectionSnapshot, SettingsOperations, SourceFile, SourceFileResolution,
};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::tempdir;

/*
 * Unit tests for `WindowController`. The directory parser is replaced by a mock
 * that hands out operations whose trees the test delivers by hand, so import
 * ordering and cancellation can be driven deterministically.
 */

// --- Mock Structures (DirectoryParser, FileBrowser) ---
struct PendingParse {
    root: PathBuf,
    sender: Sender<SourceFile>,
    progress: ParseProgress,
}

struct MockDirectoryParser {
    pending: Mutex<Vec<PendingParse>>,
}

impl MockDirectoryParser {
    fn new() -> Self {
        MockDirectoryParser {
            pending: Mutex::new(Vec::new()),
        }
    }

    fn requested_roots(&self) -> Vec<PathBuf> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.root.clone())
            .collect()
    }

    fn progress_of(&self, index: usize) -> ParseProgress {
        self.pending.lock().unwrap()[index].progress.clone()
    }

    // Returns false when the operation has already gone away.
    fn deliver(&self, index: usize, tree: SourceFile) -> bool {
        let pending = self.pending.lock().unwrap();
        pending[index].progress.mark_finished();
        pending[index].sender.send(tree).is_ok()
    }
}

impl DirectoryParserOperations for MockDirectoryParser {
    fn parse_directory(&self, root: &Path, completion: Option<ParseCompletion>) -> ParseOperation {
        let (sender, receiver) = mpsc::channel();
        let progress = ParseProgress::new();
        self.pending.lock().unwrap().push(PendingParse {
            root: root.to_path_buf(),
            sender,
            progress: progress.clone(),
        });
        ParseOperation::new(progress, receiver, completion)
    }
}

struct MockFileBrowser {
    revealed: Mutex<Vec<Vec<PathBuf>>>,
}

impl MockFileBrowser {
    fn new() -> Self {
        MockFileBrowser {
            revealed: Mutex::new(Vec::new()),
        }
    }

    fn revealed(&self) -> Vec<Vec<PathBuf>> {
        self.revealed.lock().unwrap().clone()
    }
}

impl FileBrowserOperations for MockFileBrowser {
    fn reveal(&self, paths: &[PathBuf]) {
        self.revealed.lock().unwrap().push(paths.to_vec());
    }
}
// --- End Mock Structures ---

struct TestHarness {
    controller: WindowController,
    parser: Arc<MockDirectoryParser>,
    settings: Arc<InMemorySettings>,
    file_browser: Arc<MockFileBrowser>,
}

fn setup_controller() -> TestHarness {
    crate::initialize_logging();
    let parser = Arc::new(MockDirectoryParser::new());
    let settings = Arc::new(InMemorySettings::new());
    let file_browser = Arc::new(MockFileBrowser::new());
    let controller = WindowController::new(
        parser.clone(),
        settings.clone(),
        file_browser.clone(),
        Arc::new(CoreResolutionApplicator::new()),
    );
    TestHarness {
        controller,
        parser,
        settings,
        file_browser,
    }
}

/*
 * <root> (0)
 *   sub (1)
 *     b.txt (2)
 *   a.txt (3)
 */
fn make_tree(root: &str) -> SourceFile {
    let leaf = |id: u64, path: String| {
        SourceFile::new_full(
            NodeId(id),
            PathBuf::from(path),
            false,
            SourceFileResolution::None,
            vec![],
        )
    };
    SourceFile::new_full(
        NodeId(0),
        PathBuf::from(root),
        true,
        SourceFileResolution::None,
        vec![
            SourceFile::new_full(
                NodeId(1),
                PathBuf::from(format!("{root}/sub")),
                true,
                SourceFileResolution::None,
                vec![leaf(2, format!("{root}/sub/b.txt"))],
            ),
            leaf(3, format!("{root}/a.txt")),
        ],
    )
}

fn loaded_controller() -> TestHarness {
    let mut harness = setup_controller();
    harness.controller.import_directory(Path::new("/work/project"));
    assert!(harness.parser.deliver(0, make_tree("/work/project")));
    assert_eq!(harness.controller.poll_import(), ImportStatus::Finished);
    harness
}

fn resolution_of(controller: &WindowController, id: u64) -> SourceFileResolution {
    controller
        .tree()
        .and_then(|t| t.find(NodeId(id)))
        .map(|n| n.resolution())
        .unwrap()
}

#[test]
fn test_import_stores_tree_sets_title_and_clears_progress() {
    // Arrange
    let mut harness = setup_controller();
    assert_eq!(harness.controller.window_title(), DEFAULT_WINDOW_TITLE);

    // Act
    let progress = harness
        .controller
        .import_directory(Path::new("/work/project"));

    // Assert: running
    assert!(harness.controller.active_progress().is_some());
    assert!(harness.controller.tree().is_none());
    assert_eq!(harness.controller.poll_import(), ImportStatus::Running);

    // Act: deliver
    assert!(harness.parser.deliver(0, make_tree("/work/project")));
    let status = harness.controller.poll_import();

    // Assert: finished
    assert_eq!(status, ImportStatus::Finished);
    assert!(progress.is_finished());
    assert!(harness.controller.active_progress().is_none());
    assert_eq!(harness.controller.window_title(), "project");
    assert_eq!(harness.controller.tree().map(|t| t.node_count()), Some(4));
    assert_eq!(
        harness.controller.root_path(),
        Some(Path::new("/work/project"))
    );
    assert!(harness.controller.last_parse_stats().is_some());
    assert_eq!(harness.controller.poll_import(), ImportStatus::Idle);
}

#[test]
fn test_new_import_cancels_previous_and_drops_tree() {
    // Arrange
    let mut harness = loaded_controller();
    harness.controller.import_directory(Path::new("/work/first"));

    // Act
    harness.controller.import_directory(Path::new("/work/second"));

    // Assert
    assert!(harness.controller.tree().is_none());
    assert!(harness.parser.progress_of(1).is_cancelled());
    assert!(!harness.parser.progress_of(2).is_cancelled());
    // The superseded operation is gone, so its tree has nowhere to go.
    assert!(!harness.parser.deliver(1, make_tree("/work/first")));

    assert!(harness.parser.deliver(2, make_tree("/work/second")));
    assert_eq!(harness.controller.poll_import(), ImportStatus::Finished);
    assert_eq!(harness.controller.window_title(), "second");
    assert_eq!(
        harness.controller.tree().map(|t| t.path().to_path_buf()),
        Some(PathBuf::from("/work/second"))
    );
    assert_eq!(
        harness.parser.requested_roots(),
        vec![
            PathBuf::from("/work/project"),
            PathBuf::from("/work/first"),
            PathBuf::from("/work/second"),
        ]
    );
}

#[test]
fn test_delivery_from_superseded_generation_is_ignored() {
    // Arrange
    let mut harness = setup_controller();
    harness.controller.import_directory(Path::new("/work/current"));
    let stale_generation = harness.controller.import_generation - 1;
    *harness.controller.delivered.borrow_mut() = Some(DeliveredTree {
        generation: stale_generation,
        tree: make_tree("/work/stale"),
    });

    // Act
    let accepted = harness.controller.accept_delivered_tree();

    // Assert
    assert!(!accepted);
    assert!(harness.controller.tree().is_none());
    assert_eq!(harness.controller.window_title(), DEFAULT_WINDOW_TITLE);
}

#[test]
fn test_cancel_import_never_stores_tree() {
    let mut harness = setup_controller();
    harness.controller.import_directory(Path::new("/work/project"));

    harness.controller.cancel_import();
    let _ = harness.parser.deliver(0, make_tree("/work/project"));

    assert_eq!(harness.controller.poll_import(), ImportStatus::Cancelled);
    assert!(harness.controller.tree().is_none());
    assert!(harness.controller.active_progress().is_none());
    assert_eq!(harness.controller.window_title(), DEFAULT_WINDOW_TITLE);
}

#[test]
fn test_font_size_actions() {
    // Arrange
    let mut harness = setup_controller();
    let snapshot = SelectionSnapshot::default();

    // Act & Assert
    harness
        .controller
        .handle_menu_action(MenuAction::IncreaseFontSize, &snapshot);
    harness
        .controller
        .handle_menu_action(MenuAction::IncreaseFontSize, &snapshot);
    assert_eq!(harness.settings.font_size(), DEFAULT_FONT_SIZE + 2.0);

    harness
        .controller
        .handle_menu_action(MenuAction::DecreaseFontSize, &snapshot);
    assert_eq!(harness.settings.font_size(), DEFAULT_FONT_SIZE + 1.0);

    harness
        .controller
        .handle_menu_action(MenuAction::ResetFontSize, &snapshot);
    assert_eq!(harness.settings.font_size(), DEFAULT_FONT_SIZE);
}

#[test]
fn test_font_size_never_drops_below_minimum() {
    let mut harness = setup_controller();
    harness.settings.set_font_size(MIN_FONT_SIZE);

    harness
        .controller
        .handle_menu_action(MenuAction::DecreaseFontSize, &SelectionSnapshot::default());

    assert_eq!(harness.settings.font_size(), MIN_FONT_SIZE);
}

#[test]
fn test_toggle_line_numbers_flips_setting_and_title() {
    let mut harness = setup_controller();
    let snapshot = SelectionSnapshot::default();
    let title = |h: &TestHarness| {
        h.controller
            .validate_menu_item(MenuAction::ToggleLineNumbers, 0, &snapshot)
            .title
    };

    assert_eq!(title(&harness), Some(SHOW_LINE_NUMBERS_TITLE.to_string()));

    harness
        .controller
        .handle_menu_action(MenuAction::ToggleLineNumbers, &snapshot);
    assert!(harness.settings.show_line_numbers());
    assert_eq!(title(&harness), Some(HIDE_LINE_NUMBERS_TITLE.to_string()));
    assert!(
        harness
            .controller
            .validate_menu_item(MenuAction::ToggleLineNumbers, 0, &snapshot)
            .enabled
    );

    harness
        .controller
        .handle_menu_action(MenuAction::ToggleLineNumbers, &snapshot);
    assert!(!harness.settings.show_line_numbers());
}

#[test]
fn test_show_in_file_browser_reveals_selected_nodes_only() {
    // Arrange
    let mut harness = loaded_controller();
    let snapshot = SelectionSnapshot::new(Some(NodeId(2)), [NodeId(1), NodeId(3)]);

    // Act
    harness
        .controller
        .handle_menu_action(MenuAction::ShowInFileBrowser, &snapshot);
    harness
        .controller
        .handle_menu_action(MenuAction::ShowInFileBrowser, &SelectionSnapshot::default());

    // Assert
    assert_eq!(
        harness.file_browser.revealed(),
        vec![vec![
            PathBuf::from("/work/project/sub"),
            PathBuf::from("/work/project/a.txt"),
        ]]
    );
}

#[test]
fn test_show_in_file_browser_enabled_only_with_selection() {
    let harness = loaded_controller();

    let clicked_only = SelectionSnapshot::new(Some(NodeId(3)), []);
    let with_selection = SelectionSnapshot::new(None, [NodeId(3)]);

    assert_eq!(
        harness
            .controller
            .validate_menu_item(MenuAction::ShowInFileBrowser, 0, &clicked_only),
        MenuItemState::disabled()
    );
    assert_eq!(
        harness
            .controller
            .validate_menu_item(MenuAction::ShowInFileBrowser, 0, &with_selection),
        MenuItemState::enabled()
    );
}

#[test]
fn test_comment_action_on_click_outside_selection_hits_clicked_only() {
    // Arrange
    let mut harness = loaded_controller();
    let snapshot = SelectionSnapshot::new(Some(NodeId(3)), [NodeId(2)]);

    // Act
    harness
        .controller
        .handle_menu_action(MenuAction::DeleteComment, &snapshot);

    // Assert
    assert_eq!(
        resolution_of(&harness.controller, 3),
        SourceFileResolution::Delete
    );
    assert_eq!(
        resolution_of(&harness.controller, 2),
        SourceFileResolution::None
    );
}

#[test]
fn test_comment_action_on_click_inside_selection_hits_whole_selection() {
    let mut harness = loaded_controller();
    let snapshot = SelectionSnapshot::new(Some(NodeId(3)), [NodeId(2), NodeId(3)]);

    harness
        .controller
        .handle_menu_action(MenuAction::AddComment, &snapshot);

    assert_eq!(resolution_of(&harness.controller, 2), SourceFileResolution::Add);
    assert_eq!(resolution_of(&harness.controller, 3), SourceFileResolution::Add);
}

#[test]
fn test_comment_action_on_directory_covers_contents() {
    let mut harness = loaded_controller();
    let snapshot = SelectionSnapshot::new(None, [NodeId(1)]);

    harness
        .controller
        .handle_menu_action(MenuAction::IgnoreComment, &snapshot);

    assert_eq!(
        resolution_of(&harness.controller, 2),
        SourceFileResolution::Ignore
    );
    let state = harness.controller.validate_menu_item(
        MenuAction::IgnoreComment,
        SourceFileResolution::Ignore.tag(),
        &snapshot,
    );
    assert!(state.enabled && state.checked);
}

#[test]
fn test_comment_validation_tracks_model() {
    // Arrange
    let mut harness = loaded_controller();
    let snapshot = SelectionSnapshot::new(Some(NodeId(3)), []);
    let modify_tag = MenuAction::ModifyComment.tag();

    // Act & Assert
    let before = harness
        .controller
        .validate_menu_item(MenuAction::ModifyComment, modify_tag, &snapshot);
    assert!(before.enabled && !before.checked);

    harness
        .controller
        .handle_menu_action(MenuAction::ModifyComment, &snapshot);
    let after = harness
        .controller
        .validate_menu_item(MenuAction::ModifyComment, modify_tag, &snapshot);
    assert!(after.enabled && after.checked);

    let other = harness.controller.validate_menu_item(
        MenuAction::AddComment,
        MenuAction::AddComment.tag(),
        &snapshot,
    );
    assert!(other.enabled && !other.checked);
}

#[test]
fn test_comment_items_disabled_without_targets_or_tree() {
    let harness = setup_controller();
    let snapshot = SelectionSnapshot::new(Some(NodeId(0)), []);
    assert_eq!(
        harness
            .controller
            .validate_menu_item(MenuAction::AddComment, 1, &snapshot),
        MenuItemState::disabled()
    );

    let loaded = loaded_controller();
    assert_eq!(
        loaded.controller.validate_menu_item(
            MenuAction::AddComment,
            1,
            &SelectionSnapshot::default()
        ),
        MenuItemState::disabled()
    );
}

#[test]
fn test_apply_resolution_can_clear_back_to_none() {
    let mut harness = loaded_controller();
    let snapshot = SelectionSnapshot::new(None, [NodeId(3)]);
    harness
        .controller
        .handle_menu_action(MenuAction::AddComment, &snapshot);

    let changed = harness
        .controller
        .apply_resolution(SourceFileResolution::None, &snapshot);

    assert_eq!(changed, 1);
    assert_eq!(
        resolution_of(&harness.controller, 3),
        SourceFileResolution::None
    );
    assert_eq!(
        harness
            .controller
            .apply_resolution(SourceFileResolution::Add, &SelectionSnapshot::default()),
        0
    );
}

#[test]
fn test_find_node_by_path() {
    let harness = loaded_controller();
    assert_eq!(
        harness
            .controller
            .find_node_by_path(Path::new("/work/project/sub/b.txt")),
        Some(NodeId(2))
    );
    assert_eq!(
        harness
            .controller
            .find_node_by_path(Path::new("/work/project/none")),
        None
    );
}

#[test]
fn test_import_with_core_parser_end_to_end() {
    // Arrange
    crate::initialize_logging();
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("b.txt"), "b").unwrap();
    let mut controller = WindowController::new(
        Arc::new(CoreDirectoryParser::new()),
        Arc::new(InMemorySettings::new()),
        Arc::new(MockFileBrowser::new()),
        Arc::new(CoreResolutionApplicator::new()),
    );

    // Act
    controller.import_directory(dir.path());
    let started = Instant::now();
    let mut status = controller.poll_import();
    while status == ImportStatus::Running && started.elapsed() < Duration::from_secs(10) {
        std::thread::sleep(Duration::from_millis(5));
        status = controller.poll_import();
    }

    // Assert
    assert_eq!(status, ImportStatus::Finished);
    let tree = controller.tree().unwrap();
    assert_eq!(tree.node_count(), 4);
    let expected_title = dir.path().file_name().unwrap().to_string_lossy();
    assert_eq!(controller.window_title(), expected_title);
    let b = controller
        .find_node_by_path(&dir.path().join("sub").join("b.txt"))
        .unwrap();
    controller.handle_menu_action(
        MenuAction::AddComment,
        &SelectionSnapshot::new(Some(b), []),
    );
    assert_eq!(
        controller.tree().unwrap().find(b).unwrap().resolution(),
        SourceFileResolution::Add
    );
}

#[test]
fn test_wait_for_import_blocks_until_finished() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only.txt"), "x").unwrap();
    let mut controller = WindowController::new(
        Arc::new(CoreDirectoryParser::new()),
        Arc::new(InMemorySettings::new()),
        Arc::new(MockFileBrowser::new()),
        Arc::new(CoreResolutionApplicator::new()),
    );

    assert_eq!(controller.wait_for_import(), ImportStatus::Idle);
    controller.import_directory(dir.path());

    assert_eq!(controller.wait_for_import(), ImportStatus::Finished);
    assert_eq!(controller.tree().map(|t| t.children.len()), Some(1));
}

#[test]
fn test_title_names_directory_when_root_ends_in_parent_component() {
    // Arrange
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let mut controller = WindowController::new(
        Arc::new(CoreDirectoryParser::new()),
        Arc::new(InMemorySettings::new()),
        Arc::new(MockFileBrowser::new()),
        Arc::new(CoreResolutionApplicator::new()),
    );

    // Act
    controller.import_directory(&dir.path().join("sub").join(".."));
    let status = controller.wait_for_import();

    // Assert
    assert_eq!(status, ImportStatus::Finished);
    let expected_title = dir.path().file_name().unwrap().to_string_lossy();
    assert_eq!(controller.window_title(), expected_title);
    assert_eq!(controller.tree().unwrap().node_count(), 3);
}
