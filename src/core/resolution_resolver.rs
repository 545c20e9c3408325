/*
 * Maps a user interaction to the set of nodes a resolution action applies to,
 * applies resolutions to those nodes, and computes the enabled/checked state of
 * the matching menu items. Everything here is a pure function of the tree and a
 * `SelectionSnapshot`, so menu state is recomputed from the model on every query
 * and nothing is cached between calls.
 */
use super::source_file::{NodeId, SourceFile, SourceFileResolution};
use std::collections::BTreeSet;

/*
 * The UI's view of the interaction at the moment an action fires: the node the
 * context menu was opened on (if any) and the current multi-selection.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSnapshot {
    pub clicked: Option<NodeId>,
    pub selected: BTreeSet<NodeId>,
}

impl SelectionSnapshot {
    pub fn new(clicked: Option<NodeId>, selected: impl IntoIterator<Item = NodeId>) -> Self {
        SelectionSnapshot {
            clicked,
            selected: selected.into_iter().collect(),
        }
    }

    pub fn targets(&self) -> BTreeSet<NodeId> {
        resolve_targets(self.clicked, &self.selected)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItemState {
    pub enabled: bool,
    pub checked: bool,
    pub title: Option<String>,
}

impl MenuItemState {
    pub fn disabled() -> Self {
        MenuItemState::default()
    }

    pub fn enabled() -> Self {
        MenuItemState {
            enabled: true,
            ..MenuItemState::default()
        }
    }
}

/*
 * Selects the nodes an action applies to.
 * A click inside the current selection acts on the whole selection; a click
 * outside it acts on the clicked node alone; without a click the selection is
 * used as is.
 */
pub fn resolve_targets(clicked: Option<NodeId>, selected: &BTreeSet<NodeId>) -> BTreeSet<NodeId> {
    match clicked {
        Some(id) if selected.contains(&id) => selected.clone(),
        Some(id) => BTreeSet::from([id]),
        None => selected.clone(),
    }
}

pub trait ResolutionApplicatorOperations: Send + Sync {
    /*
     * Sets `resolution` on every target node found in `tree`, overwriting the
     * previous value. Returns how many of the targets were found.
     */
    fn apply_resolution(
        &self,
        tree: &mut SourceFile,
        targets: &BTreeSet<NodeId>,
        resolution: SourceFileResolution,
    ) -> usize;

    /*
     * Computes the state of the menu item carrying `tag` for the given targets.
     * The item is disabled when none of the targets exists in `tree`, and
     * checked when at least one target matches the tag.
     */
    fn validate_resolution_item(
        &self,
        tree: &SourceFile,
        targets: &BTreeSet<NodeId>,
        tag: i64,
    ) -> MenuItemState;
}

#[derive(Debug, Default)]
pub struct CoreResolutionApplicator {}

impl CoreResolutionApplicator {
    pub fn new() -> Self {
        CoreResolutionApplicator {}
    }
}

impl ResolutionApplicatorOperations for CoreResolutionApplicator {
    fn apply_resolution(
        &self,
        tree: &mut SourceFile,
        targets: &BTreeSet<NodeId>,
        resolution: SourceFileResolution,
    ) -> usize {
        let mut applied = 0;
        for id in targets {
            match tree.find_mut(*id) {
                Some(node) => {
                    node.set_resolution(resolution);
                    applied += 1;
                }
                None => {
                    log::warn!("ResolutionApplicator: Node {id:?} not found in tree; skipped.");
                }
            }
        }
        log::debug!(
            "ResolutionApplicator: Set '{resolution}' on {applied} of {} target(s).",
            targets.len()
        );
        applied
    }

    fn validate_resolution_item(
        &self,
        tree: &SourceFile,
        targets: &BTreeSet<NodeId>,
        tag: i64,
    ) -> MenuItemState {
        let mut found_any = false;
        let mut checked = false;
        for node in targets.iter().filter_map(|id| tree.find(*id)) {
            found_any = true;
            if node.matches(tag) {
                checked = true;
                break;
            }
        }
        MenuItemState {
            enabled: found_any,
            checked,
            title: None,
        }
    }
}
