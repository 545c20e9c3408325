/*
 * Defines the menu commands the window controller responds to, identified
 * semantically rather than by toolkit selectors. The front end maps its menu
 * items onto these values. The comment actions each stand for one resolution
 * and carry that resolution's numeric tag as their menu item tag.
 */
use crate::core::SourceFileResolution;

// Title of the line number toggle while line numbers are visible.
pub const HIDE_LINE_NUMBERS_TITLE: &str = "Hide Line Numbers";
// Title of the line number toggle while line numbers are hidden.
pub const SHOW_LINE_NUMBERS_TITLE: &str = "Show Line Numbers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    ShowInFileBrowser,
    ResetFontSize,
    IncreaseFontSize,
    DecreaseFontSize,
    ToggleLineNumbers,
    AddComment,
    ModifyComment,
    DeleteComment,
    IgnoreComment,
}

impl MenuAction {
    /* The resolution a comment action applies, or `None` for other actions. */
    pub fn resolution(self) -> Option<SourceFileResolution> {
        match self {
            MenuAction::AddComment => Some(SourceFileResolution::Add),
            MenuAction::ModifyComment => Some(SourceFileResolution::Modify),
            MenuAction::DeleteComment => Some(SourceFileResolution::Delete),
            MenuAction::IgnoreComment => Some(SourceFileResolution::Ignore),
            _ => None,
        }
    }

    /* The tag a menu item for this action carries. Non-comment actions use 0. */
    pub fn tag(self) -> i64 {
        self.resolution().map(|r| r.tag()).unwrap_or(0)
    }
}
