use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/*
 * The disposition a user has chosen for a source file's comment header.
 * Each variant carries a stable numeric tag; menu items identify the resolution
 * they stand for by this tag, so the values must never be renumbered.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceFileResolution {
    #[default]
    None,
    Add,
    Modify,
    Delete,
    Ignore,
}

impl SourceFileResolution {
    pub const ALL: [SourceFileResolution; 5] = [
        SourceFileResolution::None,
        SourceFileResolution::Add,
        SourceFileResolution::Modify,
        SourceFileResolution::Delete,
        SourceFileResolution::Ignore,
    ];

    pub fn tag(self) -> i64 {
        match self {
            SourceFileResolution::None => 0,
            SourceFileResolution::Add => 1,
            SourceFileResolution::Modify => 2,
            SourceFileResolution::Delete => 3,
            SourceFileResolution::Ignore => 4,
        }
    }

    pub fn from_tag(tag: i64) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|resolution| resolution.tag() == tag)
            .ok_or(ResolutionError::UnknownTag(tag))
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceFileResolution::None => "none",
            SourceFileResolution::Add => "add",
            SourceFileResolution::Modify => "modify",
            SourceFileResolution::Delete => "delete",
            SourceFileResolution::Ignore => "ignore",
        }
    }

    /*
     * Parses a resolution from its lowercase name, ignoring case and surrounding
     * whitespace. Used by the command line front end.
     */
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|resolution| resolution.name() == wanted)
            .ok_or_else(|| ResolutionError::UnknownName(name.to_string()))
    }
}

impl TryFrom<i64> for SourceFileResolution {
    type Error = ResolutionError;

    fn try_from(tag: i64) -> Result<Self> {
        Self::from_tag(tag)
    }
}

impl std::fmt::Display for SourceFileResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    UnknownTag(i64),
    UnknownName(String),
}

impl std::fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionError::UnknownTag(tag) => write!(f, "Unknown resolution tag: {tag}"),
            ResolutionError::UnknownName(name) => write!(f, "Unknown resolution name: '{name}'"),
        }
    }
}

impl std::error::Error for ResolutionError {}

pub type Result<T> = std::result::Result<T, ResolutionError>;

/*
 * Identifies a node within one imported tree. Ids are handed out by the
 * directory parser in depth-first pre-order, starting with the root at 0, and
 * are only meaningful for the tree they were produced with.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/*
 * Represents one file or directory of an imported tree.
 * Directories always carry a (possibly empty) child list; plain files never
 * have children. The resolution of a directory is only meaningful as an
 * aggregate: `matches` looks at the children for directories.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    id: NodeId,
    path: PathBuf,
    name: String,
    is_dir: bool,
    resolution: SourceFileResolution,
    pub children: Vec<SourceFile>,
}

impl SourceFile {
    pub fn new(id: NodeId, path: PathBuf, is_dir: bool) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        SourceFile {
            id,
            path,
            name,
            is_dir,
            resolution: SourceFileResolution::default(),
            children: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn new_full(
        id: NodeId,
        path: PathBuf,
        is_dir: bool,
        resolution: SourceFileResolution,
        children: Vec<SourceFile>,
    ) -> Self {
        let mut node = SourceFile::new(id, path, is_dir);
        node.resolution = resolution;
        node.children = children;
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    pub fn resolution(&self) -> SourceFileResolution {
        self.resolution
    }

    /*
     * Sets the resolution of this node. For a directory the same resolution is
     * pushed down to every descendant, so a folder action covers the whole
     * folder and the directory's aggregate `matches` agrees with it afterwards.
     */
    pub fn set_resolution(&mut self, resolution: SourceFileResolution) {
        self.resolution = resolution;
        for child in self.children.iter_mut() {
            child.set_resolution(resolution);
        }
    }

    /*
     * Checks whether this node carries the resolution identified by `tag`.
     * A file matches on its own resolution. A directory matches when the own
     * resolution of any direct child carries the tag; grandchildren are not
     * inspected.
     */
    pub fn matches(&self, tag: i64) -> bool {
        if self.is_dir {
            self.children
                .iter()
                .any(|child| child.resolution.tag() == tag)
        } else {
            self.resolution.tag() == tag
        }
    }

    pub fn find(&self, id: NodeId) -> Option<&SourceFile> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: NodeId) -> Option<&mut SourceFile> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Pre-order traversal over this node and all its descendants.
    pub fn iter(&self) -> SourceFileIter<'_> {
        SourceFileIter { stack: vec![self] }
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// The paths of the given nodes, in the given order.
    pub fn paths_of<'a>(nodes: impl IntoIterator<Item = &'a SourceFile>) -> Vec<PathBuf> {
        nodes.into_iter().map(|node| node.path.clone()).collect()
    }
}

pub struct SourceFileIter<'a> {
    stack: Vec<&'a SourceFile>,
}

impl<'a> Iterator for SourceFileIter<'a> {
    type Item = &'a SourceFile;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
