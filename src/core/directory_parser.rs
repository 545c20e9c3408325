use super::parse_progress::ParseProgress;
use super::source_file::{NodeId, SourceFile};
use super::source_file_system::{
    CoreSourceFileSystem, DirectoryEntry, EntryKind, SourceFileSystemOperations,
};
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

/*
 * This module builds a `SourceFile` tree from a directory on a background
 * thread. The tree under construction is private to the worker and is moved,
 * fully built, to whichever thread polls the returned `ParseOperation`. That
 * polling thread is the UI-owning thread in the application; it is where the
 * completion closure runs. Traversal is best effort: entries that cannot be
 * inspected are skipped and directories that cannot be listed are kept without
 * children, so a single bad entry never fails the import.
 */

const WAIT_SLICE: Duration = Duration::from_millis(25);

/*
 * Options for a directory parse. By default every entry below the root is
 * scanned. Exclude patterns are glob patterns matched against both the path
 * relative to the root and the bare file name; an excluded directory is left
 * out together with its subtree.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    pub include_hidden: bool,
    pub exclude_patterns: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            include_hidden: true,
            exclude_patterns: Vec::new(),
        }
    }
}

pub type ParseCompletion = Box<dyn FnOnce(SourceFile)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePoll {
    Pending,
    Completed,
    Cancelled,
}

/*
 * Defines the operations for starting a directory parse.
 * Implementations return immediately; the tree is delivered exactly once
 * through the returned operation, and never after it has been cancelled.
 */
pub trait DirectoryParserOperations: Send + Sync {
    fn parse_directory(&self, root: &Path, completion: Option<ParseCompletion>) -> ParseOperation;
}

/*
 * A running (or finished) parse as seen from the thread that started it.
 * `poll` and `wait` hand the finished tree to the completion closure when one
 * was supplied; otherwise the tree is kept until `take_tree` is called.
 * Dropping an operation that has not delivered yet cancels it.
 */
pub struct ParseOperation {
    progress: ParseProgress,
    receiver: Receiver<SourceFile>,
    completion: Option<ParseCompletion>,
    tree: Option<SourceFile>,
    status: ParsePoll,
}

impl std::fmt::Debug for ParseOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseOperation")
            .field("progress", &self.progress)
            .field("status", &self.status)
            .field("has_completion", &self.completion.is_some())
            .finish()
    }
}

impl ParseOperation {
    pub(crate) fn new(
        progress: ParseProgress,
        receiver: Receiver<SourceFile>,
        completion: Option<ParseCompletion>,
    ) -> Self {
        ParseOperation {
            progress,
            receiver,
            completion,
            tree: None,
            status: ParsePoll::Pending,
        }
    }

    pub fn progress(&self) -> &ParseProgress {
        &self.progress
    }

    pub fn cancel(&self) {
        self.progress.cancel();
    }

    pub fn status(&self) -> ParsePoll {
        self.status
    }

    /*
     * Checks for the finished tree without blocking. Once the operation has
     * completed or been cancelled, repeated polls keep reporting that outcome.
     */
    pub fn poll(&mut self) -> ParsePoll {
        if self.status != ParsePoll::Pending {
            return self.status;
        }
        if self.progress.is_cancelled() {
            return self.finish_cancelled();
        }
        match self.receiver.try_recv() {
            Ok(tree) => self.deliver(tree),
            Err(TryRecvError::Empty) => ParsePoll::Pending,
            Err(TryRecvError::Disconnected) => {
                log::error!("DirectoryParser: Worker ended without delivering a tree.");
                self.progress.cancel();
                self.finish_cancelled()
            }
        }
    }

    /* Blocks until the parse completes or is cancelled. */
    pub fn wait(&mut self) -> ParsePoll {
        loop {
            match self.wait_for(WAIT_SLICE) {
                ParsePoll::Pending => continue,
                outcome => return outcome,
            }
        }
    }

    /* Blocks for at most `timeout`; returns `Pending` if the parse is still running. */
    pub fn wait_timeout(&mut self, timeout: Duration) -> ParsePoll {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait();
        };
        loop {
            let now = Instant::now();
            if now >= deadline {
                return self.poll();
            }
            match self.wait_for((deadline - now).min(WAIT_SLICE)) {
                ParsePoll::Pending => continue,
                outcome => return outcome,
            }
        }
    }

    /* The delivered tree, if the operation completed without a completion closure. */
    pub fn take_tree(&mut self) -> Option<SourceFile> {
        self.tree.take()
    }

    fn wait_for(&mut self, slice: Duration) -> ParsePoll {
        let polled = self.poll();
        if polled != ParsePoll::Pending {
            return polled;
        }
        match self.receiver.recv_timeout(slice) {
            Ok(tree) if self.progress.is_cancelled() => {
                drop(tree);
                self.finish_cancelled()
            }
            Ok(tree) => self.deliver(tree),
            Err(RecvTimeoutError::Timeout) => self.poll(),
            Err(RecvTimeoutError::Disconnected) => self.poll(),
        }
    }

    fn deliver(&mut self, tree: SourceFile) -> ParsePoll {
        self.status = ParsePoll::Completed;
        log::debug!(
            "DirectoryParser: Delivering tree for {:?} ({} nodes).",
            tree.path(),
            tree.node_count()
        );
        match self.completion.take() {
            Some(completion) => completion(tree),
            None => self.tree = Some(tree),
        }
        self.status
    }

    fn finish_cancelled(&mut self) -> ParsePoll {
        self.status = ParsePoll::Cancelled;
        self.completion = None;
        log::debug!("DirectoryParser: Parse cancelled; completion dropped.");
        self.status
    }
}

impl Drop for ParseOperation {
    fn drop(&mut self) {
        if self.status == ParsePoll::Pending {
            self.progress.cancel();
        }
    }
}

/*
 * The core implementation of `DirectoryParserOperations`.
 * Each call spawns one worker thread that walks the tree through the injected
 * `SourceFileSystemOperations`.
 */
pub struct CoreDirectoryParser {
    file_system: Arc<dyn SourceFileSystemOperations>,
    config: ParserConfig,
}

impl CoreDirectoryParser {
    pub fn new() -> Self {
        CoreDirectoryParser {
            file_system: Arc::new(CoreSourceFileSystem::new()),
            config: ParserConfig::default(),
        }
    }

    pub fn with_file_system(mut self, file_system: Arc<dyn SourceFileSystemOperations>) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for CoreDirectoryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryParserOperations for CoreDirectoryParser {
    fn parse_directory(&self, root: &Path, completion: Option<ParseCompletion>) -> ParseOperation {
        let progress = ParseProgress::new();
        let (sender, receiver) = mpsc::channel();
        log::debug!("DirectoryParser: Starting parse of {root:?}.");

        let worker = ParseWorker {
            file_system: Arc::clone(&self.file_system),
            filter: EntryFilter::from_config(root, &self.config),
            progress: progress.clone(),
            next_id: 0,
        };
        let root = root.to_path_buf();
        let spawn_result = thread::Builder::new()
            .name("directory-parser".to_string())
            .spawn(move || worker.run(root, sender));
        if let Err(err) = spawn_result {
            // The sender went down with the closure, so the operation reports cancellation.
            log::error!("DirectoryParser: Failed to spawn worker thread: {err}");
        }

        ParseOperation::new(progress, receiver, completion)
    }
}

struct EntryFilter {
    root: PathBuf,
    include_hidden: bool,
    patterns: Vec<Pattern>,
}

impl EntryFilter {
    fn from_config(root: &Path, config: &ParserConfig) -> Self {
        let patterns = config
            .exclude_patterns
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty() && !p.starts_with('#'))
            .filter_map(|p| {
                let pattern = p.trim_end_matches('/');
                match Pattern::new(pattern) {
                    Ok(compiled) => Some(compiled),
                    Err(err) => {
                        log::warn!("DirectoryParser: Invalid exclude pattern '{p}': {err}");
                        None
                    }
                }
            })
            .collect();
        EntryFilter {
            root: root.to_path_buf(),
            include_hidden: config.include_hidden,
            patterns,
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !self.include_hidden && name.starts_with('.') {
            return false;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        !self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative) || pattern.matches(&name))
    }
}

struct Cancelled;

struct ParseWorker {
    file_system: Arc<dyn SourceFileSystemOperations>,
    filter: EntryFilter,
    progress: ParseProgress,
    next_id: u64,
}

impl ParseWorker {
    fn run(mut self, root: PathBuf, sender: Sender<SourceFile>) {
        match self.build_tree(root) {
            Ok(tree) => {
                self.progress.mark_finished();
                let stats = self.progress.stats();
                log::debug!(
                    "DirectoryParser: Parse complete. {} nodes, {} skipped entries, {} unreadable directories.",
                    stats.completed,
                    stats.skipped_entries,
                    stats.unreadable_directories
                );
                if sender.send(tree).is_err() {
                    log::debug!("DirectoryParser: Receiver gone; tree discarded.");
                }
            }
            Err(Cancelled) => {
                log::debug!("DirectoryParser: Worker stopped after cancellation.");
            }
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn build_tree(&mut self, root: PathBuf) -> Result<SourceFile, Cancelled> {
        self.progress.add_total(1);
        let id = self.allocate_id();
        let kind = match self.file_system.root_kind(&root) {
            Ok(kind) => kind,
            Err(err) => {
                log::warn!("DirectoryParser: Root {root:?} is unavailable: {err}");
                self.progress.mark_root_unavailable();
                self.progress.complete_unit();
                return Ok(SourceFile::new(id, root, false));
            }
        };

        let mut node = SourceFile::new(id, root, kind == EntryKind::Directory);
        self.progress.complete_unit();
        if node.is_dir() {
            self.populate(&mut node, true)?;
        }
        Ok(node)
    }

    /* Depth first: each child directory is filled before its next sibling is created. */
    fn populate(&mut self, node: &mut SourceFile, is_root: bool) -> Result<(), Cancelled> {
        if self.progress.is_cancelled() {
            return Err(Cancelled);
        }
        let listing = match self.file_system.list_directory(node.path()) {
            Ok(listing) => listing,
            Err(err) => {
                log::warn!(
                    "DirectoryParser: Cannot list directory {:?}: {err}",
                    node.path()
                );
                self.progress.record_unreadable_directory();
                if is_root {
                    self.progress.mark_root_unavailable();
                }
                return Ok(());
            }
        };

        let mut entries: Vec<DirectoryEntry> = Vec::with_capacity(listing.len());
        for entry_result in listing {
            match entry_result {
                Ok(entry) if self.filter.accepts(&entry.path) => entries.push(entry),
                Ok(entry) => {
                    log::trace!("DirectoryParser: Excluding {:?}", entry.path);
                }
                Err(err) => {
                    log::warn!(
                        "DirectoryParser: Skipping unreadable entry in {:?}: {err}",
                        node.path()
                    );
                    self.progress.record_skipped_entry();
                }
            }
        }
        sort_entries(&mut entries);
        self.progress.add_total(entries.len());

        for entry in entries {
            if self.progress.is_cancelled() {
                return Err(Cancelled);
            }
            let id = self.allocate_id();
            let mut child = SourceFile::new(id, entry.path, entry.kind == EntryKind::Directory);
            self.progress.complete_unit();
            if child.is_dir() {
                self.populate(&mut child, false)?;
            }
            node.children.push(child);
        }
        Ok(())
    }
}

/* Directories before files, then by file name. */
fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
    });
}
