// src/main.rs

use clap::Parser;
use copyright_manager::app_logic::{ImportStatus, LoggingFileBrowser, WindowController};
use copyright_manager::core::{
    CoreDirectoryParser, CoreResolutionApplicator, CoreSettingsStore, InMemorySettings,
    ParserConfig, SelectionSnapshot, SettingsOperations, SourceFile, SourceFileResolution,
    path_utils,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

const APP_NAME: &str = "CopyrightManager";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Parser)]
#[command(name = "copyright-manager")]
#[command(about = "Import a source tree and mark how each file's comment header is resolved", long_about = None)]
struct Cli {
    /// Directory to import
    root: PathBuf,

    /// Leave out entries whose name starts with a dot
    #[arg(long)]
    skip_hidden: bool,

    /// Glob pattern of entries to leave out (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Set a resolution on a path relative to ROOT, e.g. `add=src/main.rs` (repeatable)
    #[arg(long = "mark", value_name = "RESOLUTION=RELPATH", value_parser = parse_mark)]
    marks: Vec<Mark>,

    /// Keep settings in memory instead of the user's configuration directory
    #[arg(long)]
    no_persist: bool,
}

#[derive(Debug, Clone)]
struct Mark {
    resolution: SourceFileResolution,
    relative_path: PathBuf,
}

fn parse_mark(value: &str) -> Result<Mark, String> {
    let (name, path) = value
        .split_once('=')
        .ok_or_else(|| format!("expected RESOLUTION=RELPATH, got '{value}'"))?;
    let resolution = SourceFileResolution::from_name(name).map_err(|e| e.to_string())?;
    if path.trim().is_empty() {
        return Err(format!("missing path in '{value}'"));
    }
    Ok(Mark {
        resolution,
        relative_path: PathBuf::from(path.trim()),
    })
}

fn open_settings(no_persist: bool) -> Arc<dyn SettingsOperations> {
    if no_persist {
        return Arc::new(InMemorySettings::new());
    }
    match CoreSettingsStore::new(APP_NAME) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            log::warn!("Main: {err}; settings will not be persisted.");
            Arc::new(InMemorySettings::new())
        }
    }
}

fn run_import(controller: &mut WindowController, root: &Path) -> ImportStatus {
    let progress = controller.import_directory(root);
    let mut stderr = io::stderr();
    loop {
        let status = controller.poll_import();
        if status != ImportStatus::Running {
            let _ = writeln!(stderr);
            return status;
        }
        let _ = write!(
            stderr,
            "\rScanning {}/{} entries",
            progress.completed(),
            progress.total()
        );
        let _ = stderr.flush();
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn apply_marks(controller: &mut WindowController, root: &Path, marks: &[Mark]) {
    for mark in marks {
        let path = path_utils::join_relative(root, &mark.relative_path);
        let Some(id) = controller.find_node_by_path(&path) else {
            log::warn!("Main: {:?} is not part of the imported tree.", mark.relative_path);
            continue;
        };
        controller.apply_resolution(mark.resolution, &SelectionSnapshot::new(Some(id), [id]));
    }
}

fn print_tree(out: &mut impl Write, root: &Path, node: &SourceFile, depth: usize) -> io::Result<()> {
    let label = if depth == 0 {
        root.display().to_string()
    } else {
        node.name().to_string()
    };
    let suffix = if node.is_dir() { "/" } else { "" };
    writeln!(
        out,
        "{:indent$}{label}{suffix} [{}]",
        "",
        node.resolution(),
        indent = depth * 2
    )?;
    for child in &node.children {
        print_tree(out, root, child, depth + 1)?;
    }
    Ok(())
}

fn main() {
    copyright_manager::initialize_logging();
    let args = Cli::parse();

    let config = ParserConfig {
        include_hidden: !args.skip_hidden,
        exclude_patterns: args.exclude.clone(),
    };
    let mut controller = WindowController::new(
        Arc::new(CoreDirectoryParser::new().with_config(config)),
        open_settings(args.no_persist),
        Arc::new(LoggingFileBrowser::new()),
        Arc::new(CoreResolutionApplicator::new()),
    );

    match run_import(&mut controller, &args.root) {
        ImportStatus::Finished => {}
        status => {
            log::error!("Main: Import of {:?} did not finish ({status:?}).", args.root);
            process::exit(1);
        }
    }
    if let Some(stats) = controller.last_parse_stats() {
        if stats.root_unavailable {
            log::warn!("Main: {:?} could not be read.", args.root);
        }
        if stats.skipped_entries > 0 || stats.unreadable_directories > 0 {
            log::warn!(
                "Main: Skipped {} entries and {} unreadable directories.",
                stats.skipped_entries,
                stats.unreadable_directories
            );
        }
    }

    apply_marks(&mut controller, &args.root, &args.marks);

    if let Some(tree) = controller.tree() {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(err) = print_tree(&mut out, &args.root, tree, 0) {
            log::error!("Main: Failed to print tree: {err}");
        }
    }
}
